// eval/graph.rs — Editor graph JSON → indexed, compiled evaluation graph
//
// Nodes arrive either flat (`{id, type, fields}`) or in React Flow shape
// (`{id, type, data: {type, fields, _outputNode, _biomeField}}`), as an array
// or as an object keyed by id. Construction sorts ids so node indices are
// stable, resolves every edge handle to a slot, maps types to `DensityKind`
// and prepares the curve each curve-consuming node applies.

use crate::error::GraphError;
use crate::eval::compiled::{classify_handle, DensityKind, Handle, HandleRef, ResolvedInputs};
use crate::eval::curves::{Curve, SplineCurve};
use rustc_hash::FxHashMap;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, warn};

/// Type name of the sink node whose input is the graph's output.
pub const ROOT_SINK_TYPE: &str = "Root";

// ── Wire types ──────────────────────────────────────────────────────

/// One graph node.
#[derive(Debug, Clone, Deserialize)]
#[serde(from = "RawNode")]
pub struct GraphNode {
    pub id: String,
    pub data: NodeData,
    /// React Flow UI kind (e.g. `"density"`), when the node came in that shape.
    pub node_type: Option<String>,
}

/// Evaluation-relevant payload of a node.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeData {
    #[serde(rename = "type", default)]
    pub density_type: Option<String>,

    #[serde(default)]
    pub fields: Map<String, Value>,

    #[serde(rename = "_outputNode", default)]
    pub is_output: bool,

    #[serde(rename = "_biomeField", default)]
    pub biome_field: Option<String>,
}

#[derive(Deserialize)]
struct RawNode {
    #[serde(default)]
    id: String,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    data: Option<NodeData>,
    #[serde(default)]
    fields: Option<Map<String, Value>>,
    #[serde(rename = "_outputNode", default)]
    is_output: bool,
    #[serde(rename = "_biomeField", default)]
    biome_field: Option<String>,
}

impl From<RawNode> for GraphNode {
    fn from(raw: RawNode) -> Self {
        match raw.data {
            Some(data) => GraphNode {
                id: raw.id,
                data,
                node_type: raw.kind,
            },
            None => GraphNode {
                id: raw.id,
                data: NodeData {
                    density_type: raw.kind,
                    fields: raw.fields.unwrap_or_default(),
                    is_output: raw.is_output,
                    biome_field: raw.biome_field,
                },
                node_type: None,
            },
        }
    }
}

impl GraphNode {
    pub fn new(id: impl Into<String>, density_type: impl Into<String>, fields: Map<String, Value>) -> Self {
        GraphNode {
            id: id.into(),
            data: NodeData {
                density_type: Some(density_type.into()),
                fields,
                is_output: false,
                biome_field: None,
            },
            node_type: None,
        }
    }

    pub fn density_type(&self) -> &str {
        self.data.density_type.as_deref().unwrap_or("")
    }
}

/// One graph edge. A missing `targetHandle` means `"Input"`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdge {
    #[serde(default)]
    pub id: Option<String>,
    pub source: String,
    #[serde(default)]
    pub source_handle: Option<String>,
    pub target: String,
    #[serde(default)]
    pub target_handle: Option<String>,
}

impl GraphEdge {
    pub fn new(source: impl Into<String>, target: impl Into<String>, handle: Option<&str>) -> Self {
        GraphEdge {
            id: None,
            source: source.into(),
            source_handle: None,
            target: target.into(),
            target_handle: handle.map(str::to_string),
        }
    }

    pub fn handle(&self) -> &str {
        self.target_handle.as_deref().unwrap_or("Input")
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NodeCollection {
    List(Vec<GraphNode>),
    Keyed(BTreeMap<String, GraphNode>),
}

/// A whole serialized graph: `{ nodes, edges, rootNodeId? }`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphDocument {
    nodes: NodeCollection,
    #[serde(default)]
    edges: Vec<GraphEdge>,
    #[serde(default, alias = "root_node_id")]
    root_node_id: Option<String>,
}

impl GraphDocument {
    pub fn from_value(value: &Value) -> Result<Self, GraphError> {
        Ok(GraphDocument::deserialize(value)?)
    }

    pub fn root_node_id(&self) -> Option<&str> {
        self.root_node_id.as_deref()
    }

    /// Split into node and edge lists. Keyed nodes take their id from the key
    /// when the body has none.
    pub fn into_parts(self) -> (Vec<GraphNode>, Vec<GraphEdge>, Option<String>) {
        let nodes = match self.nodes {
            NodeCollection::List(list) => list,
            NodeCollection::Keyed(map) => map
                .into_iter()
                .map(|(key, mut node)| {
                    if node.id.is_empty() {
                        node.id = key;
                    }
                    node
                })
                .collect(),
        };
        (nodes, self.edges, self.root_node_id)
    }
}

// ── Root selection ──────────────────────────────────────────────────

/// How the evaluation root was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootStrategy {
    Explicit,
    RootSink,
    OutputFlag,
    TerrainField,
    TerminalDensity,
    AnyDensity,
}

// ── EvalGraph ───────────────────────────────────────────────────────

/// Indexed graph ready for evaluation.
pub struct EvalGraph {
    /// Nodes in sorted-id order; a node's position is its index.
    pub node_list: Vec<GraphNode>,
    pub id_to_idx: FxHashMap<String, usize>,
    pub root_idx: usize,
    pub root_strategy: RootStrategy,
    /// Per-node resolved input slots.
    pub resolved: Vec<ResolvedInputs>,
    /// Per-node kind; `None` for non-density or unknown types.
    pub kinds: Vec<Option<DensityKind>>,
    /// Curve applied by curve-consuming nodes (CurveFunction, BlendCurve,
    /// Distance, SplineFunction). `None` means pass-through.
    pub curves: Vec<Option<Curve>>,
}

impl EvalGraph {
    #[inline]
    pub fn node_count(&self) -> usize {
        self.node_list.len()
    }

    #[inline]
    pub fn idx_of(&self, id: &str) -> Option<usize> {
        self.id_to_idx.get(id).copied()
    }

    pub fn root_id(&self) -> &str {
        &self.node_list[self.root_idx].id
    }

    /// Parse `{ nodes, edges, rootNodeId? }` JSON and build the graph.
    pub fn from_json(value: &Value) -> Result<Self, GraphError> {
        let (nodes, edges, root) = GraphDocument::from_value(value)?.into_parts();
        Self::from_raw(nodes, edges, root.as_deref())
    }

    /// Build from node and edge lists.
    ///
    /// Duplicate node ids keep the first node. Edges whose endpoints are not
    /// in the graph are dropped. When two edges feed the same
    /// `(target, handle)` pair the later edge wins.
    pub fn from_raw(
        nodes: Vec<GraphNode>,
        edges: Vec<GraphEdge>,
        root_node_id: Option<&str>,
    ) -> Result<Self, GraphError> {
        let mut by_id: BTreeMap<String, GraphNode> = BTreeMap::new();
        for node in nodes {
            if by_id.contains_key(&node.id) {
                warn!(id = %node.id, "duplicate node id, keeping the first");
                continue;
            }
            by_id.insert(node.id.clone(), node);
        }

        let node_list: Vec<GraphNode> = by_id.into_values().collect();
        let id_to_idx: FxHashMap<String, usize> = node_list
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.clone(), i))
            .collect();

        let kinds: Vec<Option<DensityKind>> = node_list
            .iter()
            .map(|n| DensityKind::from_type_name(n.density_type()))
            .collect();

        let mut resolved = vec![ResolvedInputs::default(); node_list.len()];
        let mut dangling = 0usize;
        for edge in &edges {
            let (Some(&src), Some(&dst)) = (id_to_idx.get(&edge.source), id_to_idx.get(&edge.target))
            else {
                dangling += 1;
                continue;
            };
            let handle = classify_handle(edge.handle());
            if handle == HandleRef::Unknown {
                debug!(target_node = %edge.target, handle = edge.handle(), "edge into unknown handle ignored");
                continue;
            }
            if let Some(previous) = resolved[dst].connect(handle, src) {
                debug!(
                    target_node = %edge.target,
                    handle = edge.handle(),
                    replaced = %node_list[previous].id,
                    "handle fed twice, later edge wins"
                );
            }
        }

        let (root_idx, root_strategy) =
            Self::find_root(&node_list, &kinds, &edges, &id_to_idx, root_node_id)?;

        let curves = node_list
            .iter()
            .enumerate()
            .map(|(i, node)| prepare_curve(kinds[i], node, &resolved[i], &node_list))
            .collect();

        debug!(
            nodes = node_list.len(),
            edges = edges.len(),
            dangling,
            root = %node_list[root_idx].id,
            strategy = ?root_strategy,
            "evaluation graph built"
        );

        Ok(EvalGraph {
            node_list,
            id_to_idx,
            root_idx,
            root_strategy,
            resolved,
            kinds,
            curves,
        })
    }

    /// Pick the evaluation root.
    ///
    /// Order: explicit id, the node feeding a `Root` sink, `_outputNode`,
    /// `_biomeField == "Terrain"`, a density node without outgoing edges,
    /// any density node.
    fn find_root(
        nodes: &[GraphNode],
        kinds: &[Option<DensityKind>],
        edges: &[GraphEdge],
        id_to_idx: &FxHashMap<String, usize>,
        explicit_id: Option<&str>,
    ) -> Result<(usize, RootStrategy), GraphError> {
        if let Some(idx) = explicit_id.and_then(|id| id_to_idx.get(id)) {
            return Ok((*idx, RootStrategy::Explicit));
        }

        let sink_feeder = edges.iter().rev().find_map(|e| {
            let target = *id_to_idx.get(&e.target)?;
            let source = *id_to_idx.get(&e.source)?;
            (nodes[target].density_type() == ROOT_SINK_TYPE && source != target).then_some(source)
        });
        if let Some(idx) = sink_feeder {
            return Ok((idx, RootStrategy::RootSink));
        }

        if let Some(idx) = nodes.iter().position(|n| n.data.is_output) {
            return Ok((idx, RootStrategy::OutputFlag));
        }

        if let Some(idx) = nodes
            .iter()
            .position(|n| n.data.biome_field.as_deref() == Some("Terrain"))
        {
            return Ok((idx, RootStrategy::TerrainField));
        }

        let with_outgoing: HashSet<&str> = edges.iter().map(|e| e.source.as_str()).collect();
        if let Some(idx) = (0..nodes.len())
            .find(|&i| kinds[i].is_some() && !with_outgoing.contains(nodes[i].id.as_str()))
        {
            return Ok((idx, RootStrategy::TerminalDensity));
        }

        if let Some(idx) = kinds.iter().position(Option::is_some) {
            return Ok((idx, RootStrategy::AnyDensity));
        }

        Err(GraphError::NoRoot)
    }
}

/// The curve a node applies: its `Curve` input's curve, else an inline
/// `Curve` field object; `Points` for spline nodes.
fn prepare_curve(
    kind: Option<DensityKind>,
    node: &GraphNode,
    inputs: &ResolvedInputs,
    nodes: &[GraphNode],
) -> Option<Curve> {
    let kind = kind?;
    if kind == DensityKind::SplineFunction {
        return SplineCurve::from_field(node.data.fields.get("Points")).map(Curve::Spline);
    }
    if !kind.uses_curve() {
        return None;
    }
    if let Some(src) = inputs.get(Handle::Curve) {
        let curve_node = &nodes[src];
        return Curve::from_node(curve_node.density_type(), &curve_node.data.fields);
    }
    let inline = node.data.fields.get("Curve")?.as_object()?;
    let curve_type = inline.get("Type").and_then(Value::as_str)?;
    Curve::from_node(curve_type, inline)
}
