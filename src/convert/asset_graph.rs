// convert/asset_graph.rs — Arena form of a nested asset tree
//
// Every typed object (`{"Type": ..}`) becomes a node; the slot it sat in
// becomes an edge from child to parent whose handle is the JSON path inside
// the parent (`Input`, `Inputs[2]`, `Entries[0].Material`). The parent keeps
// the remaining plain data, with nulls holding array positions.

use super::{is_typed, parse_path, path_string, set_at_path, PathSeg, NODE_ID_KEY};
use crate::eval::graph::{GraphEdge, GraphNode};
use crate::schema::AssetCategory;
use serde_json::{Map, Value};

pub type NodeIdx = usize;

#[derive(Debug, Clone, PartialEq)]
pub struct AssetNode {
    pub id: String,
    /// Internal type name.
    pub asset_type: String,
    pub category: AssetCategory,
    /// Plain fields; child assets live on edges.
    pub fields: Map<String, Value>,
}

/// `source` is the child, `target` the parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetEdge {
    pub source: NodeIdx,
    pub target: NodeIdx,
    pub handle: String,
}

#[derive(Debug, Clone, Default)]
pub struct AssetGraph {
    pub nodes: Vec<AssetNode>,
    edges: Vec<AssetEdge>,
    /// Per node: incoming child edges as `(parsed handle, edge index)`,
    /// sorted by handle.
    children: Vec<Vec<(Vec<PathSeg>, usize)>>,
    /// Per node: number of slots holding it.
    parents: Vec<usize>,
}

impl AssetGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the arena for one nested asset. Returns `None` for the root if
    /// `value` is not a typed object.
    pub fn from_asset(value: &Value, category: AssetCategory) -> (Self, Option<NodeIdx>) {
        let mut graph = AssetGraph::new();
        let root = graph.insert_asset(value, category);
        (graph, root)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn add_node(&mut self, node: AssetNode) -> NodeIdx {
        self.nodes.push(node);
        self.children.push(Vec::new());
        self.parents.push(0);
        self.nodes.len() - 1
    }

    /// Connect `source` into the `handle` slot of `target`. Edges sharing a
    /// handle keep their insertion order.
    pub fn connect(&mut self, source: NodeIdx, target: NodeIdx, handle: impl Into<String>) {
        let handle = handle.into();
        let path = parse_path(&handle);
        let slots = &mut self.children[target];
        let at = slots.partition_point(|(p, _)| *p <= path);
        slots.insert(at, (path, self.edges.len()));
        self.parents[source] += 1;
        self.edges.push(AssetEdge { source, target, handle });
    }

    pub fn edges(&self) -> &[AssetEdge] {
        &self.edges
    }

    /// Number of slots holding this node.
    pub fn parent_count(&self, idx: NodeIdx) -> usize {
        self.parents[idx]
    }

    /// Incoming child edges of `idx`, in path order (array slots by index).
    pub fn child_edges(&self, idx: NodeIdx) -> Vec<&AssetEdge> {
        self.children[idx].iter().map(|&(_, e)| &self.edges[e]).collect()
    }

    /// Nodes nothing refers to.
    pub fn roots(&self) -> Vec<NodeIdx> {
        (0..self.nodes.len()).filter(|&i| self.parents[i] == 0).collect()
    }

    /// Add a nested asset and all typed objects below it.
    pub fn insert_asset(&mut self, value: &Value, category: AssetCategory) -> Option<NodeIdx> {
        let map = value.as_object()?;
        let asset_type = map.get("Type")?.as_str()?.to_string();
        let idx = self.add_node(AssetNode {
            id: format!("node-{}", self.nodes.len()),
            asset_type,
            category,
            fields: Map::new(),
        });

        let mut fields = Map::new();
        let mut path = Vec::new();
        for (key, field) in map {
            if key == "Type" || key == NODE_ID_KEY {
                continue;
            }
            path.push(PathSeg::Key(key.clone()));
            if let Some(plain) = self.split_field(field, category.child_category(key), idx, &mut path) {
                fields.insert(key.clone(), plain);
            }
            path.pop();
        }
        self.nodes[idx].fields = fields;
        Some(idx)
    }

    /// Move typed objects in `value` into the arena under `parent`. Returns
    /// what is left, or `None` when `value` itself became a node.
    fn split_field(
        &mut self,
        value: &Value,
        category: AssetCategory,
        parent: NodeIdx,
        path: &mut Vec<PathSeg>,
    ) -> Option<Value> {
        if is_typed(value) {
            if let Some(child) = self.insert_asset(value, category) {
                self.connect(child, parent, path_string(path));
            }
            return None;
        }
        match value {
            Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    path.push(PathSeg::Index(i));
                    out.push(self.split_field(item, category, parent, path).unwrap_or(Value::Null));
                    path.pop();
                }
                Some(Value::Array(out))
            }
            Value::Object(map) => {
                let mut out = Map::new();
                for (key, item) in map {
                    path.push(PathSeg::Key(key.clone()));
                    if let Some(plain) = self.split_field(item, category.child_category(key), parent, path) {
                        out.insert(key.clone(), plain);
                    }
                    path.pop();
                }
                Some(Value::Object(out))
            }
            other => Some(other.clone()),
        }
    }

    /// Rebuild nested JSON below `root`. A shared node is inlined at every
    /// site; a node already on the current path becomes `null`.
    pub fn to_asset(&self, root: NodeIdx) -> Value {
        let mut on_path = vec![false; self.nodes.len()];
        self.build_asset(root, &mut on_path)
    }

    fn build_asset(&self, idx: NodeIdx, on_path: &mut [bool]) -> Value {
        if on_path[idx] {
            return Value::Null;
        }
        on_path[idx] = true;

        let node = &self.nodes[idx];
        let mut map = node.fields.clone();
        map.insert("Type".to_string(), Value::String(node.asset_type.clone()));
        let mut out = Value::Object(map);
        for edge in self.child_edges(idx) {
            let child = self.build_asset(edge.source, on_path);
            set_at_path(&mut out, &parse_path(&edge.handle), child);
        }

        on_path[idx] = false;
        out
    }

    /// Evaluator nodes and edges for previewing the arena directly.
    pub fn to_eval_nodes(&self) -> (Vec<GraphNode>, Vec<GraphEdge>) {
        let nodes = self
            .nodes
            .iter()
            .map(|n| GraphNode::new(n.id.clone(), n.asset_type.clone(), n.fields.clone()))
            .collect();
        let edges = self
            .edges
            .iter()
            .map(|e| {
                GraphEdge::new(
                    self.nodes[e.source].id.clone(),
                    self.nodes[e.target].id.clone(),
                    Some(e.handle.as_str()),
                )
            })
            .collect();
        (nodes, edges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EvalOptions;
    use crate::eval::{evaluate_grid, EvalGraph};
    use serde_json::json;

    #[test]
    fn nested_asset_becomes_arena() {
        let asset = json!({
            "Type": "Sum",
            "Inputs": [
                { "Type": "Constant", "Value": 2.0 },
                { "Type": "Constant", "Value": 3.0 }
            ],
            "Comment": "plain"
        });
        let (graph, root) = AssetGraph::from_asset(&asset, AssetCategory::Density);
        let root = root.unwrap();

        assert_eq!(graph.len(), 3);
        assert_eq!(graph.nodes[root].fields["Comment"], "plain");
        let handles: Vec<&str> = graph.child_edges(root).iter().map(|e| e.handle.as_str()).collect();
        assert_eq!(handles, vec!["Inputs[0]", "Inputs[1]"]);
        assert_eq!(graph.roots(), vec![root]);
    }

    #[test]
    fn to_asset_restores_nesting() {
        let asset = json!({
            "Type": "CurveFunction",
            "Input": { "Type": "CoordinateY" },
            "Curve": { "Type": "Power", "Exponent": 2.0 },
            "Points": [[0, 0], [1, 1]]
        });
        let (graph, root) = AssetGraph::from_asset(&asset, AssetCategory::Density);
        let root = root.unwrap();
        assert_eq!(graph.to_asset(root), asset);
        let curve = graph.child_edges(root).into_iter().find(|e| e.handle == "Curve").unwrap();
        assert_eq!(graph.nodes[curve.source].category, AssetCategory::Curve);
    }

    #[test]
    fn array_slots_reassemble_in_index_order() {
        let mut graph = AssetGraph::new();
        let parent = graph.add_node(AssetNode {
            id: "p".into(),
            asset_type: "Max".into(),
            category: AssetCategory::Density,
            fields: Map::new(),
        });
        for (i, v) in [(10, 1.0), (2, 2.0), (0, 3.0)] {
            let mut fields = Map::new();
            fields.insert("Value".into(), json!(v));
            let c = graph.add_node(AssetNode {
                id: format!("c{i}"),
                asset_type: "Constant".into(),
                category: AssetCategory::Density,
                fields,
            });
            graph.connect(c, parent, format!("Inputs[{i}]"));
        }
        let out = graph.to_asset(parent);
        let inputs = out["Inputs"].as_array().unwrap();
        assert_eq!(inputs.len(), 11);
        assert_eq!(inputs[0]["Value"], 3.0);
        assert_eq!(inputs[2]["Value"], 2.0);
        assert_eq!(inputs[10]["Value"], 1.0);
    }

    #[test]
    fn adjacency_tracks_connects_in_any_order() {
        let mut graph = AssetGraph::new();
        let node = |id: &str| AssetNode {
            id: id.into(),
            asset_type: "Constant".into(),
            category: AssetCategory::Density,
            fields: Map::new(),
        };
        let parent = graph.add_node(node("p"));
        let a = graph.add_node(node("a"));
        let b = graph.add_node(node("b"));
        let c = graph.add_node(node("c"));
        graph.connect(a, parent, "Inputs[10]");
        graph.connect(b, parent, "Inputs[2]");
        graph.connect(c, parent, "Input");
        graph.connect(a, parent, "Inputs[2]");

        let order: Vec<(NodeIdx, &str)> = graph
            .child_edges(parent)
            .iter()
            .map(|e| (e.source, e.handle.as_str()))
            .collect();
        assert_eq!(order, vec![(c, "Input"), (b, "Inputs[2]"), (a, "Inputs[2]"), (a, "Inputs[10]")]);
        assert_eq!(graph.parent_count(a), 2);
        assert_eq!(graph.parent_count(b), 1);
        assert_eq!(graph.parent_count(parent), 0);
        assert_eq!(graph.roots(), vec![parent]);
        assert_eq!(graph.edges().len(), 4);
        assert!(graph.child_edges(a).is_empty());
    }

    #[test]
    fn shared_node_is_inlined_twice_and_cycles_become_null() {
        let mut graph = AssetGraph::new();
        let node = |id: &str, t: &str| AssetNode {
            id: id.into(),
            asset_type: t.into(),
            category: AssetCategory::Density,
            fields: Map::new(),
        };
        let sum = graph.add_node(node("s", "Sum"));
        let shared = graph.add_node(node("x", "CoordinateX"));
        graph.connect(shared, sum, "InputA");
        graph.connect(shared, sum, "InputB");
        assert_eq!(graph.parent_count(shared), 2);
        let out = graph.to_asset(sum);
        assert_eq!(out["InputA"], out["InputB"]);

        let neg = graph.add_node(node("n", "Negate"));
        graph.connect(neg, neg, "Input");
        assert_eq!(graph.to_asset(neg)["Input"], Value::Null);
    }

    #[test]
    fn eval_nodes_preview_nested_density() {
        let asset = json!({
            "Type": "Sum",
            "Inputs": [
                { "Type": "Constant", "Value": 2.0 },
                { "Type": "Constant", "Value": 3.0 }
            ]
        });
        let (graph, root) = AssetGraph::from_asset(&asset, AssetCategory::Density);
        let (nodes, edges) = graph.to_eval_nodes();
        let root_id = graph.nodes[root.unwrap()].id.clone();
        let eval = EvalGraph::from_raw(nodes, edges, Some(root_id.as_str())).unwrap();
        let grid = evaluate_grid(&eval, 2, 0.0, 1.0, 0.0, &EvalOptions::default());
        assert!(grid.values.iter().all(|&v| (v - 5.0).abs() < 1e-6));
    }
}
