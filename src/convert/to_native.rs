// convert/to_native.rs — Internal assets → native JSON with `$NodeId`s

use super::asset_graph::{AssetGraph, NodeIdx};
use super::translate::{fields_to_native, native_type_name};
use super::{
    is_typed, parse_path, path_string, set_at_path, Conversion, Diagnostic, DiagnosticKind,
    PathSeg, SharingMode, NODE_ID_KEY,
};
use crate::schema::AssetCategory;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Where a node being transformed sits.
#[derive(Debug, Clone, Copy)]
pub struct TransformContext<'a> {
    pub parent_field: &'a str,
    pub category: AssetCategory,
}

impl<'a> TransformContext<'a> {
    pub fn new(parent_field: &'a str, category: AssetCategory) -> Self {
        TransformContext { parent_field, category }
    }
}

struct NativeWriter<'g> {
    graph: &'g AssetGraph,
    mode: SharingMode,
    emitted: Vec<Option<String>>,
    on_path: Vec<bool>,
    next_id: usize,
    diagnostics: Vec<Diagnostic>,
}

impl<'g> NativeWriter<'g> {
    fn new(graph: &'g AssetGraph, mode: SharingMode) -> Self {
        NativeWriter {
            graph,
            mode,
            emitted: vec![None; graph.len()],
            on_path: vec![false; graph.len()],
            next_id: 1,
            diagnostics: Vec::new(),
        }
    }

    fn write(&mut self, idx: NodeIdx, path: &mut Vec<PathSeg>) -> Value {
        let graph = self.graph;
        // A node still on the path is a cycle even once it has an id.
        if self.on_path[idx] {
            let path = path_string(path);
            warn!(%path, "cycle in asset graph, dropping back-reference");
            self.diagnostics.push(Diagnostic {
                path,
                kind: DiagnosticKind::Cycle,
                message: format!("node {} refers back to itself", graph.nodes[idx].id),
            });
            return Value::Null;
        }
        if let Some(id) = &self.emitted[idx] {
            let mut reference = Map::new();
            reference.insert(NODE_ID_KEY.to_string(), Value::String(id.clone()));
            return Value::Object(reference);
        }
        self.on_path[idx] = true;

        let node = &graph.nodes[idx];
        let native_type = native_type_name(node.category, &node.asset_type).to_string();
        let node_id = format!("{native_type}{}-{}", node.category.native_suffix(), self.next_id);
        self.next_id += 1;
        if self.mode == SharingMode::Reference {
            self.emitted[idx] = Some(node_id.clone());
        }

        let mut map = fields_to_native(node.category, &node.asset_type, node.fields.clone());
        map.insert("Type".to_string(), Value::String(native_type));
        map.insert(NODE_ID_KEY.to_string(), Value::String(node_id));
        let mut out = Value::Object(map);

        for edge in graph.child_edges(idx) {
            let handle = parse_path(&edge.handle);
            let depth = path.len();
            path.extend(handle.iter().cloned());
            let child = self.write(edge.source, path);
            path.truncate(depth);
            if child.is_null() && handle.len() == 1 {
                continue;
            }
            set_at_path(&mut out, &handle, child);
        }

        self.on_path[idx] = false;
        out
    }

    fn finish<T>(self, value: T) -> Conversion<T> {
        debug!(
            nodes = self.graph.len(),
            ids = self.next_id - 1,
            diagnostics = self.diagnostics.len(),
            "converted to native"
        );
        Conversion { value, diagnostics: self.diagnostics }
    }
}

/// Native JSON for the subtree under `root`.
pub fn graph_to_native(graph: &AssetGraph, root: NodeIdx, mode: SharingMode) -> Conversion<Value> {
    let mut writer = NativeWriter::new(graph, mode);
    let value = writer.write(root, &mut Vec::new());
    writer.finish(value)
}

/// Translate one internal asset. Values without a `Type` pass through.
pub fn transform_node(node: &Value, ctx: TransformContext<'_>) -> Conversion<Value> {
    if !is_typed(node) {
        return Conversion { value: node.clone(), diagnostics: Vec::new() };
    }
    let (graph, root) = AssetGraph::from_asset(node, ctx.category);
    let Some(root) = root else {
        return Conversion { value: node.clone(), diagnostics: Vec::new() };
    };
    let mut writer = NativeWriter::new(&graph, SharingMode::default());
    let mut path = vec![PathSeg::Key(ctx.parent_field.to_string())];
    let value = writer.write(root, &mut path);
    writer.finish(value)
}

/// Collect every typed subtree of a wrapper document into one arena.
fn collect_roots(
    graph: &mut AssetGraph,
    value: &Value,
    category: AssetCategory,
    path: &mut Vec<PathSeg>,
    roots: &mut Vec<(Vec<PathSeg>, NodeIdx)>,
) {
    if is_typed(value) {
        if let Some(idx) = graph.insert_asset(value, category) {
            roots.push((path.clone(), idx));
        }
        return;
    }
    match value {
        Value::Object(map) => {
            for (key, item) in map {
                path.push(PathSeg::Key(key.clone()));
                collect_roots(graph, item, category.child_category(key), path, roots);
                path.pop();
            }
        }
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                path.push(PathSeg::Index(i));
                collect_roots(graph, item, category, path, roots);
                path.pop();
            }
        }
        _ => {}
    }
}

/// Translate a whole internal biome. All sections share one id sequence.
pub fn internal_to_native_biome(biome: &Value, mode: SharingMode) -> Conversion<Value> {
    let mut graph = AssetGraph::new();
    let mut roots = Vec::new();
    collect_roots(&mut graph, biome, AssetCategory::Biome, &mut Vec::new(), &mut roots);

    let mut out = biome.clone();
    let mut writer = NativeWriter::new(&graph, mode);
    for (path, idx) in roots {
        let mut walk = path.clone();
        let value = writer.write(idx, &mut walk);
        set_at_path(&mut out, &path, value);
    }
    writer.finish(out)
}

/// Translate a world structure: its `Density` tree is converted and the
/// editor-only `Framework` key is dropped.
pub fn internal_to_native_world_structure(world: &Value) -> Conversion<Value> {
    let mut out = world.clone();
    let mut diagnostics = Vec::new();
    if let Some(density) = out.get("Density").filter(|d| is_typed(d)) {
        let converted = transform_node(density, TransformContext::new("Density", AssetCategory::Density));
        diagnostics = converted.diagnostics;
        out["Density"] = converted.value;
    }
    if let Value::Object(map) = &mut out {
        map.remove("Framework");
    }
    Conversion { value: out, diagnostics }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::asset_graph::AssetNode;
    use serde_json::json;

    fn density(id: &str, asset_type: &str, fields: Value) -> AssetNode {
        AssetNode {
            id: id.into(),
            asset_type: asset_type.into(),
            category: AssetCategory::Density,
            fields: fields.as_object().cloned().unwrap_or_default(),
        }
    }

    #[test]
    fn transform_renames_and_assigns_ids() {
        let internal = json!({
            "Type": "Clamp",
            "Min": 0,
            "Max": 1,
            "Input": {
                "Type": "CurveFunction",
                "Input": { "Type": "CoordinateY" },
                "Curve": { "Type": "Manual", "Points": [[0, 0], [1, 1]] }
            }
        });
        let out = transform_node(&internal, TransformContext::new("Density", AssetCategory::Density));
        assert!(out.is_clean());
        let v = out.value;
        assert_eq!(v["Type"], "Clamp");
        assert_eq!(v["$NodeId"], "ClampDensityNode-1");
        assert_eq!(v["WallB"], 0);
        assert_eq!(v["WallA"], 1);
        assert_eq!(v["Input"]["Type"], "CurveMapper");
        assert_eq!(v["Input"]["Curve"]["$NodeId"].as_str().map(|s| s.starts_with("ManualCurveNode-")), Some(true));
    }

    #[test]
    fn untyped_values_pass_through() {
        let plain = json!({ "Value": 3 });
        let out = transform_node(&plain, TransformContext::new("Density", AssetCategory::Density));
        assert_eq!(out.value, plain);
    }

    #[test]
    fn shared_node_is_referenced_after_first_visit() {
        let mut graph = AssetGraph::new();
        let sum = graph.add_node(density("s", "Sum", json!({})));
        let noise = graph.add_node(density("n", "SimplexNoise2D", json!({ "Frequency": 0.01, "Seed": 7 })));
        graph.connect(noise, sum, "InputA");
        graph.connect(noise, sum, "InputB");

        let out = graph_to_native(&graph, sum, SharingMode::Reference).value;
        let id = out["InputA"]["$NodeId"].as_str().unwrap().to_string();
        assert_eq!(out["InputA"]["Type"], "SimplexNoise2D");
        assert_eq!(out["InputB"], json!({ "$NodeId": id }));
    }

    #[test]
    fn duplicate_mode_copies_with_fresh_ids() {
        let mut graph = AssetGraph::new();
        let sum = graph.add_node(density("s", "Sum", json!({})));
        let x = graph.add_node(density("x", "CoordinateX", json!({})));
        graph.connect(x, sum, "InputA");
        graph.connect(x, sum, "InputB");

        let out = graph_to_native(&graph, sum, SharingMode::Duplicate).value;
        assert_eq!(out["InputA"]["Type"], "CoordinateX");
        assert_eq!(out["InputB"]["Type"], "CoordinateX");
        assert_ne!(out["InputA"]["$NodeId"], out["InputB"]["$NodeId"]);
    }

    #[test]
    fn cycles_are_cut_with_a_diagnostic() {
        let mut graph = AssetGraph::new();
        let neg = graph.add_node(density("n", "Negate", json!({})));
        let abs = graph.add_node(density("a", "Abs", json!({})));
        graph.connect(abs, neg, "Input");
        graph.connect(neg, abs, "Input");

        let out = graph_to_native(&graph, neg, SharingMode::Duplicate);
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!(out.diagnostics[0].kind, DiagnosticKind::Cycle);
        assert_eq!(out.diagnostics[0].path, "Input.Input");
        assert!(out.value["Input"].get("Input").is_none());
    }

    #[test]
    fn cycles_are_cut_in_reference_mode() {
        let mut graph = AssetGraph::new();
        let neg = graph.add_node(density("n", "Negate", json!({})));
        let abs = graph.add_node(density("a", "Abs", json!({})));
        graph.connect(abs, neg, "Input");
        graph.connect(neg, abs, "Input");

        let out = graph_to_native(&graph, neg, SharingMode::Reference);
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!(out.diagnostics[0].kind, DiagnosticKind::Cycle);
        assert_eq!(out.diagnostics[0].path, "Input.Input");
        // No `$NodeId` back-reference to the root survives.
        assert!(out.value["Input"].is_object());
        assert!(out.value["Input"].get("Input").is_none());
    }

    #[test]
    fn biome_sections_share_one_id_sequence() {
        let biome = json!({
            "Name": "Tundra",
            "Terrain": { "Type": "DAOTerrain", "Density": { "Type": "Negate", "Input": { "Type": "CoordinateY" } } },
            "MaterialProvider": { "Type": "Constant", "Material": "Rock_Stone" },
            "Props": [{ "Runtime": 0, "Positions": { "Type": "Mesh2D" }, "Assignments": { "Type": "Constant" } }]
        });
        let out = internal_to_native_biome(&biome, SharingMode::Reference);
        let v = out.value;
        let id = |node: &Value| node["$NodeId"].as_str().unwrap_or_default().to_string();
        assert_eq!(v["Name"], "Tundra");
        assert!(id(&v["Terrain"]).starts_with("DAOTerrainTerrainNode-"));
        assert_eq!(v["Terrain"]["Density"]["Type"], "Inverter");
        assert!(id(&v["Terrain"]["Density"]).starts_with("InverterDensityNode-"));
        assert!(id(&v["MaterialProvider"]).starts_with("ConstantMaterialProviderNode-"));
        assert_eq!(v["Props"][0]["Runtime"], 0);
        assert!(id(&v["Props"][0]["Positions"]).starts_with("Mesh2DPositionProviderNode-"));
        assert!(id(&v["Props"][0]["Assignments"]).starts_with("ConstantAssignmentsNode-"));

        let mut ids = vec![
            id(&v["Terrain"]),
            id(&v["Terrain"]["Density"]),
            id(&v["Terrain"]["Density"]["Input"]),
            id(&v["MaterialProvider"]),
            id(&v["Props"][0]["Positions"]),
            id(&v["Props"][0]["Assignments"]),
        ];
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 6);
    }

    #[test]
    fn world_structure_export() {
        let ws = json!({
            "Type": "NoiseRange",
            "Framework": {},
            "Density": { "Type": "SimplexNoise2D", "Frequency": 0.001, "Amplitude": 1.0, "Gain": 0.5 }
        });
        let v = internal_to_native_world_structure(&ws).value;
        assert!(v.get("Framework").is_none());
        assert!((v["Density"]["Scale"].as_f64().unwrap() - 1000.0).abs() < 1e-9);
        assert!(v["Density"]["$NodeId"].is_string());

        let untyped = json!({ "Type": "NoiseRange", "Density": { "Value": 1 }, "Framework": {} });
        let v = internal_to_native_world_structure(&untyped).value;
        assert_eq!(v, json!({ "Type": "NoiseRange", "Density": { "Value": 1 } }));
    }
}
