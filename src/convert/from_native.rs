// convert/from_native.rs — Native JSON → internal assets
//
// Two passes. The first collects every `$NodeId` definition (an object with
// both `$NodeId` and `Type`). The second walks the tree and gives each
// `$NodeId` exactly one arena node, so an inline copy and a bare reference
// to the same id end up as one node with two parents.

use super::asset_graph::{AssetGraph, AssetNode, NodeIdx};
use super::translate::{fields_to_internal, internal_type_name};
use super::{
    is_native_format, is_typed, path_string, strip_node_ids, Conversion, Diagnostic,
    DiagnosticKind, PathSeg, NODE_ID_KEY,
};
use crate::schema::AssetCategory;
use rustc_hash::{FxHashMap, FxHashSet};
use serde_json::{Map, Value};
use tracing::{debug, warn};

struct NativeReader<'a> {
    definitions: FxHashMap<&'a str, &'a Value>,
    assigned: FxHashMap<&'a str, NodeIdx>,
    in_progress: FxHashSet<&'a str>,
    graph: AssetGraph,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> NativeReader<'a> {
    fn new(document: &'a Value) -> Self {
        let mut definitions = FxHashMap::default();
        collect_definitions(document, &mut definitions);
        NativeReader {
            definitions,
            assigned: FxHashMap::default(),
            in_progress: FxHashSet::default(),
            graph: AssetGraph::new(),
            diagnostics: Vec::new(),
        }
    }

    fn report(&mut self, path: &[PathSeg], kind: DiagnosticKind, message: String) {
        let path = path_string(path);
        warn!(%path, ?kind, "{message}");
        self.diagnostics.push(Diagnostic { path, kind, message });
    }

    /// Arena node for a typed object or `$NodeId` reference.
    fn read_node(
        &mut self,
        value: &'a Value,
        category: AssetCategory,
        path: &mut Vec<PathSeg>,
    ) -> Option<NodeIdx> {
        let map = value.as_object()?;
        let node_id = map.get(NODE_ID_KEY).and_then(Value::as_str);

        if let Some(id) = node_id {
            if let Some(&idx) = self.assigned.get(id) {
                if self.in_progress.contains(id) {
                    self.report(path, DiagnosticKind::Cycle, format!("{id} refers to itself"));
                    return None;
                }
                return Some(idx);
            }
        }

        let definition = if is_typed(value) {
            map
        } else {
            let id = node_id?;
            match self.definitions.get(id).copied().and_then(Value::as_object) {
                Some(def) => def,
                None => {
                    self.report(path, DiagnosticKind::BrokenReference, format!("no definition for {id}"));
                    return None;
                }
            }
        };
        let native_type = definition.get("Type").and_then(Value::as_str)?;
        let category = node_id.and_then(AssetCategory::from_node_id).unwrap_or(category);

        let arena_id = node_id.map_or_else(|| format!("node-{}", self.graph.len()), str::to_string);
        let idx = self.graph.add_node(AssetNode {
            id: arena_id,
            asset_type: internal_type_name(category, native_type).to_string(),
            category,
            fields: Map::new(),
        });
        if let Some(id) = node_id {
            self.assigned.insert(id, idx);
            self.in_progress.insert(id);
        }

        let mut fields = Map::new();
        for (key, field) in definition {
            if key == "Type" || key == NODE_ID_KEY {
                continue;
            }
            path.push(PathSeg::Key(key.clone()));
            let handle_start = path.len() - 1;
            if let Some(plain) = self.read_field(field, category.child_category(key), idx, path, handle_start) {
                fields.insert(key.clone(), plain);
            }
            path.pop();
        }
        self.graph.nodes[idx].fields = fields_to_internal(category, native_type, fields);

        if let Some(id) = node_id {
            self.in_progress.remove(id);
        }
        Some(idx)
    }

    /// Plain remainder of a field, connecting nodes found inside it to
    /// `parent`. `path[handle_start..]` is the handle relative to the parent.
    fn read_field(
        &mut self,
        value: &'a Value,
        category: AssetCategory,
        parent: NodeIdx,
        path: &mut Vec<PathSeg>,
        handle_start: usize,
    ) -> Option<Value> {
        match value {
            Value::Object(map) if is_typed(value) || map.contains_key(NODE_ID_KEY) => {
                if let Some(child) = self.read_node(value, category, path) {
                    let handle = path_string(&path[handle_start..]);
                    self.graph.connect(child, parent, handle);
                }
                None
            }
            Value::Object(map) => {
                if !map.is_empty() && is_asset_slot(path) {
                    self.report(path, DiagnosticKind::MissingType, "asset without Type kept as plain data".into());
                }
                let mut out = Map::new();
                for (key, item) in map {
                    path.push(PathSeg::Key(key.clone()));
                    if let Some(plain) = self.read_field(item, category.child_category(key), parent, path, handle_start) {
                        out.insert(key.clone(), plain);
                    }
                    path.pop();
                }
                Some(Value::Object(out))
            }
            Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    path.push(PathSeg::Index(i));
                    out.push(self.read_field(item, category, parent, path, handle_start).unwrap_or(Value::Null));
                    path.pop();
                }
                Some(Value::Array(out))
            }
            other => Some(other.clone()),
        }
    }

    /// Walk a wrapper document, reading every node it contains and noting
    /// where each one sat.
    fn read_document(
        &mut self,
        value: &'a Value,
        category: AssetCategory,
        path: &mut Vec<PathSeg>,
        roots: &mut Vec<(Vec<PathSeg>, NodeIdx)>,
    ) {
        match value {
            Value::Object(map) if is_typed(value) || map.contains_key(NODE_ID_KEY) => {
                if let Some(idx) = self.read_node(value, category, path) {
                    roots.push((path.clone(), idx));
                }
            }
            Value::Object(map) => {
                for (key, item) in map {
                    path.push(PathSeg::Key(key.clone()));
                    self.read_document(item, category.child_category(key), path, roots);
                    path.pop();
                }
            }
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    path.push(PathSeg::Index(i));
                    self.read_document(item, category, path, roots);
                    path.pop();
                }
            }
            _ => {}
        }
    }

    fn finish<T>(self, value: T) -> Conversion<T> {
        debug!(
            definitions = self.definitions.len(),
            nodes = self.graph.len(),
            diagnostics = self.diagnostics.len(),
            "converted from native"
        );
        Conversion { value, diagnostics: self.diagnostics }
    }
}

fn collect_definitions<'a>(value: &'a Value, out: &mut FxHashMap<&'a str, &'a Value>) {
    match value {
        Value::Object(map) => {
            if let Some(id) = map.get(NODE_ID_KEY).and_then(Value::as_str) {
                if is_typed(value) {
                    out.entry(id).or_insert(value);
                }
            }
            map.values().for_each(|v| collect_definitions(v, out));
        }
        Value::Array(items) => items.iter().for_each(|v| collect_definitions(v, out)),
        _ => {}
    }
}

/// Whether the innermost key of `path` names a child-asset slot.
fn is_asset_slot(path: &[PathSeg]) -> bool {
    path.iter().rev().find_map(|seg| match seg {
        PathSeg::Key(k) => Some(AssetCategory::is_asset_field(k)),
        PathSeg::Index(_) => None,
    }) == Some(true)
}

/// Read a native density document into an arena, keeping sharing.
pub fn native_to_graph(document: &Value) -> Conversion<(AssetGraph, Option<NodeIdx>)> {
    let mut reader = NativeReader::new(document);
    let mut path = Vec::new();
    let root = reader.read_node(document, AssetCategory::Density, &mut path);
    if root.is_none() && reader.diagnostics.is_empty() {
        reader.report(&path, DiagnosticKind::MissingType, "document root has no Type".into());
    }
    let graph = std::mem::take(&mut reader.graph);
    reader.finish((graph, root))
}

fn convert_document(document: &Value, category: AssetCategory) -> Conversion<Value> {
    let mut reader = NativeReader::new(document);
    let mut roots = Vec::new();
    reader.read_document(document, category, &mut Vec::new(), &mut roots);

    let mut out = document.clone();
    strip_node_ids(&mut out);
    for (path, idx) in roots {
        super::set_at_path(&mut out, &path, reader.graph.to_asset(idx));
    }
    reader.finish(out)
}

/// Native density (or any asset) → nested internal JSON. Shared nodes are
/// inlined at each site. Documents without `$NodeId` pass through.
pub fn native_to_internal(document: &Value) -> Conversion<Value> {
    if !is_native_format(document) {
        return Conversion { value: document.clone(), diagnostics: Vec::new() };
    }
    convert_document(document, AssetCategory::Density)
}

/// Native biome → internal biome. All sections resolve ids against one
/// registry.
pub fn native_to_internal_biome(document: &Value) -> Conversion<Value> {
    if !is_native_format(document) {
        return Conversion { value: document.clone(), diagnostics: Vec::new() };
    }
    convert_document(document, AssetCategory::Biome)
}

/// Native world structure → internal: `Density` is reverse-translated,
/// the top-level `$NodeId` removed and an empty `Framework` added.
pub fn native_to_internal_world_structure(document: &Value) -> Conversion<Value> {
    let mut out = document.clone();
    let mut diagnostics = Vec::new();
    if let Some(density) = document.get("Density").filter(|d| is_native_format(d)) {
        let converted = native_to_internal(density);
        diagnostics = converted.diagnostics;
        out["Density"] = converted.value;
    }
    if let Value::Object(map) = &mut out {
        map.remove(NODE_ID_KEY);
        map.insert("Framework".to_string(), Value::Object(Map::new()));
    }
    Conversion { value: out, diagnostics }
}
