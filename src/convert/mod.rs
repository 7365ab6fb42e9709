// convert — Internal ↔ Hytale native asset JSON
//
// Internal assets are nested `{Type, ...fields}` objects (or editor graphs).
// Native assets carry a `$NodeId` on every node and may replace a repeated
// node with a bare `{"$NodeId": ...}` reference. Both directions go through
// `AssetGraph`, where a shared node is one arena entry with several parents.

pub mod asset_graph;
pub mod from_native;
pub mod to_native;
pub mod translate;

pub use asset_graph::{AssetEdge, AssetGraph, AssetNode, NodeIdx};
pub use from_native::{
    native_to_graph, native_to_internal, native_to_internal_biome,
    native_to_internal_world_structure,
};
pub use to_native::{
    graph_to_native, internal_to_native_biome, internal_to_native_world_structure, transform_node,
    TransformContext,
};

use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Key carrying node identity in native documents.
pub const NODE_ID_KEY: &str = "$NodeId";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DiagnosticKind {
    /// `$NodeId` reference with no definition anywhere in the document.
    BrokenReference,
    /// Object in an asset slot without a `Type`.
    MissingType,
    /// Reference back to a node that is still being converted.
    Cycle,
}

/// A recoverable conversion problem, located by JSON path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub path: String,
    pub kind: DiagnosticKind,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} at {}: {}", self.kind, self.path, self.message)
    }
}

/// Converted output plus the diagnostics collected on the way.
#[derive(Debug, Clone)]
pub struct Conversion<T> {
    pub value: T,
    pub diagnostics: Vec<Diagnostic>,
}

impl<T> Conversion<T> {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Conversion<U> {
        Conversion { value: f(self.value), diagnostics: self.diagnostics }
    }
}

/// How a node with several parents is written to native JSON.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SharingMode {
    /// Full node at the first site, `{"$NodeId": id}` afterwards.
    #[default]
    Reference,
    /// Full copy with a fresh id at every site.
    Duplicate,
}

/// True if `$NodeId` appears anywhere in the document.
pub fn is_native_format(value: &Value) -> bool {
    match value {
        Value::Object(map) => map.contains_key(NODE_ID_KEY) || map.values().any(is_native_format),
        Value::Array(items) => items.iter().any(is_native_format),
        _ => false,
    }
}

/// True for objects with a string `Type`.
pub(crate) fn is_typed(value: &Value) -> bool {
    value.get("Type").is_some_and(Value::is_string)
}

/// One step of a JSON path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum PathSeg {
    Key(String),
    Index(usize),
}

/// Renders a path as `Density.Inputs[0]`.
pub(crate) fn path_string(path: &[PathSeg]) -> String {
    let mut out = String::new();
    for seg in path {
        match seg {
            PathSeg::Key(k) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(k);
            }
            PathSeg::Index(i) => {
                out.push('[');
                out.push_str(&i.to_string());
                out.push(']');
            }
        }
    }
    if out.is_empty() {
        out.push('$');
    }
    out
}

/// Parses a path rendered by [`path_string`].
pub(crate) fn parse_path(path: &str) -> Vec<PathSeg> {
    let mut segs = Vec::new();
    for part in path.split('.') {
        let (key, mut rest) = match part.find('[') {
            Some(i) => (&part[..i], &part[i..]),
            None => (part, ""),
        };
        if !key.is_empty() {
            segs.push(PathSeg::Key(key.to_string()));
        }
        while let Some(close) = rest.find(']') {
            if let Ok(i) = rest[1..close].parse() {
                segs.push(PathSeg::Index(i));
            }
            rest = &rest[close + 1..];
        }
    }
    segs
}

/// Writes `value` at `path` inside `root`, creating objects and padding
/// arrays with nulls on the way.
pub(crate) fn set_at_path(root: &mut Value, path: &[PathSeg], value: Value) {
    let Some((first, rest)) = path.split_first() else {
        *root = value;
        return;
    };
    let slot = match first {
        PathSeg::Key(k) => {
            if !root.is_object() {
                *root = Value::Object(Default::default());
            }
            let Value::Object(map) = root else { return };
            map.entry(k.clone()).or_insert(Value::Null)
        }
        PathSeg::Index(i) => {
            if !root.is_array() {
                *root = Value::Array(Vec::new());
            }
            let Value::Array(items) = root else { return };
            if items.len() <= *i {
                items.resize(*i + 1, Value::Null);
            }
            &mut items[*i]
        }
    };
    set_at_path(slot, rest, value);
}

/// Removes every `$NodeId` key in place.
pub(crate) fn strip_node_ids(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.remove(NODE_ID_KEY);
            map.values_mut().for_each(strip_node_ids);
        }
        Value::Array(items) => items.iter_mut().for_each(strip_node_ids),
        _ => {}
    }
}
