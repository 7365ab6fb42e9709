//! Conversion between internal nested assets and native `$NodeId` JSON.
//!
//! Covers sharing preservation, identity of look-alike nodes, stability of
//! internal → native → internal, and that both forms preview identically.

use serde_json::{json, Value};
use terranova_core::commands::preview::load_graph;
use terranova_core::convert::{
    graph_to_native, internal_to_native_biome, is_native_format, native_to_graph,
    native_to_internal, native_to_internal_biome, transform_node, DiagnosticKind, SharingMode,
    TransformContext,
};
use terranova_core::eval::{evaluate_grid, GridResult};
use terranova_core::schema::AssetCategory;
use terranova_core::EvalOptions;

// ── Helpers ────────────────────────────────────────────────────────

/// Every `$NodeId` string in the document, in document order.
fn node_ids(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            if let Some(id) = map.get("$NodeId").and_then(Value::as_str) {
                out.push(id.to_string());
            }
            map.values().for_each(|v| node_ids(v, out));
        }
        Value::Array(items) => items.iter().for_each(|v| node_ids(v, out)),
        _ => {}
    }
}

fn preview(document: &Value) -> GridResult {
    let graph = load_graph(document).unwrap();
    evaluate_grid(&graph, 16, -64.0, 64.0, 40.0, &EvalOptions::default())
}

fn internal_terrain() -> Value {
    json!({
        "Type": "Clamp",
        "Min": -1.0,
        "Max": 1.0,
        "Input": {
            "Type": "Sum",
            "InputA": {
                "Type": "SimplexNoise2D",
                "Frequency": 0.25,
                "Octaves": 3,
                "Gain": 0.5,
                "Seed": 11
            },
            "InputB": {
                "Type": "CurveFunction",
                "Input": { "Type": "Negate", "Input": { "Type": "CoordinateY" } },
                "Curve": { "Type": "Manual", "Points": [[-128, -1], [0, 0], [128, 1]] }
            }
        }
    })
}

fn shared_native() -> Value {
    json!({
        "Type": "Max",
        "$NodeId": "MaxDensityNode-1",
        "Inputs": [
            {
                "Type": "SimplexNoise2D",
                "$NodeId": "SimplexNoise2DDensityNode-2",
                "Scale": 32.0,
                "Seed": 3
            },
            {
                "Type": "Inverter",
                "$NodeId": "InverterDensityNode-3",
                "Input": { "$NodeId": "SimplexNoise2DDensityNode-2" }
            }
        ]
    })
}

// ── 1. Sharing ─────────────────────────────────────────────────────

#[test]
fn shared_reference_survives_native_round_trip() {
    let read = native_to_graph(&shared_native());
    assert!(read.is_clean());
    let (graph, root) = read.value;
    let root = root.unwrap();
    assert_eq!(graph.len(), 3);

    let out = graph_to_native(&graph, root, SharingMode::Reference);
    assert!(out.is_clean());
    let v = out.value;

    assert_eq!(v["Type"], "Max");
    assert_eq!(v["Inputs"][0]["Type"], "SimplexNoise2D");
    assert!((v["Inputs"][0]["Scale"].as_f64().unwrap() - 32.0).abs() < 1e-9);
    let shared_id = v["Inputs"][0]["$NodeId"].as_str().unwrap();
    assert_eq!(v["Inputs"][1]["Type"], "Inverter");
    assert_eq!(v["Inputs"][1]["Input"], json!({ "$NodeId": shared_id }));
}

#[test]
fn duplicate_mode_expands_shared_node() {
    let (graph, root) = native_to_graph(&shared_native()).value;
    let v = graph_to_native(&graph, root.unwrap(), SharingMode::Duplicate).value;

    assert_eq!(v["Inputs"][1]["Input"]["Type"], "SimplexNoise2D");
    let mut ids = Vec::new();
    node_ids(&v, &mut ids);
    assert_eq!(ids.len(), 4);
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 4, "every emitted node carries a fresh id");
}

#[test]
fn look_alike_nodes_stay_distinct() {
    let native = json!({
        "Type": "Sum",
        "$NodeId": "SumDensityNode-1",
        "InputA": { "Type": "CoordinateX", "$NodeId": "CoordinateXDensityNode-2" },
        "InputB": { "Type": "CoordinateX", "$NodeId": "CoordinateXDensityNode-3" }
    });
    let (graph, root) = native_to_graph(&native).value;
    assert_eq!(graph.len(), 3);

    let v = graph_to_native(&graph, root.unwrap(), SharingMode::Reference).value;
    assert_eq!(v["InputA"]["Type"], "CoordinateX");
    assert_eq!(v["InputB"]["Type"], "CoordinateX");
    assert_ne!(v["InputA"]["$NodeId"], v["InputB"]["$NodeId"]);
}

#[test]
fn shared_node_is_inlined_in_internal_form() {
    let out = native_to_internal(&shared_native());
    assert!(out.is_clean());
    let v = out.value;
    assert!(!is_native_format(&v));
    assert_eq!(v["Type"], "MaxFunction");
    assert_eq!(v["Inputs"][1]["Type"], "Negate");
    assert_eq!(v["Inputs"][0], v["Inputs"][1]["Input"]);
    assert!((v["Inputs"][0]["Frequency"].as_f64().unwrap() - 1.0 / 32.0).abs() < 1e-12);
}

// ── 2. Stability ───────────────────────────────────────────────────

#[test]
fn internal_native_internal_is_stable() {
    let internal = internal_terrain();
    let native = transform_node(&internal, TransformContext::new("Density", AssetCategory::Density));
    assert!(native.is_clean());
    assert!(is_native_format(&native.value));
    assert_eq!(native.value["WallB"], -1.0);
    assert_eq!(native.value["Input"]["InputB"]["Type"], "CurveMapper");

    let back = native_to_internal(&native.value);
    assert!(back.is_clean());
    assert_eq!(back.value, internal);
}

#[test]
fn biome_round_trip_keeps_wrapper_fields() {
    let biome = json!({
        "Name": "Tundra",
        "Terrain": {
            "Type": "DAOTerrain",
            "Density": { "Type": "Product", "Inputs": [{ "Type": "CoordinateY" }, { "Type": "Constant", "Value": 0.5 }] }
        },
        "MaterialProvider": { "Type": "Constant", "Material": "Rock_Stone" },
        "Props": [{ "Runtime": 0, "Positions": { "Type": "Mesh2D" }, "Assignments": { "Type": "Constant" } }]
    });

    let native = internal_to_native_biome(&biome, SharingMode::Reference);
    assert!(native.is_clean());
    assert_eq!(native.value["Terrain"]["Density"]["Type"], "Multiplier");

    let back = native_to_internal_biome(&native.value);
    assert!(back.is_clean());
    assert_eq!(back.value, biome);
}

// ── 3. Preview parity ──────────────────────────────────────────────

#[test]
fn native_and_internal_forms_preview_identically() {
    let internal = internal_terrain();
    let native = transform_node(&internal, TransformContext::new("Density", AssetCategory::Density)).value;

    let a = preview(&internal);
    let b = preview(&native);
    let bits = |r: &GridResult| r.values.iter().map(|v| v.to_bits()).collect::<Vec<_>>();
    assert_eq!(bits(&a), bits(&b));
    assert!(a.values.iter().all(|v| (-1.0..=1.0).contains(v)));
}

// ── 4. Diagnostics ─────────────────────────────────────────────────

#[test]
fn broken_reference_is_reported_and_dropped() {
    let native = json!({
        "Type": "Inverter",
        "$NodeId": "InverterDensityNode-1",
        "Input": { "$NodeId": "ConstantDensityNode-99" }
    });
    let out = native_to_internal(&native);
    assert_eq!(out.diagnostics.len(), 1);
    assert_eq!(out.diagnostics[0].kind, DiagnosticKind::BrokenReference);
    assert_eq!(out.diagnostics[0].path, "Input");
    assert_eq!(out.value, json!({ "Type": "Negate" }));
}

#[test]
fn self_reference_is_a_cycle() {
    let native = json!({
        "Type": "Inverter",
        "$NodeId": "InverterDensityNode-1",
        "Input": { "$NodeId": "InverterDensityNode-1" }
    });
    let out = native_to_graph(&native);
    assert!(out.diagnostics.iter().any(|d| d.kind == DiagnosticKind::Cycle));
    let (graph, root) = out.value;
    assert_eq!(graph.len(), 1);
    assert!(root.is_some());
}
