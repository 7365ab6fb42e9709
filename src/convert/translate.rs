// convert/translate.rs — Density type renames and field transforms
//
// Only density assets differ between the two formats by name. Other
// categories reuse names like `Clamp` or `Max` with their own meaning and
// pass through untouched.

use crate::schema::AssetCategory;
use serde_json::{json, Map, Value};
use tracing::debug;

/// `(internal, native)` density type names.
const DENSITY_RENAMES: &[(&str, &str)] = &[
    ("Product", "Multiplier"),
    ("Negate", "Inverter"),
    ("CurveFunction", "CurveMapper"),
    ("CacheOnce", "Cache"),
    ("ImportedValue", "Imported"),
    ("Blend", "Mix"),
    ("MinFunction", "Min"),
    ("MaxFunction", "Max"),
    ("VoronoiNoise2D", "CellNoise2D"),
    ("VoronoiNoise3D", "CellNoise3D"),
    ("SquareRoot", "Sqrt"),
    ("DomainWarp2D", "FastGradientWarp"),
    ("ScaledPosition", "Scale"),
    ("TranslatedPosition", "Slider"),
    ("RotatedPosition", "Rotator"),
];

pub fn native_type_name(category: AssetCategory, internal: &str) -> &str {
    if category != AssetCategory::Density {
        return internal;
    }
    DENSITY_RENAMES
        .iter()
        .find(|(i, _)| *i == internal)
        .map_or(internal, |(_, n)| *n)
}

pub fn internal_type_name(category: AssetCategory, native: &str) -> &str {
    if category != AssetCategory::Density {
        return native;
    }
    DENSITY_RENAMES
        .iter()
        .find(|(_, n)| *n == native)
        .map_or(native, |(i, _)| *i)
}

/// `1/v` for numbers, with 0 kept as 0.
fn reciprocal(value: &Value) -> Value {
    match value.as_f64() {
        Some(v) if v == 0.0 => json!(0.0),
        Some(v) => json!(1.0 / v),
        None => value.clone(),
    }
}

fn rename(fields: &mut Map<String, Value>, from: &str, to: &str) {
    if let Some(v) = fields.remove(from) {
        fields.insert(to.to_string(), v);
    }
}

/// Noise frequency becomes one reciprocal scale per listed axis key.
fn frequency_to_scales(fields: &mut Map<String, Value>, keys: &[&str]) {
    if let Some(freq) = fields.remove("Frequency") {
        let scale = reciprocal(&freq);
        for key in keys {
            fields.insert((*key).to_string(), scale.clone());
        }
    }
}

/// Inverse of [`frequency_to_scales`]: the first key present wins, the rest
/// are dropped.
fn scales_to_frequency(fields: &mut Map<String, Value>, keys: &[&str]) {
    let mut frequency = None;
    for key in keys {
        if let Some(scale) = fields.remove(*key) {
            frequency.get_or_insert_with(|| reciprocal(&scale));
        }
    }
    if let Some(f) = frequency {
        fields.insert("Frequency".to_string(), f);
    }
}

fn drop_unit_amplitude(fields: &mut Map<String, Value>, native_type: &str) {
    match fields.get("Amplitude").and_then(Value::as_f64) {
        Some(a) if a == 1.0 => {
            fields.remove("Amplitude");
        }
        Some(a) => debug!(native_type, amplitude = a, "keeping non-unit noise amplitude"),
        None => {}
    }
}

/// Internal → native plain fields of one node.
pub fn fields_to_native(
    category: AssetCategory,
    internal_type: &str,
    mut fields: Map<String, Value>,
) -> Map<String, Value> {
    if category != AssetCategory::Density {
        return fields;
    }
    match internal_type {
        "SimplexNoise2D" => {
            frequency_to_scales(&mut fields, &["Scale"]);
            rename(&mut fields, "Gain", "Persistence");
            drop_unit_amplitude(&mut fields, internal_type);
        }
        "SimplexNoise3D" => {
            frequency_to_scales(&mut fields, &["ScaleXZ", "ScaleY"]);
            rename(&mut fields, "Gain", "Persistence");
            drop_unit_amplitude(&mut fields, internal_type);
        }
        "VoronoiNoise2D" => frequency_to_scales(&mut fields, &["ScaleX", "ScaleZ"]),
        "VoronoiNoise3D" => frequency_to_scales(&mut fields, &["ScaleX", "ScaleY", "ScaleZ"]),
        "Clamp" | "SmoothClamp" => {
            rename(&mut fields, "Min", "WallB");
            rename(&mut fields, "Max", "WallA");
        }
        "RotatedPosition" => rename(&mut fields, "AngleDegrees", "SpinAngle"),
        "DomainWarp2D" | "DomainWarp3D" => rename(&mut fields, "Amplitude", "WarpFactor"),
        _ => {}
    }
    fields
}

/// Native → internal plain fields of one node, keyed by the native type.
pub fn fields_to_internal(
    category: AssetCategory,
    native_type: &str,
    mut fields: Map<String, Value>,
) -> Map<String, Value> {
    if category != AssetCategory::Density {
        return fields;
    }
    match native_type {
        "SimplexNoise2D" => {
            scales_to_frequency(&mut fields, &["Scale"]);
            rename(&mut fields, "Persistence", "Gain");
        }
        "SimplexNoise3D" => {
            scales_to_frequency(&mut fields, &["ScaleXZ", "ScaleY"]);
            rename(&mut fields, "Persistence", "Gain");
        }
        "CellNoise2D" => scales_to_frequency(&mut fields, &["ScaleX", "ScaleZ"]),
        "CellNoise3D" => scales_to_frequency(&mut fields, &["ScaleX", "ScaleY", "ScaleZ"]),
        "Clamp" | "SmoothClamp" => {
            rename(&mut fields, "WallB", "Min");
            rename(&mut fields, "WallA", "Max");
        }
        "Rotator" => rename(&mut fields, "SpinAngle", "AngleDegrees"),
        "FastGradientWarp" | "DomainWarp3D" => rename(&mut fields, "WarpFactor", "Amplitude"),
        _ => {}
    }
    fields
}
