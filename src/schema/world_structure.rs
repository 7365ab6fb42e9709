use super::RangeDouble;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

/// One biome's slot in a `NoiseRange` world structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BiomeRangeAsset {
    #[serde(rename = "Biome")]
    pub biome: String,
    #[serde(flatten)]
    pub range: RangeDouble,
}

/// Named base height, e.g. sea level.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct ContentField {
    #[serde(rename = "Type", default = "content_field_type")]
    pub field_type: String,
    pub name: String,
    #[serde(rename = "Y")]
    pub y: f64,
}

fn content_field_type() -> String {
    "BaseHeight".to_string()
}

/// World structure (`HytaleGenerator/WorldStructures/*.json`).
///
/// `Density` stays raw JSON; it is a density asset tree handled by the
/// converter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct WorldStructureAsset {
    #[serde(rename = "Type")]
    pub asset_type: String,
    #[serde(default)]
    pub default_biome: String,
    #[serde(default)]
    pub default_transition_distance: f64,
    #[serde(default)]
    pub max_biome_edge_distance: f64,
    #[serde(default)]
    pub biomes: Vec<BiomeRangeAsset>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub density: Value,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content_fields: Vec<ContentField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framework: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spawn_positions: Option<Value>,
}

impl WorldStructureAsset {
    /// Single-biome `NoiseRange` world used when an import has no world
    /// structure of its own.
    pub fn single_biome(biome_id: &str) -> Self {
        WorldStructureAsset {
            asset_type: "NoiseRange".to_string(),
            default_biome: biome_id.to_string(),
            default_transition_distance: 24.0,
            max_biome_edge_distance: 48.0,
            biomes: vec![BiomeRangeAsset {
                biome: biome_id.to_string(),
                range: RangeDouble { min: -1.0, max: 1.0 },
            }],
            density: json!({
                "Type": "SimplexNoise2D",
                "Frequency": 0.001,
                "Amplitude": 1.0,
                "Seed": "world_biome",
                "Octaves": 3,
                "Lacunarity": 2.0,
                "Gain": 0.5
            }),
            content_fields: vec![
                ContentField { field_type: content_field_type(), name: "Base".into(), y: 100.0 },
                ContentField { field_type: content_field_type(), name: "Water".into(), y: 100.0 },
                ContentField { field_type: content_field_type(), name: "Bedrock".into(), y: 0.0 },
            ],
            framework: None,
            spawn_positions: None,
        }
    }

    /// Content field heights by name, for evaluation.
    pub fn content_field_values(&self) -> BTreeMap<String, f64> {
        self.content_fields.iter().map(|f| (f.name.clone(), f.y)).collect()
    }
}
