use serde::{Deserialize, Serialize};

/// Generator-wide settings (`HytaleGenerator/Settings/Settings.json`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase", default)]
pub struct SettingsAsset {
    pub custom_concurrency: i32,
    pub buffer_capacity_factor: f64,
    pub target_view_distance: f64,
    pub target_player_count: f64,
    pub stats_checkpoints: Vec<i64>,
}

impl Default for SettingsAsset {
    fn default() -> Self {
        SettingsAsset {
            custom_concurrency: -1,
            buffer_capacity_factor: 0.4,
            target_view_distance: 1024.0,
            target_player_count: 8.0,
            stats_checkpoints: Vec::new(),
        }
    }
}
