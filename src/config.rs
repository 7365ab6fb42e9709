//! Preview configuration and evaluation options.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::ProjectError;

/// Options threaded into every evaluation call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EvalOptions {
    /// World content-field heights by name, e.g. `Base → 100`.
    pub content_fields: BTreeMap<String, f64>,
}

/// Preview grid and analysis settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PreviewConfig {
    pub resolution: u32,
    pub range_min: f64,
    pub range_max: f64,
    pub y_level: f64,
    pub contour_interval: f64,
    pub histogram_bins: usize,
    pub content_fields: BTreeMap<String, f64>,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        PreviewConfig {
            resolution: 128,
            range_min: -64.0,
            range_max: 64.0,
            y_level: 64.0,
            contour_interval: 0.1,
            histogram_bins: 32,
            content_fields: BTreeMap::new(),
        }
    }
}

impl PreviewConfig {
    /// Load from a JSON file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ProjectError> {
        let text = std::fs::read_to_string(path).map_err(ProjectError::io(path))?;
        serde_json::from_str(&text).map_err(|source| ProjectError::InvalidJson {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn eval_options(&self) -> EvalOptions {
        EvalOptions {
            content_fields: self.content_fields.clone(),
        }
    }
}
