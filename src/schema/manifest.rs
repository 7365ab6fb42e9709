use serde::{Deserialize, Serialize};

pub const DEFAULT_DESCRIPTION: &str = "Imported from Hytale native format.";
pub const DEFAULT_VERSION: &str = "0.1.0";
pub const DEFAULT_SERVER_VERSION: &str = "2026.02.05";
pub const DEFAULT_CATEGORY: &str = "Fantasy";

/// Project manifest (`manifest.json`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "default_server_version")]
    pub server_version: String,
    #[serde(default = "default_category")]
    pub category: String,
}

fn default_version() -> String {
    DEFAULT_VERSION.to_string()
}

fn default_server_version() -> String {
    DEFAULT_SERVER_VERSION.to_string()
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

impl Manifest {
    /// Manifest for a freshly imported project.
    pub fn imported(name: String, description: Option<String>, category: Option<String>) -> Self {
        Manifest {
            name,
            description: description.unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
            version: default_version(),
            server_version: default_server_version(),
            category: category.unwrap_or_else(default_category),
        }
    }

    /// World-structure file stem used on export: the name without whitespace.
    pub fn world_structure_name(&self) -> String {
        self.name.chars().filter(|c| !c.is_whitespace()).collect()
    }
}
