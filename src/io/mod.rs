//! Project import/export at directory level.
//!
//! A project is `manifest.json` plus `HytaleGenerator/{Settings,
//! WorldStructures, Biomes}` holding internal-format assets. The native
//! side uses the same `HytaleGenerator/` subtree.

pub mod atomic;
pub mod export;
pub mod import;
pub mod naming;

pub use export::{export_project, ExportReport};
pub use import::{import_project, ImportOptions, ImportReport};

use crate::convert::Diagnostic;
use crate::error::ProjectError;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

pub const GENERATOR_DIR: &str = "HytaleGenerator";
pub const SETTINGS_DIR: &str = "Settings";
pub const SETTINGS_FILE: &str = "Settings.json";
pub const WORLD_STRUCTURES_DIR: &str = "WorldStructures";
pub const BIOMES_DIR: &str = "Biomes";
pub const MANIFEST_FILE: &str = "manifest.json";
/// World structure file inside an internal project.
pub const MAIN_WORLD_FILE: &str = "MainWorld.json";

/// A conversion diagnostic and the file it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiagnostic {
    pub file: PathBuf,
    pub diagnostic: Diagnostic,
}

pub(crate) fn read_text(path: &Path) -> Result<String, ProjectError> {
    fs::read_to_string(path).map_err(ProjectError::io(path))
}

pub(crate) fn parse_json(path: &Path, text: &str) -> Result<Value, ProjectError> {
    serde_json::from_str(text).map_err(|source| ProjectError::InvalidJson {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn read_json(path: &Path) -> Result<Value, ProjectError> {
    parse_json(path, &read_text(path)?)
}

/// `*.json` files directly inside `dir`, sorted by name.
pub(crate) fn list_json_files(dir: &Path) -> Result<Vec<PathBuf>, ProjectError> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(ProjectError::io(dir))? {
        let path = entry.map_err(ProjectError::io(dir))?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

pub(crate) fn file_stem(path: &Path) -> String {
    path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default()
}

pub(crate) fn file_name(path: &Path) -> String {
    path.file_name().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default()
}

pub(crate) fn tag_diagnostics(file: &Path, diagnostics: Vec<Diagnostic>) -> impl Iterator<Item = FileDiagnostic> + '_ {
    diagnostics.into_iter().map(move |diagnostic| FileDiagnostic {
        file: file.to_path_buf(),
        diagnostic,
    })
}
