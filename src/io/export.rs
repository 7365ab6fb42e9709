// io/export.rs — Internal project → native HytaleGenerator tree

use super::{
    atomic, file_name, list_json_files, read_json, read_text, tag_diagnostics, FileDiagnostic,
    BIOMES_DIR, GENERATOR_DIR, MAIN_WORLD_FILE, MANIFEST_FILE, SETTINGS_DIR, SETTINGS_FILE,
    WORLD_STRUCTURES_DIR,
};
use crate::convert::{internal_to_native_biome, internal_to_native_world_structure, SharingMode};
use crate::error::ProjectError;
use crate::schema::Manifest;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Default)]
pub struct ExportReport {
    pub written: Vec<PathBuf>,
    pub removed: Vec<PathBuf>,
    pub diagnostics: Vec<FileDiagnostic>,
}

fn require(path: PathBuf) -> Result<PathBuf, ProjectError> {
    if path.exists() {
        Ok(path)
    } else {
        Err(ProjectError::MissingFile(path))
    }
}

/// Native file name for an internal biome: its `Name` verbatim, else the
/// source file name.
fn biome_output_name(biome: &Value, source: &Path) -> String {
    match biome.get("Name").and_then(Value::as_str) {
        Some(name) if !name.is_empty() => format!("{name}.json"),
        _ => file_name(source),
    }
}

/// Delete files in `dir` whose name equals `name` ignoring case but differs
/// in case.
fn remove_case_variants(dir: &Path, name: &str) -> Result<Vec<PathBuf>, ProjectError> {
    let mut removed = Vec::new();
    if !dir.is_dir() {
        return Ok(removed);
    }
    let wanted = name.to_lowercase();
    for entry in fs::read_dir(dir).map_err(ProjectError::io(dir))? {
        let path = entry.map_err(ProjectError::io(dir))?.path();
        let existing = file_name(&path);
        if existing != name && existing.to_lowercase() == wanted {
            fs::remove_file(&path).map_err(ProjectError::io(&path))?;
            info!(file = %existing, "removed stale case variant");
            removed.push(path);
        }
    }
    Ok(removed)
}

/// Export the internal project at `project` into `output/HytaleGenerator`.
///
/// Everything is read and validated before the first file is written.
pub fn export_project(project: &Path, output: &Path) -> Result<ExportReport, ProjectError> {
    if !project.is_dir() {
        return Err(ProjectError::InputNotFound(project.to_path_buf()));
    }
    let manifest_path = project.join(MANIFEST_FILE);
    if !manifest_path.exists() {
        return Err(ProjectError::MissingManifest(manifest_path));
    }
    let manifest: Manifest =
        serde_json::from_value(read_json(&manifest_path)?).map_err(|source| ProjectError::InvalidJson {
            path: manifest_path.clone(),
            source,
        })?;

    let generator = project.join(GENERATOR_DIR);
    let settings_path = require(generator.join(SETTINGS_DIR).join(SETTINGS_FILE))?;
    let settings = read_text(&settings_path)?;
    let world_path = require(generator.join(WORLD_STRUCTURES_DIR).join(MAIN_WORLD_FILE))?;
    let world = read_json(&world_path)?;
    let biomes_dir = require(generator.join(BIOMES_DIR))?;
    let biomes = list_json_files(&biomes_dir)?
        .into_iter()
        .map(|path| read_json(&path).map(|data| (path, data)))
        .collect::<Result<Vec<_>, _>>()?;

    let out = output.join(GENERATOR_DIR);
    let mut report = ExportReport::default();

    // Settings carry no density nodes.
    let settings_out = out.join(SETTINGS_DIR).join(SETTINGS_FILE);
    atomic::write_text(&settings_out, &settings)?;
    report.written.push(settings_out);

    let converted = internal_to_native_world_structure(&world);
    report.diagnostics.extend(tag_diagnostics(&world_path, converted.diagnostics));
    let world_file = format!("{}.json", manifest.world_structure_name());
    let world_out = out.join(WORLD_STRUCTURES_DIR).join(&world_file);
    atomic::write_json(&world_out, &converted.value)?;
    info!(file = %world_file, "wrote world structure");
    report.written.push(world_out);

    let biomes_out = out.join(BIOMES_DIR);
    for (path, data) in &biomes {
        let converted = internal_to_native_biome(data, SharingMode::Reference);
        report.diagnostics.extend(tag_diagnostics(path, converted.diagnostics));
        let name = biome_output_name(data, path);
        report.removed.extend(remove_case_variants(&biomes_out, &name)?);
        let target = biomes_out.join(&name);
        atomic::write_json(&target, &converted.value)?;
        info!(file = %name, "wrote biome");
        report.written.push(target);
    }

    info!(
        output = %out.display(),
        files = report.written.len(),
        diagnostics = report.diagnostics.len(),
        "export complete"
    );
    Ok(report)
}
