// io/import.rs — Native HytaleGenerator tree → internal project

use super::naming::{biome_file_name, to_biome_id, to_display_name};
use super::{
    atomic, file_name, file_stem, list_json_files, parse_json, read_json, read_text,
    tag_diagnostics, FileDiagnostic, BIOMES_DIR, GENERATOR_DIR, MAIN_WORLD_FILE, MANIFEST_FILE,
    SETTINGS_DIR, SETTINGS_FILE, WORLD_STRUCTURES_DIR,
};
use crate::convert::{
    is_native_format, native_to_internal_biome, native_to_internal_world_structure,
};
use crate::error::ProjectError;
use crate::schema::{Manifest, SettingsAsset, WorldStructureAsset};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::info;

/// Manifest overrides for an import.
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Default)]
pub struct ImportReport {
    pub written: Vec<PathBuf>,
    pub diagnostics: Vec<FileDiagnostic>,
}

struct BiomeInput {
    name: String,
    source: PathBuf,
    data: Value,
}

/// The directory holding `Settings/`, `WorldStructures/` and `Biomes/`.
fn resolve_generator_root(input: &Path) -> Result<PathBuf, ProjectError> {
    let nested = input.join(GENERATOR_DIR);
    if nested.exists() {
        return Ok(nested);
    }
    if input.file_name().is_some_and(|n| n == GENERATOR_DIR) || input.join(BIOMES_DIR).exists() {
        return Ok(input.to_path_buf());
    }
    Err(ProjectError::NoHytaleGenerator(input.to_path_buf()))
}

/// Import `input` (a native biome `.json` or a directory) into a new
/// internal project at `output`.
///
/// Everything is read and validated before the first file is written.
pub fn import_project(
    input: &Path,
    output: &Path,
    options: &ImportOptions,
) -> Result<ImportReport, ProjectError> {
    if !input.exists() {
        return Err(ProjectError::InputNotFound(input.to_path_buf()));
    }
    let single_file = input.is_file()
        && input
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let mut settings_text = None;
    let mut world_structure = None;
    let mut biomes = Vec::new();

    if single_file {
        info!(file = %input.display(), "single-file import");
        biomes.push(BiomeInput {
            name: file_stem(input),
            source: input.to_path_buf(),
            data: read_json(input)?,
        });
    } else {
        let root = resolve_generator_root(input)?;

        let settings_path = root.join(SETTINGS_DIR).join(SETTINGS_FILE);
        if settings_path.exists() {
            let text = read_text(&settings_path)?;
            parse_json(&settings_path, &text)?;
            settings_text = Some(text);
        }

        let worlds_dir = root.join(WORLD_STRUCTURES_DIR);
        if worlds_dir.is_dir() {
            if let Some(first) = list_json_files(&worlds_dir)?.into_iter().next() {
                info!(file = %file_name(&first), "found world structure");
                world_structure = Some((read_json(&first)?, first));
            }
        }

        let biomes_dir = root.join(BIOMES_DIR);
        if biomes_dir.is_dir() {
            for path in list_json_files(&biomes_dir)? {
                biomes.push(BiomeInput {
                    name: file_stem(&path),
                    data: read_json(&path)?,
                    source: path,
                });
            }
            info!(count = biomes.len(), "found biome files");
        }
    }

    if biomes.is_empty() {
        return Err(ProjectError::NoBiomes(input.to_path_buf()));
    }

    let slug = file_name(output);
    let generator = output.join(GENERATOR_DIR);
    let mut report = ImportReport::default();

    // Settings
    let settings_path = generator.join(SETTINGS_DIR).join(SETTINGS_FILE);
    match &settings_text {
        Some(text) => atomic::write_text(&settings_path, text)?,
        None => atomic::write_json(&settings_path, &SettingsAsset::default())?,
    }
    info!(pass_through = settings_text.is_some(), "wrote Settings.json");
    report.written.push(settings_path);

    // World structure
    let world_path = generator.join(WORLD_STRUCTURES_DIR).join(MAIN_WORLD_FILE);
    match &world_structure {
        Some((value, source)) => {
            let converted = native_to_internal_world_structure(value);
            report.diagnostics.extend(tag_diagnostics(source, converted.diagnostics));
            atomic::write_json(&world_path, &converted.value)?;
            info!("wrote MainWorld.json (density reverse-translated)");
        }
        None => {
            let biome_id = biomes[0]
                .data
                .get("Name")
                .and_then(Value::as_str)
                .map_or_else(|| to_biome_id(&slug), str::to_string);
            atomic::write_json(&world_path, &WorldStructureAsset::single_biome(&biome_id))?;
            info!(%biome_id, "wrote default MainWorld.json");
        }
    }
    report.written.push(world_path);

    // Biomes
    let biomes_out = generator.join(BIOMES_DIR);
    for biome in &biomes {
        let data = if is_native_format(&biome.data) {
            let converted = native_to_internal_biome(&biome.data);
            report.diagnostics.extend(tag_diagnostics(&biome.source, converted.diagnostics));
            info!(name = %biome.name, "converted from native format");
            converted.value
        } else {
            info!(name = %biome.name, "already internal, passing through");
            biome.data.clone()
        };
        let path = biomes_out.join(biome_file_name(&biome.name));
        atomic::write_json(&path, &data)?;
        report.written.push(path);
    }

    // Manifest
    let manifest = Manifest::imported(
        options.name.clone().unwrap_or_else(|| to_display_name(&slug)),
        options.description.clone(),
        options.category.clone(),
    );
    let manifest_path = output.join(MANIFEST_FILE);
    atomic::write_json(&manifest_path, &manifest)?;
    report.written.push(manifest_path);

    info!(
        output = %output.display(),
        files = report.written.len(),
        diagnostics = report.diagnostics.len(),
        "import complete"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;

    #[test]
    fn resolves_generator_root_variants() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("pack");
        fs::create_dir_all(nested.join("HytaleGenerator/Biomes")).unwrap();
        assert_eq!(resolve_generator_root(&nested).unwrap(), nested.join("HytaleGenerator"));
        assert_eq!(
            resolve_generator_root(&nested.join("HytaleGenerator")).unwrap(),
            nested.join("HytaleGenerator")
        );

        let bare = dir.path().join("bare");
        fs::create_dir_all(bare.join("Biomes")).unwrap();
        assert_eq!(resolve_generator_root(&bare).unwrap(), bare);

        let empty = dir.path().join("empty");
        fs::create_dir_all(&empty).unwrap();
        assert!(matches!(resolve_generator_root(&empty), Err(ProjectError::NoHytaleGenerator(_))));
    }

    #[test]
    fn missing_input_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = import_project(&dir.path().join("nope"), &dir.path().join("out"), &ImportOptions::default());
        assert!(matches!(err, Err(ProjectError::InputNotFound(_))));
    }

    #[test]
    fn no_biomes_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in");
        fs::create_dir_all(input.join("HytaleGenerator/Biomes")).unwrap();
        let out = dir.path().join("out");
        let err = import_project(&input, &out, &ImportOptions::default());
        assert!(matches!(err, Err(ProjectError::NoBiomes(_))));
        assert!(!out.exists());
    }

    #[test]
    fn single_file_gets_default_world_and_settings() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("tundra.json");
        fs::write(&input, json!({ "Type": "Biome", "Name": "Tundra_Cold" }).to_string()).unwrap();
        let out = dir.path().join("frozen-north");

        import_project(&input, &out, &ImportOptions::default()).unwrap();

        let world: Value = serde_json::from_str(
            &fs::read_to_string(out.join("HytaleGenerator/WorldStructures/MainWorld.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(world["DefaultBiome"], "Tundra_Cold");
        let settings: SettingsAsset = serde_json::from_str(
            &fs::read_to_string(out.join("HytaleGenerator/Settings/Settings.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(settings, SettingsAsset::default());
        let manifest: Manifest =
            serde_json::from_str(&fs::read_to_string(out.join("manifest.json")).unwrap()).unwrap();
        assert_eq!(manifest.name, "Frozen North");
        assert!(out.join("HytaleGenerator/Biomes/TundraBiome.json").exists());
    }
}
