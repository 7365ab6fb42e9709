use crate::error::ProjectError;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Write `contents` via a sibling `.tmp` file and a rename, creating parent
/// directories as needed.
pub fn write_text(path: &Path, contents: &str) -> Result<(), ProjectError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(ProjectError::io(parent))?;
    }
    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, contents).map_err(ProjectError::io(&temp_path))?;
    fs::rename(&temp_path, path).map_err(ProjectError::io(path))?;
    debug!(path = %path.display(), bytes = contents.len(), "wrote file");
    Ok(())
}

/// Pretty-printed JSON, written atomically.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), ProjectError> {
    let json = serde_json::to_string_pretty(value)?;
    write_text(path, &json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn creates_parents_and_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a/b/out.json");
        write_json(&path, &json!({ "k": 1 })).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "{\n  \"k\": 1\n}");
        assert!(!dir.path().join("a/b/out.tmp").exists());
    }

    #[test]
    fn overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.json");
        write_text(&path, "old").unwrap();
        write_text(&path, "new").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
    }
}
