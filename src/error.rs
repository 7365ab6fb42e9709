//! Library error types.

use std::path::PathBuf;

/// Failure to build an evaluation graph.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// The graph JSON does not have the `{ nodes, edges }` shape.
    #[error("invalid graph JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// No node qualifies as the evaluation root.
    #[error("graph has no density node to evaluate")]
    NoRoot,
}

/// Structural failure at the project import/export boundary.
///
/// These abort the operation before anything is written. Referential
/// problems inside assets are reported as `convert::Diagnostic` instead.
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("input path not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("could not find a HytaleGenerator/ subtree in {}", .0.display())]
    NoHytaleGenerator(PathBuf),

    #[error("no biome files found in {}", .0.display())]
    NoBiomes(PathBuf),

    #[error("manifest not found: {}", .0.display())]
    MissingManifest(PathBuf),

    #[error("required file not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("invalid JSON in {}: {source}", path.display())]
    InvalidJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize JSON: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl ProjectError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> ProjectError {
        let path = path.into();
        move |source| ProjectError::Io { path, source }
    }
}
