//! Core of the TerraNova world-generation editor.
//!
//! - [`eval`]: density graph evaluation over a 2D preview grid
//! - [`analysis`]: contours, cross sections, statistics and histograms
//! - [`convert`]: internal ↔ Hytale native asset conversion with `$NodeId` sharing
//! - [`io`]: project import/export at directory level
//! - [`commands`]: preview entry points used by the host and the CLI

pub mod analysis;
pub mod commands;
pub mod config;
pub mod convert;
pub mod error;
pub mod eval;
pub mod io;
pub mod schema;

pub use config::{EvalOptions, PreviewConfig};
pub use error::{GraphError, ProjectError};
