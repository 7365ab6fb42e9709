//! terranova - density preview and Hytale asset conversion tool
//!
//! Imports native HytaleGenerator trees into TerraNova projects, exports
//! them back, and evaluates density graphs from the command line.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use terranova_core::commands::preview::{analyze, evaluate_with_options, EvaluateResponse};
use terranova_core::io::{atomic, export_project, import_project, ImportOptions};
use terranova_core::schema::WorldStructureAsset;
use terranova_core::PreviewConfig;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "terranova")]
#[command(about = "TerraNova density preview and Hytale asset conversion")]
#[command(version)]
struct Cli {
    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a native HytaleGenerator tree or biome file as a project
    Import {
        /// Directory containing HytaleGenerator/, or a single biome .json
        input: PathBuf,

        /// Project directory to create
        output: PathBuf,

        /// Manifest display name (default: derived from the output name)
        #[arg(long)]
        name: Option<String>,

        /// Manifest description
        #[arg(long)]
        description: Option<String>,

        /// Manifest category
        #[arg(long)]
        category: Option<String>,
    },

    /// Export a project to native format
    Export {
        /// Project directory (contains manifest.json)
        project: PathBuf,

        /// Output directory; HytaleGenerator/ is created inside it
        output: PathBuf,
    },

    /// Evaluate a density graph over a grid and print the values
    Evaluate {
        #[command(flatten)]
        preview: PreviewArgs,
    },

    /// Print statistics and a histogram of the evaluated grid
    Stats {
        #[command(flatten)]
        preview: PreviewArgs,

        /// Histogram bin count
        #[arg(long)]
        bins: Option<usize>,
    },

    /// Print contour segments of the evaluated grid
    Contours {
        #[command(flatten)]
        preview: PreviewArgs,

        /// Spacing between contour levels
        #[arg(long)]
        interval: Option<f64>,
    },
}

#[derive(Args)]
struct PreviewArgs {
    /// Graph JSON ({ nodes, edges }) or a nested density asset
    graph: PathBuf,

    /// Preview config JSON
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// World structure whose content fields feed BaseHeight nodes
    #[arg(long)]
    world: Option<PathBuf>,

    #[arg(short, long)]
    resolution: Option<u32>,

    #[arg(long, allow_hyphen_values = true)]
    range_min: Option<f64>,

    #[arg(long, allow_hyphen_values = true)]
    range_max: Option<f64>,

    #[arg(short, long, allow_hyphen_values = true)]
    y_level: Option<f64>,

    /// Write JSON here instead of stdout
    #[arg(short, long)]
    out: Option<PathBuf>,
}

impl PreviewArgs {
    fn config(&self) -> Result<PreviewConfig> {
        let mut config = match &self.config {
            Some(path) => PreviewConfig::from_file(path)
                .with_context(|| format!("loading preview config {}", path.display()))?,
            None => PreviewConfig::default(),
        };
        if let Some(path) = &self.world {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading world structure {}", path.display()))?;
            let world: WorldStructureAsset = serde_json::from_str(&text)
                .with_context(|| format!("parsing world structure {}", path.display()))?;
            config.content_fields.extend(world.content_field_values());
        }
        if let Some(r) = self.resolution {
            config.resolution = r;
        }
        if let Some(v) = self.range_min {
            config.range_min = v;
        }
        if let Some(v) = self.range_max {
            config.range_max = v;
        }
        if let Some(v) = self.y_level {
            config.y_level = v;
        }
        Ok(config)
    }

    fn evaluate(&self, config: &PreviewConfig) -> Result<EvaluateResponse> {
        let text = std::fs::read_to_string(&self.graph)
            .with_context(|| format!("reading graph {}", self.graph.display()))?;
        let graph: serde_json::Value = serde_json::from_str(&text)
            .with_context(|| format!("parsing graph {}", self.graph.display()))?;
        let response = evaluate_with_options(
            &graph,
            config.resolution,
            config.range_min,
            config.range_max,
            config.y_level,
            &config.eval_options(),
        )
        .with_context(|| format!("evaluating {}", self.graph.display()))?;
        Ok(response)
    }
}

fn emit<T: Serialize>(value: &T, out: Option<&Path>) -> Result<()> {
    match out {
        Some(path) => atomic::write_json(path, value)
            .with_context(|| format!("writing {}", path.display()))?,
        None => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "terranova=debug,terranova_core=debug"
    } else {
        "terranova=info,terranova_core=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Import {
            input,
            output,
            name,
            description,
            category,
        } => {
            let options = ImportOptions {
                name,
                description,
                category,
            };
            let report = import_project(&input, &output, &options)
                .with_context(|| format!("importing {}", input.display()))?;
            for d in &report.diagnostics {
                tracing::warn!(file = %d.file.display(), "{}", d.diagnostic);
            }
            tracing::info!(files = report.written.len(), "imported into {}", output.display());
        }

        Commands::Export { project, output } => {
            let report = export_project(&project, &output)
                .with_context(|| format!("exporting {}", project.display()))?;
            for d in &report.diagnostics {
                tracing::warn!(file = %d.file.display(), "{}", d.diagnostic);
            }
            tracing::info!(
                files = report.written.len(),
                removed = report.removed.len(),
                "exported to {}",
                output.display()
            );
        }

        Commands::Evaluate { preview } => {
            let config = preview.config()?;
            let response = preview.evaluate(&config)?;
            emit(&response, preview.out.as_deref())?;
        }

        Commands::Stats { preview, bins } => {
            let config = preview.config()?;
            let response = preview.evaluate(&config)?;
            let analysis = analyze(&response, config.contour_interval, bins.unwrap_or(config.histogram_bins));
            emit(
                &serde_json::json!({
                    "statistics": analysis.statistics,
                    "histogram": analysis.histogram,
                }),
                preview.out.as_deref(),
            )?;
        }

        Commands::Contours { preview, interval } => {
            let config = preview.config()?;
            let response = preview.evaluate(&config)?;
            let analysis = analyze(&response, interval.unwrap_or(config.contour_interval), config.histogram_bins);
            emit(&analysis.contours, preview.out.as_deref())?;
        }
    }

    Ok(())
}
