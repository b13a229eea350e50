#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the crime graph analyses.
//!
//! `similarity` compares incident similarity graphs across time periods and
//! `transitions` traces the cheapest Morning to Night route through the
//! shift-transition graph of one area and year.

mod export;
mod similarity;
mod transitions;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use crime_graph_analysis::AnalysisError;
use crime_graph_analysis_models::{AnalysisConfig, ConfigError};
use crime_graph_ingest::IngestError;

/// Errors surfaced by a CLI run.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Incident file could not be loaded.
    #[error(transparent)]
    Ingest(#[from] IngestError),

    /// A graph build or report failed.
    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    /// Output could not be written or a partition file read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A required setting has no value on the command line or in the config.
    #[error("Missing setting: {message}")]
    Missing {
        /// What is missing and where it can be given.
        message: String,
    },
}

#[derive(Parser)]
#[command(name = "crime_graph", about = "Crime incident graph analyses")]
struct Cli {
    /// TOML config file. Built-in defaults are used when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Directory that graph exports are written to
    #[arg(long, global = true, default_value = "output")]
    output_dir: PathBuf,
    /// Random seed for sampling (overrides the config)
    #[arg(long, global = true)]
    seed: Option<u64>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build per-period similarity graphs of the busiest areas and compare them
    Similarity {
        /// Delimited incident file
        #[arg(long)]
        input: PathBuf,
        /// Incidents sampled per period (overrides the config)
        #[arg(long)]
        sample_size: Option<usize>,
        /// Directory holding `partition_<period>.json` files from community
        /// detection. Defaults to the output directory.
        #[arg(long)]
        partition_dir: Option<PathBuf>,
    },
    /// Build the crime-chain and shift-transition graphs of one area and year
    /// and find the critical path
    Transitions {
        /// Delimited incident file
        #[arg(long)]
        input: PathBuf,
        /// Area name, e.g. "77th Street" (overrides the config)
        #[arg(long)]
        area: Option<String>,
        /// Year of occurrence (overrides the config)
        #[arg(long)]
        year: Option<i32>,
    },
}

/// Loads the config file (or defaults), applies command-line overrides,
/// and validates the result.
fn resolve_config(cli: &Cli) -> Result<AnalysisConfig, CliError> {
    let mut config = match &cli.config {
        Some(path) => {
            log::info!("Loading config from {}", path.display());
            AnalysisConfig::load(path)?
        }
        None => AnalysisConfig::default(),
    };

    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    match &cli.command {
        Commands::Similarity { sample_size, .. } => {
            if let Some(size) = *sample_size {
                config.sample_size = size;
            }
        }
        Commands::Transitions { area, year, .. } => {
            if let Some(area) = area {
                config.area = Some(area.clone());
            }
            if let Some(year) = *year {
                config.year = Some(year);
            }
        }
    }

    config.validate()?;
    Ok(config)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = crime_graph_cli_utils::init_logger();
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    std::fs::create_dir_all(&cli.output_dir)?;

    match &cli.command {
        Commands::Similarity {
            input,
            partition_dir,
            ..
        } => {
            let partition_dir = partition_dir.as_ref().unwrap_or(&cli.output_dir);
            similarity::run(&config, input, &cli.output_dir, partition_dir, &multi)?;
        }
        Commands::Transitions { input, .. } => {
            transitions::run(&config, input, &cli.output_dir)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_line_overrides_config_values() {
        let cli = Cli::parse_from([
            "crime_graph",
            "--seed",
            "7",
            "transitions",
            "--input",
            "incidents.csv",
            "--area",
            "Pacific",
            "--year",
            "2021",
        ]);
        let config = resolve_config(&cli).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.area.as_deref(), Some("Pacific"));
        assert_eq!(config.year, Some(2021));
        assert_eq!(config.sample_size, 1000);
    }

    #[test]
    fn sample_size_override_applies_to_similarity() {
        let cli = Cli::parse_from([
            "crime_graph",
            "similarity",
            "--input",
            "incidents.csv",
            "--sample-size",
            "250",
            "--output-dir",
            "out",
        ]);
        let config = resolve_config(&cli).unwrap();
        assert_eq!(config.sample_size, 250);
        assert_eq!(cli.output_dir, PathBuf::from("out"));
    }
}
