use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use fieldcov_core::aggregate::AggregationKind;

/// fieldcov - coverage-aware work-order preparation
#[derive(Parser, Debug)]
#[command(name = "fieldcov")]
#[command(about = "Join candidate installation points with signal coverage surveys", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Path to a fieldcov.toml configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ingest candidate files, join the coverage survey, and export the table
    Ingest(IngestArgs),

    /// Parse candidate files and report per-source point counts, no join
    Inspect(InspectArgs),
}

#[derive(Parser, Debug)]
pub struct IngestArgs {
    /// Candidate survey files (CSV, KML, or KMZ), named Child_Parent.ext
    #[arg(required = true)]
    pub candidates: Vec<PathBuf>,

    /// Coverage survey CSV with Latitud, Longitud and RSSI / RSCP (dBm)
    #[arg(long)]
    pub coverage: Option<PathBuf>,

    /// Join radius in metres
    #[arg(long)]
    pub radius: Option<f64>,

    /// Aggregation strategy for the coverage join
    #[arg(long, value_enum)]
    pub strategy: Option<StrategyArg>,

    /// Child location applied to the whole batch (skips filename derivation)
    #[arg(long, requires = "parent")]
    pub child: Option<String>,

    /// Parent location applied to the whole batch (skips filename derivation)
    #[arg(long, requires = "child")]
    pub parent: Option<String>,

    /// Fill promised visit windows starting at this local time
    /// (e.g. 2025-06-30T09:00)
    #[arg(long, value_name = "DATETIME")]
    pub schedule_start: Option<String>,

    /// Write the full table as CSV to this path instead of previewing
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct InspectArgs {
    /// Candidate survey files to examine
    #[arg(required = true)]
    pub candidates: Vec<PathBuf>,
}

/// Aggregation strategy selection
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StrategyArg {
    /// Average every sample within the join radius
    RadiusAverage,
    /// Exact lookup on coordinates rounded to ten decimals
    ExactBin,
}

impl From<StrategyArg> for AggregationKind {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::RadiusAverage => AggregationKind::RadiusAverage,
            StrategyArg::ExactBin => AggregationKind::ExactBin,
        }
    }
}
