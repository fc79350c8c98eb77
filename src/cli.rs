//! CLI argument parsing for batch-oee

use crate::normalize::OverlapPolicy;
use chrono::{DateTime, Utc};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for calculation results
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text report (default)
    Text,
    /// JSON report for machine parsing
    Json,
    /// CSV of categorized intervals for spreadsheet analysis
    Csv,
    /// CSV of minutes per loss category, summed over all units
    BreakdownCsv,
}

/// How overlapping intervals on one unit are handled
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OverlapArg {
    /// Keep both and warn
    Preserve,
    /// Fail the calculation
    Reject,
    /// The later-starting interval ends the earlier one
    LastWriteWins,
}

impl From<OverlapArg> for OverlapPolicy {
    fn from(arg: OverlapArg) -> Self {
        match arg {
            OverlapArg::Preserve => OverlapPolicy::Preserve,
            OverlapArg::Reject => OverlapPolicy::Reject,
            OverlapArg::LastWriteWins => OverlapPolicy::LastWriteWins,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "batch-oee")]
#[command(version)]
#[command(about = "Overall Equipment Effectiveness for batch operation intervals", long_about = None)]
pub struct Cli {
    /// JSON file with an array of operation interval records
    #[arg(short, long, value_name = "FILE")]
    pub intervals: PathBuf,

    /// Classification config (.yaml, .yml, .toml or .json); built-in ISA-88 defaults if omitted
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Start of the analysis window (RFC 3339, e.g. 2024-12-15T08:00:00Z)
    #[arg(long, value_name = "TIMESTAMP")]
    pub start: DateTime<Utc>,

    /// End of the analysis window (RFC 3339)
    #[arg(long, value_name = "TIMESTAMP")]
    pub end: DateTime<Utc>,

    /// Evaluate a live process: open intervals end at min(window end, NOW)
    #[arg(long, value_name = "TIMESTAMP")]
    pub now: Option<DateTime<Utc>>,

    /// Policy for overlapping intervals on the same unit
    #[arg(long, value_enum, default_value = "preserve")]
    pub overlap: OverlapArg,

    /// Operation name used for uncovered time
    #[arg(long = "idle-operation", value_name = "NAME", default_value = "idle")]
    pub idle_operation: String,

    /// Output format
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Fail if any operation is missing from the loss mappings
    #[arg(long = "strict")]
    pub strict: bool,

    /// Enable debug tracing output to stderr
    #[arg(long = "debug")]
    pub debug: bool,
}
