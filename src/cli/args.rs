//! Command line argument parsing for the sarissa-query CLI using clap.

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// sarissa-query - Run boolean filter trees over a JSON document set
#[derive(Parser, Debug, Clone)]
#[command(name = "sarissa-query")]
#[command(about = "Run boolean filter trees over an in-memory index")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "Sarissa Contributors")]
#[command(long_about = None)]
pub struct QueryArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human")]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl QueryArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1, // Default to normal
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run a filter against a document set
    Search(SearchArgs),

    /// Print a filter and its prepared form
    Explain(ExplainArgs),

    /// Show document set statistics
    Stats(StatsArgs),
}

/// Arguments for searching
#[derive(Parser, Debug, Clone)]
pub struct SearchArgs {
    /// JSON document set: an array of segments, each an array of documents
    #[arg(short, long, value_name = "DOCS_FILE")]
    pub index: PathBuf,

    /// JSON filter tree
    #[arg(short = 'Q', long, value_name = "QUERY_FILE")]
    pub query: PathBuf,

    /// Sorts to rank hits by, in priority order
    #[arg(short, long, value_enum)]
    pub sort: Vec<SortKind>,

    /// Maximum number of results to return
    #[arg(short, long, default_value = "10")]
    pub limit: usize,

    /// Only report the number of matching documents
    #[arg(long)]
    pub count: bool,

    /// Query configuration file (JSON)
    #[arg(short, long, value_name = "CONFIG_FILE")]
    pub config: Option<PathBuf>,
}

/// Arguments for explaining a filter
#[derive(Parser, Debug, Clone)]
pub struct ExplainArgs {
    /// JSON filter tree
    #[arg(short = 'Q', long, value_name = "QUERY_FILE")]
    pub query: PathBuf,

    /// JSON document set to prepare the filter against
    #[arg(short, long, value_name = "DOCS_FILE")]
    pub index: Option<PathBuf>,

    /// Query configuration file (JSON)
    #[arg(short, long, value_name = "CONFIG_FILE")]
    pub config: Option<PathBuf>,
}

/// Arguments for showing statistics
#[derive(Parser, Debug, Clone)]
pub struct StatsArgs {
    /// JSON document set
    #[arg(short, long, value_name = "DOCS_FILE")]
    pub index: PathBuf,
}

/// Built-in sorts
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKind {
    /// Effective boost of the matching terms
    Boost,
    /// Term frequency times boost
    Frequency,
}

/// Output formats for CLI
#[derive(ValueEnum, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}
