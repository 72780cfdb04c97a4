//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Incremental extraction from the Scope REST API into object storage
#[derive(Parser, Debug)]
#[command(name = "scope-extract")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run configuration file (YAML); the built-in endpoint table is used when omitted
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract every configured endpoint
    Run {
        /// Override the destination bucket URL
        #[arg(short, long)]
        bucket: Option<String>,

        /// Override the run identifier
        #[arg(long)]
        run_id: Option<String>,

        /// Extract independent endpoints in parallel, up to this many at once
        #[arg(long)]
        concurrency: Option<usize>,
    },

    /// Show the execution order and dependency levels
    Plan,

    /// Show the stored watermark of each endpoint
    State {
        /// Override the bucket URL holding the state
        #[arg(short, long)]
        bucket: Option<String>,
    },

    /// Validate the run configuration
    Validate,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    Text,
    /// JSON output
    Json,
}
