//! CLI module
//!
//! Command-line interface for running extractions.
//!
//! # Commands
//!
//! - `run` - Extract every configured endpoint
//! - `plan` - Print the execution order and dependency levels
//! - `state` - Print the stored watermark of each endpoint
//! - `validate` - Load and validate the run configuration

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
