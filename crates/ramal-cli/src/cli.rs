//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Ramal - Forecast next month's spending per category
#[derive(Parser)]
#[command(name = "ramal")]
#[command(about = "Per-category one-month-ahead spending forecasts", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Forecast configuration file (TOML)
    ///
    /// Defaults to the override in the data directory if present, otherwise
    /// the built-in configuration.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Forecast next month's total for every category in a ledger
    Forecast {
        /// CSV ledger with date, category and amount columns
        #[arg(short, long)]
        file: PathBuf,

        /// Print a JSON map of category to forecast instead of a table
        #[arg(long)]
        json: bool,

        /// Include strategy and per-model results (implies --json)
        #[arg(long)]
        detail: bool,
    },

    /// Show the effective forecast configuration
    Config {
        /// Print the override file location instead
        #[arg(long)]
        path: bool,
    },

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },
}
