//! Ramal CLI - Per-category spending forecasts
//!
//! Usage:
//!   ramal forecast --file CSV   Forecast next month per category
//!   ramal config               Show the effective forecast configuration
//!   ramal serve --port 3000    Start web server

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match cli.command {
        Commands::Forecast { file, json, detail } => {
            commands::cmd_forecast(cli.config.as_deref(), &file, json, detail)
        }
        Commands::Config { path } => commands::cmd_config(cli.config.as_deref(), path),
        Commands::Serve { port, host } => {
            commands::cmd_serve(cli.config.as_deref(), &host, port).await
        }
    }
}

/// RUST_LOG wins; otherwise `--verbose` selects debug over info
fn init_logging(verbose: bool) {
    let filter = match std::env::var("RUST_LOG") {
        Ok(_) => EnvFilter::from_default_env(),
        Err(_) => EnvFilter::new(if verbose { "debug" } else { "info" }),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();
}
