//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `config` - Show the effective configuration or its override path
//! - `forecast` - Forecast a CSV ledger
//! - `serve` - Web server command

pub mod config;
pub mod forecast;
pub mod serve;

// Re-export command functions for main.rs
pub use config::*;
pub use forecast::*;
pub use serve::*;

use std::path::Path;

use anyhow::{Context, Result};
use ramal_core::ForecastConfig;

/// Load the forecast configuration, explicit path first
pub fn load_config(path: Option<&Path>) -> Result<ForecastConfig> {
    ForecastConfig::load(path).with_context(|| match path {
        Some(p) => format!("Failed to load config from {}", p.display()),
        None => "Failed to load config".to_string(),
    })
}

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
