//! Config command implementation

use std::path::Path;

use anyhow::{Context, Result};
use ramal_core::default_config_path;

use super::load_config;

pub fn cmd_config(config_path: Option<&Path>, show_path: bool) -> Result<()> {
    if show_path {
        let path = default_config_path().context("No data directory on this platform")?;
        println!("{}", path.display());
        if !path.exists() {
            println!("   (not present, built-in defaults are used)");
        }
        return Ok(());
    }

    let config = load_config(config_path)?;
    print!("{}", config.to_toml()?);
    Ok(())
}
