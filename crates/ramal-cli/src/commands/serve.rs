//! Server command implementation

use std::path::Path;

use anyhow::Result;

use super::load_config;

pub async fn cmd_serve(config_path: Option<&Path>, host: &str, port: u16) -> Result<()> {
    let forecast_config = load_config(config_path)?;

    println!("🚀 Starting Ramal web server...");
    println!("   Listening: http://{}:{}", host, port);

    // Parse allowed CORS origins from environment (comma-separated)
    let allowed_origins: Vec<String> = std::env::var("RAMAL_ALLOWED_ORIGINS")
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if !allowed_origins.is_empty() {
        println!(
            "   🌐 Allowed origins: {} (RAMAL_ALLOWED_ORIGINS)",
            allowed_origins.join(", ")
        );
    }
    println!();
    println!("   Press Ctrl+C to stop");

    let config = ramal_server::ServerConfig { allowed_origins };
    ramal_server::serve(forecast_config, host, port, config).await?;

    Ok(())
}
