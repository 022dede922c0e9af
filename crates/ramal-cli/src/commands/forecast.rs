//! Forecast command implementation

use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

use anyhow::{bail, Context, Result};
use ramal_core::{parse_ledger, CategoryReport, ForecastEngine};

use super::{load_config, truncate};

/// Parse a ledger file and forecast every category in it
pub fn forecast_file(config_path: Option<&Path>, file: &Path) -> Result<Vec<CategoryReport>> {
    let name = file
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    if !ramal_server::allowed_file(name) {
        bail!("Only .csv files are accepted: {}", file.display());
    }

    let config = load_config(config_path)?;
    let csv_file =
        File::open(file).with_context(|| format!("Failed to open file: {}", file.display()))?;
    let transactions = parse_ledger(csv_file)
        .with_context(|| format!("Failed to parse ledger: {}", file.display()))?;

    tracing::info!(
        file = %file.display(),
        transactions = transactions.len(),
        "Ledger loaded"
    );

    Ok(ForecastEngine::new(config).report(&transactions))
}

/// Category → display string, as served by the HTTP API
pub fn forecast_map(reports: &[CategoryReport]) -> BTreeMap<&str, &str> {
    reports
        .iter()
        .map(|r| (r.category.as_str(), r.display.as_str()))
        .collect()
}

pub fn cmd_forecast(
    config_path: Option<&Path>,
    file: &Path,
    json: bool,
    detail: bool,
) -> Result<()> {
    let reports = forecast_file(config_path, file)?;

    if detail {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }
    if json {
        println!("{}", serde_json::to_string_pretty(&forecast_map(&reports))?);
        return Ok(());
    }

    println!();
    println!("🔮 Next Month Forecast");
    println!("   Ledger: {}", file.display());
    println!("   ─────────────────────────────────────────────────────────────");

    if reports.is_empty() {
        println!("   No transactions found.");
        return Ok(());
    }

    println!(
        "   {:25} │ {:>6} │ {:8} │ {}",
        "Category", "Months", "Strategy", "Forecast"
    );
    println!("   ──────────────────────────┼────────┼──────────┼──────────────────");

    for report in &reports {
        println!(
            "   {:25} │ {:>6} │ {:8} │ {}",
            truncate(&report.category, 25),
            report.n_months,
            report.strategy.as_str(),
            report.display
        );
    }

    let failed = reports.iter().filter(|r| r.error.is_some()).count();
    if failed > 0 {
        println!();
        println!("   ⚠️  {} categories could not be forecast", failed);
    }

    Ok(())
}
