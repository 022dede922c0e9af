//! CLI command tests
//!
//! This module contains all tests for the CLI commands.

use std::fs;
use std::path::PathBuf;

use ramal_core::Strategy;
use tempfile::TempDir;

use crate::commands::{self, truncate};

/// Write a ledger with `months` monthly rows per category into a temp dir
fn write_ledger(dir: &TempDir, name: &str, categories: &[(&str, usize)]) -> PathBuf {
    let mut csv = String::from("Date,Category,Amount,Memo\n");
    for (category, months) in categories {
        for t in 0..*months {
            csv.push_str(&format!(
                "{}-{:02}-15,{},{},note\n",
                2022 + t / 12,
                t % 12 + 1,
                category,
                100_000 + 5_000 * t
            ));
        }
    }
    let path = dir.path().join(name);
    fs::write(&path, csv).unwrap();
    path
}

// ========== Forecast Command Tests ==========

#[test]
fn test_forecast_file_reports_every_category() {
    let dir = TempDir::new().unwrap();
    let path = write_ledger(&dir, "ledger.csv", &[("Food", 6), ("Rent", 2)]);

    let reports = commands::forecast_file(None, &path).unwrap();
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].category, "Food");
    assert_eq!(reports[0].strategy, Strategy::Trend);
    assert_eq!(reports[0].display, "Rp. 130.000");
    assert_eq!(reports[1].display, "Rp. 110.000");

    let map = commands::forecast_map(&reports);
    assert_eq!(map.get("Rent"), Some(&"Rp. 110.000"));
}

#[test]
fn test_forecast_accepts_uppercase_extension() {
    let dir = TempDir::new().unwrap();
    let path = write_ledger(&dir, "LEDGER.CSV", &[("Food", 3)]);
    assert!(commands::forecast_file(None, &path).is_ok());
}

#[test]
fn test_forecast_rejects_non_csv() {
    let dir = TempDir::new().unwrap();
    let path = write_ledger(&dir, "ledger.txt", &[("Food", 3)]);
    let err = commands::forecast_file(None, &path).unwrap_err();
    assert!(err.to_string().contains("Only .csv files"));
}

#[test]
fn test_forecast_missing_file() {
    let dir = TempDir::new().unwrap();
    let err = commands::forecast_file(None, &dir.path().join("missing.csv")).unwrap_err();
    assert!(err.to_string().contains("Failed to open file"));
}

#[test]
fn test_forecast_bad_row_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.csv");
    fs::write(&path, "date,category,amount\n2024-01-01,Food,abc\n").unwrap();

    let err = commands::forecast_file(None, &path).unwrap_err();
    assert!(format!("{:#}", err).contains("row 1"));
}

#[test]
fn test_forecast_uses_explicit_config() {
    let dir = TempDir::new().unwrap();
    let ledger = write_ledger(&dir, "ledger.csv", &[("Food", 6)]);
    let config = dir.path().join("forecast.toml");
    fs::write(&config, "short_history_threshold = 5\n").unwrap();

    let reports = commands::forecast_file(Some(&config), &ledger).unwrap();
    assert_eq!(reports[0].strategy, Strategy::Ensemble);
    assert!(reports[0].display.starts_with("Rp. "), "{}", reports[0].display);
}

#[test]
fn test_cmd_forecast_output_modes() {
    let dir = TempDir::new().unwrap();
    let path = write_ledger(&dir, "ledger.csv", &[("Food", 4)]);
    assert!(commands::cmd_forecast(None, &path, false, false).is_ok());
    assert!(commands::cmd_forecast(None, &path, true, false).is_ok());
    assert!(commands::cmd_forecast(None, &path, false, true).is_ok());
}

// ========== Config Command Tests ==========

#[test]
fn test_cmd_config_explicit() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("forecast.toml");
    fs::write(&path, "seasonal_period = 4\nshort_history_threshold = 4\n").unwrap();
    assert!(commands::cmd_config(Some(&path), false).is_ok());
}

#[test]
fn test_cmd_config_invalid_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("forecast.toml");
    fs::write(&path, "seasonal_period = \"monthly\"\n").unwrap();
    assert!(commands::cmd_config(Some(&path), false).is_err());
    assert!(commands::load_config(Some(&path)).is_err());
}

// ========== Helper Tests ==========

#[test]
fn test_truncate() {
    assert_eq!(truncate("Food", 10), "Food");
    assert_eq!(truncate("Entertainment & Leisure", 10), "Enterta...");
    assert_eq!(truncate("Kopi ☕ Pagi", 20), "Kopi ☕ Pagi");
}
