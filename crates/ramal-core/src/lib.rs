//! Ramal Core Library
//!
//! Per-category spending forecasts from a transaction ledger:
//! - CSV ledger parsing
//! - Monthly aggregation into per-category series
//! - Strategy selection (trend extrapolation for short histories,
//!   a seasonal model ensemble otherwise)
//! - SARIMA, exponential smoothing and additive decomposition models
//! - Rupiah display formatting
//! - TOML configuration with embedded defaults

pub mod aggregate;
pub mod config;
pub mod engine;
pub mod error;
pub mod format;
pub mod ledger;
pub mod models;

pub use aggregate::{aggregate_monthly, CategorySeries, MonthlyObservation, YearMonth};
pub use config::{
    default_config_path, ArimaOrder, DecompositionConfig, ForecastConfig, OptimizerConfig,
    SarimaConfig, SmoothingConfig,
};
pub use engine::{
    ensemble_mean, CategoryForecast, CategoryReport, ForecastEngine, ForecastOutcome,
    SeriesForecast, SkippedModel, Strategy,
};
pub use error::{Error, ForecastError, ModelError, Result};
pub use format::{format_rupiah, render};
pub use ledger::{parse_ledger, parse_ledger_file, Transaction};
pub use models::{ModelAttempt, ModelKind, ModelPolicy};
