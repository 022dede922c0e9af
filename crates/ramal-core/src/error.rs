//! Error types for Ramal
//!
//! Three layers, from widest to narrowest blast radius:
//! - [`Error`]: fails the whole request (unreadable ledger, bad config)
//! - [`ForecastError`]: fails one category, siblings are unaffected
//! - [`ModelError`]: fails one model attempt inside a category

use thiserror::Error;

use crate::models::ModelKind;

#[derive(Error, Debug)]
pub enum Error {
    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Why a single category could not be forecast.
///
/// The `Display` text is what follows `"Error: "` in the rendered output.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    #[error("Category has no observations")]
    NoHistory,

    #[error("{0}")]
    TrendFit(ModelError),

    #[error("{detail}")]
    MandatoryModelFailure { model: ModelKind, detail: ModelError },

    #[error("All models failed")]
    EmptyEnsemble,
}

/// Failure of one model fit or forecast.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("insufficient data: need at least {needed} observations, got {got}")]
    InsufficientData { needed: usize, got: usize },

    #[error("non-finite value: {0}")]
    NonFinite(String),

    #[error("singular system: {0}")]
    Singular(String),

    #[error("estimation failed: {0}")]
    Estimation(String),
}
