//! Forecasting models
//!
//! Each model takes a category's ordered monthly values and returns a single
//! one-step-ahead forecast or a [`ModelError`]. Short histories go to
//! [`trend`]; longer ones run the seasonal models in [`SEASONAL_MODELS`]
//! order and are combined by the engine.

pub mod decomposition;
pub(crate) mod linalg;
pub(crate) mod optimizer;
pub mod sarima;
pub mod smoothing;
pub mod trend;

use serde::Serialize;

use crate::error::ModelError;

/// Seasonal models available to the ensemble
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Sarima,
    ExponentialSmoothing,
    Decomposition,
}

impl ModelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::Sarima => "sarima",
            ModelKind::ExponentialSmoothing => "exponential_smoothing",
            ModelKind::Decomposition => "decomposition",
        }
    }

    pub fn policy(&self) -> ModelPolicy {
        match self {
            ModelKind::Sarima => ModelPolicy::Mandatory,
            ModelKind::ExponentialSmoothing | ModelKind::Decomposition => ModelPolicy::Optional,
        }
    }
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a model failure means for its category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelPolicy {
    /// Failure fails the category
    Mandatory,
    /// Failure drops the model from the ensemble
    Optional,
}

/// Evaluation order for seasonal-ensemble categories
pub const SEASONAL_MODELS: [ModelKind; 3] = [
    ModelKind::Sarima,
    ModelKind::ExponentialSmoothing,
    ModelKind::Decomposition,
];

/// Outcome of running one model on one category
#[derive(Debug, Clone, PartialEq)]
pub struct ModelAttempt {
    pub model: ModelKind,
    pub policy: ModelPolicy,
    pub result: Result<f64, ModelError>,
}

impl ModelAttempt {
    pub fn new(model: ModelKind, result: Result<f64, ModelError>) -> Self {
        Self {
            model,
            policy: model.policy(),
            result,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }
}
