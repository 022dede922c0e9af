//! Forecast engine - strategy selection, model failure isolation, ensembling
//!
//! Every category is forecast independently: a failure inside one category
//! becomes that category's [`ForecastError`] and never touches its siblings.

use std::collections::BTreeMap;
use std::io::Read;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::aggregate::{aggregate_monthly, CategorySeries};
use crate::config::ForecastConfig;
use crate::error::{ForecastError, ModelError, Result};
use crate::format::render;
use crate::ledger::{parse_ledger, Transaction};
use crate::models::{
    decomposition, sarima, smoothing, trend, ModelAttempt, ModelKind, ModelPolicy, SEASONAL_MODELS,
};

/// Result for one category
pub type ForecastOutcome = std::result::Result<f64, ForecastError>;

/// How a category is forecast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Linear trend extrapolation for short histories
    Trend,
    /// Mean of the seasonal models that succeed
    Ensemble,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Trend => "trend",
            Strategy::Ensemble => "ensemble",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Final output for one category
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryForecast {
    pub category: String,
    /// Formatted currency, or a message starting with "Error: "
    pub display: String,
}

/// Everything that happened while forecasting one series
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesForecast {
    pub strategy: Strategy,
    pub outcome: ForecastOutcome,
    /// Seasonal model attempts in evaluation order, empty for [`Strategy::Trend`]
    pub attempts: Vec<ModelAttempt>,
}

/// A model that was attempted but dropped
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedModel {
    pub model: ModelKind,
    pub error: String,
}

/// Diagnostic view of one category's forecast
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryReport {
    pub category: String,
    pub n_months: usize,
    pub strategy: Strategy,
    /// Models whose forecasts went into the result
    pub models: Vec<ModelKind>,
    pub skipped: Vec<SkippedModel>,
    pub forecast: Option<f64>,
    pub error: Option<String>,
    pub display: String,
}

/// Arithmetic mean of the surviving model forecasts
pub fn ensemble_mean(values: &[f64]) -> ForecastOutcome {
    if values.is_empty() {
        return Err(ForecastError::EmptyEnsemble);
    }
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// Run the seasonal models in order, stopping at a mandatory failure
fn ensemble_attempts<F>(category: &str, mut run: F) -> (ForecastOutcome, Vec<ModelAttempt>)
where
    F: FnMut(ModelKind) -> std::result::Result<f64, ModelError>,
{
    let mut attempts = Vec::with_capacity(SEASONAL_MODELS.len());

    for model in SEASONAL_MODELS {
        let attempt = ModelAttempt::new(model, run(model));

        match (&attempt.result, attempt.policy) {
            (Ok(value), _) => debug!(
                category,
                model = model.as_str(),
                forecast = value,
                "Model forecast complete"
            ),
            (Err(e), ModelPolicy::Mandatory) => {
                let failure = ForecastError::MandatoryModelFailure {
                    model,
                    detail: e.clone(),
                };
                attempts.push(attempt);
                return (Err(failure), attempts);
            }
            (Err(e), ModelPolicy::Optional) => warn!(
                category,
                model = model.as_str(),
                error = %e,
                "Optional model failed, excluding from ensemble"
            ),
        }
        attempts.push(attempt);
    }

    let forecasts: Vec<f64> = attempts
        .iter()
        .filter_map(|a| a.result.as_ref().ok().copied())
        .collect();
    (ensemble_mean(&forecasts), attempts)
}

/// Stateless forecaster; holds only configuration
#[derive(Debug, Clone, Default)]
pub struct ForecastEngine {
    config: ForecastConfig,
}

impl ForecastEngine {
    pub fn new(config: ForecastConfig) -> Self {
        Self { config }
    }

    /// Engine with the built-in default configuration
    pub fn with_defaults() -> Self {
        Self::default()
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    pub fn select_strategy(&self, n_months: usize) -> Strategy {
        if n_months < self.config.short_history_threshold {
            Strategy::Trend
        } else {
            Strategy::Ensemble
        }
    }

    fn run_model(
        &self,
        model: ModelKind,
        series: &CategorySeries,
    ) -> std::result::Result<f64, ModelError> {
        let config = &self.config;
        let values = series.values();
        match model {
            ModelKind::Sarima => sarima::forecast(
                &values,
                &config.sarima,
                &config.optimizer,
                config.seasonal_period,
            ),
            ModelKind::ExponentialSmoothing => smoothing::forecast(
                &values,
                config.seasonal_period,
                config.seasonal_smoothing_threshold,
                &config.smoothing,
                &config.optimizer,
            ),
            ModelKind::Decomposition => decomposition::forecast(series, &config.decomposition),
        }
    }

    /// Forecast the month after the last observation of one series
    pub fn forecast_series(&self, series: &CategorySeries) -> SeriesForecast {
        let strategy = self.select_strategy(series.len());

        if series.is_empty() {
            return SeriesForecast {
                strategy,
                outcome: Err(ForecastError::NoHistory),
                attempts: Vec::new(),
            };
        }

        match strategy {
            Strategy::Trend => SeriesForecast {
                strategy,
                outcome: trend::extrapolate(&series.values()).map_err(ForecastError::TrendFit),
                attempts: Vec::new(),
            },
            Strategy::Ensemble => {
                let (outcome, attempts) = self.run_ensemble(series);
                SeriesForecast {
                    strategy,
                    outcome,
                    attempts,
                }
            }
        }
    }

    fn run_ensemble(&self, series: &CategorySeries) -> (ForecastOutcome, Vec<ModelAttempt>) {
        ensemble_attempts(&series.category, |model| self.run_model(model, series))
    }

    /// Per-category diagnostics for a ledger
    pub fn report(&self, transactions: &[Transaction]) -> Vec<CategoryReport> {
        aggregate_monthly(transactions)
            .into_values()
            .map(|series| {
                let result = self.forecast_series(&series);
                let display = render(&result.outcome);

                match &result.outcome {
                    Ok(value) => info!(
                        category = %series.category,
                        n_months = series.len(),
                        strategy = result.strategy.as_str(),
                        forecast = value,
                        "Category forecast"
                    ),
                    Err(e) => warn!(
                        category = %series.category,
                        n_months = series.len(),
                        strategy = result.strategy.as_str(),
                        error = %e,
                        "Category forecast failed"
                    ),
                }

                let (models, skipped) = result.attempts.iter().fold(
                    (Vec::new(), Vec::new()),
                    |(mut models, mut skipped), attempt| {
                        match &attempt.result {
                            Ok(_) => models.push(attempt.model),
                            Err(e) => skipped.push(SkippedModel {
                                model: attempt.model,
                                error: e.to_string(),
                            }),
                        }
                        (models, skipped)
                    },
                );

                CategoryReport {
                    n_months: series.len(),
                    strategy: result.strategy,
                    models,
                    skipped,
                    forecast: result.outcome.as_ref().ok().copied(),
                    error: result.outcome.as_ref().err().map(|e| e.to_string()),
                    display,
                    category: series.category,
                }
            })
            .collect()
    }

    /// Map every category in the ledger to its display string
    pub fn forecast_ledger(&self, transactions: &[Transaction]) -> BTreeMap<String, String> {
        self.report(transactions)
            .into_iter()
            .map(|r| (r.category, r.display))
            .collect()
    }

    /// Parse a CSV ledger and forecast it; a malformed row fails the whole call
    pub fn forecast_csv<R: Read>(&self, reader: R) -> Result<BTreeMap<String, String>> {
        let transactions = parse_ledger(reader)?;
        info!(rows = transactions.len(), "Ledger parsed");
        Ok(self.forecast_ledger(&transactions))
    }
}

impl CategoryReport {
    pub fn to_forecast(&self) -> CategoryForecast {
        CategoryForecast {
            category: self.category.clone(),
            display: self.display.clone(),
        }
    }
}
