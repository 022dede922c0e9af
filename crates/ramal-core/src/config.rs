//! Forecast engine configuration
//!
//! Every constant the engine relies on (model orders, the seasonal period,
//! the 12/24 month thresholds, optimizer limits, decomposition priors) lives
//! here so that other cadences can be supported by swapping a file instead
//! of editing code.
//!
//! ## Configuration Resolution
//!
//! Config is loaded with a two-layer resolution:
//! 1. An explicit path, or the override in the data dir
//!    (~/.local/share/ramal/config/forecast.toml)
//! 2. Fall back to embedded defaults (compiled into binary)
//!
//! Any field missing from a file keeps its default.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/forecast.toml");

/// Top-level engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ForecastConfig {
    /// Observations per seasonal cycle (12 for monthly data)
    pub seasonal_period: usize,
    /// Series shorter than this use the trend extrapolator
    pub short_history_threshold: usize,
    /// Series at least this long get a seasonal smoothing component
    pub seasonal_smoothing_threshold: usize,
    pub optimizer: OptimizerConfig,
    pub sarima: SarimaConfig,
    pub smoothing: SmoothingConfig,
    pub decomposition: DecompositionConfig,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            seasonal_period: 12,
            short_history_threshold: 12,
            seasonal_smoothing_threshold: 24,
            optimizer: OptimizerConfig::default(),
            sarima: SarimaConfig::default(),
            smoothing: SmoothingConfig::default(),
            decomposition: DecompositionConfig::default(),
        }
    }
}

/// Bounded Nelder-Mead settings shared by the SARIMA and smoothing fits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptimizerConfig {
    pub max_iter: usize,
    /// Convergence threshold on the simplex diameter
    pub tolerance: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            max_iter: 500,
            tolerance: 1e-8,
        }
    }
}

/// (p, d, q) triple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArimaOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SarimaConfig {
    pub order: ArimaOrder,
    /// Seasonal (P, D, Q); the period is `ForecastConfig::seasonal_period`
    pub seasonal_order: ArimaOrder,
    /// Coefficients are searched in [-bound, bound]. Values above 1 allow
    /// non-stationary and non-invertible fits.
    pub param_bound: f64,
    /// Starting value for every coefficient
    pub initial_value: f64,
}

impl Default for SarimaConfig {
    fn default() -> Self {
        Self {
            order: ArimaOrder { p: 1, d: 1, q: 1 },
            seasonal_order: ArimaOrder { p: 1, d: 1, q: 1 },
            param_bound: 1.5,
            initial_value: 0.1,
        }
    }
}

/// Holt-Winters parameter bounds and starting point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SmoothingConfig {
    /// Lower bound for alpha, beta and gamma
    pub min_param: f64,
    /// Upper bound for alpha and gamma
    pub max_param: f64,
    /// Upper bound for beta
    pub max_beta: f64,
    pub initial_alpha: f64,
    pub initial_beta: f64,
    pub initial_gamma: f64,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            min_param: 0.001,
            max_param: 0.999,
            max_beta: 0.5,
            initial_alpha: 0.3,
            initial_beta: 0.05,
            initial_gamma: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DecompositionConfig {
    /// Number of yearly Fourier pairs
    pub fourier_order: usize,
    /// Yearly seasonality is only fitted when the history spans this many days
    pub min_seasonal_span_days: i64,
    pub yearly_period_days: f64,
    /// Potential trend changepoints, placed in the first `changepoint_range`
    /// fraction of the history
    pub n_changepoints: usize,
    pub changepoint_range: f64,
    pub changepoint_prior_scale: f64,
    pub seasonality_prior_scale: f64,
    pub trend_prior_scale: f64,
}

impl Default for DecompositionConfig {
    fn default() -> Self {
        Self {
            fourier_order: 3,
            min_seasonal_span_days: 730,
            yearly_period_days: 365.25,
            n_changepoints: 5,
            changepoint_range: 0.8,
            changepoint_prior_scale: 0.05,
            seasonality_prior_scale: 10.0,
            trend_prior_scale: 5.0,
        }
    }
}

impl ForecastConfig {
    /// Load configuration (explicit path, then override, then embedded default)
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let content = match path {
            Some(path) => fs::read_to_string(path).map_err(|e| {
                Error::Config(format!("Failed to read {}: {}", path.display(), e))
            })?,
            None => match default_config_path().filter(|p| p.exists()) {
                Some(override_path) => {
                    debug!(path = %override_path.display(), "Using config override");
                    fs::read_to_string(&override_path)
                        .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?
                }
                None => DEFAULT_CONFIG.to_string(),
            },
        };

        Self::from_toml(&content)
    }

    /// Parse and validate configuration from TOML content
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: ForecastConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Render the configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))
    }

    pub fn validate(&self) -> Result<()> {
        let fail = |msg: &str| Err(Error::Config(msg.to_string()));

        if self.seasonal_period < 2 {
            return fail("seasonal_period must be at least 2");
        }
        if self.short_history_threshold == 0 {
            return fail("short_history_threshold must be at least 1");
        }
        if self.seasonal_smoothing_threshold < self.short_history_threshold {
            return fail("seasonal_smoothing_threshold must not be below short_history_threshold");
        }
        if self.optimizer.max_iter == 0 {
            return fail("optimizer.max_iter must be positive");
        }
        if !(self.optimizer.tolerance > 0.0) {
            return fail("optimizer.tolerance must be positive");
        }
        if !(self.sarima.param_bound > 0.0) {
            return fail("sarima.param_bound must be positive");
        }

        let s = &self.smoothing;
        if !(0.0 < s.min_param && s.min_param < s.max_param && s.max_param < 1.0) {
            return fail("smoothing bounds must satisfy 0 < min_param < max_param < 1");
        }
        if !(s.min_param < s.max_beta && s.max_beta < 1.0) {
            return fail("smoothing.max_beta must lie in (min_param, 1)");
        }

        let d = &self.decomposition;
        if !(d.changepoint_range > 0.0 && d.changepoint_range <= 1.0) {
            return fail("decomposition.changepoint_range must lie in (0, 1]");
        }
        if !(d.changepoint_prior_scale > 0.0
            && d.seasonality_prior_scale > 0.0
            && d.trend_prior_scale > 0.0)
        {
            return fail("decomposition prior scales must be positive");
        }
        if !(d.yearly_period_days > 0.0) {
            return fail("decomposition.yearly_period_days must be positive");
        }

        Ok(())
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("ramal").join("config").join("forecast.toml"))
}
