//! Exponential smoothing: Holt linear trend, or additive Holt-Winters
//!
//! The non-seasonal form is delegated to augurs `AutoETS` with an additive
//! error and trend and no season ("AAN"). The seasonal form is fitted here:
//! smoothing parameters minimize the in-sample sum of squared one-step errors
//! with the bounded simplex search.

use augurs::prelude::*;
use tracing::debug;

use crate::config::{OptimizerConfig, SmoothingConfig};
use crate::error::ModelError;

use super::optimizer::{nelder_mead, Bounds};

/// Additive error, additive trend, no seasonality
const HOLT_SPEC: &str = "AAN";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmoothingForm {
    /// Level and additive trend
    Holt,
    /// Level, additive trend and additive seasonal component
    HoltWintersAdditive,
}

impl SmoothingForm {
    /// Pick the form for a series of `n` observations
    pub fn for_length(n: usize, seasonal_threshold: usize) -> Self {
        if n >= seasonal_threshold {
            SmoothingForm::HoltWintersAdditive
        } else {
            SmoothingForm::Holt
        }
    }
}

fn check_finite(values: &[f64]) -> Result<(), ModelError> {
    if values.iter().any(|v| !v.is_finite()) {
        return Err(ModelError::NonFinite("observation".into()));
    }
    Ok(())
}

/// One-step Holt forecast through augurs
pub fn holt_forecast(values: &[f64]) -> Result<f64, ModelError> {
    if values.len() < 3 {
        return Err(ModelError::InsufficientData {
            needed: 3,
            got: values.len(),
        });
    }
    check_finite(values)?;

    debug!(
        spec = HOLT_SPEC,
        data_length = values.len(),
        "Exponential smoothing fit (Holt)"
    );

    let auto = augurs::ets::AutoETS::new(1, HOLT_SPEC)
        .map_err(|e| ModelError::Estimation(format!("ETS init: {e}")))?;
    let fitted = auto
        .fit(values)
        .map_err(|e| ModelError::Estimation(format!("ETS fit: {e}")))?;
    let forecast = fitted
        .predict(1, None)
        .map_err(|e| ModelError::Estimation(format!("ETS predict: {e}")))?;

    match forecast.point.first() {
        Some(&value) if value.is_finite() => Ok(value),
        _ => Err(ModelError::NonFinite("smoothing forecast".into())),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FittedHoltWinters {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    pub level: f64,
    pub trend: f64,
    /// Seasonal state indexed by `t % period`
    pub seasonal: Vec<f64>,
    pub sse: f64,
    n: usize,
}

/// Initial (level, trend, seasonal) state from the first two seasons
fn initial_state(values: &[f64], m: usize) -> (f64, f64, Vec<f64>) {
    let mean1 = values[..m].iter().sum::<f64>() / m as f64;
    let mean2 = values[m..2 * m].iter().sum::<f64>() / m as f64;
    let seasonal = values[..m].iter().map(|&v| v - mean1).collect();
    (mean1, (mean2 - mean1) / m as f64, seasonal)
}

/// Run the recursions from `t = m`; returns the final state and SSE
fn filter(values: &[f64], m: usize, params: &[f64]) -> (f64, f64, Vec<f64>, f64) {
    let (alpha, beta, gamma) = (params[0], params[1], params[2]);

    let (mut level, mut trend, mut seasonal) = initial_state(values, m);
    let mut sse = 0.0;

    for (t, &y) in values.iter().enumerate().skip(m) {
        let s_prev = seasonal[t % m];
        let error = y - (level + trend + s_prev);
        sse += error * error;

        let prev_level = level;
        level = alpha * (y - s_prev) + (1.0 - alpha) * (prev_level + trend);
        trend = beta * (level - prev_level) + (1.0 - beta) * trend;
        seasonal[t % m] = gamma * (y - level) + (1.0 - gamma) * s_prev;
    }

    (level, trend, seasonal, sse)
}

pub fn fit_holt_winters(
    values: &[f64],
    period: usize,
    config: &SmoothingConfig,
    optimizer: &OptimizerConfig,
) -> Result<FittedHoltWinters, ModelError> {
    let n = values.len();
    if n < 2 * period {
        return Err(ModelError::InsufficientData {
            needed: 2 * period,
            got: n,
        });
    }
    check_finite(values)?;

    let initial = [config.initial_alpha, config.initial_beta, config.initial_gamma];
    let bounds = Bounds {
        lower: vec![config.min_param; 3],
        upper: vec![config.max_param, config.max_beta, config.max_param],
    };

    let min = nelder_mead(|p| filter(values, period, p).3, &initial, &bounds, optimizer);
    if !min.value.is_finite() || min.value == f64::MAX {
        return Err(ModelError::NonFinite("smoothing SSE".into()));
    }

    let (level, trend, seasonal, sse) = filter(values, period, &min.point);
    let fitted = FittedHoltWinters {
        alpha: min.point[0],
        beta: min.point[1],
        gamma: min.point[2],
        level,
        trend,
        seasonal,
        sse,
        n,
    };

    debug!(
        alpha = fitted.alpha,
        beta = fitted.beta,
        gamma = fitted.gamma,
        sse,
        iterations = min.iterations,
        "Exponential smoothing fit (Holt-Winters)"
    );

    Ok(fitted)
}

impl FittedHoltWinters {
    pub fn forecast_next(&self) -> Result<f64, ModelError> {
        let forecast = self.level + self.trend + self.seasonal[self.n % self.seasonal.len()];
        if forecast.is_finite() {
            Ok(forecast)
        } else {
            Err(ModelError::NonFinite("smoothing forecast".into()))
        }
    }
}

/// Fit the form chosen by series length and forecast one step ahead
pub fn forecast(
    values: &[f64],
    period: usize,
    seasonal_threshold: usize,
    config: &SmoothingConfig,
    optimizer: &OptimizerConfig,
) -> Result<f64, ModelError> {
    match SmoothingForm::for_length(values.len(), seasonal_threshold) {
        SmoothingForm::Holt => holt_forecast(values),
        SmoothingForm::HoltWintersAdditive => {
            fit_holt_winters(values, period, config, optimizer)?.forecast_next()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PATTERN: [f64; 12] = [5.0, -3.0, 2.0, 8.0, -6.0, 0.0, 4.0, -2.0, 1.0, -5.0, 3.0, -7.0];

    fn fit_default(values: &[f64]) -> Result<FittedHoltWinters, ModelError> {
        fit_holt_winters(
            values,
            12,
            &SmoothingConfig::default(),
            &OptimizerConfig::default(),
        )
    }

    fn noisy_line(n: usize) -> Vec<f64> {
        (0..n)
            .map(|t| 200.0 + 10.0 * t as f64 + ((t * 7) % 5) as f64 - 2.0)
            .collect()
    }

    #[test]
    fn test_form_selection() {
        assert_eq!(SmoothingForm::for_length(23, 24), SmoothingForm::Holt);
        assert_eq!(
            SmoothingForm::for_length(24, 24),
            SmoothingForm::HoltWintersAdditive
        );
    }

    #[test]
    fn test_holt_follows_a_trend() {
        let values = noisy_line(15);
        let forecast = holt_forecast(&values).unwrap();
        // The line reaches 350 at t = 15
        assert!((forecast - 350.0).abs() < 15.0, "forecast {}", forecast);
    }

    #[test]
    fn test_holt_needs_three_points() {
        assert_eq!(
            holt_forecast(&[3.0, 4.0]).unwrap_err(),
            ModelError::InsufficientData { needed: 3, got: 2 }
        );
    }

    #[test]
    fn test_holt_rejects_non_finite_input() {
        assert!(matches!(
            holt_forecast(&[1.0, f64::NAN, 3.0, 4.0]),
            Err(ModelError::NonFinite(_))
        ));
    }

    #[test]
    fn test_holt_winters_continues_a_pattern() {
        let values: Vec<f64> = (0..24).map(|t| 100.0 + PATTERN[t % 12]).collect();
        let fitted = fit_default(&values).unwrap();
        assert_eq!(fitted.seasonal.len(), 12);
        assert!((fitted.forecast_next().unwrap() - 105.0).abs() < 1e-6);
    }

    #[test]
    fn test_parameters_stay_in_bounds() {
        let values: Vec<f64> = (0..30)
            .map(|t| 50.0 + ((t * 17) % 13) as f64 * 4.0 + PATTERN[t % 12])
            .collect();
        let config = SmoothingConfig::default();
        let fitted = fit_default(&values).unwrap();
        assert!(fitted.alpha >= config.min_param && fitted.alpha <= config.max_param);
        assert!(fitted.beta >= config.min_param && fitted.beta <= config.max_beta);
        assert!(fitted.gamma >= config.min_param && fitted.gamma <= config.max_param);
        assert!(fitted.forecast_next().unwrap().is_finite());
    }

    #[test]
    fn test_seasonal_needs_two_cycles() {
        let values = vec![1.0; 20];
        assert_eq!(
            fit_default(&values).unwrap_err(),
            ModelError::InsufficientData { needed: 24, got: 20 }
        );
    }

    #[test]
    fn test_forecast_picks_form_by_length() {
        let config = SmoothingConfig::default();
        let optimizer = OptimizerConfig::default();

        // Below the seasonal threshold the pattern-free Holt path runs
        let short = noisy_line(18);
        let value = forecast(&short, 12, 24, &config, &optimizer).unwrap();
        assert!((value - 380.0).abs() < 15.0, "forecast {}", value);

        let seasonal: Vec<f64> = (0..24).map(|t| 100.0 + PATTERN[t % 12]).collect();
        let value = forecast(&seasonal, 12, 24, &config, &optimizer).unwrap();
        assert!((value - 105.0).abs() < 1e-6);
    }
}
