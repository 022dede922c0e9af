//! Additive trend + yearly seasonality decomposition
//!
//! A piecewise-linear trend with potential changepoints plus a Fourier series
//! for yearly seasonality, fitted as a single penalized regression. Gaussian
//! priors on the coefficients become ridge penalties of `1 / scale^2`, so the
//! fit is the MAP estimate with the target scaled to unit maximum magnitude.
//!
//! Yearly seasonality is only included when the history covers at least
//! `min_seasonal_span_days` days; a shorter history cannot tell a yearly cycle
//! from trend.

use chrono::NaiveDate;
use tracing::debug;

use crate::aggregate::CategorySeries;
use crate::config::DecompositionConfig;
use crate::error::ModelError;

use super::linalg::ridge;

/// Reference date for the Fourier phase
fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or(NaiveDate::MIN)
}

#[derive(Debug, Clone, PartialEq)]
pub struct FittedDecomposition {
    /// Changepoint locations, in days since the first observation
    pub changepoints: Vec<f64>,
    pub yearly_seasonality: bool,
    /// Regression coefficients on the scaled target
    pub coefficients: Vec<f64>,
    start: NaiveDate,
    span_days: f64,
    y_scale: f64,
    fourier_order: usize,
    yearly_period_days: f64,
}

impl FittedDecomposition {
    fn features(&self, date: NaiveDate) -> Vec<f64> {
        let days = (date - self.start).num_days() as f64;
        let t = days / self.span_days;

        let mut row = Vec::with_capacity(self.coefficients.len());
        row.push(1.0);
        row.push(t);
        for &cp in &self.changepoints {
            row.push((t - cp / self.span_days).max(0.0));
        }
        if self.yearly_seasonality {
            let phase_days = (date - epoch()).num_days() as f64;
            for k in 1..=self.fourier_order {
                let angle =
                    2.0 * std::f64::consts::PI * k as f64 * phase_days / self.yearly_period_days;
                row.push(angle.sin());
                row.push(angle.cos());
            }
        }
        row
    }

    /// Fitted value at an arbitrary date, in the original units
    pub fn predict(&self, date: NaiveDate) -> f64 {
        self.features(date)
            .iter()
            .zip(self.coefficients.iter())
            .map(|(x, b)| x * b)
            .sum::<f64>()
            * self.y_scale
    }
}

/// Changepoints at evenly spaced observations in the first `range` fraction
fn changepoint_days(days: &[f64], n_changepoints: usize, range: f64) -> Vec<f64> {
    let hist_size = (days.len() as f64 * range).floor() as usize;
    let n_cp = n_changepoints.min(hist_size.saturating_sub(1));
    if n_cp == 0 {
        return Vec::new();
    }
    let last = (hist_size - 1) as f64;
    (1..=n_cp)
        .map(|i| {
            let idx = (last * i as f64 / n_cp as f64).round() as usize;
            days[idx]
        })
        .collect()
}

pub fn fit(
    series: &CategorySeries,
    config: &DecompositionConfig,
) -> Result<FittedDecomposition, ModelError> {
    let n = series.len();
    if n < 2 {
        return Err(ModelError::InsufficientData { needed: 2, got: n });
    }
    let values = series.values();
    if values.iter().any(|v| !v.is_finite()) {
        return Err(ModelError::NonFinite("observation".into()));
    }

    let timestamps = series.timestamps();
    let start = timestamps[0];
    let days: Vec<f64> = timestamps
        .iter()
        .map(|d| (*d - start).num_days() as f64)
        .collect();
    let span = days[n - 1];
    if !(span > 0.0) {
        return Err(ModelError::Singular("history spans zero days".into()));
    }

    let max_abs = values.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    let y_scale = if max_abs > 0.0 { max_abs } else { 1.0 };
    let y: Vec<f64> = values.iter().map(|v| v / y_scale).collect();

    let mut fitted = FittedDecomposition {
        changepoints: changepoint_days(&days, config.n_changepoints, config.changepoint_range),
        yearly_seasonality: span >= config.min_seasonal_span_days as f64,
        coefficients: Vec::new(),
        start,
        span_days: span,
        y_scale,
        fourier_order: config.fourier_order,
        yearly_period_days: config.yearly_period_days,
    };

    let design: Vec<Vec<f64>> = timestamps.iter().map(|d| fitted.features(*d)).collect();

    let trend_penalty = 1.0 / config.trend_prior_scale.powi(2);
    let mut penalties = vec![trend_penalty, trend_penalty];
    penalties.extend(
        std::iter::repeat(1.0 / config.changepoint_prior_scale.powi(2))
            .take(fitted.changepoints.len()),
    );
    if fitted.yearly_seasonality {
        penalties.extend(
            std::iter::repeat(1.0 / config.seasonality_prior_scale.powi(2))
                .take(2 * config.fourier_order),
        );
    }

    fitted.coefficients = ridge(&design, &y, &penalties)?;

    debug!(
        n,
        changepoints = fitted.changepoints.len(),
        yearly_seasonality = fitted.yearly_seasonality,
        "Decomposition fit"
    );

    Ok(fitted)
}

/// Fit and predict the first day of the month after the last observation
pub fn forecast(series: &CategorySeries, config: &DecompositionConfig) -> Result<f64, ModelError> {
    let target = series
        .last_period()
        .map(|p| p.succ().first_day())
        .ok_or(ModelError::InsufficientData { needed: 2, got: 0 })?;
    let forecast = fit(series, config)?.predict(target);
    if forecast.is_finite() {
        Ok(forecast)
    } else {
        Err(ModelError::NonFinite("decomposition forecast".into()))
    }
}
