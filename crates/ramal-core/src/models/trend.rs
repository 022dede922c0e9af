//! Linear trend extrapolation for short histories
//!
//! Ordinary least squares of value on observation index, evaluated one step
//! past the last observation.

use crate::error::ModelError;

/// Fitted straight line `value = intercept + slope * index`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearTrend {
    pub intercept: f64,
    pub slope: f64,
}

impl LinearTrend {
    /// Fit a trend over indices `0..values.len()`
    ///
    /// A single observation gives a flat line through it.
    pub fn fit(values: &[f64]) -> Result<Self, ModelError> {
        let n = values.len();
        if n == 0 {
            return Err(ModelError::InsufficientData { needed: 1, got: 0 });
        }
        if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
            return Err(ModelError::NonFinite(format!("observation {}", bad)));
        }

        let nf = n as f64;
        let mean_x = (nf - 1.0) / 2.0;
        let mean_y = values.iter().sum::<f64>() / nf;

        let (sxy, sxx) = values
            .iter()
            .enumerate()
            .fold((0.0, 0.0), |(sxy, sxx), (i, &y)| {
                let dx = i as f64 - mean_x;
                (sxy + dx * (y - mean_y), sxx + dx * dx)
            });

        let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };
        let intercept = mean_y - slope * mean_x;

        if !slope.is_finite() || !intercept.is_finite() {
            return Err(ModelError::NonFinite("trend coefficients".into()));
        }

        Ok(Self { intercept, slope })
    }

    pub fn predict(&self, index: f64) -> f64 {
        self.intercept + self.slope * index
    }
}

/// Forecast the value at index `values.len()`
pub fn extrapolate(values: &[f64]) -> Result<f64, ModelError> {
    let trend = LinearTrend::fit(values)?;
    let forecast = trend.predict(values.len() as f64);

    tracing::debug!(
        n = values.len(),
        slope = trend.slope,
        intercept = trend.intercept,
        forecast,
        "Trend extrapolation"
    );

    if forecast.is_finite() {
        Ok(forecast)
    } else {
        Err(ModelError::NonFinite("trend forecast".into()))
    }
}
