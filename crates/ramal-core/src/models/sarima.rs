//! Multiplicative seasonal ARIMA, SARIMA(p,d,q)(P,D,Q)s
//!
//! The series is differenced by `(1-B)^d (1-B^s)^D`, then an ARMA model with
//! polynomials `(1 - phi(B))(1 - Phi(B^s))` and `(1 + theta(B))(1 + Theta(B^s))`
//! is fit by conditional Gaussian maximum likelihood: with pre-sample values
//! fixed at zero and the innovation variance concentrated out, maximizing the
//! likelihood is the same as minimizing the sum of squared one-step
//! innovations. Stationarity and invertibility are not enforced; coefficients
//! only have to stay inside the configured box.
//!
//! A history no longer than the differencing lag leaves nothing to estimate
//! from. Such a series keeps zero coefficients and is forecast by integrating
//! a zero differenced step, using only the differencing factors whose lags
//! fall inside the history.

use tracing::{debug, warn};

use crate::config::{ArimaOrder, OptimizerConfig, SarimaConfig};
use crate::error::ModelError;

use super::optimizer::{nelder_mead, Bounds};

/// Model specification
#[derive(Debug, Clone, PartialEq)]
pub struct Sarima {
    pub order: ArimaOrder,
    pub seasonal_order: ArimaOrder,
    pub period: usize,
}

/// Estimated coefficients and fit diagnostics
#[derive(Debug, Clone, PartialEq)]
pub struct FittedSarima {
    pub ar: Vec<f64>,
    pub seasonal_ar: Vec<f64>,
    pub ma: Vec<f64>,
    pub seasonal_ma: Vec<f64>,
    /// Innovation variance estimate
    pub sigma2: f64,
    /// Conditional log-likelihood, `None` for a perfect fit
    pub log_likelihood: Option<f64>,
    pub converged: bool,
    /// False when the history was too short to estimate coefficients
    pub estimated: bool,
    spec: Sarima,
    /// Original observations, needed to undo differencing
    history: Vec<f64>,
    differenced: Vec<f64>,
    residuals: Vec<f64>,
}

/// Product of two polynomials in the backshift operator (index = lag)
fn poly_mul(a: &[f64], b: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, &x) in a.iter().enumerate() {
        for (j, &y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}

/// `1 + sign * (c_1 B^step + c_2 B^{2 step} + ...)`
fn lag_polynomial(coeffs: &[f64], step: usize, sign: f64) -> Vec<f64> {
    let mut poly = vec![0.0; coeffs.len() * step + 1];
    poly[0] = 1.0;
    for (i, &c) in coeffs.iter().enumerate() {
        poly[(i + 1) * step] = sign * c;
    }
    poly
}

/// `(1-B)^d (1-B^s)^D`
fn differencing_polynomial(d: usize, seasonal_d: usize, period: usize) -> Vec<f64> {
    let mut poly = vec![1.0];
    for _ in 0..d {
        poly = poly_mul(&poly, &[1.0, -1.0]);
    }
    for _ in 0..seasonal_d {
        poly = poly_mul(&poly, &lag_polynomial(&[1.0], period, -1.0));
    }
    poly
}

/// One-step innovations with zero pre-sample values
fn innovations(w: &[f64], ar_poly: &[f64], ma_poly: &[f64]) -> Vec<f64> {
    let mut e = vec![0.0; w.len()];
    for t in 0..w.len() {
        let ar_part: f64 = ar_poly
            .iter()
            .enumerate()
            .take(t + 1)
            .map(|(i, &a)| a * w[t - i])
            .sum();
        let ma_part: f64 = ma_poly
            .iter()
            .enumerate()
            .skip(1)
            .take(t)
            .map(|(j, &m)| m * e[t - j])
            .sum();
        e[t] = ar_part - ma_part;
    }
    e
}

struct Polynomials {
    ar: Vec<f64>,
    ma: Vec<f64>,
}

impl Sarima {
    pub fn new(config: &SarimaConfig, period: usize) -> Self {
        Self {
            order: config.order,
            seasonal_order: config.seasonal_order,
            period,
        }
    }

    fn n_params(&self) -> usize {
        self.order.p + self.seasonal_order.p + self.order.q + self.seasonal_order.q
    }

    /// Observations consumed by differencing
    fn differencing_lag(&self) -> usize {
        self.order.d + self.seasonal_order.d * self.period
    }

    /// Drop seasonal, then regular, differencing until every lag of the
    /// differencing polynomial points inside `n` observations
    fn truncated_differencing(&self, n: usize) -> Sarima {
        let mut spec = self.clone();
        while spec.differencing_lag() > n && spec.seasonal_order.d > 0 {
            spec.seasonal_order.d -= 1;
        }
        while spec.differencing_lag() > n && spec.order.d > 0 {
            spec.order.d -= 1;
        }
        spec
    }

    /// Split a flat parameter vector into (ar, seasonal_ar, ma, seasonal_ma)
    fn unpack<'a>(&self, params: &'a [f64]) -> [&'a [f64]; 4] {
        let (ar, rest) = params.split_at(self.order.p);
        let (sar, rest) = rest.split_at(self.seasonal_order.p);
        let (ma, sma) = rest.split_at(self.order.q);
        [ar, sar, ma, sma]
    }

    fn polynomials(&self, params: &[f64]) -> Polynomials {
        let [ar, sar, ma, sma] = self.unpack(params);
        Polynomials {
            ar: poly_mul(
                &lag_polynomial(ar, 1, -1.0),
                &lag_polynomial(sar, self.period, -1.0),
            ),
            ma: poly_mul(
                &lag_polynomial(ma, 1, 1.0),
                &lag_polynomial(sma, self.period, 1.0),
            ),
        }
    }

    pub fn fit(
        &self,
        values: &[f64],
        config: &SarimaConfig,
        optimizer: &OptimizerConfig,
    ) -> Result<FittedSarima, ModelError> {
        let n = values.len();
        if n == 0 {
            return Err(ModelError::InsufficientData { needed: 1, got: 0 });
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ModelError::NonFinite("observation".into()));
        }
        if n <= self.differencing_lag() {
            return Ok(self.unestimated(values));
        }

        let diff_poly = differencing_polynomial(self.order.d, self.seasonal_order.d, self.period);
        let lag = diff_poly.len() - 1;
        let differenced: Vec<f64> = (lag..n)
            .map(|t| {
                diff_poly
                    .iter()
                    .enumerate()
                    .map(|(k, &c)| c * values[t - k])
                    .sum()
            })
            .collect();

        let sse = |params: &[f64]| -> f64 {
            let polys = self.polynomials(params);
            innovations(&differenced, &polys.ar, &polys.ma)
                .iter()
                .map(|e| e * e)
                .sum()
        };

        let k = self.n_params();
        let initial = vec![config.initial_value; k];
        let bounds = Bounds::uniform(k, -config.param_bound, config.param_bound);
        let min = nelder_mead(sse, &initial, &bounds, optimizer);

        if !min.value.is_finite() || min.value == f64::MAX {
            return Err(ModelError::NonFinite("conditional likelihood".into()));
        }
        if !min.converged {
            warn!(
                iterations = min.iterations,
                "SARIMA optimizer hit the iteration limit before converging"
            );
        }

        let m = differenced.len() as f64;
        let sigma2 = min.value / m;
        let log_likelihood = if sigma2 > 0.0 {
            Some(-0.5 * m * ((2.0 * std::f64::consts::PI * sigma2).ln() + 1.0))
        } else {
            None
        };

        let polys = self.polynomials(&min.point);
        let residuals = innovations(&differenced, &polys.ar, &polys.ma);
        let [ar, sar, ma, sma] = self.unpack(&min.point);

        let fitted = FittedSarima {
            ar: ar.to_vec(),
            seasonal_ar: sar.to_vec(),
            ma: ma.to_vec(),
            seasonal_ma: sma.to_vec(),
            sigma2,
            log_likelihood,
            converged: min.converged,
            estimated: true,
            spec: self.clone(),
            history: values.to_vec(),
            differenced,
            residuals,
        };

        debug!(
            ar = ?fitted.ar,
            seasonal_ar = ?fitted.seasonal_ar,
            ma = ?fitted.ma,
            seasonal_ma = ?fitted.seasonal_ma,
            sigma2,
            log_likelihood = ?log_likelihood,
            iterations = min.iterations,
            "SARIMA fit"
        );

        Ok(fitted)
    }

    fn unestimated(&self, values: &[f64]) -> FittedSarima {
        let spec = self.truncated_differencing(values.len());
        warn!(
            observations = values.len(),
            d = spec.order.d,
            seasonal_d = spec.seasonal_order.d,
            "Too few observations to estimate SARIMA coefficients, forecasting from differencing alone"
        );

        FittedSarima {
            ar: vec![0.0; self.order.p],
            seasonal_ar: vec![0.0; self.seasonal_order.p],
            ma: vec![0.0; self.order.q],
            seasonal_ma: vec![0.0; self.seasonal_order.q],
            sigma2: 0.0,
            log_likelihood: None,
            converged: true,
            estimated: false,
            spec,
            history: values.to_vec(),
            differenced: Vec::new(),
            residuals: Vec::new(),
        }
    }
}

impl FittedSarima {
    /// One-step-ahead forecast on the original scale
    pub fn forecast_next(&self) -> Result<f64, ModelError> {
        let mut params = Vec::new();
        params.extend_from_slice(&self.ar);
        params.extend_from_slice(&self.seasonal_ar);
        params.extend_from_slice(&self.ma);
        params.extend_from_slice(&self.seasonal_ma);
        let polys = self.spec.polynomials(&params);

        let w = &self.differenced;
        let e = &self.residuals;
        let m = w.len();

        let ar_part: f64 = polys
            .ar
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(i, _)| *i <= m)
            .map(|(i, &a)| a * w[m - i])
            .sum();
        let ma_part: f64 = polys
            .ma
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(j, _)| *j <= m)
            .map(|(j, &c)| c * e[m - j])
            .sum();
        let w_next = ma_part - ar_part;

        // Undo differencing: y_n = w_n - sum_{k>=1} c_k y_{n-k}
        let diff_poly = differencing_polynomial(
            self.spec.order.d,
            self.spec.seasonal_order.d,
            self.spec.period,
        );
        let n = self.history.len();
        let carried: f64 = diff_poly
            .iter()
            .enumerate()
            .skip(1)
            .map(|(k, &c)| c * self.history[n - k])
            .sum();
        let forecast = w_next - carried;

        if forecast.is_finite() {
            Ok(forecast)
        } else {
            Err(ModelError::NonFinite("SARIMA forecast".into()))
        }
    }
}

/// Fit the configured SARIMA and forecast one step ahead
pub fn forecast(
    values: &[f64],
    config: &SarimaConfig,
    optimizer: &OptimizerConfig,
    period: usize,
) -> Result<f64, ModelError> {
    Sarima::new(config, period)
        .fit(values, config, optimizer)?
        .forecast_next()
}
