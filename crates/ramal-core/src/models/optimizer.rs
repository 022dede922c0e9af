//! Bounded Nelder-Mead simplex minimizer
//!
//! Deterministic: the initial simplex is derived from the starting point and
//! the bounds only, so repeated fits of the same data give the same result.

use std::cmp::Ordering;

use crate::config::OptimizerConfig;

/// Box constraints, one (lower, upper) pair per dimension
#[derive(Debug, Clone)]
pub(crate) struct Bounds {
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

impl Bounds {
    /// Same interval for every dimension
    pub fn uniform(dim: usize, lower: f64, upper: f64) -> Self {
        Self {
            lower: vec![lower; dim],
            upper: vec![upper; dim],
        }
    }

    fn clamp(&self, point: &mut [f64]) {
        for (i, v) in point.iter_mut().enumerate() {
            *v = v.clamp(self.lower[i], self.upper[i]);
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Minimum {
    pub point: Vec<f64>,
    pub value: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// Objective values that are NaN or infinite rank worst
fn sanitize(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        f64::MAX
    }
}

fn by_value(values: &[f64]) -> impl Fn(&usize, &usize) -> Ordering + '_ {
    move |&a, &b| values[a].partial_cmp(&values[b]).unwrap_or(Ordering::Equal)
}

pub(crate) fn nelder_mead<F>(
    f: F,
    initial: &[f64],
    bounds: &Bounds,
    config: &OptimizerConfig,
) -> Minimum
where
    F: Fn(&[f64]) -> f64,
{
    let eval = |p: &[f64]| sanitize(f(p));
    let dim = initial.len();
    let n = dim + 1;

    let mut start = initial.to_vec();
    bounds.clamp(&mut start);

    let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(n);
    simplex.push(start.clone());
    for i in 0..dim {
        let mut vertex = start.clone();
        let step = (bounds.upper[i] - bounds.lower[i]) * 0.1;
        vertex[i] = (vertex[i] + step).min(bounds.upper[i]);
        if (vertex[i] - start[i]).abs() < 1e-12 {
            vertex[i] = (vertex[i] - step).max(bounds.lower[i]);
        }
        simplex.push(vertex);
    }

    let mut values: Vec<f64> = simplex.iter().map(|v| eval(v)).collect();
    let mut iterations = 0;
    let mut converged = dim == 0;

    while !converged && iterations < config.max_iter {
        iterations += 1;

        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(by_value(&values));
        let best_idx = order[0];
        let worst_idx = order[n - 1];
        let second_worst_idx = order[n - 2];

        let diameter = simplex[best_idx]
            .iter()
            .zip(simplex[worst_idx].iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0_f64, f64::max);
        if diameter < config.tolerance {
            converged = true;
            break;
        }

        let mut centroid = vec![0.0; dim];
        for &idx in &order[..n - 1] {
            for (c, x) in centroid.iter_mut().zip(simplex[idx].iter()) {
                *c += x;
            }
        }
        for c in centroid.iter_mut() {
            *c /= (n - 1) as f64;
        }

        let towards = |from: &[f64], scale: f64| -> Vec<f64> {
            let mut p: Vec<f64> = centroid
                .iter()
                .zip(from.iter())
                .map(|(&c, &x)| c + scale * (x - c))
                .collect();
            bounds.clamp(&mut p);
            p
        };

        let reflected = towards(&simplex[worst_idx], -1.0);
        let f_reflected = eval(&reflected);

        if f_reflected < values[best_idx] {
            let expanded = towards(&simplex[worst_idx], -2.0);
            let f_expanded = eval(&expanded);
            if f_expanded < f_reflected {
                simplex[worst_idx] = expanded;
                values[worst_idx] = f_expanded;
            } else {
                simplex[worst_idx] = reflected;
                values[worst_idx] = f_reflected;
            }
        } else if f_reflected < values[second_worst_idx] {
            simplex[worst_idx] = reflected;
            values[worst_idx] = f_reflected;
        } else {
            // Outside contraction when the reflection helped at all, inside otherwise
            let (contracted, f_reference) = if f_reflected < values[worst_idx] {
                (towards(&reflected, 0.5), f_reflected)
            } else {
                (towards(&simplex[worst_idx], 0.5), values[worst_idx])
            };
            let f_contracted = eval(&contracted);

            if f_contracted < f_reference {
                simplex[worst_idx] = contracted;
                values[worst_idx] = f_contracted;
            } else {
                let best_point = simplex[best_idx].clone();
                for &idx in &order[1..] {
                    for (x, b) in simplex[idx].iter_mut().zip(best_point.iter()) {
                        *x = 0.5 * (*x + b);
                    }
                    bounds.clamp(&mut simplex[idx]);
                    values[idx] = eval(&simplex[idx]);
                }
            }
        }
    }

    let best_idx = (0..n).min_by(by_value(&values)).unwrap_or(0);

    Minimum {
        point: simplex[best_idx].clone(),
        value: values[best_idx],
        iterations,
        converged,
    }
}
