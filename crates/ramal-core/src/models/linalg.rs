//! Small dense least-squares helpers

use crate::error::ModelError;

/// Solve `a * x = b` by Gaussian elimination with partial pivoting.
///
/// `a` is row-major `n x n`.
pub(crate) fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>, ModelError> {
    let n = b.len();
    let scale = a
        .iter()
        .flat_map(|row| row.iter())
        .fold(0.0_f64, |acc, v| acc.max(v.abs()))
        .max(1.0);

    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| {
                a[i][col]
                    .abs()
                    .partial_cmp(&a[j][col].abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or(col);

        if !(a[pivot][col].abs() > 1e-12 * scale) {
            return Err(ModelError::Singular(format!(
                "matrix is singular at column {}",
                col
            )));
        }

        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in col + 1..n {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }

    if x.iter().any(|v| !v.is_finite()) {
        return Err(ModelError::NonFinite("least-squares solution".into()));
    }
    Ok(x)
}

/// Penalized least squares: minimize `|X beta - y|^2 + sum(penalty_j * beta_j^2)`
pub(crate) fn ridge(
    design: &[Vec<f64>],
    y: &[f64],
    penalties: &[f64],
) -> Result<Vec<f64>, ModelError> {
    let k = penalties.len();
    let mut xtx = vec![vec![0.0; k]; k];
    let mut xty = vec![0.0; k];

    for (row, &target) in design.iter().zip(y.iter()) {
        for i in 0..k {
            xty[i] += row[i] * target;
            for j in i..k {
                xtx[i][j] += row[i] * row[j];
            }
        }
    }
    for i in 0..k {
        for j in 0..i {
            xtx[i][j] = xtx[j][i];
        }
        xtx[i][i] += penalties[i];
    }

    solve(xtx, xty)
}
