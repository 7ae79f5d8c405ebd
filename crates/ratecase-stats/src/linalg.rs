//! Dense linear algebra helpers for small regressions.

use crate::error::{Result, StatsError};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis, s};

const PIVOT_TOLERANCE: f64 = 1e-12;

/// Invert a square matrix by Gauss-Jordan elimination with partial pivoting.
///
/// Pivots are compared against a tolerance scaled by the largest absolute
/// entry, so badly conditioned design matrices are reported as
/// [`StatsError::SingularMatrix`].
pub fn invert(matrix: &Array2<f64>) -> Result<Array2<f64>> {
    let n = matrix.nrows();
    if n != matrix.ncols() {
        return Err(StatsError::InvalidSelector(format!(
            "cannot invert a {}x{} matrix",
            n,
            matrix.ncols()
        )));
    }

    let scale = matrix.iter().fold(0.0_f64, |m, v| m.max(v.abs())).max(1.0);
    let mut a = matrix.clone();
    let mut inv = Array2::<f64>::eye(n);

    for col in 0..n {
        let pivot_row = (col..n)
            .max_by(|&i, &j| a[[i, col]].abs().total_cmp(&a[[j, col]].abs()))
            .unwrap_or(col);
        if a[[pivot_row, col]].abs() <= PIVOT_TOLERANCE * scale {
            return Err(StatsError::SingularMatrix);
        }
        if pivot_row != col {
            for k in 0..n {
                a.swap([col, k], [pivot_row, k]);
                inv.swap([col, k], [pivot_row, k]);
            }
        }

        let pivot = a[[col, col]];
        for k in 0..n {
            a[[col, k]] /= pivot;
            inv[[col, k]] /= pivot;
        }

        for row in 0..n {
            if row == col {
                continue;
            }
            let factor = a[[row, col]];
            if factor == 0.0 {
                continue;
            }
            for k in 0..n {
                a[[row, k]] -= factor * a[[col, k]];
                inv[[row, k]] -= factor * inv[[col, k]];
            }
        }
    }

    Ok(inv)
}

/// Prepend a column of ones.
pub fn add_constant(x: ArrayView2<'_, f64>) -> Array2<f64> {
    let mut out = Array2::<f64>::ones((x.nrows(), x.ncols() + 1));
    out.slice_mut(s![.., 1..]).assign(&x);
    out
}

/// Euclidean norm of each column, with zero columns left unscaled.
fn column_norms(x: ArrayView2<'_, f64>) -> Array1<f64> {
    x.map_axis(Axis(0), |c| {
        let norm = c.dot(&c).sqrt();
        if norm > 0.0 { norm } else { 1.0 }
    })
}

/// Least-squares coefficients and `(X'X)^-1`.
///
/// Columns are scaled to unit norm before the normal equations are formed,
/// so regressors measured in customers and in dollars of rate base do not
/// swamp each other. Coefficients and the inverse are mapped back to the
/// original units.
pub fn least_squares(
    x: ArrayView2<'_, f64>,
    y: ArrayView1<'_, f64>,
) -> Result<(Array1<f64>, Array2<f64>)> {
    let norms = column_norms(x);
    let scaled = &x / &norms;
    let xtx = scaled.t().dot(&scaled);
    let scaled_inv = invert(&xtx)?;
    let beta = scaled_inv.dot(&scaled.t().dot(&y)) / &norms;
    let k = norms.len();
    let xtx_inv = Array2::from_shape_fn((k, k), |(i, j)| scaled_inv[[i, j]] / (norms[i] * norms[j]));
    Ok((beta, xtx_inv))
}

/// Centered coefficient of determination of fitted values against `y`.
pub fn r_squared(y: ArrayView1<'_, f64>, fitted: ArrayView1<'_, f64>) -> f64 {
    let mean = y.mean().unwrap_or(0.0);
    let ssr: f64 = y.iter().zip(fitted).map(|(a, b)| (a - b).powi(2)).sum();
    let tss: f64 = y.iter().map(|a| (a - mean).powi(2)).sum();
    if tss == 0.0 { 0.0 } else { 1.0 - ssr / tss }
}
