//! Ordinary least squares on an explicit design matrix.
//!
//! Used by the stationarity tester (ADF regression) and the correlogram
//! analyzer (OLS partial autocorrelations). Solves the normal equations
//! with a Cholesky decomposition.

use crate::error::{PipelineError, Result};

/// Fitted OLS regression.
#[derive(Debug, Clone)]
pub struct LeastSquaresFit {
    /// Coefficients, one per design-matrix column.
    pub coefficients: Vec<f64>,
    /// Standard error of each coefficient.
    pub standard_errors: Vec<f64>,
    /// Residual sum of squares.
    pub rss: f64,
    /// Unbiased residual variance estimate, RSS / (n - k).
    pub residual_variance: f64,
    /// Number of observations.
    pub n: usize,
}

/// Fit `y = X beta` where `columns` are the columns of X.
///
/// # Arguments
/// * `y` - Response vector
/// * `columns` - Design-matrix columns; each must have the same length as
///   `y`, and there must be more observations than columns
///
/// # Returns
/// Coefficients, standard errors, and residual statistics.
pub fn least_squares(y: &[f64], columns: &[Vec<f64>]) -> Result<LeastSquaresFit> {
    let n = y.len();
    let k = columns.len();

    if k == 0 {
        return Err(PipelineError::InvalidParameter(
            "least squares requires at least one regressor".to_string(),
        ));
    }
    if n <= k {
        return Err(PipelineError::InsufficientData { needed: k + 1, got: n });
    }
    for col in columns {
        if col.len() != n {
            return Err(PipelineError::DimensionMismatch {
                expected: n,
                got: col.len(),
            });
        }
    }

    // Normal equations: (X'X) beta = X'y
    let mut xtx = vec![vec![0.0; k]; k];
    let mut xty = vec![0.0; k];
    for i in 0..k {
        for j in i..k {
            let dot: f64 = columns[i]
                .iter()
                .zip(columns[j].iter())
                .map(|(a, b)| a * b)
                .sum();
            xtx[i][j] = dot;
            xtx[j][i] = dot;
        }
        xty[i] = columns[i].iter().zip(y.iter()).map(|(a, b)| a * b).sum();
    }

    let chol = cholesky(&xtx)?;
    let coefficients = cholesky_solve(&chol, &xty);

    // Residuals and their variance
    let mut rss = 0.0;
    for obs in 0..n {
        let mut fitted = 0.0;
        for (j, col) in columns.iter().enumerate() {
            fitted += coefficients[j] * col[obs];
        }
        let r = y[obs] - fitted;
        rss += r * r;
    }
    let residual_variance = rss / (n - k) as f64;

    // se(beta_j) = sqrt(s^2 * [(X'X)^-1]_jj), diagonal obtained by solving
    // against unit vectors.
    let mut standard_errors = Vec::with_capacity(k);
    for j in 0..k {
        let mut e = vec![0.0; k];
        e[j] = 1.0;
        let col = cholesky_solve(&chol, &e);
        standard_errors.push((residual_variance * col[j]).sqrt());
    }

    Ok(LeastSquaresFit {
        coefficients,
        standard_errors,
        rss,
        residual_variance,
        n,
    })
}

/// Cholesky factorization of a symmetric positive-definite matrix.
fn cholesky(matrix: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
    let k = matrix.len();
    let mut lower = vec![vec![0.0; k]; k];

    for i in 0..k {
        for j in 0..=i {
            let mut sum = matrix[i][j];
            for m in 0..j {
                sum -= lower[i][m] * lower[j][m];
            }
            if i == j {
                // An exactly collinear design leaves a pivot that is zero up
                // to roundoff; compare against the diagonal's scale, not 0.
                if sum <= 1e-10 * matrix[i][i].abs() {
                    return Err(PipelineError::Computation(
                        "design matrix is singular or not positive definite".to_string(),
                    ));
                }
                lower[i][j] = sum.sqrt();
            } else {
                lower[i][j] = sum / lower[j][j];
            }
        }
    }

    Ok(lower)
}

/// Solve `L L' x = b` by forward then backward substitution.
fn cholesky_solve(lower: &[Vec<f64>], b: &[f64]) -> Vec<f64> {
    let k = lower.len();

    let mut z = vec![0.0; k];
    for i in 0..k {
        let mut sum = b[i];
        for m in 0..i {
            sum -= lower[i][m] * z[m];
        }
        z[i] = sum / lower[i][i];
    }

    let mut x = vec![0.0; k];
    for i in (0..k).rev() {
        let mut sum = z[i];
        for m in (i + 1)..k {
            sum -= lower[m][i] * x[m];
        }
        x[i] = sum / lower[i][i];
    }

    x
}
