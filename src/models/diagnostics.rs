//! Residual whiteness diagnostics for fitted models.

use statrs::distribution::{ChiSquared, ContinuousCDF};

use crate::correlogram::autocorrelation;
use crate::error::{PipelineError, Result};

/// Ljung-Box test outcome.
#[derive(Debug, Clone)]
pub struct LjungBoxResult {
    /// Q statistic.
    pub statistic: f64,
    /// Upper-tail p-value under the chi-squared reference distribution.
    pub p_value: f64,
    /// Number of autocorrelation lags pooled into the statistic.
    pub lags: usize,
    /// Degrees of freedom after subtracting fitted parameters.
    pub df: usize,
}

impl LjungBoxResult {
    /// Whether the residuals look like white noise at `threshold`.
    pub fn is_white_noise(&self, threshold: f64) -> bool {
        self.p_value > threshold
    }
}

/// Ljung-Box portmanteau test on model residuals.
///
/// # Arguments
/// * `residuals` - Residuals after the model's warm-up period
/// * `lags` - Number of autocorrelation lags pooled into the statistic
/// * `fitted_params` - AR plus MA coefficients of the model that produced
///   the residuals; subtracted from `lags` for the degrees of freedom
///
/// # Returns
/// The Q statistic and its upper-tail chi-squared p-value.
pub fn ljung_box(residuals: &[f64], lags: usize, fitted_params: usize) -> Result<LjungBoxResult> {
    let n = residuals.len();
    if lags == 0 {
        return Err(PipelineError::InvalidParameter(
            "ljung_box requires at least one lag".to_string(),
        ));
    }
    if n <= lags + 1 {
        return Err(PipelineError::InsufficientData {
            needed: lags + 2,
            got: n,
        });
    }
    if fitted_params >= lags {
        return Err(PipelineError::InvalidParameter(format!(
            "ljung_box needs lags ({lags}) > fitted parameters ({fitted_params})"
        )));
    }

    let acf = autocorrelation(residuals, lags)?;
    let n_f = n as f64;
    let statistic = n_f
        * (n_f + 2.0)
        * (1..=lags)
            .map(|k| acf[k].powi(2) / (n_f - k as f64))
            .sum::<f64>();

    let df = lags - fitted_params;
    let chi2 = ChiSquared::new(df as f64)
        .map_err(|e| PipelineError::Computation(e.to_string()))?;
    let p_value = 1.0 - chi2.cdf(statistic);

    Ok(LjungBoxResult {
        statistic,
        p_value,
        lags,
        df,
    })
}
