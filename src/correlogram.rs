//! Autocorrelation and partial autocorrelation, with order selection
//! from confidence-band crossings.

use statrs::distribution::{ContinuousCDF, Normal};

use crate::core::TimeSeries;
use crate::error::{PipelineError, Result};
use crate::utils::{least_squares, stats};

/// Point where a correlation curve falls through its confidence bound,
/// located by linear interpolation between the straddling lags.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrossingPoint {
    /// Fractional lag of the crossing.
    pub lag: f64,
    /// Bound value the curve crossed.
    pub bound: f64,
}

/// ACF and PACF of a series out to a maximum lag, together with the
/// confidence bound used to read model orders off the curves.
#[derive(Debug, Clone)]
pub struct Correlogram {
    acf: Vec<f64>,
    pacf: Vec<f64>,
    confidence_bound: f64,
    max_lag: usize,
}

impl Correlogram {
    /// Compute both correlation functions for lags `0..=max_lag`.
    ///
    /// # Arguments
    /// * `series` - Series to analyze (should already be stationary)
    /// * `max_lag` - Deepest lag computed for both curves
    /// * `significance` - Two-sided level for the confidence bound
    /// * `bound_scale` - When set, replaces the normal quantile in the
    ///   bound outright, for callers that want a wider hand-tuned band
    ///
    /// # Returns
    /// The correlogram, with the confidence bound `z / sqrt(n)`.
    pub fn compute(
        series: &TimeSeries,
        max_lag: usize,
        significance: f64,
        bound_scale: Option<f64>,
    ) -> Result<Self> {
        if max_lag == 0 {
            return Err(PipelineError::InvalidParameter(
                "max_lag must be at least 1".to_string(),
            ));
        }
        let values = series.values();
        let n = values.len();
        // The deepest PACF regression has max_lag + 1 unknowns and
        // n - max_lag rows; insist on at least one residual degree of
        // freedom.
        let needed = 2 * max_lag + 2;
        if n < needed {
            return Err(PipelineError::InsufficientData { needed, got: n });
        }

        let scale = match bound_scale {
            Some(s) => s,
            None => {
                if !(0.0..1.0).contains(&significance) || significance <= 0.0 {
                    return Err(PipelineError::InvalidParameter(format!(
                        "significance must lie in (0, 1), got {significance}"
                    )));
                }
                let normal = Normal::new(0.0, 1.0)
                    .map_err(|e| PipelineError::Computation(e.to_string()))?;
                normal.inverse_cdf(1.0 - significance / 2.0)
            }
        };
        let confidence_bound = scale / (n as f64).sqrt();

        Ok(Self {
            acf: autocorrelation(values, max_lag)?,
            pacf: partial_autocorrelation(values, max_lag)?,
            confidence_bound,
            max_lag,
        })
    }

    /// Autocorrelation values, index = lag, `acf[0] == 1`.
    pub fn acf(&self) -> &[f64] {
        &self.acf
    }

    /// Partial autocorrelation values, index = lag, `pacf[0] == 1`.
    pub fn pacf(&self) -> &[f64] {
        &self.pacf
    }

    /// Upper confidence bound both curves are read against.
    pub fn confidence_bound(&self) -> f64 {
        self.confidence_bound
    }

    /// All crossings of the ACF through the bound, in lag order.
    pub fn acf_crossings(&self) -> Vec<CrossingPoint> {
        find_crossings(&self.acf, self.confidence_bound)
    }

    /// All crossings of the PACF through the bound, in lag order.
    pub fn pacf_crossings(&self) -> Vec<CrossingPoint> {
        find_crossings(&self.pacf, self.confidence_bound)
    }

    /// MA order `q`: the first ACF crossing, rounded to the nearest lag.
    pub fn moving_average_order(&self) -> Result<usize> {
        select_order(&self.acf_crossings(), self.max_lag)
    }

    /// AR order `p`: the first PACF crossing, rounded to the nearest lag.
    pub fn autoregressive_order(&self) -> Result<usize> {
        select_order(&self.pacf_crossings(), self.max_lag)
    }
}

/// Sample autocorrelation with the full-sample mean and variance in the
/// denominator.
pub(crate) fn autocorrelation(values: &[f64], max_lag: usize) -> Result<Vec<f64>> {
    let n = values.len();
    let mean = stats::mean(values);
    let denom: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    if denom == 0.0 {
        return Err(PipelineError::Computation(
            "autocorrelation undefined for a constant series".to_string(),
        ));
    }

    let mut acf = Vec::with_capacity(max_lag + 1);
    acf.push(1.0);
    for k in 1..=max_lag {
        let num: f64 = (k..n)
            .map(|t| (values[t] - mean) * (values[t - k] - mean))
            .sum();
        acf.push(num / denom);
    }
    Ok(acf)
}

/// Partial autocorrelation by ordinary least squares: `pacf[k]` is the
/// coefficient on lag `k` in a regression of the series on its first `k`
/// lags plus an intercept.
fn partial_autocorrelation(values: &[f64], max_lag: usize) -> Result<Vec<f64>> {
    let n = values.len();
    let mut pacf = Vec::with_capacity(max_lag + 1);
    pacf.push(1.0);

    for k in 1..=max_lag {
        let rows = n - k;
        let y: Vec<f64> = values[k..].to_vec();
        let mut columns = Vec::with_capacity(k + 1);
        columns.push(vec![1.0; rows]);
        for i in 1..=k {
            columns.push(values[k - i..n - i].to_vec());
        }
        let fit = least_squares(&y, &columns)?;
        pacf.push(fit.coefficients[k]);
    }
    Ok(pacf)
}

/// Locate every point where `curve` passes through `bound`, in either
/// direction, interpolating the fractional lag of each crossing.
///
/// # Arguments
/// * `curve` - Lag-indexed correlation values, `curve[0]` at lag 0
/// * `bound` - The confidence bound to test against
///
/// # Returns
/// Crossings in increasing lag order. Order selection uses only the
/// first one; the rest are kept for diagnostic inspection.
pub fn find_crossings(curve: &[f64], bound: f64) -> Vec<CrossingPoint> {
    let mut crossings = Vec::new();
    for k in 1..curve.len() {
        let above_before = curve[k - 1] >= bound;
        let above_after = curve[k] >= bound;
        if above_before != above_after {
            let lag = k as f64 - (curve[k] - bound) / (curve[k] - curve[k - 1]);
            crossings.push(CrossingPoint { lag, bound });
        }
    }
    crossings
}

/// Turn the first crossing into an integer order: round to the nearest
/// lag and clamp to at least 1.
pub fn select_order(crossings: &[CrossingPoint], max_lag: usize) -> Result<usize> {
    let first = crossings
        .first()
        .ok_or(PipelineError::OrderNotFound { max_lag })?;
    Ok((first.lag.round() as usize).max(1))
}
