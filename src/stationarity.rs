//! Stationarity testing: rolling statistics plus an augmented
//! Dickey-Fuller unit-root test.

use crate::core::TimeSeries;
use crate::error::{PipelineError, Result};
use crate::transform::window::{rolling_mean, rolling_std};
use crate::utils::least_squares;

/// Critical values of the ADF tau distribution (constant, no trend).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CriticalValues {
    /// Critical value at 1% significance.
    pub cv_1pct: f64,
    /// Critical value at 5% significance.
    pub cv_5pct: f64,
    /// Critical value at 10% significance.
    pub cv_10pct: f64,
}

/// Result of a stationarity check on one candidate series.
#[derive(Debug, Clone)]
pub struct StationarityReport {
    /// ADF t-statistic on the lagged level.
    pub statistic: f64,
    /// Approximate p-value under the tau distribution.
    pub p_value: f64,
    /// Number of lagged differences included in the regression.
    pub lags: usize,
    /// Critical values at the common significance levels.
    pub critical_values: CriticalValues,
    /// Trailing rolling mean (visual check companion; NaN where the
    /// window is incomplete).
    pub rolling_mean: Vec<f64>,
    /// Trailing rolling standard deviation, same alignment.
    pub rolling_std: Vec<f64>,
    /// Verdict at the tester's configured significance threshold.
    pub stationary: bool,
}

impl StationarityReport {
    /// Re-evaluate the verdict at a different significance threshold.
    pub fn is_stationary(&self, threshold: f64) -> bool {
        self.p_value < threshold
    }
}

/// Classifies a series as stationary or not.
///
/// Combines rolling mean/std arrays for visual inspection with an
/// augmented Dickey-Fuller regression whose lag order is chosen by AIC.
#[derive(Debug, Clone)]
pub struct StationarityTester {
    window: usize,
    significance: f64,
    max_lags: Option<usize>,
}

impl StationarityTester {
    /// Create a tester with the given rolling window and significance
    /// threshold.
    pub fn new(window: usize, significance: f64) -> Self {
        Self {
            window,
            significance,
            max_lags: None,
        }
    }

    /// Fix the maximum ADF lag order instead of the `12 * (n/100)^(1/4)`
    /// default.
    pub fn with_max_lags(mut self, max_lags: usize) -> Self {
        self.max_lags = Some(max_lags);
        self
    }

    /// Run the stationarity check.
    ///
    /// # Arguments
    /// * `series` - Candidate series; requires at least `2 * window`
    ///   observations
    ///
    /// # Returns
    /// A [`StationarityReport`] with the ADF statistic, its approximate
    /// p-value, and the rolling mean/std arrays.
    pub fn check(&self, series: &TimeSeries) -> Result<StationarityReport> {
        let values = series.values();
        let n = values.len();
        let needed = 2 * self.window;
        if n < needed {
            return Err(PipelineError::InsufficientData { needed, got: n });
        }

        let (statistic, lags) = self.adf_statistic(values)?;
        let p_value = adf_p_value(statistic);

        // MacKinnon asymptotic critical values, constant-only regression.
        let critical_values = CriticalValues {
            cv_1pct: -3.43,
            cv_5pct: -2.86,
            cv_10pct: -2.57,
        };

        Ok(StationarityReport {
            statistic,
            p_value,
            lags,
            critical_values,
            rolling_mean: rolling_mean(values, self.window),
            rolling_std: rolling_std(values, self.window),
            stationary: p_value < self.significance,
        })
    }

    /// ADF regression `Δy_t = α + β·y_{t-1} + Σ γ_i·Δy_{t-i} + ε`,
    /// returning the t-statistic on β and the lag order used.
    fn adf_statistic(&self, values: &[f64]) -> Result<(f64, usize)> {
        let n = values.len();
        let diff: Vec<f64> = values.windows(2).map(|w| w[1] - w[0]).collect();

        // Schwert's rule, wide enough to whiten seasonal residuals at
        // monthly periodicity.
        let default_lags = (12.0 * (n as f64 / 100.0).powf(0.25)).floor() as usize;
        let max_lags = self
            .max_lags
            .unwrap_or(default_lags)
            .min((n / 2).saturating_sub(2))
            .max(1);

        // Whiten residuals: pick the lag count minimizing AIC over a common
        // estimation sample, then refit at that lag on its full sample.
        let mut best_lag = 1;
        let mut best_aic = f64::INFINITY;
        for lag in 1..=max_lags {
            let fit = match self.adf_regression(values, &diff, lag, max_lags) {
                Ok(fit) => fit,
                Err(_) => continue,
            };
            let m = fit.n as f64;
            let k = (lag + 2) as f64;
            if fit.rss <= 0.0 {
                continue;
            }
            let aic = m * (fit.rss / m).ln() + 2.0 * k;
            if aic < best_aic {
                best_aic = aic;
                best_lag = lag;
            }
        }

        let fit = self.adf_regression(values, &diff, best_lag, best_lag)?;
        let beta = fit.coefficients[1];
        let se = fit.standard_errors[1];
        if !se.is_finite() || se == 0.0 {
            return Err(PipelineError::Computation(
                "degenerate ADF regression: zero standard error".to_string(),
            ));
        }

        Ok((beta / se, best_lag))
    }

    /// Fit the augmented regression with `lag` lagged differences, using
    /// observations from `start` onward (relative to the diff index).
    fn adf_regression(
        &self,
        values: &[f64],
        diff: &[f64],
        lag: usize,
        start: usize,
    ) -> Result<crate::utils::LeastSquaresFit> {
        let m = diff.len();
        if m <= start {
            return Err(PipelineError::InsufficientData {
                needed: start + 1,
                got: m,
            });
        }

        let rows = m - start;
        let y: Vec<f64> = diff[start..].to_vec();

        let mut columns = Vec::with_capacity(lag + 2);
        columns.push(vec![1.0; rows]);
        // Lagged level: Δy_t regressed on y_{t-1}, i.e. values[t] for the
        // difference at index t.
        columns.push(values[start..m].to_vec());
        for i in 1..=lag {
            columns.push(diff[start - i..m - i].to_vec());
        }

        least_squares(&y, &columns)
    }
}

/// Approximate p-value by piecewise-linear interpolation through the
/// MacKinnon tau quantiles (constant-only case).
fn adf_p_value(t_stat: f64) -> f64 {
    const TAU_QUANTILES: [(f64, f64); 12] = [
        (-3.96, 0.001),
        (-3.43, 0.01),
        (-3.12, 0.025),
        (-2.86, 0.05),
        (-2.57, 0.10),
        (-2.12, 0.25),
        (-1.57, 0.50),
        (-0.94, 0.75),
        (-0.44, 0.90),
        (-0.07, 0.95),
        (0.23, 0.975),
        (0.60, 0.99),
    ];

    if t_stat.is_nan() {
        return f64::NAN;
    }
    if t_stat <= TAU_QUANTILES[0].0 {
        return 0.0001;
    }
    if t_stat >= TAU_QUANTILES[TAU_QUANTILES.len() - 1].0 {
        return 0.9999;
    }

    for pair in TAU_QUANTILES.windows(2) {
        let (t_lo, p_lo) = pair[0];
        let (t_hi, p_hi) = pair[1];
        if t_stat <= t_hi {
            let frac = (t_stat - t_lo) / (t_hi - t_lo);
            return p_lo + frac * (p_hi - p_lo);
        }
    }

    0.9999
}
