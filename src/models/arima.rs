//! ARIMA estimation by conditional least squares.

use crate::core::TimeSeries;
use crate::error::{PipelineError, Result};
use crate::utils::optimization::{simplex_minimize, SimplexConfig};

/// Model orders for an ARIMA(p, d, q) fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArimaSpec {
    /// Autoregressive order.
    pub p: usize,
    /// Differencing order.
    pub d: usize,
    /// Moving-average order.
    pub q: usize,
}

impl ArimaSpec {
    /// Create a specification with the given orders.
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }

    /// Number of estimated parameters (AR + MA + intercept).
    pub fn num_params(&self) -> usize {
        self.p + self.q + 1
    }

    /// Human-readable label, e.g. `ARIMA(1,1,1)`.
    pub fn describe(&self) -> String {
        format!("ARIMA({},{},{})", self.p, self.d, self.q)
    }
}

impl Default for ArimaSpec {
    fn default() -> Self {
        Self::new(1, 1, 1)
    }
}

/// Unfitted ARIMA model: a specification plus optimizer settings.
#[derive(Debug, Clone)]
pub struct Arima {
    spec: ArimaSpec,
    optimizer: SimplexConfig,
}

impl Arima {
    /// Create a model with the given specification and default optimizer
    /// settings.
    pub fn new(spec: ArimaSpec) -> Self {
        Self {
            spec,
            optimizer: SimplexConfig::default(),
        }
    }

    /// Override the optimizer configuration.
    pub fn with_optimizer(mut self, optimizer: SimplexConfig) -> Self {
        self.optimizer = optimizer;
        self
    }

    /// Model specification.
    pub fn spec(&self) -> ArimaSpec {
        self.spec
    }

    /// Fit the model to a series by minimizing the conditional sum of
    /// squares of the differenced values.
    ///
    /// # Arguments
    /// * `series` - Observations on the model's input scale; needs at
    ///   least `d + max(p, q) + 2` points
    ///
    /// # Returns
    /// A [`FittedArima`] with coefficients, in-sample fit, residuals, and
    /// information criteria.
    pub fn fit(&self, series: &TimeSeries) -> Result<FittedArima> {
        let values = series.values();
        let spec = self.spec;
        let min_len = spec.d + spec.p.max(spec.q) + 2;
        if values.len() < min_len {
            return Err(PipelineError::InsufficientData {
                needed: min_len,
                got: values.len(),
            });
        }

        let differenced = difference(values, spec.d);
        let (intercept, ar, ma, iterations) =
            self.estimate(&differenced)?;

        let mut fitted = FittedArima {
            spec,
            ar,
            ma,
            intercept,
            iterations,
            original: values.to_vec(),
            differenced,
            fitted: vec![],
            residuals: vec![],
            residual_variance: 0.0,
            aic: f64::NAN,
            bic: f64::NAN,
        };
        fitted.compute_fitted();
        Ok(fitted)
    }

    /// Estimate intercept, AR and MA coefficients.
    fn estimate(&self, differenced: &[f64]) -> Result<(f64, Vec<f64>, Vec<f64>, usize)> {
        let p = self.spec.p;
        let q = self.spec.q;
        let mean = differenced.iter().sum::<f64>() / differenced.len() as f64;

        if p == 0 && q == 0 {
            return Ok((mean, vec![], vec![], 0));
        }

        let mut initial = vec![0.0; p + q + 1];
        initial[0] = mean;
        for i in 0..p {
            initial[1 + i] = 0.1 / (i + 1) as f64;
        }
        for i in 0..q {
            initial[1 + p + i] = 0.1 / (i + 1) as f64;
        }

        // Coefficient bounds keep the fit inside the stationary and
        // invertible region.
        let mut bounds = vec![(f64::NEG_INFINITY, f64::INFINITY)];
        bounds.extend(std::iter::repeat((-0.99, 0.99)).take(p + q));

        let outcome = simplex_minimize(
            |params| {
                let intercept = params[0];
                let ar = &params[1..1 + p];
                let ma = &params[1 + p..];
                conditional_sum_of_squares(differenced, ar, ma, intercept)
            },
            &initial,
            Some(&bounds),
            &self.optimizer,
        );

        if !outcome.converged {
            return Err(PipelineError::ConvergenceFailure {
                iterations: outcome.iterations,
            });
        }

        let intercept = outcome.point[0];
        let ar = outcome.point[1..1 + p].to_vec();
        let ma = outcome.point[1 + p..].to_vec();
        Ok((intercept, ar, ma, outcome.iterations))
    }
}

/// A fitted ARIMA model with its estimation artifacts.
#[derive(Debug, Clone)]
pub struct FittedArima {
    spec: ArimaSpec,
    ar: Vec<f64>,
    ma: Vec<f64>,
    intercept: f64,
    iterations: usize,
    original: Vec<f64>,
    differenced: Vec<f64>,
    fitted: Vec<f64>,
    residuals: Vec<f64>,
    residual_variance: f64,
    aic: f64,
    bic: f64,
}

impl FittedArima {
    /// Model specification.
    pub fn spec(&self) -> ArimaSpec {
        self.spec
    }

    /// AR coefficients.
    pub fn ar_coefficients(&self) -> &[f64] {
        &self.ar
    }

    /// MA coefficients.
    pub fn ma_coefficients(&self) -> &[f64] {
        &self.ma
    }

    /// Intercept of the differenced process.
    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Optimizer iterations used during estimation.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// One-step-ahead predictions on the differenced scale; NaN where the
    /// recursion has not warmed up.
    pub fn fitted_values(&self) -> &[f64] {
        &self.fitted
    }

    /// Residuals on the differenced scale.
    pub fn residuals(&self) -> &[f64] {
        &self.residuals
    }

    /// Mean squared residual over the warmed-up sample.
    pub fn residual_variance(&self) -> f64 {
        self.residual_variance
    }

    /// Akaike information criterion.
    pub fn aic(&self) -> f64 {
        self.aic
    }

    /// Bayesian information criterion.
    pub fn bic(&self) -> f64 {
        self.bic
    }

    /// Forecast past the end of the sample, on the scale of the series
    /// the model was fitted to.
    ///
    /// # Arguments
    /// * `horizon` - Number of steps ahead
    ///
    /// # Returns
    /// `horizon` values; the recursion assumes zero future shocks, and
    /// differencing is undone internally.
    pub fn forecast(&self, horizon: usize) -> Vec<f64> {
        if horizon == 0 {
            return vec![];
        }

        let p = self.spec.p;
        let q = self.spec.q;
        let mut extended = self.differenced.clone();
        let mut shocks = self.residuals.clone();

        for _ in 0..horizon {
            let t = extended.len();
            let mut pred = self.intercept;
            for i in 0..p {
                if t > i {
                    pred += self.ar[i] * (extended[t - 1 - i] - self.intercept);
                }
            }
            // Future shocks have zero expectation.
            for i in 0..q {
                if t > i {
                    pred += self.ma[i] * shocks[t - 1 - i];
                }
            }
            extended.push(pred);
            shocks.push(0.0);
        }

        let future = &extended[self.differenced.len()..];
        integrate(future, &self.original, self.spec.d)
    }

    /// In-sample predictions on the original scale.
    ///
    /// `dynamic = false` feeds observed lags into the AR terms (one step
    /// ahead everywhere); `dynamic = true` feeds the model's own earlier
    /// predictions, so errors compound through the sample.
    pub fn predictions(&self, dynamic: bool) -> Vec<f64> {
        let p = self.spec.p;
        let q = self.spec.q;
        let n = self.differenced.len();
        let start = p.max(q);

        let mut preds = vec![f64::NAN; n];
        let mut history = self.differenced.clone();
        let mut shocks = vec![0.0; n];

        for t in start..n {
            let mut pred = self.intercept;
            for i in 0..p {
                pred += self.ar[i] * (history[t - 1 - i] - self.intercept);
            }
            for i in 0..q {
                pred += self.ma[i] * shocks[t - 1 - i];
            }
            preds[t] = pred;
            shocks[t] = self.differenced[t] - pred;
            if dynamic {
                history[t] = pred;
                shocks[t] = 0.0;
            }
        }

        // Undo differencing one level at a time against the observed
        // shallower values, so each prediction lands on the original scale.
        let mut out = preds;
        for level_order in (0..self.spec.d).rev() {
            let level = difference(&self.original, level_order);
            let offset = level.len() - n;
            for (t, v) in out.iter_mut().enumerate() {
                if !v.is_nan() {
                    *v += level[t + offset - 1];
                }
            }
        }
        out
    }

    fn compute_fitted(&mut self) {
        let p = self.spec.p;
        let q = self.spec.q;
        let n = self.differenced.len();
        let start = p.max(q);

        let mut fitted = vec![f64::NAN; n];
        let mut residuals = vec![0.0; n];

        for t in start..n {
            let mut pred = self.intercept;
            for i in 0..p {
                pred += self.ar[i] * (self.differenced[t - 1 - i] - self.intercept);
            }
            for i in 0..q {
                pred += self.ma[i] * residuals[t - 1 - i];
            }
            fitted[t] = pred;
            residuals[t] = self.differenced[t] - pred;
        }

        let valid = &residuals[start..];
        if !valid.is_empty() {
            let n_eff = valid.len() as f64;
            let variance = valid.iter().map(|r| r * r).sum::<f64>() / n_eff;
            let k = self.spec.num_params() as f64;
            let ll = -0.5 * n_eff * (1.0 + variance.ln() + (2.0 * std::f64::consts::PI).ln());

            self.residual_variance = variance;
            self.aic = -2.0 * ll + 2.0 * k;
            self.bic = -2.0 * ll + k * n_eff.ln();
        }

        self.fitted = fitted;
        self.residuals = residuals;
    }
}

/// Conditional sum of squares of the ARMA recursion, with residuals
/// zeroed before `max(p, q)`.
fn conditional_sum_of_squares(series: &[f64], ar: &[f64], ma: &[f64], intercept: f64) -> f64 {
    let n = series.len();
    let start = ar.len().max(ma.len());
    if n <= start {
        return f64::MAX;
    }

    let mut residuals = vec![0.0; n];
    let mut css = 0.0;
    for t in start..n {
        let mut pred = intercept;
        for (i, phi) in ar.iter().enumerate() {
            pred += phi * (series[t - 1 - i] - intercept);
        }
        for (i, theta) in ma.iter().enumerate() {
            pred += theta * residuals[t - 1 - i];
        }
        let error = series[t] - pred;
        residuals[t] = error;
        css += error * error;
    }
    css
}

/// Difference a series `d` times.
pub fn difference(series: &[f64], d: usize) -> Vec<f64> {
    let mut result = series.to_vec();
    for _ in 0..d {
        if result.len() <= 1 {
            return vec![];
        }
        result = result.windows(2).map(|w| w[1] - w[0]).collect();
    }
    result
}

/// Reverse `d` rounds of differencing for a forecast path, seeding each
/// round from the tail of the corresponding observed difference level.
pub fn integrate(forecast: &[f64], original: &[f64], d: usize) -> Vec<f64> {
    if d == 0 || forecast.is_empty() {
        return forecast.to_vec();
    }

    let mut result = forecast.to_vec();
    for level in (0..d).rev() {
        let seed = if level == 0 {
            original.last().copied().unwrap_or(0.0)
        } else {
            difference(original, level).last().copied().unwrap_or(0.0)
        };
        let mut cumsum = seed;
        for value in &mut result {
            cumsum += *value;
            *value = cumsum;
        }
    }
    result
}
