//! End-to-end forecasting pipeline.
//!
//! Runs the candidate transforms in order until one passes the
//! stationarity check, reads the model orders off the correlogram of the
//! stationary series, fits the model, and forecasts back on the original
//! scale.

use crate::config::PipelineConfig;
use crate::core::{Forecast, TimeSeries};
use crate::correlogram::Correlogram;
use crate::error::{PipelineError, Result};
use crate::forecaster::Forecaster;
use crate::models::diagnostics::{ljung_box, LjungBoxResult};
use crate::models::{Arima, ArimaSpec, FittedArima};
use crate::stationarity::{StationarityReport, StationarityTester};
use crate::transform::TransformedSeries;

/// Candidate transforms, tried in order of increasing aggressiveness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Candidate {
    Identity,
    Log,
    LogDifference,
    LogSeasonalAdjust,
}

impl Candidate {
    const ALL: [Candidate; 4] = [
        Candidate::Identity,
        Candidate::Log,
        Candidate::LogDifference,
        Candidate::LogSeasonalAdjust,
    ];

    /// Series the stationarity check and correlogram run on.
    fn build(self, series: &TimeSeries, window: usize) -> Result<TransformedSeries> {
        let base = TransformedSeries::identity(series.clone());
        match self {
            Candidate::Identity => Ok(base),
            Candidate::Log => base.log(),
            Candidate::LogDifference => base.log()?.difference(1),
            Candidate::LogSeasonalAdjust => base.log()?.moving_average_subtract(window),
        }
    }

    /// Series the model fits on, plus the differencing order moved into
    /// the model.
    ///
    /// A trailing difference step is handled by the model itself (so its
    /// forecasts integrate internally), and the seasonally adjusted
    /// candidate is likewise differenced once inside the model, since
    /// subtracting a rolling mean removes the seasonal shape but not the
    /// local level. Every other transform stays in the chain.
    fn build_fit(self, series: &TimeSeries, window: usize) -> Result<(TransformedSeries, usize)> {
        match self {
            Candidate::LogDifference => {
                let transformed = TransformedSeries::identity(series.clone()).log()?;
                Ok((transformed, 1))
            }
            Candidate::LogSeasonalAdjust => Ok((self.build(series, window)?, 1)),
            other => Ok((other.build(series, window)?, 0)),
        }
    }
}

/// One stationarity check performed during candidate selection.
#[derive(Debug, Clone)]
pub struct StationarityAttempt {
    /// Transform description, e.g. `"log + diff(1)"`.
    pub transform: String,
    /// The check's outcome.
    pub report: StationarityReport,
}

/// Everything a pipeline run produces.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    /// Stationarity checks in the order they were tried; the last entry
    /// is the one that passed.
    pub attempts: Vec<StationarityAttempt>,
    /// Description of the selected transform.
    pub selected_transform: String,
    /// Correlogram of the stationary series the orders were read from.
    pub correlogram: Correlogram,
    /// Selected model orders.
    pub spec: ArimaSpec,
    /// The fitted model.
    pub model: FittedArima,
    /// Residual whiteness check, when enough residuals were available.
    pub diagnostics: Option<LjungBoxResult>,
    /// In-sample predictions on the model's input scale.
    pub in_sample: Vec<f64>,
    /// Forecast on the original scale.
    pub forecast: Forecast,
}

/// The full pipeline: transform selection, order selection, model fit,
/// forecast.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a pipeline with the given configuration.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The active configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the full pipeline on a series.
    ///
    /// # Arguments
    /// * `series` - The observed series, on its original scale
    ///
    /// # Returns
    /// A [`PipelineReport`] carrying the stationarity attempts, the selected
    /// transform and model orders, the fitted model, and the forecast on the
    /// original scale.
    pub fn run(&self, series: &TimeSeries) -> Result<PipelineReport> {
        let config = &self.config;
        let tester = StationarityTester::new(config.window, config.significance);

        let mut attempts = Vec::new();
        let mut selected = None;
        for candidate in Candidate::ALL {
            // Candidates the series is too short for, or whose transform
            // does not apply (log of non-positive values), are skipped;
            // anything else aborts the run.
            let transformed = match candidate.build(series, config.window) {
                Ok(t) => t,
                Err(PipelineError::InsufficientData { .. })
                | Err(PipelineError::NonPositiveValue { .. }) => continue,
                Err(e) => return Err(e),
            };
            let report = match tester.check(transformed.series()) {
                Ok(r) => r,
                Err(PipelineError::InsufficientData { .. }) => continue,
                Err(e) => return Err(e),
            };

            let stationary = report.stationary;
            attempts.push(StationarityAttempt {
                transform: transformed.chain().describe(),
                report,
            });
            if stationary {
                selected = Some((transformed, candidate));
                break;
            }
        }

        let (test_series, candidate) = selected.ok_or(PipelineError::NoStationaryCandidate {
            attempts: attempts.len(),
        })?;
        let selected_transform = test_series.chain().describe();

        let correlogram = Correlogram::compute(
            test_series.series(),
            config.max_lag,
            config.significance,
            config.bound_scale,
        )?;
        let q = correlogram.moving_average_order()?;
        let p = correlogram.autoregressive_order()?;

        let (fit_transformed, d) = candidate.build_fit(series, config.window)?;
        let (fit_series, chain) = fit_transformed.into_parts();
        let spec = ArimaSpec::new(p, d, q);
        let model = Arima::new(spec)
            .with_optimizer(config.optimizer.clone())
            .fit(&fit_series)?;

        let diagnostics = self.residual_diagnostics(&model, p, q);

        let result = Forecaster::new(config.horizon, config.mode, config.window)
            .forecast(&model, &fit_series, &chain)?;

        Ok(PipelineReport {
            attempts,
            selected_transform,
            correlogram,
            spec,
            model,
            diagnostics,
            in_sample: result.in_sample,
            forecast: result.forecast,
        })
    }

    /// Best-effort Ljung-Box on the warmed-up residuals.
    fn residual_diagnostics(&self, model: &FittedArima, p: usize, q: usize) -> Option<LjungBoxResult> {
        let start = p.max(q);
        let residuals = &model.residuals()[start..];
        let lags = (p + q + 1).max(10);
        if residuals.len() <= lags + 1 {
            return None;
        }
        ljung_box(residuals, lags, p + q).ok()
    }
}
