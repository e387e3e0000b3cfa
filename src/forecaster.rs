//! Forecast generation on the original scale.

use crate::core::{Forecast, TimeSeries};
use crate::error::{PipelineError, Result};
use crate::models::FittedArima;
use crate::transform::TransformChain;

/// How in-sample predictions are generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ForecastMode {
    /// One step ahead everywhere: observed lags feed the AR terms.
    #[default]
    Static,
    /// Recursive: the model's own predictions feed the AR terms, so
    /// errors compound through the sample.
    Dynamic,
}

/// Result of forecasting through a transform chain.
#[derive(Debug, Clone)]
pub struct ForecastResult {
    /// Future values on the original scale, with timestamps continuing
    /// the observed frequency.
    pub forecast: Forecast,
    /// In-sample predictions on the scale the model was fitted to,
    /// generated per the configured mode. NaN during recursion warm-up.
    pub in_sample: Vec<f64>,
}

/// Turns a fitted model plus its transform chain into an original-scale
/// forecast.
#[derive(Debug, Clone)]
pub struct Forecaster {
    horizon: usize,
    mode: ForecastMode,
    window: usize,
}

impl Forecaster {
    /// Create a forecaster.
    ///
    /// `window` is the seasonal window the pipeline transformed with; a
    /// horizon beyond twice the window is still produced but flagged as
    /// out of range.
    pub fn new(horizon: usize, mode: ForecastMode, window: usize) -> Self {
        Self {
            horizon,
            mode,
            window,
        }
    }

    /// Forecast `horizon` steps and map them back to the original scale.
    ///
    /// # Arguments
    /// * `model` - The fitted model
    /// * `transformed` - The series the model was fitted to
    /// * `chain` - The transforms that produced it from the raw series
    ///
    /// # Returns
    /// The original-scale forecast plus in-sample predictions on the
    /// model's input scale.
    pub fn forecast(
        &self,
        model: &FittedArima,
        transformed: &TimeSeries,
        chain: &TransformChain,
    ) -> Result<ForecastResult> {
        let last = transformed
            .last_timestamp()
            .ok_or(PipelineError::InsufficientData { needed: 1, got: 0 })?;

        let future = model.forecast(self.horizon);
        let values = chain.project(transformed, &future)?;
        // Transforms only ever drop a prefix, so the transformed series
        // ends at the same timestamp as the raw one.
        let timestamps = transformed.frequency().future_timestamps(last, self.horizon)?;

        let out_of_range = self.horizon > 2 * self.window;
        let forecast = Forecast::new(timestamps, values).with_out_of_range(out_of_range);

        Ok(ForecastResult {
            forecast,
            in_sample: model.predictions(self.mode == ForecastMode::Dynamic),
        })
    }
}
