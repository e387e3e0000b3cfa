//! Pipeline configuration.

use crate::error::{PipelineError, Result};
use crate::forecaster::ForecastMode;
use crate::utils::optimization::SimplexConfig;

/// Knobs for a full pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Significance threshold shared by the stationarity verdict and the
    /// correlogram confidence band.
    pub significance: f64,
    /// Seasonal window: rolling statistics, the moving-average transform,
    /// and the reliable forecast range all derive from it.
    pub window: usize,
    /// Deepest lag computed for the ACF and PACF.
    pub max_lag: usize,
    /// Number of future steps to forecast.
    pub horizon: usize,
    /// In-sample prediction mode.
    pub mode: ForecastMode,
    /// When set, replaces the normal quantile in the correlogram bound
    /// `scale / sqrt(n)` with this value.
    pub bound_scale: Option<f64>,
    /// Optimizer settings for the model fit.
    pub optimizer: SimplexConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            significance: 0.05,
            window: 12,
            max_lag: 15,
            horizon: 11,
            mode: ForecastMode::Static,
            bound_scale: None,
            optimizer: SimplexConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Validate field ranges.
    pub fn validate(&self) -> Result<()> {
        if !(self.significance > 0.0 && self.significance < 1.0) {
            return Err(PipelineError::InvalidParameter(format!(
                "significance must lie in (0, 1), got {}",
                self.significance
            )));
        }
        if self.window < 2 {
            return Err(PipelineError::InvalidParameter(format!(
                "window must be at least 2, got {}",
                self.window
            )));
        }
        if self.max_lag == 0 {
            return Err(PipelineError::InvalidParameter(
                "max_lag must be at least 1".to_string(),
            ));
        }
        if let Some(scale) = self.bound_scale {
            if !(scale > 0.0) {
                return Err(PipelineError::InvalidParameter(format!(
                    "bound_scale must be positive, got {scale}"
                )));
            }
        }
        Ok(())
    }

    /// Set the forecast horizon.
    pub fn with_horizon(mut self, horizon: usize) -> Self {
        self.horizon = horizon;
        self
    }

    /// Set the in-sample prediction mode.
    pub fn with_mode(mut self, mode: ForecastMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the correlogram bound scale override.
    pub fn with_bound_scale(mut self, scale: f64) -> Self {
        self.bound_scale = Some(scale);
        self
    }
}
