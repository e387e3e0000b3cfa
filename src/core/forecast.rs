//! Forecast result structure for holding projected values.

use chrono::{DateTime, Utc};

/// A forecast on the original (untransformed) scale.
///
/// Holds `horizon` future timestamps at the series' declared frequency,
/// starting immediately after the last observed timestamp, with one
/// predicted value per timestamp.
#[derive(Debug, Clone, Default)]
pub struct Forecast {
    timestamps: Vec<DateTime<Utc>>,
    values: Vec<f64>,
    /// Set when the requested horizon exceeds the range the fitted model
    /// can reliably cover. The forecast is still produced; accuracy
    /// degrades rather than erroring.
    out_of_range: bool,
}

impl Forecast {
    /// Create a forecast from paired timestamps and values.
    pub fn new(timestamps: Vec<DateTime<Utc>>, values: Vec<f64>) -> Self {
        debug_assert_eq!(timestamps.len(), values.len());
        Self {
            timestamps,
            values,
            out_of_range: false,
        }
    }

    /// Flag this forecast as extending beyond the reliable range.
    pub fn with_out_of_range(mut self, out_of_range: bool) -> Self {
        self.out_of_range = out_of_range;
        self
    }

    /// Get the forecast horizon (number of steps).
    pub fn horizon(&self) -> usize {
        self.values.len()
    }

    /// Check if the forecast is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get the predicted values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Get the forecast timestamps.
    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    /// Whether the horizon exceeded the reliable range.
    pub fn is_out_of_range(&self) -> bool {
        self.out_of_range
    }

    /// Iterate over (timestamp, value) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (DateTime<Utc>, f64)> + '_ {
        self.timestamps
            .iter()
            .copied()
            .zip(self.values.iter().copied())
    }
}
