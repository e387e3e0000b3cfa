//! Error types for the arima-pipeline library.

use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors that can occur while running the forecasting pipeline.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// A non-positive value was fed to the log transform.
    #[error("log transform requires positive values: value {value} at index {index}")]
    NonPositiveValue { index: usize, value: f64 },

    /// Insufficient data points for the operation.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Stored transform state is missing or misaligned with the series
    /// being inverted.
    #[error("inversion error: {0}")]
    Inversion(String),

    /// No correlogram crossing was found within the configured lag bound.
    #[error("no confidence-bound crossing within {max_lag} lags")]
    OrderNotFound { max_lag: usize },

    /// The likelihood optimizer did not converge within its iteration budget.
    #[error("optimizer failed to converge after {iterations} iterations")]
    ConvergenceFailure { iterations: usize },

    /// No candidate transform chain produced a stationary series.
    #[error("no stationary transform found after {attempts} candidate chains")]
    NoStationaryCandidate { attempts: usize },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Timestamp-related error.
    #[error("timestamp error: {0}")]
    TimestampError(String),

    /// Dimension mismatch between data structures.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Numerical computation failure (singular regression, etc.).
    #[error("computation error: {0}")]
    Computation(String),
}
