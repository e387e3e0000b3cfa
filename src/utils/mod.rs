//! Numerical utilities shared by the pipeline stages.

pub mod least_squares;
pub mod optimization;
pub mod stats;

pub use least_squares::{least_squares, LeastSquaresFit};
pub use optimization::{simplex_minimize, SimplexConfig, SimplexOutcome};
pub use stats::{mean, std_dev, variance};
