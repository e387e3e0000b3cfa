//! Reversible transforms for coercing a series toward stationarity.
//!
//! Each forward transform records the state needed to reverse it in a
//! [`TransformChain`]; the chain travels with the transformed series so
//! inversion is always well-defined from the value itself.

mod chain;
pub mod window;

pub use chain::{TransformChain, TransformStep, TransformedSeries};
pub use window::{rolling_mean, rolling_std};
