//! Model estimation and residual diagnostics.

mod arima;
pub mod diagnostics;

pub use arima::{Arima, ArimaSpec, FittedArima};
