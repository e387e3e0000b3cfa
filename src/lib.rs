//! # arima-pipeline
//!
//! Univariate time-series forecasting pipeline: stationarity testing,
//! invertible transforms, correlogram-based order selection, ARIMA
//! estimation, and forecasting back on the original scale.
//!
//! The typical entry point is [`pipeline::Pipeline`], which runs the
//! whole flow on a [`core::TimeSeries`]; each stage is also usable on
//! its own.

#![allow(clippy::needless_range_loop)]

pub mod config;
pub mod core;
pub mod correlogram;
pub mod error;
pub mod forecaster;
pub mod models;
pub mod pipeline;
pub mod stationarity;
pub mod transform;
pub mod utils;

pub use error::{PipelineError, Result};

pub mod prelude {
    pub use crate::config::PipelineConfig;
    pub use crate::core::{Forecast, Frequency, TimeSeries};
    pub use crate::correlogram::Correlogram;
    pub use crate::error::{PipelineError, Result};
    pub use crate::forecaster::ForecastMode;
    pub use crate::models::{Arima, ArimaSpec, FittedArima};
    pub use crate::pipeline::{Pipeline, PipelineReport};
    pub use crate::stationarity::{StationarityReport, StationarityTester};
    pub use crate::transform::{TransformChain, TransformedSeries};
}
