//! End-to-end pipeline tests on a synthetic monthly series with trend,
//! seasonality, and noise.

use arima_pipeline::prelude::*;
use chrono::{TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Monthly series `100 + 2t + 20 sin(2 pi t / 12) + noise`, always
/// positive.
fn seasonal_trend_series(n: usize, seed: u64) -> TimeSeries {
    let mut rng = StdRng::seed_from_u64(seed);
    let values: Vec<f64> = (0..n)
        .map(|t| {
            let trend = 100.0 + 2.0 * t as f64;
            let seasonal = 20.0 * (2.0 * std::f64::consts::PI * t as f64 / 12.0).sin();
            let noise = 2.0 * (rng.gen::<f64>() - 0.5);
            trend + seasonal + noise
        })
        .collect();
    let start = Utc.with_ymd_and_hms(1949, 1, 1, 0, 0, 0).unwrap();
    TimeSeries::monthly(start, values).unwrap()
}

fn pipeline_with(config: PipelineConfig) -> Pipeline {
    Pipeline::new(config).unwrap()
}

fn default_pipeline() -> Pipeline {
    let mut config = PipelineConfig::default();
    config.optimizer.max_iter = 10_000;
    pipeline_with(config)
}

#[test]
fn trending_seasonal_series_runs_the_full_pipeline() {
    let series = seasonal_trend_series(144, 42);
    let report = default_pipeline().run(&series).unwrap();

    // The raw and log series are trend-dominated; a differenced transform
    // is needed before the unit-root test passes.
    assert!(report.attempts.len() >= 2);
    assert!(!report.attempts[0].report.stationary);
    assert!(report.attempts.last().unwrap().report.stationary);
    assert!(report.selected_transform.contains("log"));

    assert!(report.spec.p >= 1);
    assert!(report.spec.q >= 1);

    assert_eq!(report.forecast.horizon(), 11);
    assert!(!report.forecast.is_out_of_range());
    for v in report.forecast.values() {
        assert!(v.is_finite());
        assert!(*v > 0.0);
    }
}

#[test]
fn forecast_timestamps_continue_the_monthly_calendar() {
    let series = seasonal_trend_series(144, 42);
    let report = default_pipeline().run(&series).unwrap();

    let last_observed = series.last_timestamp().unwrap();
    let timestamps = report.forecast.timestamps();
    assert_eq!(timestamps.len(), 11);
    assert!(timestamps[0] > last_observed);
    assert_eq!(
        timestamps[0],
        Utc.with_ymd_and_hms(1961, 1, 1, 0, 0, 0).unwrap()
    );
    assert!(timestamps.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn held_out_tail_is_forecast_within_loose_tolerance() {
    let full = seasonal_trend_series(144, 7);
    let train = full.slice(0, 132).unwrap();

    let mut config = PipelineConfig::default();
    config.horizon = 12;
    config.optimizer.max_iter = 10_000;
    let report = pipeline_with(config).run(&train).unwrap();

    let actual = &full.values()[132..];
    let mape: f64 = report
        .forecast
        .values()
        .iter()
        .zip(actual)
        .map(|(f, a)| ((f - a) / a).abs())
        .sum::<f64>()
        / actual.len() as f64;

    // The model tracks trend, not the seasonal shape, so the tolerance is
    // generous.
    assert!(mape < 0.5, "mean absolute percentage error {mape}");
}

#[test]
fn horizon_beyond_twice_the_window_is_flagged() {
    let series = seasonal_trend_series(144, 42);

    let mut config = PipelineConfig::default();
    config.horizon = 30;
    config.optimizer.max_iter = 10_000;
    let report = pipeline_with(config).run(&series).unwrap();

    assert!(report.forecast.is_out_of_range());
    assert_eq!(report.forecast.horizon(), 30);
    for v in report.forecast.values() {
        assert!(v.is_finite());
    }
}

#[test]
fn wide_bound_scale_still_selects_orders() {
    let series = seasonal_trend_series(144, 42);

    let mut config = PipelineConfig::default().with_bound_scale(7.96);
    config.optimizer.max_iter = 10_000;
    let result = pipeline_with(config).run(&series);

    // A much wider band pushes the crossing earlier; the run either
    // selects small orders or reports that no crossing exists.
    match result {
        Ok(report) => {
            assert!(report.spec.p >= 1);
            assert!(report.spec.q >= 1);
            assert_eq!(report.forecast.horizon(), 11);
        }
        Err(PipelineError::OrderNotFound { max_lag }) => {
            assert_eq!(max_lag, 15);
        }
        Err(e) => panic!("unexpected error: {e}"),
    }
}

#[test]
fn dynamic_mode_changes_only_the_in_sample_path() {
    let series = seasonal_trend_series(144, 42);

    let mut static_config = PipelineConfig::default();
    static_config.optimizer.max_iter = 10_000;
    let static_report = pipeline_with(static_config).run(&series).unwrap();

    let mut dynamic_config = PipelineConfig::default().with_mode(ForecastMode::Dynamic);
    dynamic_config.optimizer.max_iter = 10_000;
    let dynamic_report = pipeline_with(dynamic_config).run(&series).unwrap();

    for (a, b) in static_report
        .forecast
        .values()
        .iter()
        .zip(dynamic_report.forecast.values())
    {
        assert!((a - b).abs() < 1e-9);
    }
    let diverges = static_report
        .in_sample
        .iter()
        .zip(&dynamic_report.in_sample)
        .filter(|(a, b)| !a.is_nan() && !b.is_nan())
        .any(|(a, b)| (a - b).abs() > 1e-9);
    assert!(diverges);
}

#[test]
fn log_plus_seasonal_adjustment_is_stationary() {
    let series = seasonal_trend_series(144, 42);
    let (adjusted, _) = TransformedSeries::identity(series)
        .log()
        .unwrap()
        .moving_average_subtract(12)
        .unwrap()
        .into_parts();

    let report = StationarityTester::new(12, 0.05).check(&adjusted).unwrap();
    assert!(report.p_value < 0.05);
    assert!(report.stationary);

    let gram = Correlogram::compute(&adjusted, 15, 0.05, None).unwrap();
    assert!(!gram.acf_crossings().is_empty());
    assert!(!gram.pacf_crossings().is_empty());
}

#[test]
fn short_series_cannot_be_tested_for_stationarity() {
    let series = seasonal_trend_series(20, 1);
    let result = default_pipeline().run(&series);
    assert!(matches!(
        result,
        Err(PipelineError::NoStationaryCandidate { .. })
    ));
}
