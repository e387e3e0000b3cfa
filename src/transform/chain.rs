//! Transform chain: recorded, invertible transform steps.

use chrono::{DateTime, Utc};

use crate::core::TimeSeries;
use crate::error::{PipelineError, Result};
use crate::transform::window::rolling_mean;

/// One applied transform, retaining the state needed to reverse it.
#[derive(Debug, Clone, PartialEq)]
pub enum TransformStep {
    /// Natural logarithm of every value.
    Log,
    /// Repeated first differencing. `initial` holds the (timestamp, value)
    /// head dropped at each pass, in application order; cumulative summation
    /// seeded from these heads undoes the differencing exactly.
    Difference {
        order: usize,
        initial: Vec<(DateTime<Utc>, f64)>,
    },
    /// Subtraction of a trailing rolling mean. `averages` is the rolling
    /// mean aligned to the output index; `dropped` is the prefix removed
    /// where the window was incomplete. Both are stored rather than
    /// recomputed: recomputation would need the pre-transform series the
    /// forward flow discards.
    MovingAverageSubtract {
        window: usize,
        averages: Vec<f64>,
        dropped: Vec<(DateTime<Utc>, f64)>,
    },
}

impl TransformStep {
    /// Short human-readable name, used in pipeline reports.
    pub fn describe(&self) -> String {
        match self {
            TransformStep::Log => "log".to_string(),
            TransformStep::Difference { order, .. } => format!("diff({})", order),
            TransformStep::MovingAverageSubtract { window, .. } => {
                format!("ma_subtract({})", window)
            }
        }
    }
}

/// Ordered record of the transforms applied to a series.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformChain {
    steps: Vec<TransformStep>,
}

impl TransformChain {
    /// An empty chain (identity transform).
    pub fn new() -> Self {
        Self::default()
    }

    /// The recorded steps, in application order.
    pub fn steps(&self) -> &[TransformStep] {
        &self.steps
    }

    /// Check if no transforms were applied.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Chain description such as `"log + ma_subtract(12)"`.
    pub fn describe(&self) -> String {
        if self.steps.is_empty() {
            return "identity".to_string();
        }
        self.steps
            .iter()
            .map(TransformStep::describe)
            .collect::<Vec<_>>()
            .join(" + ")
    }

    /// Invert the chain, reconstructing the series each step was applied to.
    ///
    /// Steps are undone in reverse order: rolling means are added back
    /// (index-aligned) and the dropped prefix restored, differences are
    /// cumulatively summed from their stored heads, logs are exponentiated.
    pub fn invert(&self, series: &TimeSeries) -> Result<TimeSeries> {
        let mut timestamps = series.timestamps().to_vec();
        let mut values = series.values().to_vec();

        for step in self.steps.iter().rev() {
            match step {
                TransformStep::Log => {
                    for v in &mut values {
                        *v = v.exp();
                    }
                }
                TransformStep::Difference { order, initial } => {
                    if initial.len() != *order {
                        return Err(PipelineError::Inversion(format!(
                            "difference step of order {} retained {} initial values",
                            order,
                            initial.len()
                        )));
                    }
                    for &(head_ts, head_val) in initial.iter().rev() {
                        if let Some(first) = timestamps.first() {
                            if head_ts >= *first {
                                return Err(PipelineError::Inversion(format!(
                                    "stored difference head at {} is not before the series start",
                                    head_ts
                                )));
                            }
                        }
                        values = undo_difference_pass(head_val, &values);
                        timestamps.insert(0, head_ts);
                    }
                }
                TransformStep::MovingAverageSubtract {
                    window,
                    averages,
                    dropped,
                } => {
                    if averages.len() != values.len() {
                        return Err(PipelineError::Inversion(format!(
                            "stored averages cover {} points but the series has {}",
                            averages.len(),
                            values.len()
                        )));
                    }
                    if dropped.len() + 1 != *window {
                        return Err(PipelineError::Inversion(format!(
                            "moving-average step of window {} retained {} dropped points",
                            window,
                            dropped.len()
                        )));
                    }
                    for (v, avg) in values.iter_mut().zip(averages.iter()) {
                        *v += avg;
                    }
                    for &(ts, v) in dropped.iter().rev() {
                        timestamps.insert(0, ts);
                        values.insert(0, v);
                    }
                }
            }
        }

        TimeSeries::new(timestamps, values, series.frequency())
    }

    /// Project future values back onto the original scale.
    ///
    /// # Arguments
    /// * `history` - The transformed series the chain produced
    /// * `future` - Values on the transformed scale, continuing directly
    ///   after `history`
    ///
    /// # Returns
    /// The future values on the original scale, same length as `future`.
    ///
    /// Inverse steps are seeded from each level's trailing state instead of
    /// its stored head: differencing cumulates from the last value of the
    /// shallower-level history, and the rolling-mean subtraction is solved
    /// recursively over its trailing window.
    pub fn project(&self, history: &TimeSeries, future: &[f64]) -> Result<Vec<f64>> {
        let mut hist = history.values().to_vec();
        let mut fut = future.to_vec();

        for step in self.steps.iter().rev() {
            match step {
                TransformStep::Log => {
                    for v in &mut hist {
                        *v = v.exp();
                    }
                    for v in &mut fut {
                        *v = v.exp();
                    }
                }
                TransformStep::Difference { order, initial } => {
                    if initial.len() != *order {
                        return Err(PipelineError::Inversion(format!(
                            "difference step of order {} retained {} initial values",
                            order,
                            initial.len()
                        )));
                    }
                    for &(_, head_val) in initial.iter().rev() {
                        hist = undo_difference_pass(head_val, &hist);
                        let seed = *hist.last().ok_or_else(|| {
                            PipelineError::Inversion(
                                "empty history while undoing differencing".to_string(),
                            )
                        })?;
                        let mut cumsum = seed;
                        for v in &mut fut {
                            cumsum += *v;
                            *v = cumsum;
                        }
                    }
                }
                TransformStep::MovingAverageSubtract {
                    window,
                    averages,
                    dropped,
                } => {
                    if *window < 2 {
                        return Err(PipelineError::Inversion(
                            "moving-average window below 2 cannot be projected".to_string(),
                        ));
                    }
                    if averages.len() != hist.len() {
                        return Err(PipelineError::Inversion(format!(
                            "stored averages cover {} points but the history has {}",
                            averages.len(),
                            hist.len()
                        )));
                    }

                    for (v, avg) in hist.iter_mut().zip(averages.iter()) {
                        *v += avg;
                    }
                    let mut restored: Vec<f64> = dropped.iter().map(|&(_, v)| v).collect();
                    restored.extend(hist);
                    hist = restored;

                    // pre[t] solves pre - (sum(tail) + pre) / w = f.
                    let w = *window as f64;
                    let mut tail: Vec<f64> =
                        hist[hist.len().saturating_sub(window - 1)..].to_vec();
                    if tail.len() + 1 != *window {
                        return Err(PipelineError::Inversion(
                            "history shorter than the moving-average window".to_string(),
                        ));
                    }
                    for v in &mut fut {
                        let pre = (w * *v + tail.iter().sum::<f64>()) / (w - 1.0);
                        *v = pre;
                        tail.remove(0);
                        tail.push(pre);
                    }
                }
            }
        }

        Ok(fut)
    }

    fn push(&mut self, step: TransformStep) {
        self.steps.push(step);
    }
}

/// Cumulative sum seeded by the stored head value.
fn undo_difference_pass(head: f64, diffs: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(diffs.len() + 1);
    let mut cumsum = head;
    out.push(cumsum);
    for &d in diffs {
        cumsum += d;
        out.push(cumsum);
    }
    out
}

/// A series together with the chain that produced it.
///
/// Each transform consumes `self` and returns a new value; the input series
/// itself is never mutated.
#[derive(Debug, Clone)]
pub struct TransformedSeries {
    series: TimeSeries,
    chain: TransformChain,
}

impl TransformedSeries {
    /// Start a chain from an untransformed series.
    pub fn identity(series: TimeSeries) -> Self {
        Self {
            series,
            chain: TransformChain::new(),
        }
    }

    /// The current (transformed) series.
    pub fn series(&self) -> &TimeSeries {
        &self.series
    }

    /// The chain applied so far.
    pub fn chain(&self) -> &TransformChain {
        &self.chain
    }

    /// Split into the series and its chain.
    pub fn into_parts(self) -> (TimeSeries, TransformChain) {
        (self.series, self.chain)
    }

    /// Natural log of every value. Fails on any value `<= 0`.
    pub fn log(mut self) -> Result<Self> {
        if let Some((index, &value)) = self
            .series
            .values()
            .iter()
            .enumerate()
            .find(|(_, v)| **v <= 0.0)
        {
            return Err(PipelineError::NonPositiveValue { index, value });
        }

        let values = self.series.values().iter().map(|v| v.ln()).collect();
        self.series = TimeSeries::new(
            self.series.timestamps().to_vec(),
            values,
            self.series.frequency(),
        )?;
        self.chain.push(TransformStep::Log);
        Ok(self)
    }

    /// First difference repeated `order` times; drops the first `order`
    /// points, recording each dropped head for inversion.
    pub fn difference(mut self, order: usize) -> Result<Self> {
        if order == 0 {
            return Err(PipelineError::InvalidParameter(
                "differencing order must be at least 1".to_string(),
            ));
        }
        if self.series.len() <= order {
            return Err(PipelineError::InsufficientData {
                needed: order + 1,
                got: self.series.len(),
            });
        }

        let heads: Vec<DateTime<Utc>> = self.series.timestamps()[..order].to_vec();
        let mut values = self.series.values().to_vec();
        let mut initial = Vec::with_capacity(order);

        for head_ts in heads {
            initial.push((head_ts, values[0]));
            values = values.windows(2).map(|w| w[1] - w[0]).collect();
        }

        self.series = self.series.with_tail_values(values)?;
        self.chain.push(TransformStep::Difference { order, initial });
        Ok(self)
    }

    /// Subtract a trailing rolling mean of size `window`; drops the first
    /// `window - 1` points where the window is incomplete, recording the
    /// aligned averages and the dropped prefix.
    pub fn moving_average_subtract(mut self, window: usize) -> Result<Self> {
        if window < 2 {
            return Err(PipelineError::InvalidParameter(
                "moving-average window must be at least 2".to_string(),
            ));
        }
        if self.series.len() < window {
            return Err(PipelineError::InsufficientData {
                needed: window,
                got: self.series.len(),
            });
        }

        let values = self.series.values();
        let timestamps = self.series.timestamps();
        let means = rolling_mean(values, window);

        let averages: Vec<f64> = means[window - 1..].to_vec();
        let detrended: Vec<f64> = values[window - 1..]
            .iter()
            .zip(averages.iter())
            .map(|(v, m)| v - m)
            .collect();
        let dropped: Vec<(DateTime<Utc>, f64)> = timestamps[..window - 1]
            .iter()
            .copied()
            .zip(values[..window - 1].iter().copied())
            .collect();

        self.series = self.series.with_tail_values(detrended)?;
        self.chain.push(TransformStep::MovingAverageSubtract {
            window,
            averages,
            dropped,
        });
        Ok(self)
    }

    /// Invert the full chain, reconstructing the original series.
    pub fn invert(&self) -> Result<TimeSeries> {
        self.chain.invert(&self.series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::TimeZone;

    fn monthly_series(values: Vec<f64>) -> TimeSeries {
        let start = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        TimeSeries::monthly(start, values).unwrap()
    }

    fn assert_series_close(a: &TimeSeries, b: &TimeSeries) {
        assert_eq!(a.timestamps(), b.timestamps());
        assert_eq!(a.len(), b.len());
        for (x, y) in a.values().iter().zip(b.values()) {
            assert_relative_eq!(x, y, max_relative = 1e-9);
        }
    }

    #[test]
    fn log_round_trip() {
        let original = monthly_series(vec![1.0, 2.5, 10.0, 100.0]);
        let transformed = TransformedSeries::identity(original.clone()).log().unwrap();

        assert_relative_eq!(transformed.series().values()[2], 10.0f64.ln());
        assert_series_close(&transformed.invert().unwrap(), &original);
    }

    #[test]
    fn log_rejects_non_positive_values() {
        let series = monthly_series(vec![1.0, 0.0, 2.0]);
        let result = TransformedSeries::identity(series).log();
        assert!(matches!(
            result,
            Err(PipelineError::NonPositiveValue { index: 1, .. })
        ));
    }

    #[test]
    fn difference_drops_leading_points_and_round_trips() {
        let original = monthly_series(vec![1.0, 3.0, 6.0, 10.0, 15.0]);
        let transformed = TransformedSeries::identity(original.clone())
            .difference(1)
            .unwrap();

        assert_eq!(transformed.series().values(), &[2.0, 3.0, 4.0, 5.0]);
        assert_eq!(transformed.series().len(), 4);
        assert_eq!(
            transformed.series().timestamps()[0],
            original.timestamps()[1]
        );

        assert_series_close(&transformed.invert().unwrap(), &original);
    }

    #[test]
    fn second_order_difference_round_trips() {
        let original = monthly_series(vec![1.0, 3.0, 6.0, 10.0, 15.0, 21.0]);
        let transformed = TransformedSeries::identity(original.clone())
            .difference(2)
            .unwrap();

        assert_eq!(transformed.series().values(), &[1.0, 1.0, 1.0, 1.0]);
        assert_series_close(&transformed.invert().unwrap(), &original);
    }

    #[test]
    fn moving_average_subtract_round_trips() {
        let original = monthly_series((1..=24).map(|i| i as f64).collect());
        let transformed = TransformedSeries::identity(original.clone())
            .moving_average_subtract(12)
            .unwrap();

        assert_eq!(transformed.series().len(), 13);
        match &transformed.chain().steps()[0] {
            TransformStep::MovingAverageSubtract {
                averages, dropped, ..
            } => {
                assert_eq!(averages.len(), 13);
                assert_eq!(dropped.len(), 11);
                // Trailing mean of 1..=12 is 6.5.
                assert_relative_eq!(averages[0], 6.5, epsilon = 1e-12);
            }
            other => panic!("unexpected step {:?}", other),
        }

        assert_series_close(&transformed.invert().unwrap(), &original);
    }

    #[test]
    fn full_chain_round_trips_within_tolerance() {
        let values: Vec<f64> = (0..48)
            .map(|t| 100.0 + 2.0 * t as f64 + 10.0 * ((t % 12) as f64))
            .collect();
        let original = monthly_series(values);

        let transformed = TransformedSeries::identity(original.clone())
            .log()
            .unwrap()
            .moving_average_subtract(12)
            .unwrap()
            .difference(1)
            .unwrap();

        assert_eq!(transformed.chain().describe(), "log + ma_subtract(12) + diff(1)");
        assert_series_close(&transformed.invert().unwrap(), &original);
    }

    #[test]
    fn invert_detects_misaligned_state() {
        let original = monthly_series((1..=24).map(|i| i as f64).collect());
        let (series, chain) = TransformedSeries::identity(original)
            .moving_average_subtract(12)
            .unwrap()
            .into_parts();

        // Inverting a truncated series against the stored averages must fail.
        let truncated = series.slice(0, series.len() - 2).unwrap();
        assert!(matches!(
            chain.invert(&truncated),
            Err(PipelineError::Inversion(_))
        ));
    }

    #[test]
    fn project_continues_differencing_from_history_tail() {
        let original = monthly_series(vec![10.0, 12.0, 15.0, 19.0, 24.0]);
        let (series, chain) = TransformedSeries::identity(original)
            .difference(1)
            .unwrap()
            .into_parts();

        let projected = chain.project(&series, &[6.0, 7.0]).unwrap();
        assert_relative_eq!(projected[0], 30.0, epsilon = 1e-9);
        assert_relative_eq!(projected[1], 37.0, epsilon = 1e-9);
    }

    #[test]
    fn project_solves_moving_average_recursion() {
        // Constant series: rolling mean equals the constant, transform is 0,
        // projecting zeros must reproduce the constant.
        let original = monthly_series(vec![5.0; 24]);
        let (series, chain) = TransformedSeries::identity(original)
            .moving_average_subtract(12)
            .unwrap()
            .into_parts();

        let projected = chain.project(&series, &[0.0, 0.0, 0.0]).unwrap();
        for v in projected {
            assert_relative_eq!(v, 5.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn project_round_trips_against_held_out_tail() {
        // Transform the first 36 points, then project the transformed values
        // of the held-out tail and compare with the actual tail.
        let values: Vec<f64> = (0..48)
            .map(|t| (100.0 + 2.0 * t as f64 + 10.0 * ((t % 12) as f64)).ln())
            .collect();
        let full = monthly_series(values.iter().map(|v| v.exp()).collect());
        let head = full.slice(0, 36).unwrap();

        let (hist, chain) = TransformedSeries::identity(head)
            .log()
            .unwrap()
            .moving_average_subtract(12)
            .unwrap()
            .into_parts();

        // Compute what the transform would emit for the tail by running the
        // chain over the full series and taking its last 12 points.
        let (full_transformed, _) = TransformedSeries::identity(full.clone())
            .log()
            .unwrap()
            .moving_average_subtract(12)
            .unwrap()
            .into_parts();
        let tail_transformed =
            &full_transformed.values()[full_transformed.len() - 12..];

        let projected = chain.project(&hist, tail_transformed).unwrap();
        for (p, actual) in projected.iter().zip(&full.values()[36..]) {
            assert_relative_eq!(p, actual, max_relative = 1e-9);
        }
    }

    #[test]
    fn identity_chain_is_empty() {
        let original = monthly_series(vec![1.0, 2.0]);
        let transformed = TransformedSeries::identity(original.clone());
        assert!(transformed.chain().is_empty());
        assert_eq!(transformed.chain().describe(), "identity");
        assert_series_close(&transformed.invert().unwrap(), &original);
    }
}
