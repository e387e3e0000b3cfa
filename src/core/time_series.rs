//! TimeSeries data structure for univariate temporal data.

use crate::error::{PipelineError, Result};
use chrono::{DateTime, Duration, Months, Utc};

/// Declared spacing between consecutive observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    /// One observation per calendar month.
    Monthly,
    /// Fixed spacing (hourly, daily, ...).
    Fixed(Duration),
}

impl Frequency {
    /// Advance a timestamp by `steps` periods.
    pub fn advance(&self, ts: DateTime<Utc>, steps: u32) -> Result<DateTime<Utc>> {
        match self {
            Frequency::Monthly => ts.checked_add_months(Months::new(steps)).ok_or_else(|| {
                PipelineError::TimestampError(format!(
                    "timestamp overflow advancing {} months from {}",
                    steps, ts
                ))
            }),
            Frequency::Fixed(duration) => Ok(ts + *duration * steps as i32),
        }
    }

    /// Generate `count` future timestamps starting one period after `last`.
    pub fn future_timestamps(
        &self,
        last: DateTime<Utc>,
        count: usize,
    ) -> Result<Vec<DateTime<Utc>>> {
        (1..=count as u32).map(|step| self.advance(last, step)).collect()
    }
}

/// A univariate time series: strictly increasing timestamps at a declared
/// frequency, one value per timestamp.
///
/// Values are immutable once constructed; every transform in the pipeline
/// produces a new `TimeSeries` rather than mutating in place.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    timestamps: Vec<DateTime<Utc>>,
    values: Vec<f64>,
    frequency: Frequency,
}

impl TimeSeries {
    /// Create a new time series, validating timestamp monotonicity and
    /// length agreement.
    pub fn new(
        timestamps: Vec<DateTime<Utc>>,
        values: Vec<f64>,
        frequency: Frequency,
    ) -> Result<Self> {
        if timestamps.len() != values.len() {
            return Err(PipelineError::DimensionMismatch {
                expected: timestamps.len(),
                got: values.len(),
            });
        }

        for i in 1..timestamps.len() {
            if timestamps[i] <= timestamps[i - 1] {
                return Err(PipelineError::TimestampError(
                    "timestamps must be strictly increasing".to_string(),
                ));
            }
        }

        Ok(Self {
            timestamps,
            values,
            frequency,
        })
    }

    /// Create a monthly series starting at `start`, one value per month.
    pub fn monthly(start: DateTime<Utc>, values: Vec<f64>) -> Result<Self> {
        let mut timestamps = Vec::with_capacity(values.len());
        for i in 0..values.len() as u32 {
            timestamps.push(Frequency::Monthly.advance(start, i)?);
        }
        Self::new(timestamps, values, Frequency::Monthly)
    }

    /// Get the number of observations.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Check if the series is empty.
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Get the observed values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Get the timestamps.
    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    /// Get the declared frequency.
    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    /// Get the last observed timestamp.
    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamps.last().copied()
    }

    /// Extract a half-open slice `[start, end)` of the series.
    pub fn slice(&self, start: usize, end: usize) -> Result<TimeSeries> {
        if start > end || end > self.len() {
            return Err(PipelineError::InvalidParameter(format!(
                "slice bounds {}..{} out of range for series of length {}",
                start,
                end,
                self.len()
            )));
        }

        Ok(TimeSeries {
            timestamps: self.timestamps[start..end].to_vec(),
            values: self.values[start..end].to_vec(),
            frequency: self.frequency,
        })
    }

    /// Build a new series sharing this one's tail timestamps with new values.
    ///
    /// `values` must not be longer than the series; it is aligned to the
    /// last `values.len()` timestamps, matching transforms that drop a
    /// fixed-length prefix.
    pub fn with_tail_values(&self, values: Vec<f64>) -> Result<TimeSeries> {
        if values.len() > self.len() {
            return Err(PipelineError::DimensionMismatch {
                expected: self.len(),
                got: values.len(),
            });
        }
        let offset = self.len() - values.len();
        Ok(TimeSeries {
            timestamps: self.timestamps[offset..].to_vec(),
            values,
            frequency: self.frequency,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn monthly_series_generates_calendar_timestamps() {
        let ts = TimeSeries::monthly(start(), vec![1.0, 2.0, 3.0]).unwrap();

        assert_eq!(ts.len(), 3);
        assert_eq!(ts.values(), &[1.0, 2.0, 3.0]);
        assert_eq!(
            ts.timestamps()[1],
            Utc.with_ymd_and_hms(2020, 2, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(
            ts.timestamps()[2],
            Utc.with_ymd_and_hms(2020, 3, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn new_rejects_length_mismatch() {
        let timestamps = vec![start()];
        let result = TimeSeries::new(timestamps, vec![1.0, 2.0], Frequency::Monthly);
        assert!(matches!(
            result,
            Err(PipelineError::DimensionMismatch { expected: 1, got: 2 })
        ));
    }

    #[test]
    fn new_rejects_non_increasing_timestamps() {
        let t0 = start();
        let t1 = Utc.with_ymd_and_hms(2020, 2, 1, 0, 0, 0).unwrap();

        let result = TimeSeries::new(vec![t1, t0], vec![1.0, 2.0], Frequency::Monthly);
        assert!(matches!(result, Err(PipelineError::TimestampError(_))));

        let result = TimeSeries::new(vec![t0, t0], vec![1.0, 2.0], Frequency::Monthly);
        assert!(matches!(result, Err(PipelineError::TimestampError(_))));
    }

    #[test]
    fn future_timestamps_follow_last_observation() {
        let ts = TimeSeries::monthly(start(), vec![1.0, 2.0]).unwrap();
        let last = ts.last_timestamp().unwrap();

        let future = ts.frequency().future_timestamps(last, 3).unwrap();
        assert_eq!(future.len(), 3);
        assert_eq!(future[0], Utc.with_ymd_and_hms(2020, 3, 1, 0, 0, 0).unwrap());
        assert_eq!(future[2], Utc.with_ymd_and_hms(2020, 5, 1, 0, 0, 0).unwrap());
        assert!(future.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn fixed_frequency_advances_by_duration() {
        let freq = Frequency::Fixed(Duration::hours(1));
        let later = freq.advance(start(), 5).unwrap();
        assert_eq!(later, start() + Duration::hours(5));
    }

    #[test]
    fn slice_and_tail_values_align_timestamps() {
        let ts = TimeSeries::monthly(start(), vec![1.0, 2.0, 3.0, 4.0]).unwrap();

        let sliced = ts.slice(1, 3).unwrap();
        assert_eq!(sliced.values(), &[2.0, 3.0]);
        assert_eq!(sliced.timestamps()[0], ts.timestamps()[1]);

        let tail = ts.with_tail_values(vec![10.0, 20.0]).unwrap();
        assert_eq!(tail.timestamps()[0], ts.timestamps()[2]);
        assert_eq!(tail.values(), &[10.0, 20.0]);

        assert!(ts.with_tail_values(vec![0.0; 5]).is_err());
        assert!(ts.slice(3, 2).is_err());
    }
}
