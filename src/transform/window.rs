//! Trailing rolling-window statistics.

/// Trailing (non-centered) rolling mean.
///
/// Entries where the window is incomplete are `NaN`.
pub fn rolling_mean(series: &[f64], window: usize) -> Vec<f64> {
    let n = series.len();
    if window == 0 {
        return vec![f64::NAN; n];
    }

    let mut result = vec![f64::NAN; n];
    for i in (window - 1)..n {
        let start = i + 1 - window;
        let sum: f64 = series[start..=i].iter().sum();
        result[i] = sum / window as f64;
    }
    result
}

/// Trailing rolling sample standard deviation.
///
/// Entries where the window is incomplete are `NaN`; requires `window >= 2`.
pub fn rolling_std(series: &[f64], window: usize) -> Vec<f64> {
    let n = series.len();
    if window < 2 {
        return vec![f64::NAN; n];
    }

    let mut result = vec![f64::NAN; n];
    for i in (window - 1)..n {
        let start = i + 1 - window;
        let segment = &series[start..=i];
        let mean = segment.iter().sum::<f64>() / window as f64;
        let var =
            segment.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (window - 1) as f64;
        result[i] = var.sqrt();
    }
    result
}
