use super::types::{Pattern, Trend};

pub const TREND_THRESHOLD: f64 = 0.1;
pub const CONSISTENT_RATIO: f64 = 0.1;
pub const VOLATILE_RATIO: f64 = 0.5;
pub const OUTLIER_SIGMAS: f64 = 2.0;

pub fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Upper-middle element of the sorted values; even lengths are not averaged.
pub fn upper_median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted[sorted.len() / 2]
}

/// Population standard deviation (divides by n).
pub fn population_std_dev(values: &[f64], avg: f64) -> f64 {
    let variance = values.iter()
        .map(|v| (v - avg).powi(2))
        .sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Ordinary least squares slope of the values against their position.
pub fn index_slope(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let (sum_x, sum_y, sum_xy, sum_xx) = values.iter().enumerate().fold(
        (0.0, 0.0, 0.0, 0.0),
        |(sx, sy, sxy, sxx), (i, &y)| {
            let x = i as f64;
            (sx + x, sy + y, sxy + x * y, sxx + x * x)
        },
    );

    (n * sum_xy - sum_x * sum_y) / (n * sum_xx - sum_x * sum_x)
}

pub fn classify_trend(slope: f64) -> Trend {
    if slope > TREND_THRESHOLD {
        Trend::Up
    } else if slope < -TREND_THRESHOLD {
        Trend::Down
    } else {
        Trend::Stable
    }
}

/// Classifies by coefficient of variation. A zero mean is not guarded:
/// the ratio follows IEEE rules (+inf is Volatile, -inf Consistent, NaN Moderate).
pub fn classify_pattern(std_dev: f64, avg: f64) -> Pattern {
    let ratio = std_dev / avg;
    if ratio < CONSISTENT_RATIO {
        Pattern::Consistent
    } else if ratio > VOLATILE_RATIO {
        Pattern::Volatile
    } else {
        Pattern::Moderate
    }
}

pub fn count_outliers(values: &[f64], avg: f64, std_dev: f64) -> usize {
    let limit = OUTLIER_SIGMAS * std_dev;
    values.iter().filter(|v| (*v - avg).abs() > limit).count()
}

/// Share of complete rows as a whole percentage, halves rounded up.
pub fn completeness_percent(total_rows: usize, missing_rows: usize) -> u32 {
    let complete = (total_rows - missing_rows) as f64;
    (complete / total_rows as f64 * 100.0).round() as u32
}
