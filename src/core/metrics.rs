//! Descriptive statistics over projected rows.
//!
//! Standard deviation is the population form (divide by N). Quartiles and the
//! median use linear interpolation between closest ranks at position
//! `(n - 1) * p` on the ascending sort.

use crate::types::{DerivedRow, MetricsResult, StatSummary};

/// Statistics for each numeric axis. Never fails; a column with no finite
/// values gets [`StatSummary::zero`].
pub fn summarize(rows: &[DerivedRow], numeric_axes: &[String]) -> MetricsResult {
    let mut result = MetricsResult::new();
    for axis in numeric_axes {
        let values: Vec<f64> = rows
            .iter()
            .filter_map(|row| row.value(axis))
            .filter(|v| v.is_finite())
            .collect();
        result.insert(axis.clone(), describe(&values));
    }
    result
}

/// Full statistic set for one series of values.
pub fn describe(values: &[f64]) -> StatSummary {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return StatSummary::zero();
    }

    let mut sorted = finite.clone();
    sorted.sort_by(f64::total_cmp);

    let sum: f64 = finite.iter().sum();
    let average = sum / finite.len() as f64;

    StatSummary {
        sum,
        average,
        max: sorted[sorted.len() - 1],
        min: sorted[0],
        median: quantile_sorted(&sorted, 0.5),
        std_dev: population_std_dev(&finite, average),
        q1: quantile_sorted(&sorted, 0.25),
        q3: quantile_sorted(&sorted, 0.75),
    }
}

fn population_std_dev(values: &[f64], mean: f64) -> f64 {
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Linear-interpolation quantile of an ascending, non-empty slice.
fn quantile_sorted(sorted: &[f64], p: f64) -> f64 {
    let position = (sorted.len() - 1) as f64 * p;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}
