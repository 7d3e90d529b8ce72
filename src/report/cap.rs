//! Percentile capping for display.
//!
//! Clamps values above a quantile so that a handful of outliers do not
//! flatten a chart's scale. The source result is never modified; callers get
//! a fresh vector.

use crate::db::Value;

/// Quantile used by every capped chart.
pub const DISPLAY_PERCENTILE: f64 = 0.99;

/// Linear-interpolation quantile of the non-null values, or `None` if there are none.
///
/// `p` is clamped into `[0, 1]`.
pub fn percentile(values: &[Option<f64>], p: f64) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().flatten().copied().collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| a.total_cmp(b));

    let p = p.clamp(0.0, 1.0);
    let rank = p * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;

    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}

/// Coerces `values` to numbers and caps them at their `p`-quantile.
///
/// Non-numeric and NULL values become `None` and stay `None`. When there is
/// no numeric value at all the coerced values are returned as they are.
pub fn cap_by_percentile(values: &[&Value], p: f64) -> Vec<Option<f64>> {
    let numeric: Vec<Option<f64>> = values.iter().map(|v| v.as_f64()).collect();
    cap_numeric(numeric, p)
}

/// Caps already-numeric values at their `p`-quantile.
pub fn cap_numeric(values: Vec<Option<f64>>, p: f64) -> Vec<Option<f64>> {
    match percentile(&values, p) {
        Some(threshold) => values
            .into_iter()
            .map(|v| v.map(|x| x.min(threshold)))
            .collect(),
        None => values,
    }
}
