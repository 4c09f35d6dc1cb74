//! Exceedance (duration) curve
//!
//! Sort descending; the i-th value (1-indexed) is equalled or exceeded by
//! `i / N * 100` percent of the samples.

use serde::{Deserialize, Serialize};

/// One point of the curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExceedancePoint {
    /// Percent of samples at or above `value`
    pub percent: f64,
    pub value: f64,
}

/// Exceedance curve of `values`, x ascending and y non-increasing
pub fn exceedance_curve(values: &[f64]) -> Vec<ExceedancePoint> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| b.total_cmp(a));
    let n = sorted.len() as f64;
    sorted
        .into_iter()
        .enumerate()
        .map(|(i, value)| ExceedancePoint {
            percent: (i + 1) as f64 / n * 100.0,
            value,
        })
        .collect()
}
