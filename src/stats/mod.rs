//! Sample-series statistics
//!
//! Order statistics over plain `f64` series: linear-interpolation percentiles,
//! means, a fixed-bin histogram and the exceedance (duration) curve.
//!
//! Every function takes its input by slice and returns fresh values; nothing
//! here mutates a caller's series.
//!
//! # Example
//!
//! ```
//! use outfall::stats::percentiles;
//!
//! let p = percentiles(&[4.0, 1.0, 3.0, 2.0, 5.0], &[0.5, 0.9, 0.95]);
//! assert_eq!(p[0], 3.0);
//! assert!(p[0] <= p[1] && p[1] <= p[2]);
//! ```

pub mod exceedance;
pub mod histogram;

use serde::{Deserialize, Serialize};

/// Quantiles reported for every Monte Carlo run
pub const STANDARD_QUANTILES: [f64; 3] = [0.50, 0.90, 0.95];

/// Copy of `values` sorted ascending (total order, NaN last)
pub fn sorted_ascending(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

/// Percentile of an ascending-sorted series by linear interpolation
///
/// `q` is a fraction in [0,1]; it is clamped. The rank is `(n-1)*q` and the
/// result interpolates between the two order statistics around it. Returns
/// NaN for an empty series.
pub fn percentile_sorted(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let rank = (sorted.len() - 1) as f64 * q.clamp(0.0, 1.0);
    let i0 = rank.floor() as usize;
    let i1 = rank.ceil() as usize;
    if i0 == i1 {
        return sorted[i0];
    }
    let w = rank - i0 as f64;
    sorted[i0] * (1.0 - w) + sorted[i1] * w
}

/// Several percentiles of an unsorted series, sorting once
pub fn percentiles(values: &[f64], quantiles: &[f64]) -> Vec<f64> {
    let sorted = sorted_ascending(values);
    quantiles.iter().map(|&q| percentile_sorted(&sorted, q)).collect()
}

/// Arithmetic mean, 0 for an empty series
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Requested quantile and its value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PercentilePoint {
    pub quantile: f64,
    pub value: f64,
}

/// Summary of one sample series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesSummary {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub percentiles: Vec<PercentilePoint>,
}

impl SeriesSummary {
    /// Summarise `values` at the requested quantiles
    pub fn from_values(values: &[f64], quantiles: &[f64]) -> Self {
        let sorted = sorted_ascending(values);
        let percentiles = quantiles
            .iter()
            .map(|&q| PercentilePoint {
                quantile: q,
                value: percentile_sorted(&sorted, q),
            })
            .collect();
        Self {
            count: values.len(),
            min: sorted.first().copied().unwrap_or(f64::NAN),
            max: sorted.last().copied().unwrap_or(f64::NAN),
            mean: mean(values),
            percentiles,
        }
    }

    /// Value at a quantile that was requested when summarising
    pub fn percentile(&self, quantile: f64) -> Option<f64> {
        self.percentiles
            .iter()
            .find(|p| (p.quantile - quantile).abs() < 1e-12)
            .map(|p| p.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_percentile_interpolates() {
        let sorted = [10.0, 20.0, 30.0, 40.0];
        // rank = 3 * 0.5 = 1.5
        assert_eq!(percentile_sorted(&sorted, 0.5), 25.0);
        assert_eq!(percentile_sorted(&sorted, 0.0), 10.0);
        assert_eq!(percentile_sorted(&sorted, 1.0), 40.0);
    }

    #[test]
    fn test_percentile_single_and_empty() {
        assert_eq!(percentile_sorted(&[7.0], 0.9), 7.0);
        assert!(percentile_sorted(&[], 0.5).is_nan());
    }

    proptest! {
        #[test]
        fn percentiles_are_monotone(values in prop::collection::vec(-1e6f64..1e6, 1..300)) {
            let p = percentiles(&values, &STANDARD_QUANTILES);
            // interpolation may round by an ulp
            let slack = 1e-9;
            prop_assert!(p[0] <= p[1] + slack && p[1] <= p[2] + slack, "p={:?}", p);
        }

        #[test]
        fn percentiles_stay_within_range(values in prop::collection::vec(-1e6f64..1e6, 1..300), q in 0.0f64..=1.0) {
            let sorted = sorted_ascending(&values);
            let x = percentile_sorted(&sorted, q);
            prop_assert!(x >= sorted[0] - 1e-9 && x <= sorted[sorted.len() - 1] + 1e-9);
        }
    }

    #[test]
    fn test_percentiles_do_not_mutate_input() {
        let values = vec![3.0, 1.0, 2.0];
        let _ = percentiles(&values, &[0.5]);
        assert_eq!(values, vec![3.0, 1.0, 2.0]);
    }

    #[test]
    fn test_summary() {
        let summary = SeriesSummary::from_values(&[1.0, 2.0, 3.0, 4.0, 5.0], &STANDARD_QUANTILES);
        assert_eq!(summary.count, 5);
        assert_eq!(summary.min, 1.0);
        assert_eq!(summary.max, 5.0);
        assert_eq!(summary.mean, 3.0);
        assert_eq!(summary.percentile(0.5), Some(3.0));
        assert!((summary.percentile(0.9).unwrap() - 4.6).abs() < 1e-12);
        assert_eq!(summary.percentile(0.99), None);
    }

    #[test]
    fn test_mean_empty() {
        assert_eq!(mean(&[]), 0.0);
    }
}
