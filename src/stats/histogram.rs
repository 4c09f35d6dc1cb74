//! Fixed-bin linear histogram
//!
//! Twelve equal-width bins spanning `[min, max]` of the series. A sample
//! lands in `clamp(floor((x - min) / width), 0, 11)`, so the maximum falls in
//! the last bin and every sample is counted exactly once.

use serde::{Deserialize, Serialize};

/// Number of bins in the output-concentration histogram
pub const NUM_BINS: usize = 12;

/// Histogram over one sample series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedHistogram {
    /// Left edge of the first bin
    min: f64,
    /// Bin width; 1 when the series has zero range
    width: f64,
    /// Counts per bin
    counts: [u64; NUM_BINS],
}

/// One bin with its edges
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: u64,
}

impl FixedHistogram {
    /// Build the histogram of `values`
    ///
    /// An empty series yields all-zero counts on `[0, 12)`.
    pub fn from_values(values: &[f64]) -> Self {
        let (min, max) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| (lo.min(x), hi.max(x)));
        if values.is_empty() {
            return Self {
                min: 0.0,
                width: 1.0,
                counts: [0; NUM_BINS],
            };
        }

        let range_width = (max - min) / NUM_BINS as f64;
        let width = if range_width > 0.0 { range_width } else { 1.0 };

        let mut counts = [0u64; NUM_BINS];
        for &x in values {
            let idx = ((x - min) / width).floor();
            // NaN and negative indices fall into bin 0
            let idx = if idx >= 0.0 { (idx as usize).min(NUM_BINS - 1) } else { 0 };
            counts[idx] += 1;
        }

        Self { min, width, counts }
    }

    /// Total number of samples
    pub fn len(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn counts(&self) -> &[u64; NUM_BINS] {
        &self.counts
    }

    /// Bins with their edges, left to right
    pub fn bins(&self) -> Vec<HistogramBin> {
        self.counts
            .iter()
            .enumerate()
            .map(|(i, &count)| HistogramBin {
                lower: self.min + i as f64 * self.width,
                upper: self.min + (i + 1) as f64 * self.width,
                count,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn histogram_conserves_samples(values in prop::collection::vec(-1e9f64..1e9, 0..1000)) {
            let hist = FixedHistogram::from_values(&values);
            prop_assert_eq!(hist.len(), values.len() as u64);
            prop_assert_eq!(hist.bins().iter().map(|b| b.count).sum::<u64>(), values.len() as u64);
        }
    }

    #[test]
    fn test_histogram_max_lands_in_last_bin() {
        let values: Vec<f64> = (0..=12).map(|i| i as f64).collect();
        let hist = FixedHistogram::from_values(&values);
        assert_eq!(hist.width(), 1.0);
        // 0..=10 one each, 11 and 12 share the last bin
        assert_eq!(hist.counts()[0], 1);
        assert_eq!(hist.counts()[11], 2);
    }

    #[test]
    fn test_histogram_zero_range() {
        let hist = FixedHistogram::from_values(&[5.0; 20]);
        assert_eq!(hist.width(), 1.0);
        assert_eq!(hist.counts()[0], 20);
        let bins = hist.bins();
        assert_eq!(bins[0].lower, 5.0);
        assert_eq!(bins[0].upper, 6.0);
    }

    #[test]
    fn test_histogram_bin_edges() {
        let hist = FixedHistogram::from_values(&[0.0, 24.0]);
        let bins = hist.bins();
        assert_eq!(bins.len(), NUM_BINS);
        assert_eq!(bins[0].lower, 0.0);
        assert_eq!(bins[11].upper, 24.0);
        assert_eq!(bins[11].count, 1);
    }

    #[test]
    fn test_histogram_empty() {
        let hist = FixedHistogram::from_values(&[]);
        assert!(hist.is_empty());
    }
}
