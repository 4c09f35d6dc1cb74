//! Triangular distribution
//!
//! The three parameters may arrive in any order. The effective triple is
//! `low = min(all)`, `high = max(all)` and `peak = mode` clamped into
//! `[low, high]`. Sampling is the piecewise inverse CDF with the branch point
//! at `Fm = (peak - low) / (high - low)`.

use super::Sampler;
use crate::rng::UniformSource;

/// Triangular distribution on a normalised `[low, peak, high]` triple
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangular {
    low: f64,
    peak: f64,
    high: f64,
}

impl Triangular {
    pub fn new(min: f64, mode: f64, max: f64) -> Self {
        let low = min.min(mode).min(max);
        let high = min.max(mode).max(max);
        let peak = mode.min(high).max(low);
        Self { low, peak, high }
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn peak(&self) -> f64 {
        self.peak
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    pub fn inverse_cdf(&self, u: f64) -> f64 {
        let width = self.high - self.low;
        if width <= 0.0 {
            return self.low;
        }
        let fm = (self.peak - self.low) / width;
        let x = if u < fm {
            self.low + (u * width * (self.peak - self.low)).sqrt()
        } else {
            self.high - ((1.0 - u) * width * (self.high - self.peak)).sqrt()
        };
        x.clamp(self.low, self.high)
    }
}

impl Sampler for Triangular {
    fn sample<S: UniformSource + ?Sized>(&self, source: &mut S) -> f64 {
        self.inverse_cdf(source.next_uniform())
    }
}
