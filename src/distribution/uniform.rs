//! Continuous uniform distribution
//!
//! Maps a draw linearly onto `[low, high]`, where the bounds are sorted from
//! the two supplied endpoints so callers may give them in either order.

use super::Sampler;
use crate::rng::UniformSource;

/// Uniform distribution over `[min(a,b), max(a,b)]`
#[derive(Debug, Clone, Copy)]
pub struct Uniform {
    low: f64,
    high: f64,
}

impl Uniform {
    pub fn new(a: f64, b: f64) -> Self {
        Self {
            low: a.min(b),
            high: a.max(b),
        }
    }

    pub fn inverse_cdf(&self, u: f64) -> f64 {
        self.low + (self.high - self.low) * u
    }
}

impl Sampler for Uniform {
    #[inline]
    fn sample<S: UniformSource + ?Sized>(&self, source: &mut S) -> f64 {
        self.inverse_cdf(source.next_uniform())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::Mulberry32;

    #[test]
    fn test_uniform_endpoints() {
        let dist = Uniform::new(3.0, 7.0);
        assert_eq!(dist.inverse_cdf(0.0), 3.0);
        assert_eq!(dist.inverse_cdf(0.5), 5.0);
    }

    #[test]
    fn test_uniform_swapped_bounds() {
        let dist = Uniform::new(7.0, 3.0);
        assert_eq!(dist.inverse_cdf(0.0), 3.0);
        assert_eq!(dist.inverse_cdf(0.25), 4.0);
    }

    #[test]
    fn test_uniform_distribution_coverage() {
        let dist = Uniform::new(0.0, 100.0);
        let mut rng = Mulberry32::new(42);
        let mut buckets = vec![0u32; 10];

        for _ in 0..10_000 {
            let x = dist.sample(&mut rng);
            assert!((0.0..100.0).contains(&x));
            buckets[(x / 10.0) as usize] += 1;
        }

        // Each bucket should have roughly 1000 samples (10000 / 10)
        for count in buckets {
            assert!(count > 800 && count < 1200, "Bucket count {} outside expected range", count);
        }
    }
}
