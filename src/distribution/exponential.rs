//! Exponential distribution
//!
//! Inverse-CDF sampling: `x = -mean * ln(1 - u)`. The draw is kept away from
//! exactly 0 and 1 so the result is neither zero nor infinite.

use super::Sampler;
use crate::rng::UniformSource;

/// Smallest mean accepted before clamping
const MIN_MEAN: f64 = 1e-9;

/// Distance the draw is kept from the ends of [0,1]
const U_EPSILON: f64 = 1e-12;

/// Exponential distribution with the given mean
#[derive(Debug, Clone, Copy)]
pub struct Exponential {
    mean: f64,
}

impl Exponential {
    /// Create an exponential distribution; non-positive means are floored
    pub fn new(mean: f64) -> Self {
        Self { mean: mean.max(MIN_MEAN) }
    }

    /// Map one uniform draw through the inverse CDF
    pub fn inverse_cdf(&self, u: f64) -> f64 {
        let u = u.clamp(U_EPSILON, 1.0 - U_EPSILON);
        -self.mean * (1.0 - u).ln()
    }
}

impl Sampler for Exponential {
    fn sample<S: UniformSource + ?Sized>(&self, source: &mut S) -> f64 {
        self.inverse_cdf(source.next_uniform())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::Mulberry32;

    #[test]
    fn test_exponential_median() {
        let dist = Exponential::new(5.0);
        let median = dist.inverse_cdf(0.5);
        assert!((median - 5.0 * std::f64::consts::LN_2).abs() < 1e-12);
    }

    #[test]
    fn test_exponential_extremes_are_finite_and_positive() {
        let dist = Exponential::new(2.0);
        assert!(dist.inverse_cdf(0.0) > 0.0);
        assert!(dist.inverse_cdf(1.0).is_finite());
    }

    #[test]
    fn test_exponential_zero_mean_is_floored() {
        let dist = Exponential::new(0.0);
        let x = dist.inverse_cdf(0.5);
        assert!(x > 0.0 && x < 1e-8);
    }

    #[test]
    fn test_exponential_sample_mean() {
        let dist = Exponential::new(5.0);
        let mut rng = Mulberry32::new(1234);
        let n = 20_000;
        let mean = (0..n).map(|_| dist.sample(&mut rng)).sum::<f64>() / n as f64;
        assert!((mean - 5.0).abs() < 0.25, "mean={}", mean);
    }
}
