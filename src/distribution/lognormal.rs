//! Lognormal distribution
//!
//! Parameterised by the arithmetic mean and coefficient of variation of the
//! lognormal variable itself:
//!
//! ```text
//! sigma^2 = ln(1 + cv^2)
//! mu      = ln(mean) - sigma^2 / 2
//! x       = exp(mu + sigma * z)
//! ```
//!
//! `z` comes from the Box-Muller transform. Each sample consumes two draws,
//! `u1` then `u2`; the second Box-Muller output is discarded so that the draw
//! count per sample is fixed and runs replay exactly.

use super::Sampler;
use crate::rng::UniformSource;
use std::f64::consts::PI;

/// Floor applied to the mean before taking its logarithm
const MIN_MEAN: f64 = 1e-9;

/// Floor applied to the coefficient of variation
const MIN_CV: f64 = 1e-4;

/// Floor on the first Box-Muller draw, keeps ln(u1) finite
const MIN_U1: f64 = 1e-12;

/// Lognormal distribution from mean and coefficient of variation
#[derive(Debug, Clone, Copy)]
pub struct Lognormal {
    mu: f64,
    sigma: f64,
}

impl Lognormal {
    /// Create a lognormal distribution; degenerate inputs are floored
    pub fn new(mean: f64, cv: f64) -> Self {
        let cv = cv.max(MIN_CV);
        let sigma2 = (1.0 + cv * cv).ln();
        let mu = mean.max(MIN_MEAN).ln() - 0.5 * sigma2;
        Self {
            mu,
            sigma: sigma2.sqrt(),
        }
    }

    /// Location parameter of the underlying normal
    pub fn mu(&self) -> f64 {
        self.mu
    }

    /// Scale parameter of the underlying normal
    pub fn sigma(&self) -> f64 {
        self.sigma
    }
}

/// Standard normal variate from two uniform draws
pub fn standard_normal<S: UniformSource + ?Sized>(source: &mut S) -> f64 {
    let u1 = source.next_uniform().max(MIN_U1);
    let u2 = source.next_uniform();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

impl Sampler for Lognormal {
    fn sample<S: UniformSource + ?Sized>(&self, source: &mut S) -> f64 {
        (self.mu + self.sigma * standard_normal(source)).exp()
    }
}
