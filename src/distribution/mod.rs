//! Sampling distributions
//!
//! This module maps uniform draws onto the distribution families used by the
//! simulators. Every sampler is total: degenerate parameters are clamped
//! rather than rejected, so a run never fails inside the sampling loop.
//!
//! # Distributions
//!
//! - **Exponential**: inverse CDF, one draw
//! - **Uniform**: linear map onto `[min(a,b), max(a,b)]`, one draw
//! - **Triangular**: piecewise inverse CDF, one draw
//! - **Constant**: ignores the draw
//! - **Lognormal**: parameterised by mean and coefficient of variation,
//!   Box-Muller normal variate, two draws
//!
//! # Example
//!
//! ```
//! use outfall::distribution::DistributionSpec;
//! use outfall::rng::Mulberry32;
//!
//! let spec = DistributionSpec::Triangular { min: 30.0, mode: 60.0, max: 85.0 };
//! let mut rng = Mulberry32::new(42);
//! let x = spec.sample(&mut rng);
//! assert!((30.0..=85.0).contains(&x));
//! ```

use crate::rng::UniformSource;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod exponential;
pub mod lognormal;
pub mod triangular;
pub mod uniform;

use exponential::Exponential;
use lognormal::Lognormal;
use triangular::Triangular;
use uniform::Uniform;

/// A family that turns uniform draws into values
pub trait Sampler {
    /// Draw one value from `source`
    fn sample<S: UniformSource + ?Sized>(&self, source: &mut S) -> f64;
}

/// Distribution specification as it appears in configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DistributionSpec {
    Exponential { mean: f64 },
    Uniform { a: f64, b: f64 },
    Triangular { min: f64, mode: f64, max: f64 },
    Constant { value: f64 },
    Lognormal { mean: f64, cv: f64 },
}

impl DistributionSpec {
    /// Draw one value from the specified family
    pub fn sample<S: UniformSource + ?Sized>(&self, source: &mut S) -> f64 {
        match *self {
            Self::Exponential { mean } => Exponential::new(mean).sample(source),
            Self::Uniform { a, b } => Uniform::new(a, b).sample(source),
            Self::Triangular { min, mode, max } => Triangular::new(min, mode, max).sample(source),
            Self::Constant { value } => value.max(0.0),
            Self::Lognormal { mean, cv } => Lognormal::new(mean, cv).sample(source),
        }
    }

    /// Uniform draws consumed by one call to [`DistributionSpec::sample`]
    pub fn draws_per_sample(&self) -> usize {
        match self {
            Self::Lognormal { .. } => 2,
            Self::Constant { .. } => 0,
            _ => 1,
        }
    }

    /// Copy of this spec with every parameter floored at zero
    pub fn non_negative(&self) -> Self {
        match *self {
            Self::Exponential { mean } => Self::Exponential { mean: mean.max(0.0) },
            Self::Uniform { a, b } => Self::Uniform { a: a.max(0.0), b: b.max(0.0) },
            Self::Triangular { min, mode, max } => Self::Triangular {
                min: min.max(0.0),
                mode: mode.max(0.0),
                max: max.max(0.0),
            },
            Self::Constant { value } => Self::Constant { value: value.max(0.0) },
            Self::Lognormal { mean, cv } => Self::Lognormal { mean: mean.max(0.0), cv: cv.max(0.0) },
        }
    }

    /// All parameters as (name, value) pairs, for validation
    pub fn parameters(&self) -> Vec<(&'static str, f64)> {
        match *self {
            Self::Exponential { mean } => vec![("mean", mean)],
            Self::Uniform { a, b } => vec![("a", a), ("b", b)],
            Self::Triangular { min, mode, max } => vec![("min", min), ("mode", mode), ("max", max)],
            Self::Constant { value } => vec![("value", value)],
            Self::Lognormal { mean, cv } => vec![("mean", mean), ("cv", cv)],
        }
    }
}

impl fmt::Display for DistributionSpec {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Exponential { mean } => write!(f, "Exponential(mean={})", mean),
            Self::Uniform { a, b } => write!(f, "Uniform({}, {})", a, b),
            Self::Triangular { min, mode, max } => write!(f, "Triangular({}, {}, {})", min, mode, max),
            Self::Constant { value } => write!(f, "Constant({})", value),
            Self::Lognormal { mean, cv } => write!(f, "Lognormal(mean={}, cv={})", mean, cv),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{Mulberry32, SuppliedDraws};

    #[test]
    fn test_constant_ignores_draw_and_floors() {
        let mut draws = SuppliedDraws::new(&[0.3]);
        assert_eq!(DistributionSpec::Constant { value: 4.5 }.sample(&mut draws), 4.5);
        assert_eq!(draws.remaining(), 1);
        assert_eq!(DistributionSpec::Constant { value: -2.0 }.sample(&mut draws), 0.0);
    }

    #[test]
    fn test_draws_per_sample_matches_consumption() {
        let specs = [
            DistributionSpec::Exponential { mean: 5.0 },
            DistributionSpec::Uniform { a: 3.0, b: 7.0 },
            DistributionSpec::Triangular { min: 2.0, mode: 4.0, max: 8.0 },
            DistributionSpec::Constant { value: 3.0 },
            DistributionSpec::Lognormal { mean: 300.0, cv: 0.5 },
        ];
        let values = [0.25, 0.75, 0.5, 0.1];
        for spec in specs {
            let mut draws = SuppliedDraws::new(&values);
            spec.sample(&mut draws);
            assert_eq!(values.len() - draws.remaining(), spec.draws_per_sample(), "{}", spec);
        }
    }

    #[test]
    fn test_non_negative_clamps_all_parameters() {
        let spec = DistributionSpec::Triangular { min: -5.0, mode: 2.0, max: -1.0 };
        assert_eq!(
            spec.non_negative(),
            DistributionSpec::Triangular { min: 0.0, mode: 2.0, max: 0.0 }
        );
    }

    #[test]
    fn test_spec_deserializes_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            dist: DistributionSpec,
        }
        let w: Wrapper = ::toml::from_str("dist = { kind = \"lognormal\", mean = 300.0, cv = 0.5 }").unwrap();
        assert_eq!(w.dist, DistributionSpec::Lognormal { mean: 300.0, cv: 0.5 });
    }

    #[test]
    fn test_samples_are_finite_for_all_families() {
        let mut rng = Mulberry32::new(99);
        let specs = [
            DistributionSpec::Exponential { mean: 0.0 },
            DistributionSpec::Uniform { a: 7.0, b: 3.0 },
            DistributionSpec::Triangular { min: 5.0, mode: 5.0, max: 5.0 },
            DistributionSpec::Lognormal { mean: 0.0, cv: 0.0 },
        ];
        for spec in specs {
            for _ in 0..500 {
                assert!(spec.sample(&mut rng).is_finite(), "{}", spec);
            }
        }
    }
}
