//! Monte Carlo treatment driver
//!
//! Propagates influent uncertainty through a removal-efficiency model:
//!
//! ```text
//! effluent = influent * (1 - removal_pct / 100),   removal_pct clamped to [0, 100]
//! ```
//!
//! Per sample the generator is consumed in a fixed order: the influent draws
//! (two for lognormal, one otherwise), then one removal draw. A run is a pure
//! function of its parameters, so the same seed reproduces it bit for bit.
//!
//! # Example
//!
//! ```
//! use outfall::simulation::monte_carlo::{run, MonteCarloParams};
//!
//! let params = MonteCarloParams::default();
//! let a = run(&params, Some(90.0));
//! let b = run(&params, Some(90.0));
//! assert_eq!(a.compliance_probability, b.compliance_probability);
//! ```

use crate::distribution::triangular::Triangular;
use crate::distribution::{DistributionSpec, Sampler};
use crate::rng::Mulberry32;
use crate::stats::exceedance::{exceedance_curve, ExceedancePoint};
use crate::stats::histogram::FixedHistogram;
use crate::stats::{SeriesSummary, STANDARD_QUANTILES};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Smallest lognormal influent mean the driver samples with
const MIN_INFLUENT_MEAN: f64 = 1.0;

/// Smallest lognormal influent coefficient of variation
const MIN_INFLUENT_CV: f64 = 0.01;

/// Triangular removal efficiency, in percent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RemovalSpec {
    pub min: f64,
    pub mode: f64,
    pub max: f64,
}

impl Default for RemovalSpec {
    fn default() -> Self {
        Self {
            min: 30.0,
            mode: 60.0,
            max: 85.0,
        }
    }
}

/// Inputs of one Monte Carlo run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonteCarloParams {
    /// Number of samples; values below 1 run a single sample
    pub samples: usize,
    /// Generator seed, wrapped into u32
    pub seed: i64,
    /// Influent concentration distribution
    pub influent: DistributionSpec,
    /// Removal efficiency distribution (percent)
    pub removal: RemovalSpec,
}

impl Default for MonteCarloParams {
    fn default() -> Self {
        Self {
            samples: 200,
            seed: 42,
            influent: DistributionSpec::Lognormal { mean: 300.0, cv: 0.5 },
            removal: RemovalSpec::default(),
        }
    }
}

/// One simulated treatment outcome
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreatmentSample {
    pub influent: f64,
    /// Removal efficiency after clamping to [0, 100]
    pub removal_pct: f64,
    pub effluent: f64,
}

/// Result of one Monte Carlo run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloRun {
    pub seed: i64,
    pub samples: Vec<TreatmentSample>,
    /// Effluent statistics at P50/P90/P95
    pub effluent: SeriesSummary,
    /// Ceiling the compliance probability was computed against
    pub ceiling: Option<f64>,
    /// Percent of effluent draws at or below the ceiling
    pub compliance_probability: Option<f64>,
    pub histogram: FixedHistogram,
    pub exceedance: Vec<ExceedancePoint>,
}

impl MonteCarloRun {
    pub fn p50(&self) -> f64 {
        self.effluent.percentile(0.50).unwrap_or(f64::NAN)
    }

    pub fn p90(&self) -> f64 {
        self.effluent.percentile(0.90).unwrap_or(f64::NAN)
    }

    pub fn p95(&self) -> f64 {
        self.effluent.percentile(0.95).unwrap_or(f64::NAN)
    }
}

/// Percent of `values` at or below `ceiling`
pub fn compliance_probability(values: &[f64], ceiling: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let within = values.iter().filter(|&&x| x <= ceiling).count();
    within as f64 / values.len() as f64 * 100.0
}

/// Influent spec with the driver's floors applied
fn influent_for_driver(spec: &DistributionSpec) -> DistributionSpec {
    match spec.non_negative() {
        DistributionSpec::Lognormal { mean, cv } => DistributionSpec::Lognormal {
            mean: mean.max(MIN_INFLUENT_MEAN),
            cv: cv.max(MIN_INFLUENT_CV),
        },
        other => other,
    }
}

/// Draw the treatment samples for a run
pub fn draw_samples(params: &MonteCarloParams) -> Vec<TreatmentSample> {
    let n = params.samples.max(1);
    let influent = influent_for_driver(&params.influent);
    let removal = Triangular::new(
        params.removal.min.max(0.0),
        params.removal.mode.max(0.0),
        params.removal.max.max(0.0),
    );
    let mut rng = Mulberry32::from_signed(params.seed);

    (0..n)
        .map(|_| {
            let e = influent.sample(&mut rng);
            let removal_pct = removal.sample(&mut rng).clamp(0.0, 100.0);
            TreatmentSample {
                influent: e,
                removal_pct,
                effluent: e * (1.0 - removal_pct / 100.0),
            }
        })
        .collect()
}

/// Run the simulation and derive all statistics
///
/// `ceiling` is the regulatory maximum for the simulated parameter; without
/// one the compliance probability is not applicable.
pub fn run(params: &MonteCarloParams, ceiling: Option<f64>) -> MonteCarloRun {
    debug!(
        seed = params.seed,
        samples = params.samples,
        influent = %params.influent,
        "starting Monte Carlo run"
    );

    let samples = draw_samples(params);
    let effluent: Vec<f64> = samples.iter().map(|s| s.effluent).collect();

    let summary = SeriesSummary::from_values(&effluent, &STANDARD_QUANTILES);
    let compliance = ceiling.map(|c| compliance_probability(&effluent, c));
    let histogram = FixedHistogram::from_values(&effluent);
    let exceedance = exceedance_curve(&effluent);

    info!(
        seed = params.seed,
        samples = samples.len(),
        p50 = ?summary.percentile(0.50),
        p95 = ?summary.percentile(0.95),
        compliance = ?compliance,
        "Monte Carlo run complete"
    );

    MonteCarloRun {
        seed: params.seed,
        samples,
        effluent: summary,
        ceiling,
        compliance_probability: compliance,
        histogram,
        exceedance,
    }
}

/// Run the same parameters under several seeds in parallel
///
/// Each run builds its own generator; results come back in `seeds` order.
pub fn sweep_seeds(params: &MonteCarloParams, seeds: &[i64], ceiling: Option<f64>) -> Vec<MonteCarloRun> {
    seeds
        .par_iter()
        .map(|&seed| {
            let params = MonteCarloParams {
                seed,
                ..params.clone()
            };
            run(&params, ceiling)
        })
        .collect()
}
