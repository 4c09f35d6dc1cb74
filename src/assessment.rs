//! Assessment pipeline
//!
//! Runs the stages selected by the configuration and collects their results
//! in one report. Each stage either completes, is refused because a
//! precondition failed, or does not apply; a refused stage never stops the
//! others.
//!
//! ```text
//! Monte Carlo (ceiling from table) ──P95 as Lw (bod5)──> oxygen sag
//! queue          events          measurements -> evaluate + grade
//! ```

use crate::compliance::{
    evaluate_measurement, LoadCategory, MeasurementResult, Parameter, Receptor, ThresholdRule, ThresholdTable,
};
use crate::config::{Config, RunMode};
use crate::error::SimError;
use crate::simulation::events::{self, EventRun};
use crate::simulation::monte_carlo::{self, MonteCarloRun};
use crate::simulation::oxygen_sag::{self, OxygenSagProfile};
use crate::simulation::queue::{self, QueueRun};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Outcome of one stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum Stage<T> {
    Completed(T),
    /// A precondition failed
    Refused(SimError),
    NotApplicable(String),
}

impl<T> Stage<T> {
    pub fn completed(&self) -> Option<&T> {
        match self {
            Stage::Completed(v) => Some(v),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Stage::Completed(_) => "completed",
            Stage::Refused(_) => "refused",
            Stage::NotApplicable(_) => "not applicable",
        }
    }
}

/// Monte Carlo run with its regulatory context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloSection {
    pub parameter: Parameter,
    pub rule: ThresholdRule,
    pub run: MonteCarloRun,
}

/// Headline statistics of one seed in a sweep
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SweepEntry {
    pub seed: i64,
    pub p50: f64,
    pub p90: f64,
    pub p95: f64,
    pub compliance_probability: Option<f64>,
}

impl From<&MonteCarloRun> for SweepEntry {
    fn from(run: &MonteCarloRun) -> Self {
        Self {
            seed: run.seed,
            p50: run.p50(),
            p90: run.p90(),
            p95: run.p95(),
            compliance_probability: run.compliance_probability,
        }
    }
}

/// Where the discharge BOD load came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadSource {
    /// `river.discharge_bod`
    Configured,
    /// P95 of the simulated BOD5 effluent
    SimulatedP95,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OxygenSagSection {
    pub discharge_bod: f64,
    pub load_source: LoadSource,
    pub profile: OxygenSagProfile,
}

/// Everything one invocation produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentReport {
    pub mode: RunMode,
    pub receptor: Receptor,
    pub category: LoadCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monte_carlo: Option<MonteCarloSection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sweep: Option<Vec<SweepEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oxygen_sag: Option<Stage<OxygenSagSection>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue: Option<Stage<QueueRun>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events: Option<Stage<EventRun>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measurements: Option<Vec<MeasurementResult>>,
}

/// Consecutive seeds starting at `first`
pub fn sweep_seed_list(first: i64, count: usize) -> Vec<i64> {
    (0..count).map(|i| first.wrapping_add(i as i64)).collect()
}

fn run_oxygen_sag(config: &Config, mc: Option<&MonteCarloSection>) -> Stage<OxygenSagSection> {
    let (discharge_bod, load_source) = match (config.river.discharge_bod, mc) {
        (Some(bod), _) => (bod, LoadSource::Configured),
        (None, Some(section)) if section.parameter == Parameter::Bod5 => (section.run.p95(), LoadSource::SimulatedP95),
        (None, Some(section)) => {
            return Stage::NotApplicable(format!(
                "simulated parameter is {}, not bod5; set river.discharge_bod",
                section.parameter
            ))
        }
        (None, None) => return Stage::NotApplicable("no discharge BOD load available".to_string()),
    };

    match oxygen_sag::solve(&config.river.to_params(discharge_bod)) {
        Ok(profile) => Stage::Completed(OxygenSagSection {
            discharge_bod,
            load_source,
            profile,
        }),
        Err(e) => Stage::Refused(e),
    }
}

fn run_events(config: &Config) -> Stage<EventRun> {
    let outcome = config
        .events
        .draws
        .resolve()
        .and_then(|draws| events::simulate(&config.events.entries, &draws));
    match outcome {
        Ok(run) => Stage::Completed(run),
        Err(e) => Stage::Refused(e),
    }
}

/// Run every stage the configured mode selects
pub fn run_assessment(config: &Config, table: &ThresholdTable) -> AssessmentReport {
    let mode = config.runtime.mode;
    let receptor = config.compliance.receptor;
    let category = config.compliance.category;
    info!(%mode, %receptor, %category, "starting assessment");

    let monte_carlo = mode.runs_monte_carlo().then(|| {
        let parameter = config.monte_carlo.parameter;
        let rule = table.lookup(parameter, receptor, category);
        let run = monte_carlo::run(&config.monte_carlo.to_params(), rule.ceiling());
        MonteCarloSection { parameter, rule, run }
    });

    let sweep = match (config.runtime.sweep_seeds, &monte_carlo) {
        (Some(n), Some(section)) => {
            let seeds = sweep_seed_list(config.monte_carlo.seed, n);
            let runs = monte_carlo::sweep_seeds(&config.monte_carlo.to_params(), &seeds, section.rule.ceiling());
            Some(runs.iter().map(SweepEntry::from).collect())
        }
        _ => None,
    };

    let oxygen_sag = mode
        .runs_oxygen_sag()
        .then(|| run_oxygen_sag(config, monte_carlo.as_ref()));

    let queue = mode.runs_queue().then(|| match queue::simulate(&config.queue) {
        Ok(run) => Stage::Completed(run),
        Err(e) => Stage::Refused(e),
    });

    let events = mode.runs_events().then(|| run_events(config));

    let measurements = mode.runs_compliance().then(|| {
        config
            .measurements
            .iter()
            .map(|m| evaluate_measurement(table, receptor, category, m))
            .collect::<Vec<_>>()
    });

    let refused = [
        oxygen_sag.as_ref().map(|s| s.label()),
        queue.as_ref().map(|s| s.label()),
        events.as_ref().map(|s| s.label()),
    ]
    .iter()
    .filter(|l| **l == Some("refused"))
    .count();
    if refused > 0 {
        warn!(refused, "assessment finished with refused stages");
    }

    AssessmentReport {
        mode,
        receptor,
        category,
        monte_carlo,
        sweep,
        oxygen_sag,
        queue,
        events,
        measurements,
    }
}
