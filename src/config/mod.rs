//! Configuration module
//!
//! Handles CLI argument parsing, TOML configuration files, and validation.

pub mod cli;
pub mod toml;
pub mod validator;

use crate::compliance::{LoadCategory, Measurement, Parameter, Receptor};
use crate::distribution::DistributionSpec;
use crate::simulation::events::{default_events, EventDraws, ProbabilityEvent};
use crate::simulation::monte_carlo::{MonteCarloParams, RemovalSpec};
use crate::simulation::oxygen_sag::OxygenSagParams;
use crate::simulation::queue::QueueParams;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Complete run configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub monte_carlo: MonteCarloConfig,
    #[serde(default)]
    pub compliance: ComplianceConfig,
    #[serde(default)]
    pub river: RiverConfig,
    #[serde(default)]
    pub queue: QueueParams,
    #[serde(default)]
    pub events: EventsConfig,
    /// Measured influent/effluent pairs to evaluate
    #[serde(default)]
    pub measurements: Vec<Measurement>,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

/// Treatment uncertainty model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonteCarloConfig {
    /// Regulated parameter the effluent series stands for
    pub parameter: Parameter,
    pub samples: usize,
    pub seed: i64,
    pub influent: DistributionSpec,
    /// Removal efficiency in percent
    pub removal: RemovalSpec,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        let params = MonteCarloParams::default();
        Self {
            parameter: Parameter::Bod5,
            samples: params.samples,
            seed: params.seed,
            influent: params.influent,
            removal: params.removal,
        }
    }
}

impl MonteCarloConfig {
    pub fn to_params(&self) -> MonteCarloParams {
        MonteCarloParams {
            samples: self.samples,
            seed: self.seed,
            influent: self.influent.clone(),
            removal: self.removal,
        }
    }
}

/// Regulatory context
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplianceConfig {
    pub receptor: Receptor,
    pub category: LoadCategory,
    /// Replacement threshold table (TOML); the built-in table otherwise
    pub thresholds: Option<PathBuf>,
}

/// Receiving river for the oxygen-sag profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiverConfig {
    /// Qr (m³/s)
    pub upstream_flow: f64,
    /// Cr (mg/L)
    pub upstream_do: f64,
    /// Qw (m³/s)
    pub discharge_flow: f64,
    /// Lw (mg/L); when unset the simulated BOD5 P95 is used
    pub discharge_bod: Option<f64>,
    /// Cs (mg/L)
    pub saturation_do: f64,
    /// Kd (1/day)
    pub deoxygenation_rate: f64,
    /// Kr (1/day)
    pub reaeration_rate: f64,
    /// v (m/s)
    pub velocity: f64,
    pub max_distance_km: f64,
}

impl Default for RiverConfig {
    fn default() -> Self {
        Self {
            upstream_flow: 10.0,
            upstream_do: 8.5,
            discharge_flow: 0.2,
            discharge_bod: None,
            saturation_do: 9.2,
            deoxygenation_rate: 0.35,
            reaeration_rate: 0.65,
            velocity: 0.2,
            max_distance_km: 30.0,
        }
    }
}

impl RiverConfig {
    /// Solver inputs for a given discharge BOD load
    pub fn to_params(&self, discharge_bod: f64) -> OxygenSagParams {
        OxygenSagParams {
            upstream_flow: self.upstream_flow,
            upstream_do: self.upstream_do,
            discharge_flow: self.discharge_flow,
            discharge_bod,
            saturation_do: self.saturation_do,
            deoxygenation_rate: self.deoxygenation_rate,
            reaeration_rate: self.reaeration_rate,
            velocity: self.velocity,
            max_distance_km: self.max_distance_km,
        }
    }
}

/// Probability-event simulator inputs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    pub entries: Vec<ProbabilityEvent>,
    pub draws: EventDraws,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            entries: default_events(),
            draws: EventDraws::default(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// JSON report file
    pub json_output: Option<PathBuf>,
    /// Directory for the CSV series files
    pub csv_output: Option<PathBuf>,
    /// Print every sample/row in the text report
    pub show_rows: bool,
}

/// Runtime configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub mode: RunMode,
    /// Extra Monte Carlo runs over consecutive seeds
    pub sweep_seeds: Option<usize>,
    /// Validate and print the configuration without running
    pub dry_run: bool,
}

/// Which stages to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunMode {
    #[default]
    All,
    MonteCarlo,
    OxygenSag,
    Queue,
    Events,
    Compliance,
}

impl RunMode {
    pub fn runs_monte_carlo(&self) -> bool {
        matches!(self, RunMode::All | RunMode::MonteCarlo | RunMode::OxygenSag)
    }

    pub fn runs_oxygen_sag(&self) -> bool {
        matches!(self, RunMode::All | RunMode::OxygenSag)
    }

    pub fn runs_queue(&self) -> bool {
        matches!(self, RunMode::All | RunMode::Queue)
    }

    pub fn runs_events(&self) -> bool {
        matches!(self, RunMode::All | RunMode::Events)
    }

    pub fn runs_compliance(&self) -> bool {
        matches!(self, RunMode::All | RunMode::Compliance)
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            RunMode::All => "all",
            RunMode::MonteCarlo => "monte-carlo",
            RunMode::OxygenSag => "oxygen-sag",
            RunMode::Queue => "queue",
            RunMode::Events => "events",
            RunMode::Compliance => "compliance",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Mode: {}", self.runtime.mode)?;
        writeln!(
            f,
            "Monte Carlo: {} N={} seed={} influent={} removal={}/{}/{}%",
            self.monte_carlo.parameter,
            self.monte_carlo.samples,
            self.monte_carlo.seed,
            self.monte_carlo.influent,
            self.monte_carlo.removal.min,
            self.monte_carlo.removal.mode,
            self.monte_carlo.removal.max,
        )?;
        writeln!(
            f,
            "Compliance: receptor={} category={} thresholds={}",
            self.compliance.receptor,
            self.compliance.category,
            self.compliance
                .thresholds
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "built-in".to_string()),
        )?;
        writeln!(
            f,
            "River: Qr={} Cr={} Qw={} Lw={} Cs={} Kd={} Kr={} v={} x={}km",
            self.river.upstream_flow,
            self.river.upstream_do,
            self.river.discharge_flow,
            self.river
                .discharge_bod
                .map(|v| v.to_string())
                .unwrap_or_else(|| "simulated P95".to_string()),
            self.river.saturation_do,
            self.river.deoxygenation_rate,
            self.river.reaeration_rate,
            self.river.velocity,
            self.river.max_distance_km,
        )?;
        writeln!(
            f,
            "Queue: N={} k={} seed={} trigger={}",
            self.queue.entities, self.queue.servers, self.queue.seed, self.queue.trigger
        )?;
        writeln!(f, "Events: {} defined", self.events.entries.len())?;
        write!(f, "Measurements: {}", self.measurements.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_scenarios() {
        let config = Config::default();
        assert_eq!(config.monte_carlo.to_params(), MonteCarloParams::default());
        assert_eq!(config.monte_carlo.parameter, Parameter::Bod5);
        assert_eq!(config.runtime.mode, RunMode::All);

        let sag = config.river.to_params(20.0);
        assert_eq!(sag.discharge_bod, 20.0);
        assert_eq!(sag.velocity, 0.2);
        assert_eq!(sag.max_distance_km, 30.0);
    }

    #[test]
    fn test_mode_stage_selection() {
        assert!(RunMode::OxygenSag.runs_monte_carlo());
        assert!(RunMode::OxygenSag.runs_oxygen_sag());
        assert!(!RunMode::OxygenSag.runs_queue());
        assert!(!RunMode::Queue.runs_monte_carlo());
        assert!(RunMode::All.runs_compliance());
    }

    #[test]
    fn test_display_mentions_sections() {
        let text = Config::default().to_string();
        assert!(text.contains("Mode: all"));
        assert!(text.contains("Lw=simulated P95"));
        assert!(text.contains("Events: 3 defined"));
    }
}
