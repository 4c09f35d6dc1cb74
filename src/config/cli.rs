//! CLI argument parsing using clap

use crate::compliance::{LoadCategory, Parameter, Receptor};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Stage selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Every stage (default)
    All,
    /// Monte Carlo treatment simulation only
    MonteCarlo,
    /// Oxygen-sag profile (runs Monte Carlo when the load is simulated)
    OxygenSag,
    /// FIFO multi-server queue only
    Queue,
    /// Probability-event simulator only
    Events,
    /// Measurement evaluation only
    Compliance,
}

/// Outfall - wastewater discharge compliance and water-quality simulation
#[derive(Parser, Debug, Default)]
#[command(name = "outfall")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// TOML configuration file
    #[arg(short = 'c', long, env = "OUTFALL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Stages to run
    #[arg(long, value_enum)]
    pub mode: Option<Mode>,

    // === Monte Carlo ===
    /// Generator seed (any integer, wrapped to 32 bits)
    #[arg(long, allow_negative_numbers = true)]
    pub seed: Option<i64>,

    /// Number of Monte Carlo samples
    #[arg(short = 'n', long)]
    pub samples: Option<usize>,

    /// Regulated parameter the simulated effluent stands for
    #[arg(long, value_enum)]
    pub parameter: Option<Parameter>,

    /// Repeat the Monte Carlo run over N consecutive seeds
    #[arg(long, value_name = "N")]
    pub sweep_seeds: Option<usize>,

    // === Compliance ===
    /// Discharge receptor
    #[arg(long, value_enum)]
    pub receptor: Option<Receptor>,

    /// Load category of the discharger
    #[arg(long, value_enum)]
    pub category: Option<LoadCategory>,

    /// Threshold table replacing the built-in limits (TOML)
    #[arg(long, value_name = "PATH")]
    pub thresholds: Option<PathBuf>,

    // === Queue ===
    /// Number of servers
    #[arg(long)]
    pub servers: Option<usize>,

    /// Number of entities
    #[arg(long)]
    pub entities: Option<usize>,

    /// Recompute counter for the queue streams
    #[arg(long)]
    pub trigger: Option<u32>,

    /// Inter-arrival times, e.g. "2 2 2" (replaces the generated stream)
    #[arg(long, value_name = "LIST")]
    pub inter_arrivals: Option<String>,

    /// Service times, e.g. "5; 1; 1" (replaces the generated stream)
    #[arg(long, value_name = "LIST")]
    pub service_times: Option<String>,

    // === Events ===
    /// Uniform draws in [0, 1) for the event simulator, e.g. "0.1, 0.5, 0.9"
    #[arg(long, value_name = "LIST")]
    pub draws: Option<String>,

    // === Output ===
    /// Write the JSON report to this file
    #[arg(long, value_name = "PATH")]
    pub json_output: Option<PathBuf>,

    /// Write CSV series into this directory
    #[arg(long, value_name = "DIR")]
    pub csv_output: Option<PathBuf>,

    /// Print every sample and row
    #[arg(long)]
    pub show_rows: bool,

    /// Validate configuration and exit
    #[arg(long)]
    pub dry_run: bool,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_overrides() {
        let cli = Cli::try_parse_from([
            "outfall",
            "--mode",
            "oxygen-sag",
            "--seed",
            "-5",
            "--samples",
            "1000",
            "--receptor",
            "sewer",
            "--category",
            "above-3000",
            "--parameter",
            "cod",
        ])
        .unwrap();
        assert_eq!(cli.mode, Some(Mode::OxygenSag));
        assert_eq!(cli.seed, Some(-5));
        assert_eq!(cli.samples, Some(1000));
        assert_eq!(cli.receptor, Some(Receptor::Sewer));
        assert_eq!(cli.category, Some(LoadCategory::Above3000));
        assert_eq!(cli.parameter, Some(Parameter::Cod));
    }

    #[test]
    fn test_defaults_are_unset() {
        let cli = Cli::try_parse_from(["outfall"]).unwrap();
        assert_eq!(cli.mode, None);
        assert_eq!(cli.seed, None);
        assert!(!cli.dry_run);
    }

    #[test]
    fn test_rejects_unknown_category() {
        assert!(Cli::try_parse_from(["outfall", "--category", "huge"]).is_err());
    }
}
