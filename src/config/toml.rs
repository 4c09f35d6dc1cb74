//! TOML configuration file parsing

use super::*;
use crate::config::cli::{Cli, Mode as CliMode};
use crate::simulation::queue::DurationSource;
use crate::util::parse::parse_number_list;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Parse TOML configuration file
pub fn parse_toml_file(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_toml_string(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse TOML configuration from string
pub fn parse_toml_string(contents: &str) -> Result<Config> {
    let config: Config = ::toml::from_str(contents)
        .context("Failed to parse TOML configuration")?;

    Ok(config)
}

/// Load the configuration file named on the command line (defaults otherwise)
/// and apply the CLI overrides
pub fn load_config(cli: &Cli) -> Result<Config> {
    let config = match cli.config {
        Some(ref path) => parse_toml_file(path)?,
        None => Config::default(),
    };
    merge_cli_with_config(cli, config)
}

/// Merge CLI arguments with TOML configuration (CLI takes precedence)
pub fn merge_cli_with_config(cli: &Cli, mut config: Config) -> Result<Config> {
    if let Some(mode) = cli.mode {
        config.runtime.mode = match mode {
            CliMode::All => RunMode::All,
            CliMode::MonteCarlo => RunMode::MonteCarlo,
            CliMode::OxygenSag => RunMode::OxygenSag,
            CliMode::Queue => RunMode::Queue,
            CliMode::Events => RunMode::Events,
            CliMode::Compliance => RunMode::Compliance,
        };
    }

    // Monte Carlo
    if let Some(seed) = cli.seed {
        config.monte_carlo.seed = seed;
    }
    if let Some(samples) = cli.samples {
        config.monte_carlo.samples = samples;
    }
    if let Some(parameter) = cli.parameter {
        config.monte_carlo.parameter = parameter;
    }
    if let Some(n) = cli.sweep_seeds {
        config.runtime.sweep_seeds = Some(n);
    }

    // Compliance
    if let Some(receptor) = cli.receptor {
        config.compliance.receptor = receptor;
    }
    if let Some(category) = cli.category {
        config.compliance.category = category;
    }
    if let Some(ref path) = cli.thresholds {
        config.compliance.thresholds = Some(path.clone());
    }

    // Queue
    if let Some(servers) = cli.servers {
        config.queue.servers = servers;
    }
    if let Some(trigger) = cli.trigger {
        config.queue.trigger = trigger;
    }
    let mut direct_lens = Vec::new();
    if let Some(ref text) = cli.inter_arrivals {
        let values = parse_list(text, "inter-arrivals")?;
        direct_lens.push(values.len());
        config.queue.arrivals = DurationSource::Direct { values };
    }
    if let Some(ref text) = cli.service_times {
        let values = parse_list(text, "service-times")?;
        direct_lens.push(values.len());
        config.queue.services = DurationSource::Direct { values };
    }
    // Lists given on the command line define the entity count unless it is explicit
    match (cli.entities, direct_lens.iter().min()) {
        (Some(entities), _) => config.queue.entities = entities,
        (None, Some(&n)) => config.queue.entities = n,
        (None, None) => {}
    }

    // Events
    if let Some(ref text) = cli.draws {
        config.events.draws = EventDraws::Supplied {
            values: parse_list(text, "draws")?,
        };
    }

    // Output
    if let Some(ref path) = cli.json_output {
        config.output.json_output = Some(path.clone());
    }
    if let Some(ref path) = cli.csv_output {
        config.output.csv_output = Some(path.clone());
    }
    if cli.show_rows {
        config.output.show_rows = true;
    }
    if cli.dry_run {
        config.runtime.dry_run = true;
    }

    Ok(config)
}

fn parse_list(text: &str, flag: &str) -> Result<Vec<f64>> {
    let values = parse_number_list(text);
    if values.is_empty() {
        anyhow::bail!("--{} contains no numbers: {:?}", flag, text);
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compliance::ThresholdRule;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_toml_basic() {
        let toml = r#"
[monte_carlo]
parameter = "cod"
samples = 500
seed = 7
influent = { kind = "triangular", min = 150, mode = 300, max = 600 }

[compliance]
receptor = "sewer"
category = "above_3000"

[river]
discharge_bod = 25.0
velocity = 0.3
"#;

        let config = parse_toml_string(toml).unwrap();
        assert_eq!(config.monte_carlo.parameter, Parameter::Cod);
        assert_eq!(config.monte_carlo.samples, 500);
        assert_eq!(
            config.monte_carlo.influent,
            DistributionSpec::Triangular {
                min: 150.0,
                mode: 300.0,
                max: 600.0
            }
        );
        // Unset fields keep their defaults
        assert_eq!(config.monte_carlo.removal, RemovalSpec::default());
        assert_eq!(config.compliance.receptor, Receptor::Sewer);
        assert_eq!(config.compliance.category, LoadCategory::Above3000);
        assert_eq!(config.river.discharge_bod, Some(25.0));
        assert_eq!(config.river.upstream_flow, 10.0);
        assert_eq!(config.queue, QueueParams::default());
    }

    #[test]
    fn test_parse_toml_queue_events_measurements() {
        let toml = r#"
[runtime]
mode = "queue"

[queue]
entities = 3
servers = 2
arrivals = { source = "direct", values = [2, 2, 2] }
services = { source = "manual_uniform", distribution = { kind = "exponential", mean = 4 }, draws = [0.1, 0.5, 0.9] }

[events]
draws = { source = "supplied", values = [0.1, 0.95] }

[[events.entries]]
name = "Rain"
probability = 0.4
value = 3.0
formula = "value * (1 + rnd)"

[[events.entries]]
name = "Dry"
probability = 0.6
value = 1.0

[[measurements]]
parameter = "bod5"
influent = 250
effluent = 40

[[measurements]]
parameter = "ph"
effluent = 7.2
"#;

        let config = parse_toml_string(toml).unwrap();
        assert_eq!(config.runtime.mode, RunMode::Queue);
        assert_eq!(config.queue.servers, 2);
        assert_eq!(
            config.queue.arrivals,
            DurationSource::Direct {
                values: vec![2.0, 2.0, 2.0]
            }
        );
        assert!(matches!(config.queue.services, DurationSource::ManualUniform { .. }));
        assert_eq!(config.events.entries.len(), 2);
        assert_eq!(config.events.entries[0].formula.as_deref(), Some("value * (1 + rnd)"));
        assert_eq!(config.events.entries[1].formula, None);
        assert_eq!(config.measurements.len(), 2);
        assert_eq!(config.measurements[1].influent, None);
    }

    #[test]
    fn test_parse_toml_file_reports_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[monte_carlo]\nsamples = \"many\"").unwrap();
        let err = parse_toml_file(file.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse config file"));
    }

    #[test]
    fn test_cli_overrides_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[monte_carlo]\nseed = 1\nsamples = 100\n\n[queue]\nservers = 3").unwrap();

        let cli = Cli {
            config: Some(file.path().to_path_buf()),
            seed: Some(99),
            servers: Some(1),
            mode: Some(CliMode::MonteCarlo),
            receptor: Some(Receptor::Sewer),
            ..Cli::default()
        };
        let config = load_config(&cli).unwrap();
        assert_eq!(config.monte_carlo.seed, 99);
        assert_eq!(config.monte_carlo.samples, 100);
        assert_eq!(config.queue.servers, 1);
        assert_eq!(config.runtime.mode, RunMode::MonteCarlo);
        assert_eq!(config.compliance.receptor, Receptor::Sewer);
    }

    #[test]
    fn test_cli_lists_become_direct_streams() {
        let cli = Cli {
            inter_arrivals: Some("2 2 2".into()),
            service_times: Some("5; 1; 1".into()),
            draws: Some("0,15 0,85".into()),
            ..Cli::default()
        };
        let config = merge_cli_with_config(&cli, Config::default()).unwrap();
        assert_eq!(config.queue.entities, 3);
        assert_eq!(
            config.queue.services,
            DurationSource::Direct {
                values: vec![5.0, 1.0, 1.0]
            }
        );
        assert_eq!(config.events.draws, EventDraws::Supplied { values: vec![0.15, 0.85] });
    }

    #[test]
    fn test_empty_cli_list_rejected() {
        let cli = Cli {
            draws: Some("none".into()),
            ..Cli::default()
        };
        assert!(merge_cli_with_config(&cli, Config::default()).is_err());
    }

    #[test]
    fn test_threshold_rule_in_toml_uses_kind_tag() {
        #[derive(serde::Deserialize)]
        struct Wrapper {
            rule: ThresholdRule,
        }
        let w: Wrapper = ::toml::from_str("rule = { kind = \"analysis_only\" }").unwrap();
        assert_eq!(w.rule, ThresholdRule::AnalysisOnly);
    }
}
