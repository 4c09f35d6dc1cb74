//! Outfall CLI entry point

use anyhow::{Context, Result};
use outfall::compliance::ThresholdTable;
use outfall::config::{cli::Cli, toml::load_config, validator::validate_config, Config};
use outfall::output::{csv, json, text};
use outfall::run_assessment;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse_args();
    init_logging(cli.debug);

    println!("Outfall v{}", env!("CARGO_PKG_VERSION"));
    println!("Wastewater discharge compliance and simulation");
    println!();

    let config = load_config(&cli)?;
    validate_config(&config).context("Configuration validation failed")?;

    let table = load_thresholds(&config)?;

    print_configuration(&config);

    if config.runtime.dry_run {
        println!();
        println!("Dry run mode - configuration validated successfully");
        return Ok(());
    }
    println!();

    let report = run_assessment(&config, &table);
    text::print_report(&report, &config).context("Failed to write report")?;

    if let Some(path) = &config.output.json_output {
        let doc = json::build_json_report(&config, &report, chrono::Utc::now());
        json::write_json_output(path, &doc, true)?;
        println!("JSON report written to {}", path.display());
    }

    if let Some(dir) = &config.output.csv_output {
        let written = csv::write_csv_outputs(dir, &report)?;
        println!("{} CSV files written to {}", written.len(), dir.display());
    }

    Ok(())
}

/// Logs go to stderr; RUST_LOG overrides the level chosen by --debug
fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_thresholds(config: &Config) -> Result<ThresholdTable> {
    match &config.compliance.thresholds {
        Some(path) => {
            tracing::info!(path = %path.display(), "loading threshold table");
            ThresholdTable::from_toml_file(path)
        }
        None => Ok(ThresholdTable::default()),
    }
}

fn print_configuration(config: &Config) {
    println!("═══════════════════════════════════════════════════════════");
    println!("Configuration");
    println!("═══════════════════════════════════════════════════════════");
    for line in config.to_string().lines() {
        println!("  {}", line);
    }
    println!("═══════════════════════════════════════════════════════════");
}
