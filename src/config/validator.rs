//! Configuration validation
//!
//! Everything entering the simulation core must be finite, and flows,
//! concentrations, rates and counts must be non-negative. Degenerate but
//! valid values (a zero mean, equal rate constants) are left for the core to
//! clamp. A non-positive stream velocity also passes: the oxygen-sag solver
//! refuses it itself and the refusal shows up in the report.

use super::*;
use crate::simulation::oxygen_sag::MAX_DISTANCE_KM;
use crate::simulation::queue::DurationSource;
use anyhow::Result;

/// Largest accepted Monte Carlo sample count
pub const MAX_SAMPLES: usize = 50_000;

/// Largest accepted queue size
pub const MAX_ENTITIES: usize = 50_000;

/// Validate complete configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_monte_carlo(&config.monte_carlo)?;
    validate_river(&config.river)?;
    validate_queue(&config.queue)?;
    validate_events(&config.events)?;
    validate_measurements(&config.measurements)?;
    validate_runtime(&config.runtime)?;

    Ok(())
}

fn check_finite(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() {
        anyhow::bail!("{} must be a finite number, got {}", name, value);
    }
    Ok(())
}

fn check_non_negative(name: &str, value: f64) -> Result<()> {
    check_finite(name, value)?;
    if value < 0.0 {
        anyhow::bail!("{} must not be negative, got {}", name, value);
    }
    Ok(())
}

/// Validate distribution parameters
pub fn validate_distribution(name: &str, spec: &DistributionSpec) -> Result<()> {
    for (field, value) in spec.parameters() {
        check_non_negative(&format!("{}.{}", name, field), value)?;
    }
    Ok(())
}

/// Validate Monte Carlo settings
pub fn validate_monte_carlo(mc: &MonteCarloConfig) -> Result<()> {
    if mc.samples == 0 || mc.samples > MAX_SAMPLES {
        anyhow::bail!(
            "monte_carlo.samples must be between 1 and {}, got {}",
            MAX_SAMPLES,
            mc.samples
        );
    }

    validate_distribution("monte_carlo.influent", &mc.influent)?;
    check_non_negative("monte_carlo.removal.min", mc.removal.min)?;
    check_non_negative("monte_carlo.removal.mode", mc.removal.mode)?;
    check_non_negative("monte_carlo.removal.max", mc.removal.max)?;

    Ok(())
}

/// Validate river settings
pub fn validate_river(river: &RiverConfig) -> Result<()> {
    check_non_negative("river.upstream_flow", river.upstream_flow)?;
    check_non_negative("river.upstream_do", river.upstream_do)?;
    check_non_negative("river.discharge_flow", river.discharge_flow)?;
    if let Some(bod) = river.discharge_bod {
        check_non_negative("river.discharge_bod", bod)?;
    }
    check_non_negative("river.saturation_do", river.saturation_do)?;
    check_non_negative("river.deoxygenation_rate", river.deoxygenation_rate)?;
    check_non_negative("river.reaeration_rate", river.reaeration_rate)?;
    check_finite("river.velocity", river.velocity)?;
    check_non_negative("river.max_distance_km", river.max_distance_km)?;
    if river.max_distance_km > MAX_DISTANCE_KM {
        anyhow::bail!(
            "river.max_distance_km must be at most {}, got {}",
            MAX_DISTANCE_KM,
            river.max_distance_km
        );
    }

    Ok(())
}

fn validate_duration_source(name: &str, source: &DurationSource) -> Result<()> {
    match source {
        DurationSource::Generated { distribution } => validate_distribution(name, distribution),
        DurationSource::ManualUniform { distribution, draws } => {
            validate_distribution(name, distribution)?;
            for (i, u) in draws.iter().enumerate() {
                check_finite(&format!("{}.draws[{}]", name, i), *u)?;
            }
            Ok(())
        }
        DurationSource::Direct { values } => {
            for (i, v) in values.iter().enumerate() {
                check_non_negative(&format!("{}.values[{}]", name, i), *v)?;
            }
            Ok(())
        }
    }
}

/// Validate queue settings
///
/// Manual streams shorter than the entity count are not rejected here; the
/// simulator reports the exact shortfall.
pub fn validate_queue(queue: &QueueParams) -> Result<()> {
    if queue.servers == 0 {
        anyhow::bail!("queue.servers must be at least 1");
    }
    if queue.entities == 0 || queue.entities > MAX_ENTITIES {
        anyhow::bail!(
            "queue.entities must be between 1 and {}, got {}",
            MAX_ENTITIES,
            queue.entities
        );
    }
    validate_duration_source("queue.arrivals", &queue.arrivals)?;
    validate_duration_source("queue.services", &queue.services)?;

    Ok(())
}

/// Validate event definitions
///
/// Probability sums and draw ranges are simulator preconditions and are
/// reported by the run itself.
pub fn validate_events(events: &EventsConfig) -> Result<()> {
    for (i, event) in events.entries.iter().enumerate() {
        if event.name.trim().is_empty() {
            anyhow::bail!("events.entries[{}].name must not be empty", i);
        }
        let name = format!("events.entries[{}].probability", i);
        check_non_negative(&name, event.probability)?;
        if event.probability > 1.0 {
            anyhow::bail!("{} must be at most 1, got {}", name, event.probability);
        }
        check_finite(&format!("events.entries[{}].value", i), event.value)?;
    }

    if let EventDraws::Generated { count, .. } = events.draws {
        if count > MAX_SAMPLES {
            anyhow::bail!("events.draws.count must be at most {}, got {}", MAX_SAMPLES, count);
        }
    }

    Ok(())
}

/// Validate measurement rows
pub fn validate_measurements(measurements: &[Measurement]) -> Result<()> {
    for (i, m) in measurements.iter().enumerate() {
        if let Some(e) = m.influent {
            check_finite(&format!("measurements[{}].influent", i), e)?;
        }
        if let Some(s) = m.effluent {
            check_finite(&format!("measurements[{}].effluent", i), s)?;
        }
    }
    Ok(())
}

/// Validate runtime settings
pub fn validate_runtime(runtime: &RuntimeConfig) -> Result<()> {
    if let Some(n) = runtime.sweep_seeds {
        if n == 0 || n > 1000 {
            anyhow::bail!("sweep_seeds must be between 1 and 1000, got {}", n);
        }
    }
    Ok(())
}
