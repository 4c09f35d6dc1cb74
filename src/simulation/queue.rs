//! FIFO multi-server queue
//!
//! Entities arrive in order at the running sum of their inter-arrival times
//! and are served first-come first-served by `k` identical servers. Each
//! entity takes the server that frees up earliest (lowest index on ties):
//!
//! ```text
//! start      = max(arrival, server_available)
//! completion = start + service
//! wait       = start - arrival
//! system     = completion - arrival
//! ```
//!
//! Durations come from a [`DurationSource`] per stream: drawn from a seeded
//! generator, mapped from caller-supplied uniforms, or given directly.

use crate::distribution::DistributionSpec;
use crate::error::{QueueStream, SimError};
use crate::rng::{Mulberry32, SuppliedDraws};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Waits at or below this count as "did not wait"
const WAIT_EPSILON: f64 = 1e-12;

/// Stream named in refusals for inter-arrival durations
pub const ARRIVAL_STREAM: QueueStream = QueueStream::InterArrival;

/// Stream named in refusals for service durations
pub const SERVICE_STREAM: QueueStream = QueueStream::Service;

/// Where a stream of durations comes from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum DurationSource {
    /// Drawn from a seeded generator
    Generated { distribution: DistributionSpec },
    /// Caller-supplied uniforms mapped through the distribution
    ManualUniform {
        distribution: DistributionSpec,
        draws: Vec<f64>,
    },
    /// Durations used as given
    Direct { values: Vec<f64> },
}

impl DurationSource {
    /// Resolve `n` non-negative durations
    ///
    /// `seed` only matters for [`DurationSource::Generated`].
    pub fn durations(&self, n: usize, seed: u32, stream: QueueStream) -> Result<Vec<f64>, SimError> {
        match self {
            Self::Generated { distribution } => {
                let mut rng = Mulberry32::new(seed);
                Ok((0..n).map(|_| distribution.sample(&mut rng).max(0.0)).collect())
            }
            Self::ManualUniform { distribution, draws } => {
                // At least one supplied value per entity, even for families
                // that ignore the draw
                let expected = n * distribution.draws_per_sample().max(1);
                let mut source = SuppliedDraws::new(draws);
                if source.remaining() < expected {
                    warn!(%stream, expected, received = draws.len(), "queue refused: too few manual draws");
                    return Err(SimError::InsufficientDraws {
                        stream,
                        expected,
                        received: draws.len(),
                    });
                }
                Ok((0..n).map(|_| distribution.sample(&mut source).max(0.0)).collect())
            }
            Self::Direct { values } => {
                if values.len() < n {
                    warn!(%stream, expected = n, received = values.len(), "queue refused: too few durations");
                    return Err(SimError::InsufficientDraws {
                        stream,
                        expected: n,
                        received: values.len(),
                    });
                }
                Ok(values[..n].iter().map(|v| v.max(0.0)).collect())
            }
        }
    }
}

/// Queue run inputs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueParams {
    /// Number of entities N
    pub entities: usize,
    /// Number of servers k
    pub servers: usize,
    pub seed: i64,
    /// Recompute counter; changes the generated streams without a new seed
    pub trigger: u32,
    pub arrivals: DurationSource,
    pub services: DurationSource,
}

impl Default for QueueParams {
    fn default() -> Self {
        Self {
            entities: 5,
            servers: 1,
            seed: 1234,
            trigger: 0,
            arrivals: DurationSource::Generated {
                distribution: DistributionSpec::Exponential { mean: 5.0 },
            },
            services: DurationSource::Generated {
                distribution: DistributionSpec::Uniform { a: 3.0, b: 7.0 },
            },
        }
    }
}

impl QueueParams {
    /// Seed of the inter-arrival generator
    pub fn arrival_seed(&self) -> u32 {
        (self.seed as u32).wrapping_add(self.trigger.wrapping_mul(17))
    }

    /// Seed of the service generator
    pub fn service_seed(&self) -> u32 {
        (self.seed as u32)
            .wrapping_add(self.trigger.wrapping_mul(31))
            .wrapping_add(999)
    }
}

/// Timing of one entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QueueRow {
    /// Arrival order, starting at 1
    pub id: usize,
    /// Server that handled the entity, starting at 1
    pub server: usize,
    pub inter_arrival: f64,
    pub arrival: f64,
    pub start: f64,
    pub service: f64,
    pub completion: f64,
    pub wait: f64,
    pub system_time: f64,
}

/// Aggregate queue metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueMetrics {
    pub mean_wait: f64,
    pub mean_service: f64,
    pub mean_system_time: f64,
    /// Percent of entities that waited at all
    pub waited_pct: f64,
    /// Busy time over makespan per server, percent
    pub utilization: Vec<f64>,
    /// Latest completion minus first arrival
    pub makespan: f64,
}

/// Event log and metrics of one queue run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueRun {
    pub servers: usize,
    pub rows: Vec<QueueRow>,
    pub metrics: QueueMetrics,
}

/// Simulate the queue on resolved durations
///
/// Runs over the first `min(len)` entities; `servers` below 1 is treated as 1.
pub fn simulate_durations(inter_arrivals: &[f64], services: &[f64], servers: usize) -> QueueRun {
    let k = servers.max(1);
    let n = inter_arrivals.len().min(services.len());

    let mut available = vec![0.0f64; k];
    let mut busy = vec![0.0f64; k];
    let mut rows = Vec::with_capacity(n);
    let mut clock = 0.0;

    for i in 0..n {
        clock += inter_arrivals[i];
        let arrival = clock;

        let mut chosen = 0;
        for j in 1..k {
            if available[j] < available[chosen] {
                chosen = j;
            }
        }

        let start = arrival.max(available[chosen]);
        let service = services[i];
        let completion = start + service;
        available[chosen] = completion;
        busy[chosen] += service;

        rows.push(QueueRow {
            id: i + 1,
            server: chosen + 1,
            inter_arrival: inter_arrivals[i],
            arrival,
            start,
            service,
            completion,
            wait: start - arrival,
            system_time: completion - arrival,
        });
    }

    let metrics = QueueMetrics::from_rows(&rows, &busy);
    QueueRun { servers: k, rows, metrics }
}

impl QueueMetrics {
    fn from_rows(rows: &[QueueRow], busy: &[f64]) -> Self {
        if rows.is_empty() {
            return Self {
                mean_wait: 0.0,
                mean_service: 0.0,
                mean_system_time: 0.0,
                waited_pct: 0.0,
                utilization: vec![0.0; busy.len()],
                makespan: 0.0,
            };
        }

        let n = rows.len() as f64;
        let first_arrival = rows[0].arrival;
        let last_completion = rows.iter().map(|r| r.completion).fold(f64::NEG_INFINITY, f64::max);
        let makespan = last_completion - first_arrival;
        let waited = rows.iter().filter(|r| r.wait > WAIT_EPSILON).count();

        Self {
            mean_wait: rows.iter().map(|r| r.wait).sum::<f64>() / n,
            mean_service: rows.iter().map(|r| r.service).sum::<f64>() / n,
            mean_system_time: rows.iter().map(|r| r.system_time).sum::<f64>() / n,
            waited_pct: waited as f64 / n * 100.0,
            utilization: busy
                .iter()
                .map(|b| if makespan > 0.0 { b / makespan * 100.0 } else { 0.0 })
                .collect(),
            makespan,
        }
    }
}

/// Resolve both streams and simulate
///
/// Refuses with [`SimError::InsufficientDraws`] when a manual or direct
/// stream holds fewer values than entities.
pub fn simulate(params: &QueueParams) -> Result<QueueRun, SimError> {
    let n = params.entities.max(1);
    let inter = params.arrivals.durations(n, params.arrival_seed(), ARRIVAL_STREAM)?;
    let services = params.services.durations(n, params.service_seed(), SERVICE_STREAM)?;

    let run = simulate_durations(&inter, &services, params.servers);
    debug!(
        entities = run.rows.len(),
        servers = run.servers,
        mean_wait = run.metrics.mean_wait,
        makespan = run.metrics.makespan,
        "queue simulation complete"
    );
    Ok(run)
}
