//! Probability-interval event simulator
//!
//! Events are laid out over `[0, 1)` as contiguous half-open intervals in
//! declaration order, each as wide as its probability. Every uniform draw
//! selects the event whose interval contains it; draws at or past the last
//! upper bound fall into the last interval, so rounding in the cumulative
//! sum never leaves a draw unassigned.
//!
//! An event with a formula produces `formula(rnd, value)`, otherwise its base
//! value. A formula that fails to parse or evaluate turns that row into NaN
//! and the run carries on.

use crate::error::SimError;
use crate::rng::{Mulberry32, UniformSource};
use crate::simulation::formula::{Formula, FormulaError};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Allowed distance between the probability sum and 1
pub const PROBABILITY_TOLERANCE: f64 = 1e-3;

/// A named outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbabilityEvent {
    pub name: String,
    /// Probability mass in [0, 1]
    pub probability: f64,
    /// Base value, exposed to formulas as `value`
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
}

impl ProbabilityEvent {
    pub fn new(name: &str, probability: f64, value: f64) -> Self {
        Self {
            name: name.to_string(),
            probability,
            value,
            formula: None,
        }
    }

    pub fn with_formula(mut self, formula: &str) -> Self {
        self.formula = Some(formula.to_string());
        self
    }
}

/// Half-open interval `[lower, upper)` owned by one event
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EventInterval {
    pub lower: f64,
    pub upper: f64,
}

impl EventInterval {
    pub fn contains(&self, u: f64) -> bool {
        self.lower <= u && u < self.upper
    }
}

/// Where the uniform draws come from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum EventDraws {
    /// `count` draws from a seeded generator
    Generated { count: usize, seed: i64 },
    /// Caller-supplied draws, each in [0, 1)
    Supplied { values: Vec<f64> },
}

impl Default for EventDraws {
    fn default() -> Self {
        Self::Generated { count: 20, seed: 1234 }
    }
}

impl EventDraws {
    /// Materialize the draws, rejecting supplied values outside [0, 1)
    pub fn resolve(&self) -> Result<Vec<f64>, SimError> {
        match self {
            Self::Generated { count, seed } => Ok(generate_draws(*count, *seed)),
            Self::Supplied { values } => {
                validate_draws(values)?;
                Ok(values.clone())
            }
        }
    }
}

/// Built-in demonstration events
pub fn default_events() -> Vec<ProbabilityEvent> {
    vec![
        ProbabilityEvent::new("Arrival", 0.3, 5.0).with_formula("value + rnd * 5"),
        ProbabilityEvent::new("Service", 0.5, 10.0).with_formula("value - rnd * 3"),
        ProbabilityEvent::new("Wait", 0.2, 2.0),
    ]
}

/// Lay the events out over [0, 1)
///
/// Refuses an empty event list and any list whose probabilities do not sum
/// to 1 within [`PROBABILITY_TOLERANCE`].
pub fn partition(events: &[ProbabilityEvent]) -> Result<Vec<EventInterval>, SimError> {
    if events.is_empty() {
        return Err(SimError::NoEvents);
    }

    let sum: f64 = events.iter().map(|e| e.probability).sum();
    if !((sum - 1.0).abs() <= PROBABILITY_TOLERANCE) {
        return Err(SimError::ProbabilitySum { sum });
    }

    let mut cumulative = 0.0;
    Ok(events
        .iter()
        .map(|e| {
            let lower = cumulative;
            cumulative += e.probability;
            EventInterval { lower, upper: cumulative }
        })
        .collect())
}

/// Index of the interval containing `u`, falling back to the last one
///
/// `intervals` must not be empty.
pub fn locate(intervals: &[EventInterval], u: f64) -> usize {
    intervals
        .iter()
        .position(|iv| iv.contains(u))
        .unwrap_or(intervals.len().saturating_sub(1))
}

/// `count` uniforms from a Mulberry32 stream
pub fn generate_draws(count: usize, seed: i64) -> Vec<f64> {
    let mut rng = Mulberry32::from_signed(seed);
    (0..count).map(|_| rng.next_uniform()).collect()
}

/// Every draw must be finite and in [0, 1)
pub fn validate_draws(draws: &[f64]) -> Result<(), SimError> {
    match draws.iter().position(|u| !(0.0..1.0).contains(u)) {
        Some(index) => Err(SimError::DrawOutOfRange {
            index,
            value: draws[index],
        }),
        None => Ok(()),
    }
}

/// One simulated draw
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRow {
    /// Draw order, starting at 1
    pub index: usize,
    pub event: String,
    /// Position of the event in the declared list
    pub event_index: usize,
    pub draw: f64,
    pub base_value: f64,
    /// NaN when the formula failed
    pub result: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EventRow {
    pub fn is_valid(&self) -> bool {
        self.result.is_finite()
    }
}

/// How often an event was selected
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventHits {
    pub event: String,
    pub count: usize,
}

/// Output of one event simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRun {
    pub intervals: Vec<EventInterval>,
    pub rows: Vec<EventRow>,
    /// Mean over valid rows; None when every row failed or there were none
    pub mean_result: Option<f64>,
    pub failed_rows: usize,
    pub hits: Vec<EventHits>,
}

/// Map every draw to an event and evaluate it
pub fn simulate(events: &[ProbabilityEvent], draws: &[f64]) -> Result<EventRun, SimError> {
    let intervals = partition(events).map_err(|e| {
        warn!(error = %e, "event simulation refused");
        e
    })?;
    validate_draws(draws).map_err(|e| {
        warn!(error = %e, "event simulation refused");
        e
    })?;

    // Parse once per event, not per row
    let formulas: Vec<Option<Result<Formula, FormulaError>>> = events
        .iter()
        .map(|e| e.formula.as_deref().map(Formula::parse))
        .collect();

    let mut counts = vec![0usize; events.len()];
    let rows: Vec<EventRow> = draws
        .iter()
        .enumerate()
        .map(|(i, &u)| {
            let idx = locate(&intervals, u);
            counts[idx] += 1;
            let event = &events[idx];

            let outcome = match &formulas[idx] {
                None => Ok(event.value),
                Some(Ok(formula)) => formula.evaluate(u, event.value),
                Some(Err(e)) => Err(e.clone()),
            };
            let (result, error) = match outcome {
                Ok(v) => (v, None),
                Err(e) => {
                    debug!(row = i + 1, event = %event.name, error = %e, "formula failed");
                    (f64::NAN, Some(e.to_string()))
                }
            };

            EventRow {
                index: i + 1,
                event: event.name.clone(),
                event_index: idx,
                draw: u,
                base_value: event.value,
                result,
                error,
            }
        })
        .collect();

    let valid: Vec<f64> = rows.iter().filter(|r| r.is_valid()).map(|r| r.result).collect();
    let failed_rows = rows.len() - valid.len();
    let mean_result = if valid.is_empty() {
        None
    } else {
        Some(valid.iter().sum::<f64>() / valid.len() as f64)
    };

    let hits = events
        .iter()
        .zip(counts)
        .map(|(e, count)| EventHits {
            event: e.name.clone(),
            count,
        })
        .collect();

    info!(rows = rows.len(), failed_rows, mean = ?mean_result, "event simulation complete");

    Ok(EventRun {
        intervals,
        rows,
        mean_result,
        failed_rows,
        hits,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_is_contiguous() {
        let intervals = partition(&default_events()).unwrap();
        assert_eq!(intervals.len(), 3);
        assert_eq!(intervals[0].lower, 0.0);
        for pair in intervals.windows(2) {
            assert_eq!(pair[0].upper, pair[1].lower);
        }
        assert!((intervals[2].upper - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_probability_sum_refused() {
        let events = vec![ProbabilityEvent::new("a", 0.5, 1.0), ProbabilityEvent::new("b", 0.4, 2.0)];
        match partition(&events) {
            Err(SimError::ProbabilitySum { sum }) => assert!((sum - 0.9).abs() < 1e-12),
            other => panic!("expected ProbabilitySum, got {:?}", other),
        }
        assert_eq!(partition(&[]), Err(SimError::NoEvents));

        let nan = vec![ProbabilityEvent::new("a", f64::NAN, 1.0)];
        assert!(matches!(partition(&nan), Err(SimError::ProbabilitySum { .. })));
    }

    #[test]
    fn test_sum_within_tolerance_accepted() {
        let events = vec![ProbabilityEvent::new("a", 0.5, 1.0), ProbabilityEvent::new("b", 0.4995, 2.0)];
        assert!(partition(&events).is_ok());
    }

    #[test]
    fn test_high_draw_lands_in_last_interval() {
        let events = vec![
            ProbabilityEvent::new("low", 0.1, 1.0),
            ProbabilityEvent::new("mid", 0.2, 2.0),
            ProbabilityEvent::new("high", 0.7, 3.0),
        ];
        let intervals = partition(&events).unwrap();
        assert_eq!(locate(&intervals, 0.95), 2);
        assert_eq!(locate(&intervals, 0.0), 0);
        assert_eq!(locate(&intervals, 0.1), 1);

        // Cumulative sum stops short of 1
        let thirds = vec![
            ProbabilityEvent::new("a", 0.333333333, 1.0),
            ProbabilityEvent::new("b", 0.333333333, 2.0),
            ProbabilityEvent::new("c", 0.333333333, 3.0),
        ];
        let intervals = partition(&thirds).unwrap();
        assert!(intervals[2].upper < 1.0);
        assert_eq!(locate(&intervals, 0.95), 2);
        assert_eq!(locate(&intervals, 0.9999999995), 2);
    }

    #[test]
    fn test_simulate_with_supplied_draws() {
        let run = simulate(&default_events(), &[0.1, 0.5, 0.9]).unwrap();
        assert_eq!(run.rows.len(), 3);

        assert_eq!(run.rows[0].event, "Arrival");
        assert!((run.rows[0].result - 5.5).abs() < 1e-12);
        assert_eq!(run.rows[1].event, "Service");
        assert!((run.rows[1].result - 8.5).abs() < 1e-12);
        assert_eq!(run.rows[2].event, "Wait");
        assert_eq!(run.rows[2].result, 2.0);

        assert_eq!(run.failed_rows, 0);
        assert!((run.mean_result.unwrap() - 16.0 / 3.0).abs() < 1e-12);
        let counts: Vec<usize> = run.hits.iter().map(|h| h.count).collect();
        assert_eq!(counts, vec![1, 1, 1]);
    }

    #[test]
    fn test_formula_failure_yields_nan_row() {
        let events = vec![
            ProbabilityEvent::new("bad", 0.5, 1.0).with_formula("value / 0"),
            ProbabilityEvent::new("unknown", 0.25, 1.0).with_formula("import(os)"),
            ProbabilityEvent::new("plain", 0.25, 4.0),
        ];
        let run = simulate(&events, &[0.2, 0.6, 0.8]).unwrap();
        assert!(run.rows[0].result.is_nan());
        assert!(run.rows[0].error.is_some());
        assert!(run.rows[1].result.is_nan());
        assert!(run.rows[1].error.as_deref().unwrap().contains("import"));
        assert_eq!(run.rows[2].result, 4.0);
        assert_eq!(run.failed_rows, 2);
        assert_eq!(run.mean_result, Some(4.0));
    }

    #[test]
    fn test_supplied_draws_validated() {
        assert_eq!(
            simulate(&default_events(), &[0.2, 1.0]),
            Err(SimError::DrawOutOfRange { index: 1, value: 1.0 })
        );
        assert!(matches!(
            simulate(&default_events(), &[-0.1]),
            Err(SimError::DrawOutOfRange { index: 0, .. })
        ));
        assert!(matches!(
            EventDraws::Supplied { values: vec![f64::NAN] }.resolve(),
            Err(SimError::DrawOutOfRange { .. })
        ));
    }

    #[test]
    fn test_generated_draws_are_seeded() {
        let a = EventDraws::default().resolve().unwrap();
        let b = generate_draws(20, 1234);
        assert_eq!(a, b);
        assert_eq!(a.len(), 20);
        assert!(a.iter().all(|u| (0.0..1.0).contains(u)));
        assert_ne!(generate_draws(20, 1235), a);
    }

    #[test]
    fn test_empty_draws() {
        let run = simulate(&default_events(), &[]).unwrap();
        assert!(run.rows.is_empty());
        assert_eq!(run.mean_result, None);
        assert_eq!(run.failed_rows, 0);
    }
}
