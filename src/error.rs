//! Simulation refusals
//!
//! Precondition violations are reported before a run executes. Everything
//! else (degenerate parameters, bad formulas) degrades inside the run.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Queue duration stream named in a refusal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueStream {
    InterArrival,
    Service,
}

impl fmt::Display for QueueStream {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            QueueStream::InterArrival => write!(f, "inter-arrival"),
            QueueStream::Service => write!(f, "service"),
        }
    }
}

/// Reason a simulation declined to run
///
/// Serialised with a `reason` tag next to the variant's fields, so reports
/// keep the counts and values, not just the message.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SimError {
    /// Event probabilities do not partition [0,1)
    #[error("event probabilities must sum to 1 (got {sum:.6})")]
    ProbabilitySum { sum: f64 },

    /// Event simulation needs at least one event
    #[error("no events defined")]
    NoEvents,

    /// Manual-input mode supplied fewer values than entities
    #[error("{stream}: {expected} values required, {received} received")]
    InsufficientDraws {
        stream: QueueStream,
        expected: usize,
        received: usize,
    },

    /// A supplied uniform draw lies outside [0,1)
    #[error("draw #{index} = {value} is outside [0, 1)")]
    DrawOutOfRange { index: usize, value: f64 },

    /// Streeter-Phelps cannot convert distance to travel time
    #[error("stream velocity must be greater than zero (got {velocity})")]
    NonPositiveVelocity { velocity: f64 },
}
