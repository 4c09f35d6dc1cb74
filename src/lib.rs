//! Outfall - wastewater discharge compliance and stochastic simulation
//!
//! Outfall checks treated-effluent measurements against discharge limits and
//! estimates how likely a treatment train is to meet them when influent load
//! and removal efficiency are uncertain.
//!
//! # Architecture
//!
//! - **Compliance**: threshold tables per receptor and load category, verdicts,
//!   severity, removal efficiency and quality grades
//! - **Simulation**: Monte Carlo treatment model, Streeter-Phelps oxygen sag,
//!   FIFO multi-server queue and probability-interval events
//! - **Distributions**: seeded samplers driven by a reproducible 32-bit generator
//! - **Output**: text report, JSON document and CSV series

pub mod assessment;
pub mod compliance;
pub mod config;
pub mod distribution;
pub mod error;
pub mod output;
pub mod rng;
pub mod simulation;
pub mod stats;
pub mod util;

// Re-export commonly used types
pub use assessment::{run_assessment, AssessmentReport};
pub use config::Config;
pub use error::SimError;

/// Result type used throughout Outfall
pub type Result<T> = anyhow::Result<T>;
