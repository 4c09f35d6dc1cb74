//! Simulation engines
//!
//! Each engine is a pure function of its parameters: `run(params) -> result`.
//! A run owns its generator and working state for its whole duration and
//! returns an immutable record; changing any input means running again.
//!
//! - [`monte_carlo`]: influent/removal uncertainty to effluent statistics
//! - [`oxygen_sag`]: Streeter-Phelps dissolved-oxygen profile
//! - [`queue`]: FIFO multi-server discrete-event queue
//! - [`events`]: probability-interval event selection with formulas
//! - [`formula`]: the restricted arithmetic language used by [`events`]

pub mod events;
pub mod formula;
pub mod monte_carlo;
pub mod oxygen_sag;
pub mod queue;
