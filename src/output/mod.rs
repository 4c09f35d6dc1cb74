//! Output formatting
//!
//! The text report goes to stdout; JSON and CSV are written to files when
//! requested.

pub mod csv;
pub mod json;
pub mod text;
