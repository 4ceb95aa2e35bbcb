//! Readability estimation for Japanese text based on character n-gram models.
//!
//! This crate provides the whole estimation pipeline:
//! - Operative n-gram extraction from raw text lines
//! - Graded corpus aggregation (frequency-by-grade vectors)
//! - Model construction (smoothed, centered log-likelihood weights)
//! - Scoring and grade estimation (polynomial smoothing + median voting)
//! - Leave-one-out and N-fold cross-validation
//!
//! Every knob (n-gram order, default encoding, required frequency, voting
//! subset, worker count) is carried by an explicit [`config::ObiConfig`]
//! value; there is no process-wide state.

/// Error type shared by the whole crate.
pub mod error;

/// Explicit configuration threaded through extraction, building and scoring.
pub mod config;

/// Line sources, character encodings and path helpers.
pub mod io;

/// Text normalization, operative characters and n-gram extraction.
pub mod text;

/// Corpus definitions and frequency aggregation.
pub mod corpus;

/// Model construction, persistence and scoring.
pub mod model;

/// Grade estimation from contribution vectors.
pub mod estimate;

/// Cross-validation harness.
pub mod evaluation;

pub use error::{ObiError, Result};

/// Version string reported by the command-line tool.
pub fn version() -> &'static str {
	concat!("obi ", env!("CARGO_PKG_VERSION"))
}
