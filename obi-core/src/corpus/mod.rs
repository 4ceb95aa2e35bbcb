//! Graded corpus handling.
//!
//! - `definition`: typed corpus/test definition records and partitioning
//! - `frequency`: per-token frequency-by-grade vectors
//! - `aggregate`: corpus aggregation from documents on disk

/// Corpus and test definition files.
pub mod definition;

/// Frequency-by-grade vectors.
pub mod frequency;

/// Corpus aggregation (full, partitioned, leave-one-out).
pub mod aggregate;

pub use aggregate::{Corpus, CorpusLoader};
pub use definition::{load_definition, parse_definition, partition, CorpusRecord};
pub use frequency::FrequencyVector;
