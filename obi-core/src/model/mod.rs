//! Readability models.
//!
//! A model maps every operative token to a centered log-likelihood weight per
//! grade:
//! - `builder`: corpus → model (frequency filter, zero smoothing, centering)
//! - `table`: the model itself, its output scale and its on-disk formats
//! - `scorer`: applying a model to a document's token counts

/// Model construction from an aggregated corpus.
pub mod builder;

/// Model table, scale tag and persistence (text table + binary cache).
pub mod table;

/// Document scoring against a model.
pub mod scorer;

pub use builder::ModelBuilder;
pub use scorer::{ContributionVector, TextProfile, TokenContribution};
pub use table::{Model, ModelWeightVector, Scale};
