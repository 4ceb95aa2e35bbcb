//! Turning raw lines into operative n-gram tokens.
//!
//! - `normalize`: markup and whitespace removal for a single line
//! - `operative`: the whitelist of characters allowed in tokens
//! - `extractor`: lazy unigram / bigram extraction with line-boundary rules

/// Markup tag and whitespace stripping.
pub mod normalize;

/// Operative character whitelist.
pub mod operative;

/// Lazy, restartable n-gram extraction.
pub mod extractor;

pub use extractor::{NGramExtractor, TokenCounts, Tokens};
pub use operative::OperativeChars;

/// A 1- or 2-character unit of operative text.
pub type Token = String;
