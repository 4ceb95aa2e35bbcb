use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while loading, building or scoring.
///
/// A document with no operative tokens is never an error: it yields the
/// "no signal" grade `0`.
#[derive(Debug, Error)]
pub enum ObiError {
	#[error("cannot read {}: {source}", path.display())]
	Io { path: PathBuf, source: io::Error },

	#[error("cannot write {}: {source}", path.display())]
	Write { path: PathBuf, source: io::Error },

	#[error("read error: {0}")]
	Stream(#[from] io::Error),

	#[error("{}:{line}: malformed corpus definition: {reason}", path.display())]
	MalformedRecord { path: PathBuf, line: usize, reason: String },

	#[error("{}:{line}: malformed model row: {reason}", path.display())]
	MalformedModel { path: PathBuf, line: usize, reason: String },

	#[error("{0} is not a valid kanji hint")]
	InvalidEncoding(String),

	#[error("{} is not valid {encoding} text", path.display())]
	Decode { path: PathBuf, encoding: &'static str },

	#[error("zero smoothing did not converge for {token:?} after {passes} passes")]
	SmoothingDiverged { token: String, passes: usize },

	#[error("partition count must be at least 1")]
	InvalidPartitionCount,

	#[error("{0:?} is not a smoothing method (expected 0, 2..=5 or ns, s2..s5)")]
	InvalidMethod(String),

	#[error("voting subset is empty")]
	EmptyVoting,

	#[error("invalid configuration: {0}")]
	Config(#[from] toml::de::Error),

	#[error("binary model cache: {0}")]
	Cache(#[from] postcard::Error),

	#[error("worker thread panicked")]
	WorkerPanicked,
}

impl ObiError {
	pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
		Self::Io { path: path.into(), source }
	}

	pub(crate) fn write(path: impl Into<PathBuf>, source: io::Error) -> Self {
		Self::Write { path: path.into(), source }
	}
}

pub type Result<T> = std::result::Result<T, ObiError>;
