use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ObiError, Result};
use crate::estimate::Method;
use crate::io::Encoding;

/// Width of the extracted n-grams.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum NGramOrder {
	Unigram,
	#[default]
	Bigram,
}

impl NGramOrder {
	/// Builds an order from its width (`1` or `2`).
	pub fn from_width(n: usize) -> Option<Self> {
		match n {
			1 => Some(Self::Unigram),
			2 => Some(Self::Bigram),
			_ => None,
		}
	}

	/// Number of characters per token.
	pub fn width(self) -> usize {
		match self {
			Self::Unigram => 1,
			Self::Bigram => 2,
		}
	}
}

/// Configuration of a run.
///
/// Replaces the process-wide "current n-gram order" and "default encoding"
/// switches: every component receives the values it needs from here.
///
/// Missing keys in a TOML file take their default value:
///
/// ```toml
/// order = "bigram"
/// encoding = "W"
/// required_frequency = 1
/// voting = ["ns", "s4", "s2"]
/// threads = 0
/// model_dir = "."
/// model_name = "T13"
/// operative_chars = "./jchar.utf8"
/// ```
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ObiConfig {
	/// Unigram or bigram extraction.
	pub order: NGramOrder,

	/// Encoding used when a document carries no encoding hint.
	pub encoding: Encoding,

	/// Tokens seen fewer times than this in the corpus are dropped.
	pub required_frequency: u64,

	/// Profiles whose picks are median-combined into the final grade.
	pub voting: Vec<Method>,

	/// Worker threads for aggregation and cross-validation (`0` = one per CPU).
	pub threads: usize,

	/// Upper bound on zero-smoothing passes (`None` = grade count + 1).
	pub max_smoothing_passes: Option<usize>,

	/// Directory holding the named `Obi2-<name>.model` tables.
	pub model_dir: PathBuf,

	/// Model used when neither a corpus nor a model file is given.
	pub model_name: String,

	/// Operative character list.
	pub operative_chars: PathBuf,
}

impl Default for ObiConfig {
	fn default() -> Self {
		Self {
			order: NGramOrder::Bigram,
			encoding: Encoding::Utf8,
			required_frequency: 1,
			voting: Method::DEFAULT_VOTING.to_vec(),
			threads: 0,
			max_smoothing_passes: None,
			model_dir: PathBuf::from("."),
			model_name: "T13".to_owned(),
			operative_chars: PathBuf::from("./jchar.utf8"),
		}
	}
}

impl ObiConfig {
	/// Parses a configuration from TOML text.
	pub fn from_toml_str(text: &str) -> Result<Self> {
		Ok(toml::from_str(text)?)
	}

	/// Reads and parses a TOML configuration file.
	pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
		let path = path.as_ref();
		let text = fs::read_to_string(path).map_err(|e| ObiError::io(path, e))?;
		Self::from_toml_str(&text)
	}

	/// Effective number of worker threads.
	pub fn workers(&self) -> usize {
		if self.threads == 0 { num_cpus::get() } else { self.threads }
	}
}
