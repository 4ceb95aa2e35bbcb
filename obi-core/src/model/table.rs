use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{ObiError, Result};
use crate::text::Token;

/// Output scale attached to a model.
///
/// `T7` maps the native 13-level final grade onto a 7-level scale
/// (elementary school collapsed into one level).
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Scale {
	#[default]
	Native,
	T7,
}

impl Scale {
	/// Maps a native grade onto this scale. Fractional grades are floored.
	pub fn apply(self, grade: f64) -> f64 {
		match self {
			Self::Native => grade,
			Self::T7 => f64::from(t7(grade.floor() as u32)),
		}
	}
}

/// 13-level → 7-level mapping.
fn t7(grade: u32) -> u32 {
	match grade {
		0 => 0,
		1..=6 => 1,
		13 => 7,
		11..=12 => 6,
		other => other - 5,
	}
}

/// Weights of one token: its raw corpus frequency and one centered
/// log-likelihood weight per grade (grade 1 first).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ModelWeightVector {
	pub frequency: u64,
	pub weights: Vec<f64>,
}

/// A readability model: token → per-grade weights.
///
/// Immutable once built. Tokens are kept sorted so that saved tables and
/// score sums do not depend on hash order.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Model {
	grades: usize,
	scale: Scale,
	table: BTreeMap<Token, ModelWeightVector>,
}

impl Model {
	pub(crate) fn from_table(grades: usize, table: BTreeMap<Token, ModelWeightVector>) -> Self {
		Self { grades, scale: Scale::Native, table }
	}

	/// Tags the model with an output scale.
	pub fn with_scale(mut self, scale: Scale) -> Self {
		self.scale = scale;
		self
	}

	pub fn scale(&self) -> Scale {
		self.scale
	}

	/// Number of grades (`G`).
	pub fn grades(&self) -> usize {
		self.grades
	}

	pub fn len(&self) -> usize {
		self.table.len()
	}

	pub fn is_empty(&self) -> bool {
		self.table.is_empty()
	}

	pub fn get(&self, token: &str) -> Option<&ModelWeightVector> {
		self.table.get(token)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &ModelWeightVector)> {
		self.table.iter().map(|(token, weights)| (token.as_str(), weights))
	}

	/// Drops rows whose raw frequency is below `required_frequency`.
	pub fn filtered(mut self, required_frequency: u64) -> Self {
		self.table.retain(|_, row| row.frequency >= required_frequency);
		self
	}

	/// Writes the table: `token \t frequency \t w1 .. wG`, weights at 5 decimals.
	pub fn write_table<W: Write>(&self, out: &mut W) -> io::Result<()> {
		for (token, row) in &self.table {
			write!(out, "{}\t{}", token, row.frequency)?;
			for weight in &row.weights {
				write!(out, "\t{weight:.5}")?;
			}
			writeln!(out)?;
		}
		Ok(())
	}

	/// Saves the table to `path`.
	pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
		let path = path.as_ref();
		let file = File::create(path).map_err(|e| ObiError::write(path, e))?;
		let mut out = BufWriter::new(file);
		self.write_table(&mut out)
			.and_then(|_| out.flush())
			.map_err(|e| ObiError::write(path, e))?;
		info!("saved model with {} tokens to {}", self.len(), path.display());
		Ok(())
	}

	/// Parses table text, keeping rows with frequency >= `required_frequency`.
	///
	/// `origin` only labels errors. Every row must carry the same number of
	/// weights; empty lines are skipped.
	pub fn parse_table(text: &str, origin: &Path, required_frequency: u64) -> Result<Self> {
		let mut table = BTreeMap::new();
		let mut grades: Option<usize> = None;

		for (index, line) in text.lines().enumerate() {
			if line.is_empty() {
				continue;
			}
			let malformed = |reason: String| ObiError::MalformedModel {
				path: origin.to_path_buf(),
				line: index + 1,
				reason,
			};

			let mut fields = line.split('\t');
			let token = fields.next().unwrap_or_default();
			let frequency: u64 = fields
				.next()
				.ok_or_else(|| malformed("missing frequency".to_owned()))?
				.parse()
				.map_err(|_| malformed("frequency is not an integer".to_owned()))?;
			let weights = fields
				.map(|field| {
					field
						.parse::<f64>()
						.map_err(|_| malformed(format!("weight {field:?} is not a number")))
				})
				.collect::<Result<Vec<f64>>>()?;

			match grades {
				None => grades = Some(weights.len()),
				Some(expected) if expected != weights.len() => {
					let reason = format!("expected {expected} weights, got {}", weights.len());
					return Err(malformed(reason));
				}
				Some(_) => {}
			}

			if frequency >= required_frequency {
				table.insert(token.to_owned(), ModelWeightVector { frequency, weights });
			}
		}

		Ok(Self::from_table(grades.unwrap_or(0), table))
	}

	/// Loads a model table from disk.
	pub fn load<P: AsRef<Path>>(path: P, required_frequency: u64) -> Result<Self> {
		let path = path.as_ref();
		let text = fs::read_to_string(path).map_err(|e| ObiError::io(path, e))?;
		let model = Self::parse_table(&text, path, required_frequency)?;
		debug!("loaded {} tokens ({} grades) from {}", model.len(), model.grades(), path.display());
		Ok(model)
	}

	/// Path of a named model: `<dir>/Obi2-<name>.model`.
	///
	/// `T7` shares the `T13` table.
	pub fn named_path<P: AsRef<Path>>(name: &str, dir: P) -> PathBuf {
		let file = if name == "T7" { "T13" } else { name };
		dir.as_ref().join(format!("{MODEL_PREFIX}{file}.{MODEL_EXTENSION}"))
	}

	/// Loads a named model, tagging `T7` with its scale.
	pub fn open_named<P: AsRef<Path>>(name: &str, dir: P, required_frequency: u64) -> Result<Self> {
		let model = Self::load(Self::named_path(name, dir), required_frequency)?;
		Ok(model.with_scale(scale_of(name)))
	}

	/// Names of the models in `dir`: `Obi2-T13.model` lists as `T13`, sorted.
	pub fn list_named<P: AsRef<Path>>(dir: P) -> Result<Vec<String>> {
		let dir = dir.as_ref();
		let mut names = Vec::new();
		for entry in fs::read_dir(dir).map_err(|e| ObiError::io(dir, e))? {
			let path = entry.map_err(|e| ObiError::io(dir, e))?.path();
			let is_model = path.extension().is_some_and(|ext| ext == OsStr::new(MODEL_EXTENSION));
			if !path.is_file() || !is_model {
				continue;
			}
			let stem = path.file_stem().and_then(|stem| stem.to_str());
			if let Some(name) = stem.and_then(|stem| stem.strip_prefix(MODEL_PREFIX)) {
				names.push(name.to_owned());
			}
		}
		names.sort();
		Ok(names)
	}

	/// Loads a model table through a binary cache.
	///
	/// - If `<stem>.bin` exists next to the table and was written from the
	///   table as it is now (same size and modification time), it is decoded
	///   with `postcard`.
	/// - Otherwise the table is parsed and the cache is rewritten.
	///
	/// The cache holds every row; `required_frequency` is applied afterwards.
	pub fn open_cached<P: AsRef<Path>>(path: P, required_frequency: u64) -> Result<Self> {
		let path = path.as_ref();
		let cache_path = cache_path_for(path)?;
		let stamp = TableStamp::of(path)?;

		let model = match read_cache(&cache_path, stamp) {
			Some(model) => model,
			None => {
				let model = Self::load(path, 0)?;
				let bytes = postcard::to_stdvec(&(stamp, &model))?;
				fs::write(&cache_path, bytes).map_err(|e| ObiError::write(&cache_path, e))?;
				debug!("wrote model cache {}", cache_path.display());
				model
			}
		};

		Ok(model.filtered(required_frequency))
	}
}

const MODEL_PREFIX: &str = "Obi2-";
const MODEL_EXTENSION: &str = "model";

/// Size and modification time of a model table, recorded in its cache.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
struct TableStamp {
	len: u64,
	/// Seconds and nanoseconds since the Unix epoch.
	modified: Option<(u64, u32)>,
}

impl TableStamp {
	fn of(table: &Path) -> Result<Self> {
		let metadata = fs::metadata(table).map_err(|e| ObiError::io(table, e))?;
		let modified = metadata
			.modified()
			.ok()
			.and_then(|time| time.duration_since(UNIX_EPOCH).ok())
			.map(|since| (since.as_secs(), since.subsec_nanos()));
		Ok(Self { len: metadata.len(), modified })
	}
}

/// `models/Obi2-T13.model` → `models/Obi2-T13.bin`
fn cache_path_for(table: &Path) -> Result<PathBuf> {
	if table.file_stem().is_none() {
		let source = io::Error::new(io::ErrorKind::InvalidInput, "model path has no file name");
		return Err(ObiError::io(table, source));
	}
	Ok(table.with_extension("bin"))
}

/// The cached model, if the cache exists and matches `stamp`.
fn read_cache(cache_path: &Path, stamp: TableStamp) -> Option<Model> {
	let bytes = fs::read(cache_path).ok()?;
	match postcard::from_bytes::<(TableStamp, Model)>(&bytes) {
		Ok((cached, model)) if cached == stamp => Some(model),
		Ok(_) => {
			info!("model cache {} is out of date", cache_path.display());
			None
		}
		Err(e) => {
			warn!("ignoring unreadable model cache {}: {e}", cache_path.display());
			None
		}
	}
}

/// Scale implied by a model name.
pub fn scale_of(name: &str) -> Scale {
	if name == "T7" { Scale::T7 } else { Scale::Native }
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sample() -> Model {
		let mut table = BTreeMap::new();
		let weights = vec![-0.100343, 0.200687, -0.100343];
		table.insert("あい".to_owned(), ModelWeightVector { frequency: 8, weights });
		let weights = vec![0.5, 0.0, -0.5];
		table.insert("いう".to_owned(), ModelWeightVector { frequency: 1, weights });
		Model::from_table(3, table)
	}

	#[test]
	fn t7_mapping() {
		let expected = [
			(0, 0),
			(1, 1),
			(6, 1),
			(7, 2),
			(8, 3),
			(9, 4),
			(10, 5),
			(11, 6),
			(12, 6),
			(13, 7),
		];
		for (native, mapped) in expected {
			assert_eq!(Scale::T7.apply(f64::from(native)), f64::from(mapped), "grade {native}");
		}
		assert_eq!(Scale::T7.apply(7.5), 2.0);
		assert_eq!(Scale::Native.apply(7.5), 7.5);
	}

	#[test]
	fn table_format() {
		let mut out = Vec::new();
		sample().write_table(&mut out).unwrap();
		let text = String::from_utf8(out).unwrap();
		let expected = concat!(
			"あい\t8\t-0.10034\t0.20069\t-0.10034\n",
			"いう\t1\t0.50000\t0.00000\t-0.50000\n",
		);
		assert_eq!(text, expected);
	}

	#[test]
	fn parse_applies_frequency_floor() {
		let text = "あい\t8\t-0.10034\t0.20069\t-0.10034\nいう\t1\t0.50000\t0.00000\t-0.50000\n";
		let model = Model::parse_table(text, Path::new("m"), 2).unwrap();
		assert_eq!(model.grades(), 3);
		assert_eq!(model.len(), 1);
		assert_eq!(model.get("あい").unwrap().weights, vec![-0.10034, 0.20069, -0.10034]);
	}

	#[test]
	fn ragged_rows_are_rejected() {
		let text = "あい\t8\t0.1\t0.2\nいう\t1\t0.5\n";
		assert!(matches!(
			Model::parse_table(text, Path::new("m"), 1),
			Err(ObiError::MalformedModel { line: 2, .. })
		));
		assert!(matches!(
			Model::parse_table("あい\tmany\t0.1\n", Path::new("m"), 1),
			Err(ObiError::MalformedModel { line: 1, .. })
		));
	}

	#[test]
	fn named_paths() {
		assert_eq!(Model::named_path("T13U", "m"), PathBuf::from("m/Obi2-T13U.model"));
		assert_eq!(Model::named_path("T7", "m"), PathBuf::from("m/Obi2-T13.model"));
		assert_eq!(scale_of("T7"), Scale::T7);
		assert_eq!(scale_of("T13"), Scale::Native);
		let cache = cache_path_for(Path::new("m/Obi2-T13.model")).unwrap();
		assert_eq!(cache, PathBuf::from("m/Obi2-T13.bin"));
	}

	#[test]
	fn lists_named_models() {
		let dir = tempfile::TempDir::new().unwrap();
		for file in ["Obi2-T13U.model", "Obi2-T13.model", "Obi2-T13.bin", "notes.model"] {
			fs::write(dir.path().join(file), "").unwrap();
		}
		assert_eq!(Model::list_named(dir.path()).unwrap(), vec!["T13", "T13U"]);
	}
}
