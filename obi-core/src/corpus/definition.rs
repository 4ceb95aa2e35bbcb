use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ObiError, Result};

/// One document of a corpus (or test) definition.
///
/// Definition files hold one record per line, tab separated:
/// `relative_path \t encoding_hint \t grade [\t extra ...]`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct CorpusRecord {
	/// Path relative to the corpus directory.
	pub path: String,
	/// One-letter kanji hint; empty means "use the configured default".
	pub encoding: String,
	/// Grade label, `>= 1`.
	pub grade: usize,
	/// Any trailing fields, echoed in reports.
	pub extras: Vec<String>,
}

impl CorpusRecord {
	pub fn new(path: &str, encoding: &str, grade: usize) -> Self {
		Self { path: path.to_owned(), encoding: encoding.to_owned(), grade, extras: Vec::new() }
	}

	/// Parses one definition line. `origin` and `line` only label errors.
	pub fn parse(text: &str, origin: &Path, line: usize) -> Result<Self> {
		let malformed = |reason: String| ObiError::MalformedRecord {
			path: origin.to_path_buf(),
			line,
			reason,
		};

		let fields: Vec<&str> = text.split('\t').collect();
		if fields.len() < 3 {
			let reason = format!("expected at least 3 tab-separated fields, got {}", fields.len());
			return Err(malformed(reason));
		}
		let grade: usize = fields[2]
			.trim()
			.parse()
			.map_err(|_| {
				malformed(format!("grade {:?} is not a non-negative integer", fields[2]))
			})?;
		if grade == 0 {
			return Err(malformed("grade 0 is reserved for totals".to_owned()));
		}

		Ok(Self {
			path: fields[0].to_owned(),
			encoding: fields[1].to_owned(),
			grade,
			extras: fields[3..].iter().map(|s| (*s).to_owned()).collect(),
		})
	}

	/// The definition fields as written: path, encoding, grade, extras.
	pub fn fields(&self) -> Vec<String> {
		let mut fields = vec![self.path.clone(), self.encoding.clone(), self.grade.to_string()];
		fields.extend(self.extras.iter().cloned());
		fields
	}

	/// Encoding hint, `None` when empty.
	pub fn encoding_hint(&self) -> Option<&str> {
		Some(self.encoding.as_str()).filter(|hint| !hint.is_empty())
	}
}

/// Parses definition text. Empty lines are skipped; any other malformed line
/// is fatal.
pub fn parse_definition(text: &str, origin: &Path) -> Result<Vec<CorpusRecord>> {
	text.lines()
		.enumerate()
		.filter(|(_, line)| !line.is_empty())
		.map(|(index, line)| CorpusRecord::parse(line, origin, index + 1))
		.collect()
}

/// Reads a definition file (UTF-8).
pub fn load_definition<P: AsRef<Path>>(path: P) -> Result<Vec<CorpusRecord>> {
	let path = path.as_ref();
	let text = fs::read_to_string(path).map_err(|e| ObiError::io(path, e))?;
	parse_definition(&text, path)
}

/// Assigns records round-robin to `n` partitions (`index mod n`).
pub fn partition(records: &[CorpusRecord], n: usize) -> Vec<Vec<CorpusRecord>> {
	let mut partitions = vec![Vec::new(); n];
	if n == 0 {
		return partitions;
	}
	for (index, record) in records.iter().enumerate() {
		partitions[index % n].push(record.clone());
	}
	partitions
}

/// Resolves a record path against the corpus directory.
pub fn document_path(corpus_dir: &Path, record: &CorpusRecord) -> PathBuf {
	corpus_dir.join(&record.path)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn origin() -> &'static Path {
		Path::new("corpus.def")
	}

	#[test]
	fn parses_records_with_extras() {
		let text = "a.txt\tS\t3\tnovel\tch1\nb.txt\t\t12\n\n";
		let records = parse_definition(text, origin()).unwrap();
		assert_eq!(records.len(), 2);
		assert_eq!(records[0].grade, 3);
		assert_eq!(records[0].encoding_hint(), Some("S"));
		assert_eq!(records[0].extras, vec!["novel", "ch1"]);
		assert_eq!(records[1].encoding_hint(), None);
		assert_eq!(records[1].fields(), vec!["b.txt", "", "12"]);
	}

	#[test]
	fn short_rows_are_fatal() {
		let err = parse_definition("a.txt\tS\t3\nb.txt\t4\n", origin()).unwrap_err();
		assert!(matches!(err, ObiError::MalformedRecord { line: 2, .. }));
	}

	#[test]
	fn non_numeric_or_zero_grade_is_fatal() {
		assert!(matches!(
			CorpusRecord::parse("a.txt\t\tfirst", origin(), 1),
			Err(ObiError::MalformedRecord { .. })
		));
		assert!(matches!(
			CorpusRecord::parse("a.txt\t\t-1", origin(), 1),
			Err(ObiError::MalformedRecord { .. })
		));
		assert!(matches!(
			CorpusRecord::parse("a.txt\t\t0", origin(), 1),
			Err(ObiError::MalformedRecord { .. })
		));
	}

	#[test]
	fn round_robin_partitions() {
		let records: Vec<CorpusRecord> =
			(0..8).map(|i| CorpusRecord::new(&format!("{i}.txt"), "", 1 + i % 3)).collect();
		let partitions = partition(&records, 4);
		assert_eq!(partitions.len(), 4);
		for (p, members) in partitions.iter().enumerate() {
			assert_eq!(members.len(), 2);
			assert_eq!(members[0].path, format!("{p}.txt"));
			assert_eq!(members[1].path, format!("{}.txt", p + 4));
		}
	}
}
