use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::thread;

use log::{info, warn};

use super::definition::{document_path, CorpusRecord};
use super::frequency::FrequencyVector;
use crate::config::ObiConfig;
use crate::error::{ObiError, Result};
use crate::io::{Encoding, FileSource, LineSource};
use crate::text::{NGramExtractor, OperativeChars, Token, TokenCounts};

/// Frequency-by-grade vectors for every token of a graded document set.
///
/// # Invariants
/// - Every vector satisfies `v[0] == sum(v[1..])`
/// - After [`Corpus::seal`], every vector holds exactly `grades + 1` slots
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Corpus {
	/// Highest grade seen (`G`).
	grades: usize,
	table: HashMap<Token, FrequencyVector>,
}

impl Corpus {
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds `n` occurrences of `token` at `grade`.
	pub fn add(&mut self, token: &str, grade: usize, n: u64) {
		self.grades = self.grades.max(grade);
		match self.table.get_mut(token) {
			Some(vector) => vector.add(grade, n),
			None => {
				let mut vector = FrequencyVector::default();
				vector.add(grade, n);
				self.table.insert(token.to_owned(), vector);
			}
		}
	}

	/// Adds every token of one document of `grade`.
	///
	/// The grade counts toward `G` even if the document yields no token.
	pub fn add_document<I: IntoIterator<Item = Token>>(&mut self, tokens: I, grade: usize) {
		self.grades = self.grades.max(grade);
		for token in tokens {
			self.table.entry(token).or_default().add(grade, 1);
		}
	}

	/// Pads every vector to `grades + 1` slots.
	pub fn seal(&mut self) {
		let grades = self.grades;
		for vector in self.table.values_mut() {
			vector.pad(grades);
		}
	}

	/// Adds the counts of `other` into this corpus.
	pub fn merge(&mut self, other: &Self) {
		self.grades = self.grades.max(other.grades);
		for (token, vector) in &other.table {
			match self.table.get_mut(token) {
				Some(existing) => existing.merge(vector),
				None => {
					self.table.insert(token.clone(), vector.clone());
				}
			}
		}
		self.seal();
	}

	/// Returns a copy of this corpus with one document's counts removed from
	/// its grade bucket (and the totals).
	///
	/// Counts stop at zero, so a document that was never part of the corpus
	/// cannot drive a frequency negative.
	pub fn without_document(&self, text: &TokenCounts, grade: usize) -> Self {
		let mut copy = self.clone();
		let mut clamped = 0u64;
		for (token, count) in text.iter() {
			if let Some(vector) = copy.table.get_mut(token) {
				clamped += count - vector.remove(grade, count);
			}
		}
		if clamped > 0 {
			warn!("leave-one-out subtraction clamped {clamped} occurrences at grade {grade}");
		}
		copy
	}

	/// Highest grade (`G`).
	pub fn grades(&self) -> usize {
		self.grades
	}

	/// Number of distinct tokens.
	pub fn len(&self) -> usize {
		self.table.len()
	}

	pub fn is_empty(&self) -> bool {
		self.table.is_empty()
	}

	pub fn get(&self, token: &str) -> Option<&FrequencyVector> {
		self.table.get(token)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &FrequencyVector)> {
		self.table.iter().map(|(token, vector)| (token.as_str(), vector))
	}

	/// Sum of all vectors: occurrences per grade, total first.
	pub fn totals(&self) -> FrequencyVector {
		let mut totals = FrequencyVector::zeros(self.grades);
		for vector in self.table.values() {
			totals.merge(vector);
		}
		totals
	}
}

/// Reads graded documents from a corpus directory and aggregates them.
#[derive(Clone, Debug)]
pub struct CorpusLoader<'a> {
	corpus_dir: PathBuf,
	extractor: NGramExtractor<'a>,
	default_encoding: Encoding,
	workers: usize,
}

impl<'a> CorpusLoader<'a> {
	pub fn new<P: AsRef<Path>>(
		corpus_dir: P,
		extractor: NGramExtractor<'a>,
		default_encoding: Encoding,
		workers: usize,
	) -> Self {
		Self {
			corpus_dir: corpus_dir.as_ref().to_path_buf(),
			extractor,
			default_encoding,
			workers: workers.max(1),
		}
	}

	/// Loader using the order, default encoding and worker count of `config`.
	pub fn from_config<P: AsRef<Path>>(
		corpus_dir: P,
		operative: &'a OperativeChars,
		config: &ObiConfig,
	) -> Self {
		let extractor = NGramExtractor::new(config.order, operative);
		Self::new(corpus_dir, extractor, config.encoding, config.workers())
	}

	pub fn extractor(&self) -> NGramExtractor<'a> {
		self.extractor
	}

	pub fn corpus_dir(&self) -> &Path {
		&self.corpus_dir
	}

	pub fn workers(&self) -> usize {
		self.workers
	}

	/// Reads the raw lines of a document, honoring its encoding hint.
	pub fn read_document(&self, record: &CorpusRecord) -> Result<Vec<String>> {
		let encoding = Encoding::resolve(record.encoding_hint(), self.default_encoding)?;
		FileSource::new(document_path(&self.corpus_dir, record), encoding).read_lines()
	}

	/// Token counts of one document.
	pub fn load_text(&self, record: &CorpusRecord) -> Result<TokenCounts> {
		Ok(self.extractor.count(self.read_document(record)?))
	}

	/// Aggregates `records` into a sealed corpus.
	///
	/// Records are split into one chunk per worker; each worker builds a
	/// partial corpus and partial corpora are merged.
	pub fn load_corpus(&self, records: &[CorpusRecord]) -> Result<Corpus> {
		let workers = self.workers.min(records.len()).max(1);
		let chunk_size = records.len().div_ceil(workers).max(1);

		let partials: Vec<Result<Corpus>> = thread::scope(|scope| {
			let handles: Vec<_> = records
				.chunks(chunk_size)
				.map(|chunk| scope.spawn(move || self.aggregate(chunk)))
				.collect();
			handles
				.into_iter()
				.map(|handle| handle.join().unwrap_or(Err(ObiError::WorkerPanicked)))
				.collect()
		});

		let mut corpus = Corpus::new();
		for partial in partials {
			corpus.merge(&partial?);
		}
		corpus.seal();

		info!(
			"aggregated {} documents: {} distinct tokens, {} grades",
			records.len(),
			corpus.len(),
			corpus.grades()
		);
		Ok(corpus)
	}

	/// Aggregates every partition except `excluded`.
	pub fn load_partition_corpus(
		&self,
		partitions: &[Vec<CorpusRecord>],
		excluded: usize,
	) -> Result<Corpus> {
		let records: Vec<CorpusRecord> = partitions
			.iter()
			.enumerate()
			.filter(|(index, _)| *index != excluded)
			.flat_map(|(_, records)| records.iter().cloned())
			.collect();
		self.load_corpus(&records)
	}

	fn aggregate(&self, records: &[CorpusRecord]) -> Result<Corpus> {
		let mut corpus = Corpus::new();
		for record in records {
			let lines = self.read_document(record)?;
			corpus.add_document(self.extractor.tokens(&lines), record.grade);
		}
		Ok(corpus)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn assert_invariant(corpus: &Corpus) {
		for (token, vector) in corpus.iter() {
			assert_eq!(vector.total(), vector.per_grade().iter().sum::<u64>(), "token {token}");
			assert_eq!(vector.grades(), corpus.grades(), "token {token}");
		}
	}

	fn tokens(list: &[&str]) -> Vec<Token> {
		list.iter().map(|s| (*s).to_owned()).collect()
	}

	#[test]
	fn documents_accumulate_per_grade() {
		let mut corpus = Corpus::new();
		corpus.add_document(tokens(&["あい", "いう", "あい"]), 1);
		corpus.add_document(tokens(&["あい"]), 3);
		corpus.seal();

		assert_eq!(corpus.grades(), 3);
		assert_eq!(corpus.get("あい").unwrap().as_slice(), &[3, 2, 0, 1]);
		assert_eq!(corpus.get("いう").unwrap().as_slice(), &[1, 1, 0, 0]);
		assert_invariant(&corpus);
	}

	#[test]
	fn empty_document_still_sets_grade_count() {
		let mut corpus = Corpus::new();
		corpus.add_document(tokens(&["あい"]), 1);
		corpus.add_document(Vec::new(), 4);
		corpus.seal();
		assert_eq!(corpus.grades(), 4);
		assert_eq!(corpus.get("あい").unwrap().as_slice(), &[1, 1, 0, 0, 0]);
	}

	#[test]
	fn merge_matches_sequential_aggregation() {
		let mut sequential = Corpus::new();
		sequential.add_document(tokens(&["あい", "いう"]), 1);
		sequential.add_document(tokens(&["いう", "うえ"]), 2);
		sequential.seal();

		let mut left = Corpus::new();
		left.add_document(tokens(&["あい", "いう"]), 1);
		let mut right = Corpus::new();
		right.add_document(tokens(&["いう", "うえ"]), 2);
		let mut merged = Corpus::new();
		merged.merge(&left);
		merged.merge(&right);

		assert_eq!(merged, sequential);
		assert_invariant(&merged);
	}

	#[test]
	fn leave_one_out_subtraction_reaches_exact_zero() {
		// Document D is the only grade-2 source of "あい".
		let mut corpus = Corpus::new();
		corpus.add_document(tokens(&["あい", "いう"]), 1);
		corpus.add_document(tokens(&["あい", "あい"]), 2);
		corpus.seal();

		let d: TokenCounts = tokens(&["あい", "あい"]).into_iter().collect();
		let reduced = corpus.without_document(&d, 2);

		assert_eq!(reduced.get("あい").unwrap().as_slice(), &[1, 1, 0]);
		assert_invariant(&reduced);
		// The source corpus is untouched.
		assert_eq!(corpus.get("あい").unwrap().as_slice(), &[3, 1, 2]);
	}

	#[test]
	fn subtracting_a_foreign_document_never_goes_negative() {
		let mut corpus = Corpus::new();
		corpus.add_document(tokens(&["あい"]), 2);
		corpus.seal();

		let foreign: TokenCounts =
			tokens(&["あい", "あい", "あい", "かき"]).into_iter().collect();
		let reduced = corpus.without_document(&foreign, 2);
		assert_eq!(reduced.get("あい").unwrap().as_slice(), &[0, 0, 0]);
		assert!(reduced.get("かき").is_none());
	}

	#[test]
	fn totals_sum_all_tokens() {
		let mut corpus = Corpus::new();
		corpus.add("あい", 1, 2);
		corpus.add("いう", 2, 5);
		corpus.seal();
		assert_eq!(corpus.totals().as_slice(), &[7, 2, 5]);
	}
}
