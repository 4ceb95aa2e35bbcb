use std::path::Path;
use std::sync::mpsc;
use std::thread;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::config::ObiConfig;
use crate::corpus::{Corpus, CorpusLoader, CorpusRecord, partition};
use crate::error::{ObiError, Result};
use crate::estimate::{Estimator, Readability};
use crate::model::{Model, ModelBuilder};
use crate::text::OperativeChars;

/// Cross-validation scheme.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CrossValidation {
	/// One model per sample, trained on the full corpus minus that sample.
	LeaveOneOut,
	/// Round-robin partitions; each partition is scored by a model trained on
	/// all the others.
	NFold(usize),
}

impl CrossValidation {
	/// `1` means leave-one-out, `0` is rejected.
	pub fn from_partitions(n: usize) -> Result<Self> {
		match n {
			0 => Err(ObiError::InvalidPartitionCount),
			1 => Ok(Self::LeaveOneOut),
			n => Ok(Self::NFold(n)),
		}
	}
}

/// Estimate of one held-out sample.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Evaluation {
	pub record: CorpusRecord,
	/// Partition of the sample, `None` under leave-one-out.
	pub partition: Option<usize>,
	pub readability: Readability,
}

/// Builds models from held-out training sets and scores the held-out samples.
pub struct Evaluator<'a> {
	loader: CorpusLoader<'a>,
	builder: ModelBuilder,
	estimator: Estimator,
}

impl<'a> Evaluator<'a> {
	pub fn new(loader: CorpusLoader<'a>, builder: ModelBuilder, estimator: Estimator) -> Self {
		Self { loader, builder, estimator }
	}

	pub fn from_config<P: AsRef<Path>>(
		corpus_dir: P,
		operative: &'a OperativeChars,
		config: &ObiConfig,
	) -> Result<Self> {
		Ok(Self::new(
			CorpusLoader::from_config(corpus_dir, operative, config),
			ModelBuilder::from_config(config),
			Estimator::from_config(config)?,
		))
	}

	/// Runs `mode` over `records`.
	///
	/// `tests` replaces the scored samples under leave-one-out; N-fold always
	/// scores the corpus records themselves.
	pub fn run(
		&self,
		mode: CrossValidation,
		records: &[CorpusRecord],
		tests: Option<&[CorpusRecord]>,
	) -> Result<Vec<Evaluation>> {
		match mode {
			CrossValidation::LeaveOneOut => self.leave_one_out(records, tests),
			CrossValidation::NFold(n) => self.n_fold(records, n),
		}
	}

	/// Leave-one-out over `records` (or over `tests` when given).
	///
	/// The corpus is aggregated once. Every sample then gets its own copy with
	/// the sample's counts subtracted, so workers never share mutable state.
	/// Results come back in sample order.
	pub fn leave_one_out(
		&self,
		records: &[CorpusRecord],
		tests: Option<&[CorpusRecord]>,
	) -> Result<Vec<Evaluation>> {
		let corpus = self.loader.load_corpus(records)?;
		let samples = tests.unwrap_or(records);
		if samples.is_empty() {
			return Ok(Vec::new());
		}

		let workers = self.loader.workers().min(samples.len()).max(1);
		let chunk_size = samples.len().div_ceil(workers);

		let (tx, rx) = mpsc::channel();
		let panicked = thread::scope(|scope| {
			let handles: Vec<_> = samples
				.chunks(chunk_size)
				.enumerate()
				.map(|(chunk_index, chunk)| {
					let tx = tx.clone();
					let corpus = &corpus;
					scope.spawn(move || {
						for (offset, record) in chunk.iter().enumerate() {
							let result = self.held_out(corpus, record);
							let failed = result.is_err();
							let index = chunk_index * chunk_size + offset;
							if tx.send((index, result)).is_err() || failed {
								break;
							}
						}
					})
				})
				.collect();
			handles.into_iter().map(|handle| handle.join()).filter(|joined| joined.is_err()).count()
		});
		drop(tx);

		if panicked > 0 {
			return Err(ObiError::WorkerPanicked);
		}

		let mut results: Vec<(usize, Result<Evaluation>)> = rx.into_iter().collect();
		results.sort_by_key(|(index, _)| *index);
		let evaluations =
			results.into_iter().map(|(_, result)| result).collect::<Result<Vec<_>>>()?;

		info!("leave-one-out: {} samples over {} workers", evaluations.len(), workers);
		Ok(evaluations)
	}

	/// N-fold cross-validation. `n == 1` routes to leave-one-out.
	///
	/// Partitions run one after the other; corpus loading inside each one is
	/// parallel.
	pub fn n_fold(&self, records: &[CorpusRecord], n: usize) -> Result<Vec<Evaluation>> {
		let n = match CrossValidation::from_partitions(n)? {
			CrossValidation::LeaveOneOut => return self.leave_one_out(records, None),
			CrossValidation::NFold(n) => n,
		};

		let partitions = partition(records, n);
		let mut evaluations = Vec::with_capacity(records.len());
		for (index, members) in partitions.iter().enumerate() {
			if members.is_empty() {
				continue;
			}
			let corpus = self.loader.load_partition_corpus(&partitions, index)?;
			let model = self.builder.build(&corpus)?;
			debug!(
				"partition {}/{}: model of {} tokens, {} samples",
				index + 1,
				n,
				model.len(),
				members.len()
			);

			for record in members {
				let readability = self.score(&model, record)?;
				evaluations.push(Evaluation {
					record: record.clone(),
					partition: Some(index),
					readability,
				});
			}
		}
		Ok(evaluations)
	}

	fn held_out(&self, corpus: &Corpus, record: &CorpusRecord) -> Result<Evaluation> {
		let text = self.loader.load_text(record)?;
		let model = self.builder.build(&corpus.without_document(&text, record.grade))?;
		debug!("{}: leave-one-out model of {} tokens", record.path, model.len());
		let readability = self.estimator.readability(&model, &text);
		Ok(Evaluation { record: record.clone(), partition: None, readability })
	}

	fn score(&self, model: &Model, record: &CorpusRecord) -> Result<Readability> {
		let text = self.loader.load_text(record)?;
		Ok(self.estimator.readability(model, &text))
	}
}
