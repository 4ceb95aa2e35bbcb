use std::collections::{BTreeMap, HashMap};

use log::debug;

use super::table::{Model, ModelWeightVector};
use crate::config::{NGramOrder, ObiConfig};
use crate::corpus::{Corpus, FrequencyVector};
use crate::error::{ObiError, Result};

/// Turns a corpus into a model of centered log-likelihood weights.
///
/// For every token kept by the frequency filter:
/// 1. `p[i] = count[i] / base[i]` (`0.0` when `base[i] == 0`), where the base
///    is the summed vector of all kept tokens sharing the token's first
///    character (bigrams) or of the whole corpus (unigrams)
/// 2. zero probabilities are filled from their neighbours until none remain
/// 3. `w[i] = log10(p[i]) - mean(log10(p))`
#[derive(Clone, Copy, Debug)]
pub struct ModelBuilder {
	order: NGramOrder,
	required_frequency: u64,
	max_passes: Option<usize>,
}

impl ModelBuilder {
	pub fn new(order: NGramOrder, required_frequency: u64) -> Self {
		Self { order, required_frequency, max_passes: None }
	}

	pub fn from_config(config: &ObiConfig) -> Self {
		Self {
			order: config.order,
			required_frequency: config.required_frequency,
			max_passes: config.max_smoothing_passes,
		}
	}

	/// Caps the number of zero-smoothing passes (default: grades + 1).
	pub fn with_max_passes(mut self, passes: usize) -> Self {
		self.max_passes = Some(passes);
		self
	}

	/// Builds a model. The corpus is left untouched.
	///
	/// # Errors
	/// [`ObiError::SmoothingDiverged`] if a profile still holds zeros after the
	/// allowed number of passes.
	pub fn build(&self, corpus: &Corpus) -> Result<Model> {
		let grades = corpus.grades();
		let kept: Vec<(&str, &FrequencyVector)> =
			corpus.iter().filter(|(_, counts)| counts.total() >= self.required_frequency).collect();

		let base = NormalizationBase::new(self.order, grades, &kept);
		let max_passes = self.max_passes.unwrap_or(grades + 1);

		let mut table = BTreeMap::new();
		for (token, counts) in &kept {
			let p = probabilities(counts, base.for_token(token), grades);
			let smoothed = interpolate_zeros(&p, max_passes)
				.ok_or_else(|| ObiError::SmoothingDiverged {
					token: (*token).to_owned(),
					passes: max_passes,
				})?;
			table.insert(
				(*token).to_owned(),
				ModelWeightVector {
					frequency: counts.total(),
					weights: centered_log_weights(&smoothed),
				},
			);
		}

		debug!(
			"built model: {} of {} tokens kept (required frequency {}), {} grades",
			table.len(),
			corpus.len(),
			self.required_frequency,
			grades
		);
		Ok(Model::from_table(grades, table))
	}
}

/// Denominators of the per-grade probabilities.
enum NormalizationBase {
	/// Bigrams: one summed vector per first character.
	PerContext(HashMap<char, FrequencyVector>),
	/// Unigrams: one summed vector for the whole corpus.
	Whole(FrequencyVector),
}

impl NormalizationBase {
	fn new(order: NGramOrder, grades: usize, kept: &[(&str, &FrequencyVector)]) -> Self {
		match order {
			NGramOrder::Bigram => {
				let mut contexts: HashMap<char, FrequencyVector> = HashMap::new();
				for (token, counts) in kept {
					if let Some(first) = token.chars().next() {
						contexts
							.entry(first)
							.or_insert_with(|| FrequencyVector::zeros(grades))
							.merge(counts);
					}
				}
				Self::PerContext(contexts)
			}
			NGramOrder::Unigram => {
				let mut whole = FrequencyVector::zeros(grades);
				for (_, counts) in kept {
					whole.merge(counts);
				}
				Self::Whole(whole)
			}
		}
	}

	fn for_token(&self, token: &str) -> Option<&FrequencyVector> {
		match self {
			Self::PerContext(contexts) => {
				token.chars().next().and_then(|first| contexts.get(&first))
			}
			Self::Whole(whole) => Some(whole),
		}
	}
}

/// Per-grade probabilities `count[i] / base[i]` for grades `1..=grades`.
fn probabilities(
	counts: &FrequencyVector,
	base: Option<&FrequencyVector>,
	grades: usize,
) -> Vec<f64> {
	(1..=grades)
		.map(|grade| {
			let count = counts.get(grade);
			let total = base.map_or(0, |base| base.get(grade));
			if count == 0 || total == 0 { 0.0 } else { count as f64 / total as f64 }
		})
		.collect()
}

/// Replaces zero probabilities by the mean of their neighbours, all positions
/// updated from the previous pass, until no zero remains.
///
/// Edge grades take half of their single neighbour. An all-zero profile is
/// returned unchanged. Returns `None` if zeros remain after `max_passes`.
pub fn interpolate_zeros(p: &[f64], max_passes: usize) -> Option<Vec<f64>> {
	let mut v = p.to_vec();
	if v.iter().all(|x| *x == 0.0) {
		return Some(v);
	}

	let last = v.len() - 1;
	let mut passes = 0;
	while v.iter().any(|x| *x == 0.0) {
		if passes == max_passes {
			return None;
		}
		v = (0..v.len())
			.map(|i| match (v[i] == 0.0, i) {
				(false, _) => v[i],
				(true, 0) => v[1] / 2.0,
				(true, i) if i == last => v[last - 1] / 2.0,
				(true, i) => (v[i - 1] + v[i + 1]) / 2.0,
			})
			.collect();
		passes += 1;
	}
	Some(v)
}

/// `log10(p[i])` minus the mean over all grades.
///
/// A profile with no support at all (every entry zero) gets zero weights: the
/// token stays in the model but cannot favour any grade.
pub fn centered_log_weights(p: &[f64]) -> Vec<f64> {
	if p.iter().all(|x| *x == 0.0) {
		return vec![0.0; p.len()];
	}
	let logs: Vec<f64> = p.iter().map(|x| x.log10()).collect();
	let mean = logs.iter().sum::<f64>() / logs.len() as f64;
	logs.iter().map(|x| x - mean).collect()
}
