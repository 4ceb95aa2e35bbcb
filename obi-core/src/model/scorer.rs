use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::table::Model;
use crate::text::{Token, TokenCounts};

/// Weighted impact of one token on a document's per-grade sums.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TokenContribution {
	pub count: u64,
	/// `count * weight[i]`, grade 1 first.
	pub contributions: Vec<f64>,
}

/// Per-token breakdown of a scored document, restricted to tokens the model
/// knows.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct TextProfile {
	tokens: BTreeMap<Token, TokenContribution>,
}

impl TextProfile {
	pub fn len(&self) -> usize {
		self.tokens.len()
	}

	pub fn is_empty(&self) -> bool {
		self.tokens.is_empty()
	}

	pub fn get(&self, token: &str) -> Option<&TokenContribution> {
		self.tokens.get(token)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &TokenContribution)> {
		self.tokens.iter().map(|(token, contribution)| (token.as_str(), contribution))
	}
}

/// Document-level sums: operative token count and per-grade contribution.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ContributionVector {
	pub operative_count: u64,
	/// Sum of token contributions, grade 1 first.
	pub contributions: Vec<f64>,
}

impl ContributionVector {
	/// `false` for the "no signal" case (no token known to the model).
	pub fn has_signal(&self) -> bool {
		self.operative_count > 0
	}
}

impl Model {
	/// Scores a document's token counts.
	///
	/// Tokens absent from the model are dropped. Sums are accumulated in token
	/// order so the result does not depend on hash order.
	pub fn score(&self, text: &TokenCounts) -> (TextProfile, ContributionVector) {
		let mut profile = TextProfile::default();
		for (token, count) in text.iter() {
			if let Some(row) = self.get(token) {
				let contributions =
					row.weights.iter().map(|weight| count as f64 * weight).collect();
				profile.tokens.insert(token.to_owned(), TokenContribution { count, contributions });
			}
		}

		let mut total = ContributionVector {
			operative_count: 0,
			contributions: vec![0.0; self.grades()],
		};
		for contribution in profile.tokens.values() {
			total.operative_count += contribution.count;
			for (sum, value) in total.contributions.iter_mut().zip(&contribution.contributions) {
				*sum += value;
			}
		}

		(profile, total)
	}
}
