use serde::{Deserialize, Serialize};

use super::{Method, regression};
use crate::config::ObiConfig;
use crate::error::{ObiError, Result};
use crate::model::{ContributionVector, Model, Scale, TextProfile};
use crate::text::TokenCounts;

/// The raw per-grade profile of a document and its four polynomial fits.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct EstimationProfiles {
	/// `100 * contribution[i] / operative_count`.
	pub ns: Vec<f64>,
	pub s2: Vec<f64>,
	pub s3: Vec<f64>,
	pub s4: Vec<f64>,
	pub s5: Vec<f64>,
}

impl EstimationProfiles {
	/// Builds the profiles, or `None` when the document carries no signal.
	pub fn from_contribution(contribution: &ContributionVector) -> Option<Self> {
		if !contribution.has_signal() {
			return None;
		}
		let operative = contribution.operative_count as f64;
		let ns: Vec<f64> =
			contribution.contributions.iter().map(|c| 100.0 * c / operative).collect();
		Some(Self {
			s2: regression::smooth(2, &ns),
			s3: regression::smooth(3, &ns),
			s4: regression::smooth(4, &ns),
			s5: regression::smooth(5, &ns),
			ns,
		})
	}

	pub fn get(&self, method: Method) -> &[f64] {
		match method {
			Method::Raw => &self.ns,
			Method::Poly2 => &self.s2,
			Method::Poly3 => &self.s3,
			Method::Poly4 => &self.s4,
			Method::Poly5 => &self.s5,
		}
	}

	/// 1-based grade with the highest value in `method`'s profile.
	pub fn pick(&self, method: Method) -> u32 {
		argmax(self.get(method))
	}
}

/// 1-based index of the first maximum, `0` for an empty profile.
fn argmax(profile: &[f64]) -> u32 {
	let mut best: Option<(usize, f64)> = None;
	for (index, &value) in profile.iter().enumerate() {
		if best.is_none_or(|(_, top)| value > top) {
			best = Some((index, value));
		}
	}
	best.map_or(0, |(index, _)| index as u32 + 1)
}

/// Middle value of the sorted picks; mean of the two middle values for an
/// even count.
fn median(picks: &[u32]) -> f64 {
	let mut sorted = picks.to_vec();
	sorted.sort_unstable();
	let mid = sorted.len() / 2;
	match sorted.len() {
		0 => 0.0,
		n if n % 2 == 1 => f64::from(sorted[mid]),
		_ => f64::from(sorted[mid - 1] + sorted[mid]) / 2.0,
	}
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct MethodPick {
	pub method: Method,
	pub grade: u32,
}

/// Readability estimate of one document.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Readability {
	/// Final grade on the model's scale.
	pub grade: f64,
	/// Final grade before the scale transform.
	pub native_grade: f64,
	pub scale: Scale,
	/// One pick per method, in report order. Never scale-transformed.
	pub picks: Vec<MethodPick>,
	pub contribution: ContributionVector,
	/// `None` for a document without signal.
	pub profiles: Option<EstimationProfiles>,
	/// Per-token breakdown, empty unless scored through [`Estimator::readability`].
	pub tokens: TextProfile,
}

impl Readability {
	pub fn pick(&self, method: Method) -> u32 {
		self.picks.iter().find(|p| p.method == method).map_or(0, |p| p.grade)
	}

	pub fn operative_count(&self) -> u64 {
		self.contribution.operative_count
	}
}

/// Turns contribution vectors into grades by median voting over a subset of
/// profiles.
#[derive(Clone, Debug, PartialEq)]
pub struct Estimator {
	voting: Vec<Method>,
}

impl Default for Estimator {
	fn default() -> Self {
		Self { voting: Method::DEFAULT_VOTING.to_vec() }
	}
}

impl Estimator {
	pub fn new(voting: Vec<Method>) -> Result<Self> {
		if voting.is_empty() {
			return Err(ObiError::EmptyVoting);
		}
		Ok(Self { voting })
	}

	pub fn from_config(config: &ObiConfig) -> Result<Self> {
		Self::new(config.voting.clone())
	}

	pub fn voting(&self) -> &[Method] {
		&self.voting
	}

	/// Estimates the grade of a scored document.
	///
	/// Without signal the final grade and every pick are `0`.
	pub fn estimate(&self, contribution: ContributionVector, scale: Scale) -> Readability {
		let profiles = EstimationProfiles::from_contribution(&contribution);
		let pick = |method: Method| profiles.as_ref().map_or(0, |p| p.pick(method));

		let picks = Method::ALL
			.into_iter()
			.map(|method| MethodPick { method, grade: pick(method) })
			.collect();
		let native_grade = if profiles.is_some() {
			median(&self.voting.iter().map(|m| pick(*m)).collect::<Vec<_>>())
		} else {
			0.0
		};

		Readability {
			grade: scale.apply(native_grade),
			native_grade,
			scale,
			picks,
			contribution,
			profiles,
			tokens: TextProfile::default(),
		}
	}

	/// Scores `text` against `model` and estimates its grade on the model's
	/// scale.
	pub fn readability(&self, model: &Model, text: &TokenCounts) -> Readability {
		let (tokens, contribution) = model.score(text);
		Readability { tokens, ..self.estimate(contribution, model.scale()) }
	}
}
