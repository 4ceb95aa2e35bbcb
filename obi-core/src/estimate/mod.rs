//! Grade estimation from a contribution vector.

/// Raw and polynomial-smoothed grade profiles, picks and median voting.
pub mod estimator;

/// Least-squares polynomial regression.
pub mod regression;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ObiError, Result};

pub use estimator::{EstimationProfiles, Estimator, MethodPick, Readability};

/// One estimation profile: the raw per-grade profile or one of its polynomial
/// fits.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Method {
	#[serde(rename = "ns")]
	Raw,
	#[serde(rename = "s2")]
	Poly2,
	#[serde(rename = "s3")]
	Poly3,
	#[serde(rename = "s4")]
	Poly4,
	#[serde(rename = "s5")]
	Poly5,
}

impl Method {
	/// Every method, in report order.
	pub const ALL: [Method; 5] =
		[Method::Raw, Method::Poly5, Method::Poly4, Method::Poly3, Method::Poly2];

	pub const DEFAULT_VOTING: [Method; 3] = [Method::Raw, Method::Poly4, Method::Poly2];

	/// `0` is the raw profile, `2..=5` the polynomial fit of that degree.
	pub fn from_degree(degree: u32) -> Result<Self> {
		match degree {
			0 => Ok(Self::Raw),
			2 => Ok(Self::Poly2),
			3 => Ok(Self::Poly3),
			4 => Ok(Self::Poly4),
			5 => Ok(Self::Poly5),
			other => Err(ObiError::InvalidMethod(other.to_string())),
		}
	}

	/// Polynomial degree, `None` for the raw profile.
	pub fn degree(self) -> Option<usize> {
		match self {
			Self::Raw => None,
			Self::Poly2 => Some(2),
			Self::Poly3 => Some(3),
			Self::Poly4 => Some(4),
			Self::Poly5 => Some(5),
		}
	}

	pub fn name(self) -> &'static str {
		match self {
			Self::Raw => "ns",
			Self::Poly2 => "s2",
			Self::Poly3 => "s3",
			Self::Poly4 => "s4",
			Self::Poly5 => "s5",
		}
	}
}

impl fmt::Display for Method {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

impl FromStr for Method {
	type Err = ObiError;

	/// Accepts a profile name (`ns`, `s2`..`s5`) or a degree (`0`, `2`..`5`).
	fn from_str(s: &str) -> Result<Self> {
		let s = s.trim();
		if let Some(method) = Self::ALL.into_iter().find(|m| m.name() == s) {
			return Ok(method);
		}
		let degree = s.parse::<u32>().map_err(|_| ObiError::InvalidMethod(s.to_owned()))?;
		Self::from_degree(degree)
	}
}

/// Parses a comma-separated voting subset such as `0,4,2`.
pub fn parse_voting(list: &str) -> Result<Vec<Method>> {
	let voting = list
		.split(',')
		.filter(|item| !item.trim().is_empty())
		.map(str::parse)
		.collect::<Result<Vec<Method>>>()?;
	if voting.is_empty() {
		return Err(ObiError::EmptyVoting);
	}
	Ok(voting)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn degrees_map_to_methods() {
		assert_eq!(Method::from_degree(0).unwrap(), Method::Raw);
		assert_eq!(Method::from_degree(4).unwrap(), Method::Poly4);
		assert!(matches!(Method::from_degree(1), Err(ObiError::InvalidMethod(ref d)) if d == "1"));
		assert!(matches!("s6".parse::<Method>(), Err(ObiError::InvalidMethod(ref d)) if d == "s6"));
		assert_eq!(Method::Poly3.degree(), Some(3));
		assert_eq!(Method::Raw.degree(), None);
	}

	#[test]
	fn voting_lists() {
		assert_eq!(parse_voting("0,4,2").unwrap(), Method::DEFAULT_VOTING.to_vec());
		assert_eq!(parse_voting("s5, ns").unwrap(), vec![Method::Poly5, Method::Raw]);
		assert!(matches!(parse_voting(""), Err(ObiError::EmptyVoting)));
		assert!(parse_voting("0,7").is_err());
	}

	#[test]
	fn names_round_trip() {
		for method in Method::ALL {
			assert_eq!(method.to_string().parse::<Method>().unwrap(), method);
		}
	}
}
