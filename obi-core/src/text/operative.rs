use std::collections::HashSet;

use log::{debug, warn};

use crate::error::Result;
use crate::io::LineSource;

/// Characters allowed to take part in tokens.
///
/// `Any` accepts every character; it is used when counting raw corpus size.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OperativeChars {
	Any,
	Set(HashSet<char>),
}

impl OperativeChars {
	/// Loads a whitelist, one character per line (first tab-separated field).
	///
	/// Blank lines are ignored; entries that are not exactly one character
	/// can never match a character and are skipped with a warning.
	pub fn load<S: LineSource>(source: &mut S) -> Result<Self> {
		let mut chars = HashSet::new();
		for (index, line) in source.read_lines()?.iter().enumerate() {
			let entry = line.split('\t').next().unwrap_or_default();
			let mut it = entry.chars();
			match (it.next(), it.next()) {
				(None, _) => {}
				(Some(c), None) => {
					chars.insert(c);
				}
				(Some(_), Some(_)) => {
					warn!("operative list line {}: {entry:?} is not a single character", index + 1)
				}
			}
		}
		debug!("loaded {} operative characters", chars.len());
		Ok(Self::Set(chars))
	}

	pub fn from_chars<I: IntoIterator<Item = char>>(chars: I) -> Self {
		Self::Set(chars.into_iter().collect())
	}

	pub fn contains(&self, c: char) -> bool {
		match self {
			Self::Any => true,
			Self::Set(chars) => chars.contains(&c),
		}
	}

	/// Iterates the whitelist; `Any` has nothing to enumerate.
	pub fn iter(&self) -> impl Iterator<Item = char> + '_ {
		let chars = match self {
			Self::Any => None,
			Self::Set(chars) => Some(chars.iter().copied()),
		};
		chars.into_iter().flatten()
	}

	pub fn len(&self) -> Option<usize> {
		match self {
			Self::Any => None,
			Self::Set(chars) => Some(chars.len()),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::io::MemorySource;

	#[test]
	fn loads_first_field_of_each_line() {
		let mut source = MemorySource::from("あ\t1\nい\n\n漢字\nカ\tkatakana");
		let operative = OperativeChars::load(&mut source).unwrap();
		assert_eq!(operative.len(), Some(3));
		assert!(operative.contains('あ'));
		assert!(operative.contains('カ'));
		assert!(!operative.contains('漢'));
		let mut chars: Vec<char> = operative.iter().collect();
		chars.sort();
		assert_eq!(chars, vec!['あ', 'い', 'カ']);
	}

	#[test]
	fn any_accepts_everything() {
		assert!(OperativeChars::Any.contains('x'));
		assert_eq!(OperativeChars::Any.iter().count(), 0);
		assert_eq!(OperativeChars::Any.len(), None);
	}
}
