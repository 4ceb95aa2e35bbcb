use std::collections::HashMap;

use super::normalize::{breaks_after, breaks_before, normalize_line};
use super::operative::OperativeChars;
use super::Token;
use crate::config::NGramOrder;
use crate::error::Result;
use crate::io::LineSource;

/// Extracts operative unigrams or bigrams from raw text lines.
///
/// # Bigram rules
/// - Characters are normalized per line (tags and whitespace removed).
/// - A window of two consecutive characters is emitted only if both are
///   operative.
/// - The last character of a line pairs with the first of the next line,
///   unless the next line is blank or starts with a tag, or the current line
///   ends with a tag.
///
/// # Unigram rules
/// - Every operative character is emitted; line boundaries do not matter.
#[derive(Clone, Copy, Debug)]
pub struct NGramExtractor<'a> {
	order: NGramOrder,
	operative: &'a OperativeChars,
}

impl<'a> NGramExtractor<'a> {
	pub fn new(order: NGramOrder, operative: &'a OperativeChars) -> Self {
		Self { order, operative }
	}

	pub fn order(&self) -> NGramOrder {
		self.order
	}

	/// Returns a lazy token iterator over `lines`.
	///
	/// Calling this again on the same lines yields the same sequence.
	pub fn tokens<I>(&self, lines: I) -> Tokens<'a, I::IntoIter>
	where
		I: IntoIterator,
		I::Item: AsRef<str>,
	{
		Tokens {
			lines: lines.into_iter(),
			order: self.order,
			operative: self.operative,
			window: Vec::new(),
			cursor: 0,
			break_after: false,
		}
	}

	/// Counts the tokens of `lines`.
	pub fn count<I>(&self, lines: I) -> TokenCounts
	where
		I: IntoIterator,
		I::Item: AsRef<str>,
	{
		self.tokens(lines).collect()
	}

	/// Reads a line source and counts its tokens.
	pub fn count_source<S: LineSource>(&self, source: &mut S) -> Result<TokenCounts> {
		Ok(self.count(source.read_lines()?))
	}
}

/// Iterator returned by [`NGramExtractor::tokens`].
pub struct Tokens<'a, I> {
	lines: I,
	order: NGramOrder,
	operative: &'a OperativeChars,
	/// Normalized characters of the current line, preceded by the carried
	/// character of the previous line in bigram mode.
	window: Vec<char>,
	cursor: usize,
	break_after: bool,
}

impl<I> Tokens<'_, I> {
	fn next_in_window(&mut self) -> Option<Token> {
		match self.order {
			NGramOrder::Unigram => {
				while self.cursor < self.window.len() {
					let c = self.window[self.cursor];
					self.cursor += 1;
					if self.operative.contains(c) {
						return Some(c.to_string());
					}
				}
			}
			NGramOrder::Bigram => {
				while self.cursor + 1 < self.window.len() {
					let (a, b) = (self.window[self.cursor], self.window[self.cursor + 1]);
					self.cursor += 1;
					if self.operative.contains(a) && self.operative.contains(b) {
						return Some([a, b].iter().collect());
					}
				}
			}
		}
		None
	}

	fn start_line(&mut self, line: &str) {
		let carry = match self.order {
			NGramOrder::Bigram if !self.break_after && !breaks_before(line) => {
				self.window.last().copied()
			}
			_ => None,
		};
		self.window.clear();
		self.window.extend(carry);
		self.cursor = 0;
		self.break_after = breaks_after(line);
		self.window.extend(normalize_line(line).chars());
	}
}

impl<I> Iterator for Tokens<'_, I>
where
	I: Iterator,
	I::Item: AsRef<str>,
{
	type Item = Token;

	fn next(&mut self) -> Option<Token> {
		loop {
			if let Some(token) = self.next_in_window() {
				return Some(token);
			}
			let line = self.lines.next()?;
			self.start_line(line.as_ref());
		}
	}
}

/// Occurrence count of each distinct token of one document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TokenCounts {
	counts: HashMap<Token, u64>,
}

impl TokenCounts {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn add(&mut self, token: Token) {
		*self.counts.entry(token).or_insert(0) += 1;
	}

	pub fn get(&self, token: &str) -> u64 {
		self.counts.get(token).copied().unwrap_or(0)
	}

	/// Total number of token occurrences.
	pub fn total(&self) -> u64 {
		self.counts.values().sum()
	}

	/// Number of distinct tokens.
	pub fn len(&self) -> usize {
		self.counts.len()
	}

	pub fn is_empty(&self) -> bool {
		self.counts.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
		self.counts.iter().map(|(token, count)| (token.as_str(), *count))
	}
}

impl FromIterator<Token> for TokenCounts {
	fn from_iter<T: IntoIterator<Item = Token>>(iter: T) -> Self {
		let mut counts = Self::new();
		for token in iter {
			counts.add(token);
		}
		counts
	}
}
