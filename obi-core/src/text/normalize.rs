use std::sync::LazyLock;

use regex::Regex;

/// An inline markup tag. Tags never span lines.
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^<]*>").expect("valid tag pattern"));

/// Removes markup tags and every whitespace character from a line.
///
/// Full-width spaces (U+3000) count as whitespace.
pub fn normalize_line(line: &str) -> String {
	TAG.replace_all(line, "").chars().filter(|c| !c.is_whitespace()).collect()
}

/// A blank line, or a line opening with a tag, breaks the bigram chain
/// before it.
pub fn breaks_before(line: &str) -> bool {
	let trimmed = line.trim();
	trimmed.is_empty() || trimmed.starts_with('<')
}

/// A line whose last character is `>` breaks the bigram chain after it.
///
/// Trailing whitespace counts: `"本文<br> "` does not break the chain.
pub fn breaks_after(line: &str) -> bool {
	line.ends_with('>')
}
