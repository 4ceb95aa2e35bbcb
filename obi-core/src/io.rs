use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use encoding_rs::{EUC_JP, ISO_2022_JP, SHIFT_JIS, UTF_8};
use serde::{Deserialize, Serialize};

use crate::error::{ObiError, Result};

/// Character encoding of a text file, named by its one-letter kanji hint.
///
/// - `W`: UTF-8 (no conversion)
/// - `S`: Shift_JIS
/// - `E`: EUC-JP
/// - `J`: ISO-2022-JP
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Encoding {
	#[default]
	#[serde(rename = "W")]
	Utf8,
	#[serde(rename = "S")]
	ShiftJis,
	#[serde(rename = "E")]
	EucJp,
	#[serde(rename = "J")]
	Iso2022Jp,
}

impl Encoding {
	/// Parses a one-letter kanji hint.
	pub fn from_hint(hint: &str) -> Result<Self> {
		match hint {
			"W" => Ok(Self::Utf8),
			"S" => Ok(Self::ShiftJis),
			"E" => Ok(Self::EucJp),
			"J" => Ok(Self::Iso2022Jp),
			other => Err(ObiError::InvalidEncoding(other.to_owned())),
		}
	}

	/// Resolves an optional per-document hint against a fallback.
	///
	/// An absent or empty hint selects `fallback`; anything else must be a
	/// valid hint.
	pub fn resolve(hint: Option<&str>, fallback: Encoding) -> Result<Self> {
		match hint.map(str::trim) {
			None | Some("") => Ok(fallback),
			Some(hint) => Self::from_hint(hint),
		}
	}

	pub fn name(self) -> &'static str {
		match self {
			Self::Utf8 => "UTF-8",
			Self::ShiftJis => "Shift_JIS",
			Self::EucJp => "EUC-JP",
			Self::Iso2022Jp => "ISO-2022-JP",
		}
	}

	/// Decodes raw bytes, returning `None` on malformed input.
	pub fn decode(self, bytes: &[u8]) -> Option<String> {
		let encoding = match self {
			Self::Utf8 => UTF_8,
			Self::ShiftJis => SHIFT_JIS,
			Self::EucJp => EUC_JP,
			Self::Iso2022Jp => ISO_2022_JP,
		};
		let (text, had_errors) = encoding.decode_with_bom_removal(bytes);
		if had_errors { None } else { Some(text.into_owned()) }
	}
}

/// Anything able to yield the raw lines of a text.
///
/// Files, standard input and in-memory text all go through this trait, so the
/// extraction pipeline never looks at the concrete source.
pub trait LineSource {
	/// Reads all lines, without their terminators.
	fn read_lines(&mut self) -> Result<Vec<String>>;
}

/// Lines of a file on disk, decoded with a fixed encoding.
#[derive(Clone, Debug)]
pub struct FileSource {
	path: PathBuf,
	encoding: Encoding,
}

impl FileSource {
	pub fn new<P: AsRef<Path>>(path: P, encoding: Encoding) -> Self {
		Self { path: path.as_ref().to_path_buf(), encoding }
	}

	pub fn path(&self) -> &Path {
		&self.path
	}
}

impl LineSource for FileSource {
	fn read_lines(&mut self) -> Result<Vec<String>> {
		let bytes = fs::read(&self.path).map_err(|e| ObiError::io(&self.path, e))?;
		let text = self
			.encoding
			.decode(&bytes)
			.ok_or_else(|| ObiError::Decode {
				path: self.path.clone(),
				encoding: self.encoding.name(),
			})?;
		Ok(split_lines(&text))
	}
}

/// Lines read once from a stream such as standard input.
pub struct ReaderSource<R> {
	reader: R,
	encoding: Encoding,
}

impl<R: Read> ReaderSource<R> {
	pub fn new(reader: R, encoding: Encoding) -> Self {
		Self { reader, encoding }
	}
}

impl<R: Read> LineSource for ReaderSource<R> {
	fn read_lines(&mut self) -> Result<Vec<String>> {
		let mut bytes = Vec::new();
		self.reader.read_to_end(&mut bytes)?;
		let text = self
			.encoding
			.decode(&bytes)
			.ok_or_else(|| ObiError::Decode {
				path: PathBuf::from("<stream>"),
				encoding: self.encoding.name(),
			})?;
		Ok(split_lines(&text))
	}
}

/// Lines already held in memory.
#[derive(Clone, Debug, Default)]
pub struct MemorySource {
	lines: Vec<String>,
}

impl MemorySource {
	pub fn new(lines: Vec<String>) -> Self {
		Self { lines }
	}
}

impl From<&str> for MemorySource {
	fn from(text: &str) -> Self {
		Self::new(split_lines(text))
	}
}

impl LineSource for MemorySource {
	fn read_lines(&mut self) -> Result<Vec<String>> {
		Ok(self.lines.clone())
	}
}

/// Splits on `\n` / `\r\n`.
fn split_lines(text: &str) -> Vec<String> {
	text.lines().map(str::to_owned).collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn hints_resolve_against_fallback() {
		assert_eq!(Encoding::resolve(None, Encoding::EucJp).unwrap(), Encoding::EucJp);
		assert_eq!(Encoding::resolve(Some(""), Encoding::ShiftJis).unwrap(), Encoding::ShiftJis);
		assert_eq!(Encoding::resolve(Some("W"), Encoding::ShiftJis).unwrap(), Encoding::Utf8);
		assert_eq!(Encoding::resolve(Some("J"), Encoding::Utf8).unwrap(), Encoding::Iso2022Jp);
		assert!(matches!(
			Encoding::resolve(Some("X"), Encoding::Utf8),
			Err(ObiError::InvalidEncoding(h)) if h == "X"
		));
	}

	#[test]
	fn decodes_legacy_encodings() {
		let (sjis, _, _) = SHIFT_JIS.encode("日本語の文章");
		assert_eq!(Encoding::ShiftJis.decode(&sjis).as_deref(), Some("日本語の文章"));

		let (euc, _, _) = EUC_JP.encode("かな");
		assert_eq!(Encoding::EucJp.decode(&euc).as_deref(), Some("かな"));

		assert_eq!(Encoding::Utf8.decode(&[0x61, 0xff]), None);
	}

	#[test]
	fn reader_and_memory_sources_split_lines() {
		let mut reader = ReaderSource::new("一行目\r\n二行目\n".as_bytes(), Encoding::Utf8);
		assert_eq!(reader.read_lines().unwrap(), vec!["一行目", "二行目"]);

		let mut memory = MemorySource::from("あ\n\nい");
		assert_eq!(memory.read_lines().unwrap(), vec!["あ", "", "い"]);
		// Restartable: a second read yields the same lines.
		assert_eq!(memory.read_lines().unwrap(), vec!["あ", "", "い"]);
	}

	#[test]
	fn missing_file_reports_its_path() {
		let mut source = FileSource::new("/nonexistent/obi/text.txt", Encoding::Utf8);
		match source.read_lines() {
			Err(ObiError::Io { path, .. }) => {
				assert_eq!(path, PathBuf::from("/nonexistent/obi/text.txt"))
			}
			other => panic!("unexpected {other:?}"),
		}
	}
}
