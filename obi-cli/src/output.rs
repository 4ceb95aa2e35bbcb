use std::io::{self, Write};

use obi_core::estimate::{Method, Readability};

/// How scoring results are printed.
#[derive(Clone, Copy, Debug, Default)]
pub struct ReportFormat {
	/// Adds the per-method picks to the summary line.
	pub long: bool,
	/// Info fields first, tab separated.
	pub tail: bool,
	/// Prints every estimation profile before the summary line.
	pub likelihood: bool,
	/// Prints the per-token breakdown before the summary line.
	pub contrib: bool,
}

impl ReportFormat {
	fn separator(&self) -> &'static str {
		if self.tail { "\t" } else { " " }
	}

	/// Writes the report of one document; `info` is echoed on the summary line.
	pub fn write<W: Write>(
		&self,
		out: &mut W,
		readability: &Readability,
		info: &[String],
	) -> io::Result<()> {
		if self.contrib {
			write_contributions(out, readability)?;
		}
		if self.likelihood {
			write_likelihoods(out, readability)?;
		}

		let mut fields = vec![readability.grade.to_string()];
		if self.long || self.likelihood {
			fields.extend(Method::ALL.iter().map(|method| readability.pick(*method).to_string()));
		}
		fields.push(readability.operative_count().to_string());
		if self.tail {
			fields.splice(0..0, info.iter().cloned());
		} else {
			fields.extend(info.iter().cloned());
		}
		writeln!(out, "{}", fields.join(self.separator()))?;

		if self.likelihood {
			writeln!(out)?;
		}
		Ok(())
	}
}

fn write_contributions<W: Write>(out: &mut W, readability: &Readability) -> io::Result<()> {
	for (token, contribution) in readability.tokens.iter() {
		write!(out, "{token} {:3}", contribution.count)?;
		for value in &contribution.contributions {
			write!(out, " {value:6.2}")?;
		}
		writeln!(out)?;
	}
	writeln!(out)
}

fn write_likelihoods<W: Write>(out: &mut W, readability: &Readability) -> io::Result<()> {
	for method in Method::ALL {
		write!(out, "{method} {:2}", readability.pick(method))?;
		if let Some(profiles) = &readability.profiles {
			for value in profiles.get(method) {
				write!(out, " {value:6.2}")?;
			}
		}
		writeln!(out)?;
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use obi_core::estimate::Estimator;
	use obi_core::model::{ContributionVector, Scale};

	use super::*;

	fn readability() -> Readability {
		let contribution = ContributionVector {
			operative_count: 4,
			contributions: vec![-1.0, 2.0, -1.0],
		};
		Estimator::default().estimate(contribution, Scale::Native)
	}

	fn render(format: ReportFormat, info: &[&str]) -> String {
		let info: Vec<String> = info.iter().map(|s| (*s).to_owned()).collect();
		let mut out = Vec::new();
		format.write(&mut out, &readability(), &info).unwrap();
		String::from_utf8(out).unwrap()
	}

	#[test]
	fn default_line() {
		assert_eq!(render(ReportFormat::default(), &[]), "2 4\n");
		assert_eq!(render(ReportFormat::default(), &["a.txt"]), "2 4 a.txt\n");
	}

	#[test]
	fn long_and_tail_lines() {
		let long = ReportFormat { long: true, ..ReportFormat::default() };
		assert_eq!(render(long, &["a.txt"]), "2 2 2 2 2 2 4 a.txt\n");

		let tail = ReportFormat { tail: true, ..ReportFormat::default() };
		assert_eq!(render(tail, &["a.txt", "W", "2"]), "a.txt\tW\t2\t2\t4\n");
	}

	#[test]
	fn likelihood_lists_every_profile() {
		let likelihood = ReportFormat { likelihood: true, ..ReportFormat::default() };
		let text = render(likelihood, &[]);
		let lines: Vec<&str> = text.lines().collect();
		assert_eq!(lines[0], "ns  2 -25.00  50.00 -25.00");
		assert_eq!(lines.len(), 7);
		assert_eq!(lines[5], "2 2 2 2 2 2 4");
	}

	#[test]
	fn fractional_grades_keep_their_decimals() {
		let mut readability = readability();
		readability.grade = 7.5;
		let mut out = Vec::new();
		ReportFormat::default().write(&mut out, &readability, &[]).unwrap();
		assert_eq!(String::from_utf8(out).unwrap(), "7.5 4\n");
	}
}
