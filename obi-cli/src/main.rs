//! `obi`: estimates the readability of Japanese text.
//!
//! Each level of the T13 (T13U) scale corresponds to a Japanese school grade:
//! 1-6 elementary school, 7-9 junior high school, 10-12 high school and 13
//! beyond high school. By default two values are printed per text: the
//! readability level and the number of operative characters.

mod output;

use std::io::{self, BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::info;

use obi_core::config::{NGramOrder, ObiConfig};
use obi_core::corpus::{CorpusLoader, load_definition};
use obi_core::estimate::{Estimator, parse_voting};
use obi_core::evaluation::{CrossValidation, Evaluator};
use obi_core::io::{Encoding, FileSource, LineSource, ReaderSource};
use obi_core::model::{Model, ModelBuilder};
use obi_core::text::{NGramExtractor, OperativeChars};

use output::ReportFormat;

const ABOUT: &str = "Readability estimation of Japanese text based on character bigram models.

Each level of the T13 (T13U) scale model corresponds to a Japanese school grade:
     1 - 6: elementary school (6 years)
     7 - 9: junior high school (3 years)
   10 - 12: high school (3 years)
        13: beyond high school

By default, two values are printed per text:
  first: readability level
  second: the number of operative characters in the text";

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ExecMode {
	/// Print the per-grade token totals of a corpus.
	Size,
	/// Print the operative n-grams of the input.
	Bigram,
	/// Evaluate a corpus by cross-validation (see --partition).
	#[value(name = "cross_validation")]
	CrossValidation,
}

#[derive(Parser, Debug)]
#[command(
	name = "obi",
	version,
	about = "Readability estimation of Japanese text",
	long_about = ABOUT
)]
struct Cli {
	/// Scale model name [default: T13]
	#[arg(short = 'm', long, value_parser = ["T13", "T13U", "T7"])]
	model_name: Option<String>,

	/// Scale model file
	#[arg(short = 'M', long)]
	model_file: Option<PathBuf>,

	/// Directory holding the named models
	#[arg(long)]
	model_dir: Option<PathBuf>,

	/// Operative character list
	#[arg(short = 'o', long)]
	operative_char: Option<PathBuf>,

	/// N-gram width
	#[arg(short = 'N', long, value_parser = clap::value_parser!(u8).range(1..=2))]
	ngram: Option<u8>,

	/// Kanji code of the text files
	#[arg(short = 'k', long, value_parser = ["E", "S", "J", "W"])]
	kanji: Option<String>,

	/// Corpus directory
	#[arg(short = 'D', long)]
	corpus_dir: Option<PathBuf>,

	/// Corpus definition file
	#[arg(short = 'd', long)]
	corpus_def: Option<PathBuf>,

	/// Test definition file
	#[arg(short = 't', long)]
	test_def: Option<PathBuf>,

	/// Drop tokens seen fewer times than this
	#[arg(short = 'f', long)]
	required_frequency: Option<u64>,

	/// Voting profiles as smoothing degrees, 0 = no smoothing (e.g. 0,4,2)
	#[arg(short = 's', long)]
	smoothing: Option<String>,

	/// Save the model built from --corpus-def
	#[arg(short = 'O', long)]
	model_output: Option<PathBuf>,

	/// Display long output
	#[arg(short = 'l', long = "long")]
	long: bool,

	/// Print the info fields first, tab separated
	#[arg(short = 'T', long = "tail")]
	tail: bool,

	/// Display likelihood values of levels
	#[arg(short = 'L', long)]
	likelihood: bool,

	/// Display the contribution of every token
	#[arg(short = 'C', long)]
	contrib: bool,

	#[arg(short = 'x', long, value_enum)]
	exec_mode: Option<ExecMode>,

	/// Cross-validation partitions (1 = leave-one-out)
	#[arg(short = 'p', long, default_value_t = 2)]
	partition: usize,

	/// Worker threads (0 = one per CPU)
	#[arg(short = 'j', long)]
	threads: Option<usize>,

	/// TOML configuration file
	#[arg(short = 'c', long)]
	config: Option<PathBuf>,

	/// Text files to evaluate
	inputs: Vec<PathBuf>,
}

impl Cli {
	/// Configuration file (if any) overridden by command-line flags.
	fn config(&self) -> Result<ObiConfig> {
		let mut config = match &self.config {
			Some(path) => ObiConfig::from_toml_file(path)
				.with_context(|| format!("cannot load configuration {}", path.display()))?,
			None => ObiConfig::default(),
		};

		if let Some(width) = self.ngram {
			config.order = NGramOrder::from_width(usize::from(width))
				.context("n-gram width must be 1 or 2")?;
		}
		if let Some(kanji) = &self.kanji {
			config.encoding = Encoding::from_hint(kanji)?;
		}
		if let Some(required_frequency) = self.required_frequency {
			config.required_frequency = required_frequency;
		}
		if let Some(smoothing) = &self.smoothing {
			config.voting = parse_voting(smoothing)?;
		}
		if let Some(threads) = self.threads {
			config.threads = threads;
		}
		if let Some(path) = &self.operative_char {
			config.operative_chars = path.clone();
		}
		if let Some(dir) = &self.model_dir {
			config.model_dir = dir.clone();
		}
		if let Some(name) = &self.model_name {
			config.model_name = name.clone();
		}
		Ok(config)
	}

	fn corpus_dir(&self) -> PathBuf {
		self.corpus_dir.clone().unwrap_or_else(|| PathBuf::from("."))
	}

	fn corpus_def(&self) -> Result<&Path> {
		self.corpus_def.as_deref().context("--corpus-def is required in this mode")
	}

	fn report_format(&self) -> ReportFormat {
		ReportFormat {
			long: self.long,
			tail: self.tail,
			likelihood: self.likelihood,
			contrib: self.contrib,
		}
	}
}

fn load_operative(config: &ObiConfig) -> Result<OperativeChars> {
	OperativeChars::load(&mut FileSource::new(&config.operative_chars, Encoding::Utf8))
		.with_context(|| {
			format!("cannot load operative characters {}", config.operative_chars.display())
		})
}

/// Prints the summed frequency vector of the corpus: total, then one count
/// per grade.
fn corpus_size<W: Write>(cli: &Cli, config: &ObiConfig, out: &mut W) -> Result<()> {
	let operative = match config.order {
		NGramOrder::Unigram => load_operative(config)?,
		NGramOrder::Bigram => OperativeChars::Any,
	};
	let records = load_definition(cli.corpus_def()?)?;
	let corpus = CorpusLoader::from_config(cli.corpus_dir(), &operative, config)
		.load_corpus(&records)?;
	let totals: Vec<String> = corpus.totals().as_slice().iter().map(u64::to_string).collect();
	writeln!(out, "{}", totals.join(" "))?;
	Ok(())
}

/// Prints the operative n-grams of the inputs (or standard input), one per
/// line.
fn dump_tokens<W: Write>(cli: &Cli, config: &ObiConfig, out: &mut W) -> Result<()> {
	let operative = load_operative(config)?;
	let extractor = NGramExtractor::new(config.order, &operative);

	let mut documents = Vec::new();
	if cli.inputs.is_empty() {
		documents.push(ReaderSource::new(io::stdin().lock(), config.encoding).read_lines()?);
	} else {
		for input in &cli.inputs {
			documents.push(FileSource::new(input, config.encoding).read_lines()?);
		}
	}
	for lines in documents {
		for token in extractor.tokens(&lines) {
			writeln!(out, "{token}")?;
		}
	}
	Ok(())
}

fn cross_validate<W: Write>(cli: &Cli, config: &ObiConfig, out: &mut W) -> Result<()> {
	let operative = load_operative(config)?;
	let records = load_definition(cli.corpus_def()?)?;
	let tests = cli.test_def.as_ref().map(load_definition).transpose()?;
	let mode = CrossValidation::from_partitions(cli.partition)?;

	let evaluator = Evaluator::from_config(cli.corpus_dir(), &operative, config)?;
	let format = cli.report_format();
	for evaluation in evaluator.run(mode, &records, tests.as_deref())? {
		format.write(out, &evaluation.readability, &evaluation.record.fields())?;
	}
	Ok(())
}

/// Model from `-M`, `-m`, a corpus definition, or the configured default, in
/// that order of precedence.
fn prepare_model(cli: &Cli, config: &ObiConfig, operative: &OperativeChars) -> Result<Model> {
	let required_frequency = config.required_frequency;
	if let Some(path) = &cli.model_file {
		return Model::load(path, required_frequency)
			.with_context(|| format!("cannot load model {}", path.display()));
	}
	if let Some(definition) = cli.corpus_def.as_ref().filter(|_| cli.model_name.is_none()) {
		let records = load_definition(definition)?;
		let corpus = CorpusLoader::from_config(cli.corpus_dir(), operative, config)
			.load_corpus(&records)?;
		let model = ModelBuilder::from_config(config).build(&corpus)?;
		if let Some(path) = &cli.model_output {
			model.save(path)?;
		}
		return Ok(model);
	}
	Model::open_named(&config.model_name, &config.model_dir, required_frequency)
		.with_context(|| format!("cannot load model {}", config.model_name))
}

fn estimate<W: Write>(cli: &Cli, config: &ObiConfig, out: &mut W) -> Result<()> {
	let operative = load_operative(config)?;
	let extractor = NGramExtractor::new(config.order, &operative);
	let model = prepare_model(cli, config, &operative)?;
	info!("model ready: {} tokens, {} grades", model.len(), model.grades());

	let estimator = Estimator::from_config(config)?;
	let format = cli.report_format();
	let corpus_dir = cli.corpus_dir();

	if let Some(test_def) = &cli.test_def {
		let loader = CorpusLoader::from_config(&corpus_dir, &operative, config);
		for record in load_definition(test_def)? {
			let text = loader.load_text(&record)?;
			format.write(out, &estimator.readability(&model, &text), &record.fields())?;
		}
	} else if !cli.inputs.is_empty() {
		for input in &cli.inputs {
			let text = extractor.count_source(&mut FileSource::new(input, config.encoding))?;
			let info = [input.display().to_string()];
			format.write(out, &estimator.readability(&model, &text), &info)?;
		}
	} else if cli.model_output.is_some() {
		// Model building only.
	} else if cli.corpus_dir.is_some() {
		// Standard input lists `path [kanji] [info...]` relative to the corpus directory.
		for line in io::stdin().lock().lines() {
			let line = line?;
			let fields: Vec<String> = line.split_whitespace().map(str::to_owned).collect();
			let Some(path) = fields.first() else {
				continue;
			};
			let encoding = Encoding::resolve(fields.get(1).map(String::as_str), config.encoding)?;
			let mut source = FileSource::new(corpus_dir.join(path), encoding);
			let text = extractor.count_source(&mut source)?;
			format.write(out, &estimator.readability(&model, &text), &fields)?;
		}
	} else {
		let mut source = ReaderSource::new(io::stdin().lock(), config.encoding);
		let text = extractor.count_source(&mut source)?;
		format.write(out, &estimator.readability(&model, &text), &[])?;
	}
	Ok(())
}

fn main() -> Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

	let cli = Cli::parse();
	let config = cli.config()?;

	let stdout = io::stdout();
	let mut out = BufWriter::new(stdout.lock());
	match cli.exec_mode {
		Some(ExecMode::Size) => corpus_size(&cli, &config, &mut out)?,
		Some(ExecMode::Bigram) => dump_tokens(&cli, &config, &mut out)?,
		Some(ExecMode::CrossValidation) => cross_validate(&cli, &config, &mut out)?,
		None => estimate(&cli, &config, &mut out)?,
	}
	out.flush()?;
	Ok(())
}
