use std::fs;
use std::path::Path;

use obi_core::config::{NGramOrder, ObiConfig};
use obi_core::corpus::{CorpusLoader, load_definition};
use obi_core::estimate::{Estimator, Method};
use obi_core::io::{Encoding, FileSource, MemorySource};
use obi_core::model::{Model, ModelBuilder, Scale};
use obi_core::text::{NGramExtractor, OperativeChars};
use tempfile::TempDir;

const DOCUMENTS: [(&str, usize, &str); 6] = [
	("g1a.txt", 1, "あいうえお\nかきくけこ\n"),
	("g1b.txt", 1, "あいうえおかきくけこ\n"),
	("g2a.txt", 2, "あいう漢字\n<p>\n漢字です\n"),
	("g2b.txt", 2, "かきく漢字です\n"),
	("g3a.txt", 3, "難解な漢字語彙です\n"),
	("g3b.txt", 3, "語彙難解\n漢字語彙\n"),
];

fn write_corpus(dir: &Path) {
	let mut definition = String::new();
	for (name, grade, text) in DOCUMENTS {
		fs::write(dir.join(name), text).unwrap();
		definition.push_str(&format!("{name}\t\t{grade}\textra\n"));
	}
	fs::write(dir.join("corpus.def"), definition).unwrap();

	let chars: String = "あいうえおかきくけこです漢字難解な語彙"
		.chars()
		.map(|c| format!("{c}\tkana-or-kanji\n"))
		.collect();
	fs::write(dir.join("jchar.utf8"), chars).unwrap();
}

fn operative(dir: &Path) -> OperativeChars {
	OperativeChars::load(&mut FileSource::new(dir.join("jchar.utf8"), Encoding::Utf8)).unwrap()
}

#[test]
fn build_save_reload_and_score() {
	let dir = TempDir::new().unwrap();
	write_corpus(dir.path());
	let operative = operative(dir.path());
	let config = ObiConfig { threads: 2, ..ObiConfig::default() };

	let records = load_definition(dir.path().join("corpus.def")).unwrap();
	assert_eq!(records.len(), 6);
	assert_eq!(records[0].extras, vec!["extra".to_owned()]);

	let loader = CorpusLoader::from_config(dir.path(), &operative, &config);
	let corpus = loader.load_corpus(&records).unwrap();
	assert_eq!(corpus.grades(), 3);
	for (token, vector) in corpus.iter() {
		assert_eq!(vector.total(), vector.per_grade().iter().sum::<u64>(), "{token}");
	}

	let model = ModelBuilder::from_config(&config).build(&corpus).unwrap();
	for (token, row) in model.iter() {
		assert!(row.weights.iter().sum::<f64>().abs() < 1e-9, "{token}");
	}

	let path = dir.path().join("test.model");
	model.save(&path).unwrap();
	let reloaded = Model::load(&path, 1).unwrap();
	assert_eq!(reloaded.len(), model.len());

	let extractor = NGramExtractor::new(NGramOrder::Bigram, &operative);
	let text = extractor.count_source(&mut MemorySource::from("難解な漢字です\nあいう")).unwrap();

	let estimator = Estimator::from_config(&config).unwrap();
	let built = estimator.readability(&model, &text);
	let restored = estimator.readability(&reloaded, &text);

	assert_eq!(built.grade, restored.grade);
	assert_eq!(built.operative_count(), restored.operative_count());
	let pairs = built.contribution.contributions.iter().zip(&restored.contribution.contributions);
	for (a, b) in pairs {
		assert!((a - b).abs() < 1e-4, "{a} vs {b}");
	}
	for method in Method::ALL {
		assert_eq!(built.pick(method), restored.pick(method), "{method}");
	}
}

#[test]
fn text_outside_the_model_has_grade_zero() {
	let dir = TempDir::new().unwrap();
	write_corpus(dir.path());
	let operative = operative(dir.path());
	let config = ObiConfig::default();

	let records = load_definition(dir.path().join("corpus.def")).unwrap();
	let corpus = CorpusLoader::from_config(dir.path(), &operative, &config)
		.load_corpus(&records)
		.unwrap();
	let model = ModelBuilder::from_config(&config).build(&corpus).unwrap().with_scale(Scale::T7);

	let extractor = NGramExtractor::new(NGramOrder::Bigram, &operative);
	// Latin letters are not operative.
	let text = extractor.count(["plain ascii text".to_owned()]);
	let readability = Estimator::default().readability(&model, &text);

	assert_eq!(readability.grade, 0.0);
	assert_eq!(readability.operative_count(), 0);
	assert!(Method::ALL.iter().all(|m| readability.pick(*m) == 0));
}

#[test]
fn binary_cache_matches_the_table() {
	let dir = TempDir::new().unwrap();
	write_corpus(dir.path());
	let operative = operative(dir.path());
	let config = ObiConfig::default();

	let records = load_definition(dir.path().join("corpus.def")).unwrap();
	let corpus = CorpusLoader::from_config(dir.path(), &operative, &config)
		.load_corpus(&records)
		.unwrap();
	let model = ModelBuilder::from_config(&config).build(&corpus).unwrap();
	let path = Model::named_path("T13", dir.path());
	model.save(&path).unwrap();

	let first = Model::open_cached(&path, 2).unwrap();
	assert!(dir.path().join("Obi2-T13.bin").exists());
	let second = Model::open_cached(&path, 2).unwrap();
	assert_eq!(first, second);
	assert_eq!(first, Model::load(&path, 2).unwrap());

	let t7 = Model::open_named("T7", dir.path(), 1).unwrap();
	assert_eq!(t7.scale(), Scale::T7);
}

#[test]
fn rewritten_table_replaces_its_cache() {
	let dir = TempDir::new().unwrap();
	let path = Model::named_path("T13", dir.path());

	fs::write(&path, "あい\t3\t0.10000\t-0.10000\n").unwrap();
	let first = Model::open_cached(&path, 1).unwrap();
	assert!(first.get("あい").is_some());

	fs::write(&path, "かき\t3\t0.20000\t-0.20000\nくけ\t5\t-0.30000\t0.30000\n").unwrap();
	let second = Model::open_cached(&path, 1).unwrap();
	assert!(second.get("あい").is_none());
	assert_eq!(second, Model::load(&path, 1).unwrap());

	// The refreshed cache is served as is.
	assert_eq!(Model::open_cached(&path, 4).unwrap().len(), 1);
}
