//! End-to-end training and generation.

use std::collections::HashSet;
use std::fs;
use std::thread;

use chatter_core::io::{corpus_name, list_corpora, open_corpus};
use chatter_core::model::generator::SentenceGenerator;
use chatter_core::model::tokenizer::{is_terminal, normalize};
use chatter_core::model::trainer::{Corpus, Trainer};
use chatter_core::ChatterError;
use rand::SeedableRng;
use rand::rngs::StdRng;

const CORPUS: &str = "The cat sat. The cat ran.";

fn vocabulary() -> HashSet<&'static str> {
	["the", "cat", "sat", "ran", "."].into_iter().collect()
}

#[test]
fn test_bigram_sentences_use_known_tokens() {
	let model = Trainer::new(2).unwrap().train_corpora(vec![Corpus::new("cats", CORPUS.as_bytes())]).unwrap();
	assert_eq!(model.summary.total_tokens, 8);

	let generator = SentenceGenerator::new(&model.table).with_max_tokens(100);
	let mut rng = StdRng::seed_from_u64(2024);
	let vocabulary = vocabulary();

	for _ in 0..200 {
		let sentence = generator.generate(&mut rng).unwrap();
		assert!(sentence.iter().all(|token| vocabulary.contains(token.as_str())));
		assert_eq!(sentence.last().map(String::as_str), Some("."));
		// Only the last token ends the sentence.
		assert!(sentence[..sentence.len() - 1].iter().all(|token| !is_terminal(token)));
	}
}

#[test]
fn test_bigram_produces_both_endings() {
	let model = Trainer::new(2).unwrap().train_corpora(vec![Corpus::new("cats", CORPUS.as_bytes())]).unwrap();
	let generator = SentenceGenerator::new(&model.table);
	let mut rng = StdRng::seed_from_u64(11);

	let sentences: HashSet<String> = generator.generate_many(100, &mut rng).unwrap().into_iter().collect();
	let expected: HashSet<String> = ["the cat sat .", "the cat ran ."].into_iter().map(str::to_owned).collect();
	assert_eq!(sentences, expected);
}

#[test]
fn test_unigram_sentences_end_with_terminal() {
	let model = Trainer::new(1).unwrap().train_corpora(vec![Corpus::new("cats", CORPUS.as_bytes())]).unwrap();
	assert_eq!(model.table.len(), 1);

	let generator = SentenceGenerator::new(&model.table).with_max_tokens(10_000);
	let mut rng = StdRng::seed_from_u64(8);
	let vocabulary = vocabulary();
	for _ in 0..100 {
		let sentence = generator.generate(&mut rng).unwrap();
		assert!(sentence.iter().all(|token| vocabulary.contains(token.as_str())));
		assert_eq!(sentence.last().map(String::as_str), Some("."));
	}
}

#[test]
fn test_generated_sentences_retokenize_identically() {
	let model = Trainer::new(3)
		.unwrap()
		.train_corpora(vec![Corpus::new("mixed", "Well, it's 5 o'clock! Is it? Well, it's late.".as_bytes())])
		.unwrap();
	let generator = SentenceGenerator::new(&model.table).with_max_tokens(100);
	let mut rng = StdRng::seed_from_u64(3);

	for _ in 0..50 {
		let tokens = generator.generate(&mut rng).unwrap();
		let rendered = tokens.join(" ");
		assert_eq!(normalize(&rendered), tokens);
	}
}

#[test]
fn test_undertrained_context_fails() {
	// With n = 3 the lone sentence "Hi." is skipped, so no start context exists.
	let model = Trainer::new(3).unwrap().train_corpora(vec![Corpus::new("short", "Hi.".as_bytes())]).unwrap();
	assert_eq!(model.summary.total_tokens, 0);
	assert!(model.table.is_empty());

	let mut rng = StdRng::seed_from_u64(0);
	assert!(matches!(
		SentenceGenerator::new(&model.table).generate(&mut rng),
		Err(ChatterError::MissingContext { .. })
	));
}

#[test]
fn test_concurrent_generation_shares_table() {
	let model = Trainer::new(2).unwrap().train_corpora(vec![Corpus::new("cats", CORPUS.as_bytes())]).unwrap();
	let table = &model.table;

	let results: Vec<Vec<String>> = thread::scope(|scope| {
		let handles: Vec<_> = (0..4)
			.map(|seed| {
				scope.spawn(move || {
					let mut rng = StdRng::seed_from_u64(seed);
					SentenceGenerator::new(table).generate_many(25, &mut rng).unwrap()
				})
			})
			.collect();
		handles.into_iter().map(|handle| handle.join().unwrap()).collect()
	});

	assert_eq!(results.len(), 4);
	assert!(results.iter().flatten().all(|sentence| sentence.ends_with(" .")));
}

#[test]
fn test_train_from_files() {
	let dir = tempfile::tempdir().unwrap();
	fs::write(dir.path().join("one.txt"), "The cat sat.\r\n").unwrap();
	fs::write(dir.path().join("two.txt"), "The cat ran.\r\n").unwrap();

	let corpora = list_corpora(dir.path(), "txt")
		.unwrap()
		.into_iter()
		.map(|file| {
			let path = dir.path().join(file);
			Corpus::new(corpus_name(&path).unwrap(), open_corpus(&path).unwrap())
		})
		.collect::<Vec<_>>();

	let model = Trainer::new(2).unwrap().train_corpora_parallel(corpora).unwrap();
	assert_eq!(model.summary.corpus_names(), vec!["one", "two"]);
	assert_eq!(model.summary.total_tokens, 8);

	let mut rng = StdRng::seed_from_u64(1);
	let sentence = SentenceGenerator::new(&model.table).generate_sentence(&mut rng).unwrap();
	assert!(sentence == "the cat sat ." || sentence == "the cat ran .");
}
