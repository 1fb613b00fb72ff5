use std::io::BufRead;
use std::sync::mpsc;
use std::thread;
use std::time::Instant;

use log::{debug, info, trace};
use serde::Serialize;

use crate::error::{ChatterError, ChatterResult};

use super::Token;
use super::frequency_table::{FrequencyTable, context_window};
use super::tokenizer::segment_and_normalize;

/// A named character stream to train on.
#[derive(Debug)]
pub struct Corpus<R> {
	pub name: String,
	pub reader: R,
}

impl<R: BufRead> Corpus<R> {
	pub fn new(name: impl Into<String>, reader: R) -> Self {
		Self { name: name.into(), reader }
	}
}

/// Outcome of training on one corpus.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct CorpusReport {
	pub name: String,
	/// Tokens counted, excluding skipped sentences.
	pub tokens: usize,
	pub elapsed_ms: u128,
}

/// Outcome of training on a list of corpora, in input order.
#[derive(Serialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct TrainingSummary {
	pub corpora: Vec<CorpusReport>,
	pub total_tokens: usize,
}

impl TrainingSummary {
	fn from_reports(corpora: Vec<CorpusReport>) -> Self {
		let total_tokens = corpora.iter().map(|report| report.tokens).sum();
		Self { corpora, total_tokens }
	}

	/// Names of the trained corpora, in input order.
	pub fn corpus_names(&self) -> Vec<&str> {
		self.corpora.iter().map(|report| report.name.as_str()).collect()
	}
}

/// A trained table and how it was built.
#[derive(Clone, Debug)]
pub struct TrainedModel {
	pub table: FrequencyTable,
	pub summary: TrainingSummary,
}

/// Adds one tokenized sentence to the table.
///
/// For `n > 1`, sentences shorter than `n` tokens are skipped entirely.
/// Each token is recorded after the context of the tokens preceding it.
///
/// Returns the number of tokens counted (0 when skipped).
pub fn train_sentence(table: &mut FrequencyTable, sentence: &[Token]) -> usize {
	let order = table.order();
	if sentence.is_empty() || (order > 1 && sentence.len() < order) {
		trace!("Skipping sentence of {} tokens (n = {order})", sentence.len());
		return 0;
	}

	for (i, token) in sentence.iter().enumerate() {
		table.add(context_window(&sentence[..i], order), token);
	}
	sentence.len()
}

/// Adds every sentence of a tokenizer output to the table.
///
/// # Errors
/// Stops at, and returns, the first error of the sentence stream.
pub fn train<I>(table: &mut FrequencyTable, sentences: I) -> ChatterResult<usize>
where
	I: IntoIterator<Item = ChatterResult<Vec<Token>>>,
{
	let mut total = 0;
	for sentence in sentences {
		total += train_sentence(table, &sentence?);
	}
	Ok(total)
}

/// Tokenizes a character stream and adds it to the table.
pub fn train_reader<R: BufRead>(table: &mut FrequencyTable, reader: R) -> ChatterResult<usize> {
	train(table, segment_and_normalize(reader))
}

/// Trains tables of a fixed order over lists of corpora.
#[derive(Clone, Copy, Debug)]
pub struct Trainer {
	order: usize,
}

impl Trainer {
	/// # Errors
	/// Returns `InvalidOrder` if `n < 1`.
	pub fn new(order: usize) -> ChatterResult<Self> {
		if order < 1 {
			return Err(ChatterError::InvalidOrder { n: order });
		}
		Ok(Self { order })
	}

	pub fn order(&self) -> usize {
		self.order
	}

	/// Trains one corpus into `table`.
	///
	/// Read failures are reported with the corpus name.
	pub fn train_corpus<R: BufRead>(&self, table: &mut FrequencyTable, corpus: Corpus<R>) -> ChatterResult<CorpusReport> {
		let start = Instant::now();
		let Corpus { name, reader } = corpus;

		let tokens = match train_reader(table, reader) {
			Ok(tokens) => tokens,
			Err(ChatterError::Io(source)) => return Err(ChatterError::CorpusRead { name, source }),
			Err(e) => return Err(e),
		};

		let elapsed_ms = start.elapsed().as_millis();
		info!("Parsed {name}: {tokens} tokens in {elapsed_ms}ms");
		Ok(CorpusReport { name, tokens, elapsed_ms })
	}

	/// Trains every corpus, in order, into a single table.
	pub fn train_corpora<R, I>(&self, corpora: I) -> ChatterResult<TrainedModel>
	where
		R: BufRead,
		I: IntoIterator<Item = Corpus<R>>,
	{
		let mut table = FrequencyTable::new(self.order)?;
		let mut reports = Vec::new();
		for corpus in corpora {
			reports.push(self.train_corpus(&mut table, corpus)?);
		}

		let summary = TrainingSummary::from_reports(reports);
		info!("Total tokens: {}", summary.total_tokens);
		Ok(TrainedModel { table, summary })
	}

	/// Trains corpora on several threads, then merges the results.
	///
	/// # Behavior
	/// - Spawns at most one worker per CPU and per corpus.
	/// - Each worker owns a private table and trains its share of corpora.
	/// - Private tables are merged by summing counts, so the final table is
	///   identical to the one `train_corpora` builds.
	/// - Reports are returned in input order.
	pub fn train_corpora_parallel<R>(&self, corpora: Vec<Corpus<R>>) -> ChatterResult<TrainedModel>
	where
		R: BufRead + Send,
	{
		let workers = num_cpus::get().min(corpora.len());
		if workers <= 1 {
			return self.train_corpora(corpora);
		}

		let mut shares: Vec<Vec<(usize, Corpus<R>)>> = (0..workers).map(|_| Vec::new()).collect();
		for (index, corpus) in corpora.into_iter().enumerate() {
			shares[index % workers].push((index, corpus));
		}
		debug!("Training on {workers} workers");

		let (tx, rx) = mpsc::channel();
		thread::scope(|scope| {
			for share in shares {
				let tx = tx.clone();
				scope.spawn(move || {
					tx.send(self.train_share(share)).expect("Failed to send from thread");
				});
			}
		});
		drop(tx);

		let mut table = FrequencyTable::new(self.order)?;
		let mut indexed_reports = Vec::new();
		for partial in rx.iter() {
			let (partial_table, reports) = partial?;
			table.merge(&partial_table)?;
			indexed_reports.extend(reports);
		}
		indexed_reports.sort_by_key(|(index, _)| *index);

		let summary = TrainingSummary::from_reports(indexed_reports.into_iter().map(|(_, report)| report).collect());
		info!("Total tokens: {}", summary.total_tokens);
		Ok(TrainedModel { table, summary })
	}

	/// Trains one worker's share of corpora into a private table.
	fn train_share<R: BufRead>(&self, share: Vec<(usize, Corpus<R>)>) -> ChatterResult<(FrequencyTable, Vec<(usize, CorpusReport)>)> {
		let mut table = FrequencyTable::new(self.order)?;
		let mut reports = Vec::with_capacity(share.len());
		for (index, corpus) in share {
			reports.push((index, self.train_corpus(&mut table, corpus)?));
		}
		Ok((table, reports))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn tokens(words: &[&str]) -> Vec<Token> {
		words.iter().map(|w| w.to_string()).collect()
	}

	fn trained(text: &str, order: usize) -> (FrequencyTable, usize) {
		let mut table = FrequencyTable::new(order).unwrap();
		let count = train_reader(&mut table, text.as_bytes()).unwrap();
		(table, count)
	}

	#[test]
	fn test_sliding_window() {
		let (table, count) = trained("a b c d.", 3);
		assert_eq!(count, 5);
		assert_eq!(table.len(), 5);

		let expect = [
			(tokens(&[]), "a"),
			(tokens(&["a"]), "b"),
			(tokens(&["a", "b"]), "c"),
			(tokens(&["b", "c"]), "d"),
			(tokens(&["c", "d"]), "."),
		];
		for (context, token) in expect {
			let distribution = table.distribution_for(&context).unwrap();
			assert_eq!(distribution.len(), 1);
			assert_eq!(distribution.count(token), 1);
		}
	}

	#[test]
	fn test_short_sentences_are_skipped() {
		let (table, count) = trained("Hi.", 3);
		assert_eq!(count, 0);
		assert!(table.is_empty());

		// Exactly n tokens is long enough.
		let (table, count) = trained("Hi you.", 3);
		assert_eq!(count, 3);
		assert_eq!(table.len(), 3);
	}

	#[test]
	fn test_unigram_single_context() {
		let (table, count) = trained("The cat. A dog! Cat?", 1);
		assert_eq!(count, 8);
		assert_eq!(table.len(), 1);

		let distribution = table.distribution_for(&[]).unwrap();
		assert_eq!(distribution.count("cat"), 2);
		assert_eq!(distribution.count("."), 1);
		assert_eq!(distribution.total(), 8);
	}

	#[test]
	fn test_unigram_keeps_one_token_sentences() {
		let (table, count) = trained("Hi", 1);
		assert_eq!(count, 1);
		assert_eq!(table.distribution_for(&[]).unwrap().count("hi"), 1);
	}

	#[test]
	fn test_empty_sentences_count_nothing() {
		let (table, count) = trained("Yes.   \n", 2);
		assert_eq!(count, 2);
		assert_eq!(table.total_observations(), 2);
	}

	#[test]
	fn test_counts_accumulate() {
		let (table, count) = trained("The cat sat. The cat ran.", 2);
		assert_eq!(count, 8);
		assert_eq!(table.distribution_for(&[]).unwrap().count("the"), 2);
		let cat = table.distribution_for(&tokens(&["cat"])).unwrap();
		assert_eq!(cat.count("sat"), 1);
		assert_eq!(cat.count("ran"), 1);
		assert_eq!(table.distribution_for(&tokens(&["the"])).unwrap().count("cat"), 2);
	}

	#[test]
	fn test_every_count_was_observed() {
		let (table, count) = trained("One fish. Two fish. Red fish? Blue fish!", 2);
		assert_eq!(table.total_observations(), count);
		for (_, distribution) in table.contexts() {
			assert!(!distribution.is_empty());
			assert!(distribution.iter().all(|(_, count)| count >= 1));
		}
	}

	#[test]
	fn test_trainer_rejects_zero_order() {
		assert!(matches!(Trainer::new(0), Err(ChatterError::InvalidOrder { n: 0 })));
	}

	#[test]
	fn test_train_corpora_reports_in_order() {
		let trainer = Trainer::new(2).unwrap();
		let corpora = vec![
			Corpus::new("first", "The cat sat.".as_bytes()),
			Corpus::new("second", "Hi. The dog ran away.".as_bytes()),
		];
		let model = trainer.train_corpora(corpora).unwrap();

		assert_eq!(model.summary.corpus_names(), vec!["first", "second"]);
		assert_eq!(model.summary.corpora[0].tokens, 4);
		assert_eq!(model.summary.corpora[1].tokens, 7);
		assert_eq!(model.summary.total_tokens, 11);
		assert_eq!(model.table.distribution_for(&[]).unwrap().count("the"), 2);
	}

	#[test]
	fn test_parallel_matches_sequential() {
		let texts = [
			"The cat sat on the mat. The dog sat too!",
			"A bird flew. Did the cat see it?",
			"Nobody knows. The end.",
			"",
			"Cats and dogs and birds.",
		];
		let corpora = || {
			texts
				.iter()
				.enumerate()
				.map(|(i, text)| Corpus::new(format!("corpus{i}"), text.as_bytes()))
				.collect::<Vec<_>>()
		};

		let trainer = Trainer::new(2).unwrap();
		let sequential = trainer.train_corpora(corpora()).unwrap();
		let parallel = trainer.train_corpora_parallel(corpora()).unwrap();

		assert_eq!(parallel.table, sequential.table);
		assert_eq!(parallel.summary.corpus_names(), sequential.summary.corpus_names());
		assert_eq!(parallel.summary.total_tokens, sequential.summary.total_tokens);
	}

	#[test]
	fn test_read_failure_names_corpus() {
		let trainer = Trainer::new(2).unwrap();
		let corpora = vec![Corpus::new("broken", &[b'o', b'k', 0xff, b'.'][..])];
		match trainer.train_corpora(corpora) {
			Err(ChatterError::CorpusRead { name, .. }) => assert_eq!(name, "broken"),
			other => panic!("unexpected result: {other:?}"),
		}
	}
}
