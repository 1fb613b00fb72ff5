use std::cell::RefCell;
use std::collections::HashMap;
use std::collections::hash_map::Entry;

use log::{debug, warn};
use rand::Rng;

use crate::error::{ChatterError, ChatterResult};

use super::Token;
use super::frequency_table::{FrequencyTable, context_window};
use super::sampler::WeightedSampler;
use super::tokenizer::is_terminal;

/// Generates sentences from a trained `FrequencyTable`.
///
/// # Responsibilities
/// - Derive the context of the next token from the tokens generated so far
/// - Draw the next token from the context's distribution
/// - Stop once a terminal token (`.`, `?`, `!`) has been drawn
///
/// The table is only borrowed for reading, so any number of generators may
/// share it (across threads as well, one generator per thread).
///
/// Samplers are built the first time a context is reached and reused for
/// every later draw from that context.
#[derive(Clone, Debug)]
pub struct SentenceGenerator<'a> {
	table: &'a FrequencyTable,

	/// Maximum number of tokens in one sentence, unbounded if `None`.
	max_tokens: Option<usize>,

	samplers: RefCell<HashMap<&'a [Token], WeightedSampler<&'a str>>>,
}

impl<'a> SentenceGenerator<'a> {
	/// Creates an unbounded generator over `table`.
	pub fn new(table: &'a FrequencyTable) -> Self {
		Self { table, max_tokens: None, samplers: RefCell::new(HashMap::new()) }
	}

	/// Bounds the length of generated sentences.
	///
	/// A table where no terminal token is reachable would otherwise loop
	/// forever.
	pub fn with_max_tokens(mut self, limit: usize) -> Self {
		self.max_tokens = Some(limit);
		self
	}

	/// The configured length bound, if any.
	pub fn max_tokens(&self) -> Option<usize> {
		self.max_tokens
	}

	/// Generates the tokens of one sentence.
	///
	/// The returned sequence always ends with a terminal token.
	///
	/// # Errors
	/// - `MissingContext` if a generated context was never trained
	/// - `EmptyDistribution` if the table holds an empty distribution
	/// - `SentenceTooLong` if the bound is reached before a terminal token
	pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> ChatterResult<Vec<Token>> {
		let mut tokens: Vec<Token> = Vec::new();

		loop {
			if let Some(limit) = self.max_tokens
				&& tokens.len() >= limit
			{
				warn!("Sentence reached {limit} tokens without a terminal token");
				return Err(ChatterError::SentenceTooLong { limit });
			}

			let token = self.draw(context_window(&tokens, self.table.order()), rng)?;

			let done = is_terminal(&token);
			tokens.push(token);
			if done {
				debug!("Generated a sentence of {} tokens", tokens.len());
				return Ok(tokens);
			}
		}
	}

	/// Draws the token following `context`.
	fn draw<R: Rng + ?Sized>(&self, context: &[Token], rng: &mut R) -> ChatterResult<Token> {
		let (key, distribution) = self.table.entry_for(context)?;

		let mut samplers = self.samplers.borrow_mut();
		let sampler = match samplers.entry(key) {
			Entry::Occupied(entry) => entry.into_mut(),
			Entry::Vacant(entry) => entry.insert(WeightedSampler::new(distribution)?),
		};
		Ok(sampler.draw_with_replacement(rng).to_string())
	}

	/// Generates one sentence rendered as a string.
	pub fn generate_sentence<R: Rng + ?Sized>(&self, rng: &mut R) -> ChatterResult<String> {
		Ok(render(&self.generate(rng)?))
	}

	/// Generates `count` independent sentences.
	///
	/// Stops at the first failure.
	pub fn generate_many<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> ChatterResult<Vec<String>> {
		(0..count).map(|_| self.generate_sentence(rng)).collect()
	}
}

/// Joins tokens with single spaces.
///
/// Punctuation is not attached to the previous word: `"the cat sat ."`.
pub fn render(tokens: &[Token]) -> String {
	tokens.join(" ")
}
