use std::collections::HashMap;

use crate::error::{ChatterError, ChatterResult};

use super::Token;
use super::distribution::Distribution;

/// Returns the context preceding the next prediction point.
///
/// For order `n`, this is the last `min(history.len(), n - 1)` tokens of
/// `history`. For `n == 1` it is always empty, so every token shares one
/// distribution.
///
/// Training and generation both derive their contexts through this function.
pub fn context_window(history: &[Token], order: usize) -> &[Token] {
	let width = order.saturating_sub(1).min(history.len());
	&history[history.len() - width..]
}

/// Word-level n-gram frequency table.
///
/// Maps each context (up to `n-1` tokens) to the `Distribution` of tokens
/// observed right after it. Contexts are keyed structurally by their token
/// sequence; the empty sequence is the context of a sentence start (and the
/// only context when `n == 1`).
///
/// # Invariants
/// - `order` is always >= 1
/// - Every stored distribution is non-empty with counts >= 1
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrequencyTable {
	/// The order of the model (context length + 1)
	order: usize,

	/// Mapping from a context to its observed distribution
	contexts: HashMap<Vec<Token>, Distribution>,
}

impl FrequencyTable {
	/// Creates a new empty table of order `n`.
	///
	/// # Errors
	/// Returns `InvalidOrder` if `n < 1`.
	pub fn new(order: usize) -> ChatterResult<Self> {
		if order < 1 {
			return Err(ChatterError::InvalidOrder { n: order });
		}
		Ok(Self { order, contexts: HashMap::new() })
	}

	/// The order `n` of the table.
	pub fn order(&self) -> usize {
		self.order
	}

	/// Number of distinct contexts.
	pub fn len(&self) -> usize {
		self.contexts.len()
	}

	pub fn is_empty(&self) -> bool {
		self.contexts.is_empty()
	}

	/// Records one occurrence of `token` after `context`.
	///
	/// Creates the context's distribution if absent.
	pub fn add(&mut self, context: &[Token], token: &str) {
		match self.contexts.get_mut(context) {
			Some(distribution) => distribution.add(token),
			None => {
				let mut distribution = Distribution::new();
				distribution.add(token);
				self.contexts.insert(context.to_vec(), distribution);
			}
		}
	}

	/// Returns the distribution observed after `context`.
	///
	/// # Errors
	/// Returns `MissingContext` if the context was never added.
	pub fn distribution_for(&self, context: &[Token]) -> ChatterResult<&Distribution> {
		self.contexts
			.get(context)
			.ok_or_else(|| ChatterError::MissingContext { context: context.join(" ") })
	}

	/// Returns the stored context along with its distribution.
	///
	/// The returned key borrows the table, so it outlives `context`.
	///
	/// # Errors
	/// Returns `MissingContext` if the context was never added.
	pub fn entry_for(&self, context: &[Token]) -> ChatterResult<(&[Token], &Distribution)> {
		self.contexts
			.get_key_value(context)
			.map(|(key, distribution)| (key.as_slice(), distribution))
			.ok_or_else(|| ChatterError::MissingContext { context: context.join(" ") })
	}

	/// Iterates over every `(context, distribution)` pair, in no particular order.
	pub fn contexts(&self) -> impl Iterator<Item = (&[Token], &Distribution)> {
		self.contexts.iter().map(|(context, distribution)| (context.as_slice(), distribution))
	}

	/// Total number of recorded observations across all contexts.
	pub fn total_observations(&self) -> usize {
		self.contexts.values().map(Distribution::total).sum()
	}

	/// Merges another table into this one.
	///
	/// Counts for matching contexts and tokens are summed.
	///
	/// # Errors
	/// Returns `OrderMismatch` if the orders differ.
	pub fn merge(&mut self, other: &Self) -> ChatterResult<()> {
		if self.order != other.order {
			return Err(ChatterError::OrderMismatch { left: self.order, right: other.order });
		}

		for (context, distribution) in &other.contexts {
			if let Some(existing) = self.contexts.get_mut(context) {
				existing.merge(distribution);
			} else {
				self.contexts.insert(context.clone(), distribution.clone());
			}
		}

		Ok(())
	}
}
