use std::collections::BTreeMap;

use serde::Serialize;

use super::Token;

/// Counts of the tokens observed right after one context.
///
/// Conceptually, this is the set of outgoing edges of a node in a Markov
/// chain, each weighted by its number of observations.
///
/// Tokens are kept in lexical order so that a seeded random generator
/// always walks the same weights in the same order.
///
/// ## Invariants
/// - Each count is strictly positive
/// - A token is present only if it was observed at least once
#[derive(Serialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct Distribution {
	counts: BTreeMap<Token, usize>,
}

impl Distribution {
	/// Creates a new empty distribution.
	pub fn new() -> Self {
		Self::default()
	}

	/// Records one more occurrence of `token`.
	///
	/// - If the token already exists, its count is increased.
	/// - Otherwise, it is inserted with an initial count of 1.
	pub fn add(&mut self, token: &str) {
		match self.counts.get_mut(token) {
			Some(count) => *count += 1,
			None => {
				self.counts.insert(token.to_owned(), 1);
			}
		}
	}

	/// Returns how many times `token` was observed, 0 if never.
	pub fn count(&self, token: &str) -> usize {
		self.counts.get(token).copied().unwrap_or(0)
	}

	/// Sum of all counts.
	pub fn total(&self) -> usize {
		self.counts.values().sum()
	}

	/// Number of distinct tokens.
	pub fn len(&self) -> usize {
		self.counts.len()
	}

	pub fn is_empty(&self) -> bool {
		self.counts.is_empty()
	}

	/// Iterates over `(token, count)` pairs in lexical token order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
		self.counts.iter().map(|(token, count)| (token.as_str(), *count))
	}

	/// Merges another distribution into this one, summing counts.
	pub fn merge(&mut self, other: &Self) {
		for (token, count) in &other.counts {
			*self.counts.entry(token.clone()).or_insert(0) += *count;
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_add_and_count() {
		let mut distribution = Distribution::new();
		assert!(distribution.is_empty());

		distribution.add("cat");
		distribution.add("cat");
		distribution.add("dog");

		assert_eq!(distribution.count("cat"), 2);
		assert_eq!(distribution.count("dog"), 1);
		assert_eq!(distribution.count("bird"), 0);
		assert_eq!(distribution.len(), 2);
		assert_eq!(distribution.total(), 3);
	}

	#[test]
	fn test_iter_is_ordered() {
		let mut distribution = Distribution::new();
		for token in ["z", "a", "m", "a"] {
			distribution.add(token);
		}
		let pairs: Vec<_> = distribution.iter().collect();
		assert_eq!(pairs, vec![("a", 2), ("m", 1), ("z", 1)]);
	}

	#[test]
	fn test_merge_sums_counts() {
		let mut left = Distribution::new();
		left.add("a");
		left.add("b");

		let mut right = Distribution::new();
		right.add("b");
		right.add("c");
		right.add("c");

		left.merge(&right);
		assert_eq!(left.count("a"), 1);
		assert_eq!(left.count("b"), 2);
		assert_eq!(left.count("c"), 2);
		assert_eq!(left.total(), 5);
	}
}
