use rand::Rng;

use crate::error::{ChatterError, ChatterResult};

use super::distribution::Distribution;

/// Draws items with probability proportional to their weight.
///
/// Built once in O(k) as a table of cumulative weights; each draw is a
/// uniform pick in `0..total` located by binary search in O(log k).
/// Draws are independent: the sampler is never modified by drawing.
///
/// Items with a zero weight are kept out of the table and can never be drawn.
#[derive(Clone, Debug)]
pub struct WeightedSampler<T> {
	items: Vec<T>,
	/// `cumulative[i]` is the sum of the weights of `items[..=i]`.
	cumulative: Vec<usize>,
}

impl<T> WeightedSampler<T> {
	/// Creates a sampler from `(item, weight)` pairs.
	///
	/// # Errors
	/// Returns `EmptyDistribution` if no item has a positive weight.
	pub fn from_weights<I>(weights: I) -> ChatterResult<Self>
	where
		I: IntoIterator<Item = (T, usize)>,
	{
		let mut items = Vec::new();
		let mut cumulative = Vec::new();
		let mut total = 0usize;

		for (item, weight) in weights {
			if weight == 0 {
				continue;
			}
			total += weight;
			items.push(item);
			cumulative.push(total);
		}

		if items.is_empty() {
			return Err(ChatterError::EmptyDistribution);
		}
		Ok(Self { items, cumulative })
	}

	/// Sum of all weights.
	pub fn total(&self) -> usize {
		// Never empty after construction.
		self.cumulative.last().copied().unwrap_or(0)
	}

	/// Number of drawable items.
	pub fn len(&self) -> usize {
		self.items.len()
	}

	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}

	/// Draws one item, with replacement.
	pub fn draw_with_replacement<R: Rng + ?Sized>(&self, rng: &mut R) -> &T {
		let r = rng.random_range(0..self.total());
		let index = self.cumulative.partition_point(|&bound| bound <= r);
		&self.items[index]
	}
}

impl<'a> WeightedSampler<&'a str> {
	/// Creates a sampler over the tokens of a distribution.
	///
	/// # Errors
	/// Returns `EmptyDistribution` if the distribution has no token.
	pub fn new(distribution: &'a Distribution) -> ChatterResult<Self> {
		Self::from_weights(distribution.iter())
	}
}
