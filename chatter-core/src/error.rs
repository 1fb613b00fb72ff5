//! # Error Types

/// Errors from training and generation.
#[derive(Debug, thiserror::Error)]
pub enum ChatterError {
	/// Generation reached a context that was never observed during training.
	#[error("missing context during sentence generation: \"{context}\"")]
	MissingContext {
		/// The context, space-joined.
		context: String,
	},

	/// A sampler was built from a distribution without any entry.
	#[error("cannot sample from an empty distribution")]
	EmptyDistribution,

	/// Generation exceeded the configured token limit without a terminal token.
	#[error("sentence exceeded {limit} tokens without reaching a terminal token")]
	SentenceTooLong {
		/// The configured limit.
		limit: usize,
	},

	/// The n-gram order must be at least 1.
	#[error("invalid n-gram order {n}, must be >= 1")]
	InvalidOrder {
		/// The rejected order.
		n: usize,
	},

	/// Two tables of different order cannot be merged.
	#[error("n-gram order mismatch: {left} != {right}")]
	OrderMismatch {
		/// Order of the receiving table.
		left: usize,
		/// Order of the merged table.
		right: usize,
	},

	/// A corpus could not be read to the end.
	#[error("failed to read corpus {name}: {source}")]
	CorpusRead {
		/// Name of the corpus.
		name: String,
		/// The underlying failure.
		#[source]
		source: std::io::Error,
	},

	/// I/O error outside of a named corpus.
	#[error(transparent)]
	Io(#[from] std::io::Error),
}

/// Result type for chatter operations.
pub type ChatterResult<T> = Result<T, ChatterError>;
