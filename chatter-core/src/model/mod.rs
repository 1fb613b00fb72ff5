//! Top-level module for the word-level n-gram system.
//!
//! The model is built and used in two sequential phases:
//! - Training: raw text → `tokenizer` → `trainer` → `FrequencyTable`
//! - Generation: `FrequencyTable` + `WeightedSampler` → `SentenceGenerator`
//!
//! The table is never mutated during generation.

/// Streaming segmentation of raw text into normalized sentences.
pub mod tokenizer;

/// Token counts observed after a single context.
pub mod distribution;

/// Mapping from (n-1)-token contexts to their distributions.
///
/// Also holds the context derivation rule shared by training and generation.
pub mod frequency_table;

/// Frequency-weighted random choice with replacement.
pub mod sampler;

/// Sentence generation by walking the frequency table.
pub mod generator;

/// Feeding tokenized corpora into a frequency table.
///
/// Supports sequential training and parallel training over private tables.
pub mod trainer;

/// A normalized unit of text: a lowercased word, a digit run or a single
/// punctuation character.
pub type Token = String;
