//! Word-level n-gram sentence generation library.
//!
//! This crate provides a statistical sentence generator including:
//! - A streaming tokenizer splitting raw text into normalized sentences
//! - A frequency table mapping (n-1)-token contexts to token counts
//! - Frequency-weighted sampling of the next token
//! - Sentence generation walking the table until a terminal token
//! - Training over one or more corpora (sequential or parallel)

/// Core n-gram model, training and generation logic.
pub mod model;

/// Typed failures shared by every module.
pub mod error;

/// I/O utilities (corpus opening, naming and listing).
pub mod io;

pub use error::{ChatterError, ChatterResult};
