use std::io::{self, BufRead};

use crate::error::ChatterResult;

use super::Token;

/// Characters ending a sentence, both in raw text and as generated tokens.
pub const TERMINALS: [char; 3] = ['.', '?', '!'];

/// Returns `true` if the token ends a sentence.
pub fn is_terminal(token: &str) -> bool {
	token.contains(TERMINALS)
}

/// Normalizes one raw sentence into its tokens.
///
/// - Lowercases the whole text
/// - Keeps runs of `a-z` / `0-9` together as word tokens
/// - Every other non-whitespace character becomes a token on its own
/// - Whitespace (including `\r`) only separates tokens
pub fn normalize(raw: &str) -> Vec<Token> {
	let mut tokens = Vec::new();
	let mut word = String::new();

	for c in raw.to_lowercase().chars() {
		if c.is_ascii_lowercase() || c.is_ascii_digit() {
			word.push(c);
			continue;
		}
		if !word.is_empty() {
			tokens.push(std::mem::take(&mut word));
		}
		if !c.is_whitespace() {
			tokens.push(c.to_string());
		}
	}
	if !word.is_empty() {
		tokens.push(word);
	}

	tokens
}

/// Splits a character stream into normalized sentences.
///
/// The returned iterator is lazy and single-pass: it consumes `reader`.
pub fn segment_and_normalize<R: BufRead>(reader: R) -> Sentences<R> {
	Sentences { reader, done: false }
}

/// Lazy iterator over the sentences of a stream.
///
/// Each raw sentence runs up to and including the next terminal character,
/// or up to the end of the stream. A raw sentence holding only whitespace
/// yields an empty token list.
///
/// Read failures and invalid UTF-8 are yielded once as errors, after which
/// the iterator is exhausted.
#[derive(Debug)]
pub struct Sentences<R> {
	reader: R,
	done: bool,
}

impl<R: BufRead> Sentences<R> {
	/// Reads the next raw sentence, `None` at end of stream.
	///
	/// Terminal characters are ASCII, so scanning bytes never splits a
	/// multibyte character.
	fn read_raw(&mut self) -> io::Result<Option<String>> {
		let mut bytes = Vec::new();

		loop {
			let available = match self.reader.fill_buf() {
				Ok(available) => available,
				Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
				Err(e) => return Err(e),
			};
			if available.is_empty() {
				break;
			}

			match available.iter().position(|b| matches!(b, b'.' | b'?' | b'!')) {
				Some(i) => {
					bytes.extend_from_slice(&available[..=i]);
					self.reader.consume(i + 1);
					return decode(bytes).map(Some);
				}
				None => {
					let len = available.len();
					bytes.extend_from_slice(available);
					self.reader.consume(len);
				}
			}
		}

		if bytes.is_empty() {
			Ok(None)
		} else {
			decode(bytes).map(Some)
		}
	}
}

fn decode(bytes: Vec<u8>) -> io::Result<String> {
	String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

impl<R: BufRead> Iterator for Sentences<R> {
	type Item = ChatterResult<Vec<Token>>;

	fn next(&mut self) -> Option<Self::Item> {
		if self.done {
			return None;
		}

		match self.read_raw() {
			Ok(Some(raw)) => Some(Ok(normalize(&raw))),
			Ok(None) => {
				self.done = true;
				None
			}
			Err(e) => {
				self.done = true;
				Some(Err(e.into()))
			}
		}
	}
}
