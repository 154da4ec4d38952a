//! Where section text comes from.
//!
//! Submitted text is split into lines directly. Uploaded documents go through
//! a [`TextExtractor`] first; binary formats such as PDF are handled by
//! whichever extractor the host wires in.

use crate::BoxError;

/// Turns an uploaded document into plain text, one logical line per line.
pub trait TextExtractor: Send + Sync {
  fn extract(&self, document: &[u8]) -> Result<String, BoxError>;
}

/// Accepts UTF-8 text documents only.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
  fn extract(&self, document: &[u8]) -> Result<String, BoxError> {
    Ok(std::str::from_utf8(document)?.to_owned())
  }
}

/// Split submitted text into lines after trimming surrounding whitespace.
///
/// Accepts `\n`, `\r\n` and bare `\r` line endings. Whitespace-only input has
/// no lines at all.
pub fn split_lines(text: &str) -> Vec<&str> {
  let text = text.trim();
  if text.is_empty() {
    return Vec::new();
  }
  text.lines().flat_map(|line| line.split('\r')).collect()
}
