// src/locate/normalize.rs

//! Lossy text normalization with a map back to the original positions.
//!
//! The transform:
//! - typographic single quotes / primes -> `'`
//! - typographic double quotes -> `"`
//! - figure/en/em dashes and horizontal bar -> `-`
//! - every run of whitespace -> a single space
//! - leading and trailing whitespace removed
//!
//! It is only used for matching, never for display.

use std::ops::Range;

/// Map a single character through the quote/dash unification.
pub fn unify_char(c: char) -> char {
    match c {
        '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' | '\u{2032}' => '\'',
        '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' | '\u{2033}' => '"',
        '\u{2012}' | '\u{2013}' | '\u{2014}' | '\u{2015}' => '-',
        other => other,
    }
}

/// Normalize `s` without keeping the position map.
pub fn normalize(s: &str) -> String {
    NormalizedText::new(s).into_string()
}

/// Where one normalized character came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Origin {
    /// Byte offset of the character in the normalized string.
    normalized: usize,
    /// Byte range in the source that produced it. A collapsed whitespace
    /// run covers the whole run.
    source: (usize, usize),
}

/// A normalized string plus, for every character in it, the source range
/// that produced it.
///
/// Built in a single pass. The result is the same as normalizing ever
/// longer prefixes of the source and recording which source index made each
/// new normalized character appear.
#[derive(Debug, Clone)]
pub struct NormalizedText {
    text: String,
    origins: Vec<Origin>,
}

impl NormalizedText {
    pub fn new(source: &str) -> Self {
        let mut text = String::with_capacity(source.len());
        let mut origins = Vec::with_capacity(source.len());
        let mut pending_space: Option<(usize, usize)> = None;

        for (idx, ch) in source.char_indices() {
            let end = idx + ch.len_utf8();

            if ch.is_whitespace() {
                pending_space = Some(match pending_space {
                    Some((start, _)) => (start, end),
                    None => (idx, end),
                });
                continue;
            }

            // A whitespace run only becomes a space once something follows
            // it, which is what trims the tail. The empty check trims the
            // head.
            if let Some(run) = pending_space.take() {
                if !text.is_empty() {
                    origins.push(Origin {
                        normalized: text.len(),
                        source: run,
                    });
                    text.push(' ');
                }
            }

            origins.push(Origin {
                normalized: text.len(),
                source: (idx, end),
            });
            text.push(unify_char(ch));
        }

        Self { text, origins }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Translate a byte range of the normalized string back into the
    /// source.
    ///
    /// Both ends must fall on normalized character boundaries and the range
    /// must be non-empty; otherwise `None`.
    pub fn source_range(&self, normalized: Range<usize>) -> Option<Range<usize>> {
        if normalized.start >= normalized.end || normalized.end > self.text.len() {
            return None;
        }

        let first = self
            .origins
            .binary_search_by_key(&normalized.start, |o| o.normalized)
            .ok()?;
        let last = self
            .origins
            .partition_point(|o| o.normalized < normalized.end)
            .checked_sub(1)?;

        Some(self.origins[first].source.0..self.origins[last].source.1)
    }
}
