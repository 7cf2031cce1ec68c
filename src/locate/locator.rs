// src/locate/locator.rs

use std::cell::OnceCell;
use std::ops::Range;

use serde::Serialize;
use tracing::debug;

use super::normalize::{normalize, NormalizedText};

/// Half-open byte range into the haystack, always on `char` boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// The matched text. Panics if `haystack` is not the text this span was
    /// located in.
    pub fn slice<'h>(&self, haystack: &'h str) -> &'h str {
        &haystack[self.range()]
    }

    /// The same span counted in Unicode scalar values instead of bytes.
    pub fn char_range(&self, haystack: &str) -> Range<usize> {
        let start = haystack[..self.start].chars().count();
        let len = haystack[self.range()].chars().count();
        start..start + len
    }
}

/// Which search found the span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    /// Literal substring of the haystack.
    Exact,
    /// Found only after quote/dash/whitespace normalization.
    Normalized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchResult {
    Found { span: Span, kind: MatchKind },
    NotFound,
}

impl MatchResult {
    pub fn is_found(&self) -> bool {
        matches!(self, MatchResult::Found { .. })
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            MatchResult::Found { span, .. } => Some(*span),
            MatchResult::NotFound => None,
        }
    }
}

/// Locate `needle` in `haystack`: exact first, then normalized.
///
/// Returns the leftmost match. An empty needle, or one that is only
/// whitespace, is `NotFound`.
pub fn locate(haystack: &str, needle: &str) -> MatchResult {
    Locator::new(haystack).locate(needle)
}

/// Locates many needles in one haystack, normalizing the haystack at most
/// once.
#[derive(Debug)]
pub struct Locator<'h> {
    haystack: &'h str,
    normalized: OnceCell<NormalizedText>,
}

impl<'h> Locator<'h> {
    pub fn new(haystack: &'h str) -> Self {
        Self {
            haystack,
            normalized: OnceCell::new(),
        }
    }

    pub fn haystack(&self) -> &'h str {
        self.haystack
    }

    pub fn locate(&self, needle: &str) -> MatchResult {
        if needle.is_empty() {
            return MatchResult::NotFound;
        }

        if let Some(start) = self.haystack.find(needle) {
            return MatchResult::Found {
                span: Span::new(start, start + needle.len()),
                kind: MatchKind::Exact,
            };
        }

        let needle_norm = normalize(needle);
        if needle_norm.is_empty() {
            return MatchResult::NotFound;
        }

        let haystack_norm = self
            .normalized
            .get_or_init(|| NormalizedText::new(self.haystack));

        let Some(at) = haystack_norm.as_str().find(&needle_norm) else {
            debug!(
                needle = %preview(needle),
                normalized = %preview(&needle_norm),
                haystack_len = self.haystack.len(),
                "span not found, exact or normalized"
            );
            return MatchResult::NotFound;
        };

        match haystack_norm.source_range(at..at + needle_norm.len()) {
            Some(range) => MatchResult::Found {
                span: Span::new(range.start, range.end),
                kind: MatchKind::Normalized,
            },
            None => {
                debug!(needle = %preview(needle), at, "normalized match could not be mapped back");
                MatchResult::NotFound
            }
        }
    }
}

fn preview(s: &str) -> String {
    const MAX_CHARS: usize = 80;
    let mut out: String = s.chars().take(MAX_CHARS).collect();
    if s.chars().nth(MAX_CHARS).is_some() {
        out.push_str("...");
    }
    out
}
