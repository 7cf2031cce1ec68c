// src/locate/segments.rs

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::Result;

use super::locator::{Locator, MatchKind, MatchResult, Span};

/// Category of an annotation. Unknown categories are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AnnotationKind {
    #[default]
    Concept,
    Tension,
    Prediction,
    Strategy,
    Other(String),
}

impl AnnotationKind {
    pub fn as_str(&self) -> &str {
        match self {
            AnnotationKind::Concept => "concept",
            AnnotationKind::Tension => "tension",
            AnnotationKind::Prediction => "prediction",
            AnnotationKind::Strategy => "strategy",
            AnnotationKind::Other(s) => s,
        }
    }
}

impl From<String> for AnnotationKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "concept" => AnnotationKind::Concept,
            "tension" => AnnotationKind::Tension,
            "prediction" => AnnotationKind::Prediction,
            "strategy" => AnnotationKind::Strategy,
            _ => AnnotationKind::Other(s),
        }
    }
}

impl From<AnnotationKind> for String {
    fn from(kind: AnnotationKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for AnnotationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A note attached to a quoted stretch of text.
///
/// JSON shape: `{"textSpan": "...", "insight": "...", "timestamp": "...",
/// "type": "concept"}`. Only `textSpan` is required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    pub text_span: String,
    #[serde(default)]
    pub insight: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: AnnotationKind,
}

impl Annotation {
    pub fn new(text_span: impl Into<String>, kind: AnnotationKind) -> Self {
        Self {
            text_span: text_span.into(),
            insight: String::new(),
            timestamp: None,
            kind,
        }
    }
}

/// Parse a JSON array of annotations.
pub fn parse_annotations(json: &str) -> Result<Vec<Annotation>> {
    Ok(serde_json::from_str(json)?)
}

/// A contiguous piece of the text. `annotation` is the index into the
/// annotation list for annotated pieces, `None` for plain text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub start: usize,
    pub end: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotation: Option<usize>,
}

impl Segment {
    pub fn span(&self) -> Span {
        Span::new(self.start, self.end)
    }

    pub fn text<'t>(&self, text: &'t str) -> &'t str {
        &text[self.start..self.end]
    }

    pub fn is_annotated(&self) -> bool {
        self.annotation.is_some()
    }
}

/// Outcome of [`segment`]: the segments plus which annotations could not be
/// placed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Segmentation {
    pub segments: Vec<Segment>,
    /// Annotations whose span was not found in the text.
    pub unmatched: Vec<usize>,
    /// Annotations that were found but overlapped an earlier match.
    pub overlapping: Vec<usize>,
}

impl Segmentation {
    pub fn matched(&self) -> usize {
        self.segments.iter().filter(|s| s.is_annotated()).count()
    }

    /// Pair every segment with its text and annotation, ready for output.
    ///
    /// `text` and `annotations` must be the inputs given to [`segment`].
    pub fn views<'a>(&self, text: &'a str, annotations: &'a [Annotation]) -> Vec<SegmentView<'a>> {
        self.segments
            .iter()
            .map(|seg| SegmentView {
                start: seg.start,
                end: seg.end,
                text: seg.text(text),
                annotation: seg.annotation.and_then(|idx| annotations.get(idx)),
            })
            .collect()
    }
}

/// A segment with its text and annotation resolved; the JSON shape printed by
/// `annotate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SegmentView<'a> {
    pub start: usize,
    pub end: usize,
    pub text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotation: Option<&'a Annotation>,
}

/// Cut `text` into plain and annotated segments.
///
/// Each annotation is located independently. Matches are ordered by start;
/// an annotation whose match overlaps an already placed one is dropped. The
/// returned segments tile `text` exactly, in order.
pub fn segment(text: &str, annotations: &[Annotation]) -> Segmentation {
    let locator = Locator::new(text);
    let mut out = Segmentation::default();

    let mut matches: Vec<(Span, usize, MatchKind)> = Vec::with_capacity(annotations.len());
    for (idx, annotation) in annotations.iter().enumerate() {
        match locator.locate(&annotation.text_span) {
            MatchResult::Found { span, kind } => matches.push((span, idx, kind)),
            MatchResult::NotFound => {
                debug!(annotation = idx, kind = %annotation.kind, "annotation span not found in text");
                out.unmatched.push(idx);
            }
        }
    }
    matches.sort_by_key(|(span, idx, _)| (span.start, *idx));

    let mut cursor = 0;
    for (span, idx, kind) in matches {
        if span.start < cursor {
            debug!(
                annotation = idx,
                start = span.start,
                end = span.end,
                placed_until = cursor,
                "annotation overlaps an earlier one; skipping"
            );
            out.overlapping.push(idx);
            continue;
        }

        if span.start > cursor {
            out.segments.push(Segment {
                start: cursor,
                end: span.start,
                annotation: None,
            });
        }
        out.segments.push(Segment {
            start: span.start,
            end: span.end,
            annotation: Some(idx),
        });
        debug!(annotation = idx, ?kind, start = span.start, end = span.end, "annotation placed");
        cursor = span.end;
    }

    if cursor < text.len() {
        out.segments.push(Segment {
            start: cursor,
            end: text.len(),
            annotation: None,
        });
    }

    debug!(
        matched = out.matched(),
        total = annotations.len(),
        "annotations segmented"
    );
    out
}
