// src/locate/mod.rs

//! Finding quoted spans in a source text.
//!
//! Quotes produced by another system often differ from the source in
//! typography (curly vs straight quotes, em dash vs hyphen) and in
//! whitespace. [`locate`] tries an exact search first and falls back to a
//! normalized one, always reporting offsets in the *original* text.

mod locator;
mod normalize;
mod segments;

pub use locator::{locate, Locator, MatchKind, MatchResult, Span};
pub use normalize::{normalize, unify_char, NormalizedText};
pub use segments::{
    parse_annotations, segment, Annotation, AnnotationKind, Segment, SegmentView, Segmentation,
};
