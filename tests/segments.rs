// tests/segments.rs

mod common;
use crate::common::init_tracing;

use std::error::Error;

use backend_launcher::errors::LauncherError;
use backend_launcher::locate::{
    parse_annotations, segment, Annotation, AnnotationKind, Segment, SegmentView,
};

type TestResult = Result<(), Box<dyn Error>>;

/// Segments must cover `text` exactly, in order, without gaps.
fn assert_tiles(text: &str, segments: &[Segment]) {
    let mut cursor = 0;
    for seg in segments {
        assert_eq!(seg.start, cursor, "gap or overlap at {cursor}: {segments:?}");
        assert!(seg.end > seg.start, "empty segment {seg:?}");
        cursor = seg.end;
    }
    assert_eq!(cursor, text.len());
}

#[test]
fn annotations_split_text_into_plain_and_annotated() {
    init_tracing();

    let text = "The AI\u{2019}s ability to understand context is crucial for reasoning.";
    let annotations = vec![
        Annotation::new("crucial for reasoning", AnnotationKind::Prediction),
        Annotation::new("AI's ability", AnnotationKind::Concept),
    ];

    let result = segment(text, &annotations);
    assert_tiles(text, &result.segments);
    assert_eq!(result.matched(), 2);
    assert!(result.unmatched.is_empty());

    let pieces: Vec<(&str, Option<usize>)> = result
        .segments
        .iter()
        .map(|s| (s.text(text), s.annotation))
        .collect();
    assert_eq!(
        pieces,
        vec![
            ("The ", None),
            ("AI\u{2019}s ability", Some(1)),
            (" to understand context is ", None),
            ("crucial for reasoning", Some(0)),
            (".", None),
        ]
    );
}

#[test]
fn unmatched_annotations_are_skipped() {
    let text = "short text";
    let annotations = vec![
        Annotation::new("not here", AnnotationKind::Tension),
        Annotation::new("", AnnotationKind::Concept),
    ];

    let result = segment(text, &annotations);
    assert_eq!(result.unmatched, vec![0, 1]);
    assert_eq!(result.segments, vec![Segment { start: 0, end: 10, annotation: None }]);
}

#[test]
fn overlapping_match_loses_to_earlier_start() {
    init_tracing();

    let text = "one two three four";
    let annotations = vec![
        Annotation::new("two three", AnnotationKind::Concept),
        Annotation::new("three four", AnnotationKind::Strategy),
        Annotation::new("one", AnnotationKind::Tension),
    ];

    let result = segment(text, &annotations);
    assert_tiles(text, &result.segments);
    assert_eq!(result.overlapping, vec![1]);

    let annotated: Vec<(&str, usize)> = result
        .segments
        .iter()
        .filter_map(|s| s.annotation.map(|i| (s.text(text), i)))
        .collect();
    assert_eq!(annotated, vec![("one", 2), ("two three", 0)]);
}

#[test]
fn whole_text_annotation_is_single_segment() {
    let text = "all of it";
    let result = segment(text, &[Annotation::new("all of it", AnnotationKind::Concept)]);
    assert_eq!(
        result.segments,
        vec![Segment { start: 0, end: 9, annotation: Some(0) }]
    );
}

#[test]
fn empty_text_has_no_segments() {
    let result = segment("", &[Annotation::new("x", AnnotationKind::Concept)]);
    assert!(result.segments.is_empty());
    assert_eq!(result.unmatched, vec![0]);
}

#[test]
fn annotations_parse_from_json() -> TestResult {
    let json = r#"[
        {"textSpan": "AI's ability", "insight": "core idea", "timestamp": "00:01:02", "type": "concept"},
        {"textSpan": "crucial", "insight": "", "type": "tension"},
        {"textSpan": "reasoning", "type": "hunch"},
        {"textSpan": "context"}
    ]"#;

    let annotations: Vec<Annotation> = serde_json::from_str(json)?;
    assert_eq!(annotations.len(), 4);
    assert_eq!(annotations[0].kind, AnnotationKind::Concept);
    assert_eq!(annotations[0].timestamp.as_deref(), Some("00:01:02"));
    assert_eq!(annotations[1].kind, AnnotationKind::Tension);
    assert_eq!(annotations[2].kind, AnnotationKind::Other("hunch".to_string()));
    assert_eq!(annotations[3].kind, AnnotationKind::Concept);
    assert_eq!(annotations[3].insight, "");

    // Unknown kinds survive a round trip verbatim.
    let back = serde_json::to_value(&annotations[2])?;
    assert_eq!(back["type"], "hunch");
    assert_eq!(back["textSpan"], "reasoning");

    Ok(())
}

#[test]
fn malformed_annotations_are_json_errors() {
    assert!(matches!(
        parse_annotations("[{\"insight\": \"no span\"}]"),
        Err(LauncherError::JsonError(_))
    ));
    assert!(matches!(parse_annotations("nope"), Err(LauncherError::JsonError(_))));
    assert_eq!(parse_annotations("[]").map(|a| a.len()).ok(), Some(0));
}

#[test]
fn views_carry_text_and_annotation() -> TestResult {
    let text = "say \u{201C}hello\u{201D} twice";
    let mut greeting = Annotation::new("\"hello\"", AnnotationKind::Other("greeting".to_string()));
    greeting.insight = "quoted".to_string();
    let annotations = vec![greeting];

    let result = segment(text, &annotations);
    let views = result.views(text, &annotations);
    assert_eq!(
        views[1],
        SegmentView {
            start: 4,
            end: 15,
            text: "\u{201C}hello\u{201D}",
            annotation: Some(&annotations[0]),
        }
    );

    let json = serde_json::to_value(&views)?;
    assert_eq!(json.as_array().map(Vec::len), Some(3));
    assert_eq!(json[0]["text"], "say ");
    assert!(json[0].get("annotation").is_none());
    assert_eq!(json[1]["annotation"]["type"], "greeting");
    assert_eq!(json[1]["annotation"]["insight"], "quoted");
    assert_eq!(json[2]["start"], 15);
    Ok(())
}
