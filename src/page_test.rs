#![allow(clippy::float_cmp)]

use serde_json::json;

use super::*;
use crate::doc::ObjectKind;

fn page() -> PageContent {
    PageContent {
        width_pt: 612.0,
        height_pt: 792.0,
        spans: vec![
            TextSpan { text: "Invoice".into(), bounds: Bounds::new(72.0, 72.0, 80.0, 14.0), font_size: 12.0 },
            TextSpan { text: "Total".into(), bounds: Bounds::new(72.0, 100.0, 40.0, 14.0), font_size: 12.0 },
        ],
    }
}

#[test]
fn page_content_deserializes_from_host_json() {
    let content: PageContent = serde_json::from_value(json!({
        "widthPt": 612.0,
        "heightPt": 792.0,
        "spans": [{ "text": "a", "bounds": { "x": 1.0, "y": 2.0, "width": 3.0, "height": 4.0 }, "fontSize": 9.0 }]
    }))
    .unwrap();
    assert_eq!(content.spans.len(), 1);
    assert_eq!(content.spans[0].font_size, 9.0);
}

#[test]
fn spans_default_to_empty() {
    let content: PageContent = serde_json::from_value(json!({ "widthPt": 1.0, "heightPt": 1.0 })).unwrap();
    assert!(content.spans.is_empty());
}

#[test]
fn span_lookup() {
    let p = page();
    assert_eq!(p.span(1).unwrap().text, "Total");
    let err = p.span(5).unwrap_err();
    assert_eq!(err, PageError::SpanNotFound { index: 5, len: 2 });
    assert_eq!(err.error_code(), "E_SPAN_NOT_FOUND");
}

#[test]
fn span_at_point() {
    let p = page();
    assert_eq!(p.span_at(Point::new(80.0, 80.0)), Some(0));
    assert_eq!(p.span_at(Point::new(80.0, 105.0)), Some(1));
    assert_eq!(p.span_at(Point::new(500.0, 500.0)), None);
}

#[test]
fn replacement_covers_span_with_white_box() {
    let p = page();
    let [cover, text] = replacement_objects(&LayerId::pdf_content(), &p.spans[0], "Receipt", "#000000");
    assert_eq!(cover.kind(), ObjectKind::Rect);
    assert_eq!(cover.bounds(), p.spans[0].bounds);
    assert_eq!(cover.paint.fill.as_deref(), Some("#FFFFFF"));
    assert!(cover.paint.stroke.is_none());

    assert_eq!(text.text(), Some("Receipt"));
    assert_eq!(text.group, Some(cover.id));
    assert_eq!(text.layer_id, LayerId::pdf_content());
}
