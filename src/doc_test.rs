#![allow(clippy::clone_on_copy, clippy::float_cmp)]

use serde_json::json;

use super::*;

fn layer() -> LayerId {
    LayerId::new("L1")
}

fn rect(x: f64, y: f64, w: f64, h: f64) -> AnnotationObject {
    AnnotationObject::new(layer(), Shape::Rect(BoxShape { bounds: Bounds::new(x, y, w, h) }), Paint::default())
}

fn line(ax: f64, ay: f64, bx: f64, by: f64) -> AnnotationObject {
    AnnotationObject::new(
        layer(),
        Shape::Line(LineShape { a: Point::new(ax, ay), b: Point::new(bx, by) }),
        Paint::default(),
    )
}

fn note(text: &str) -> AnnotationObject {
    AnnotationObject::new(
        layer(),
        Shape::Note(TextBoxShape { bounds: Bounds::new(0.0, 0.0, 100.0, 80.0), font_size: 14.0, text: text.into() }),
        Paint::default(),
    )
}

// =============================================================
// LayerId
// =============================================================

#[test]
fn pdf_content_layer_is_reserved() {
    assert!(LayerId::pdf_content().is_reserved());
    assert_eq!(LayerId::pdf_content().as_str(), "pdf-content");
    assert!(!LayerId::generate().is_reserved());
}

#[test]
fn generated_layer_ids_are_unique() {
    assert_ne!(LayerId::generate(), LayerId::generate());
}

#[test]
fn layer_id_serializes_as_plain_string() {
    assert_eq!(serde_json::to_value(LayerId::new("abc")).unwrap(), json!("abc"));
}

// =============================================================
// ObjectKind
// =============================================================

#[test]
fn kind_wire_names_round_trip() {
    for kind in ObjectKind::ALL {
        assert_eq!(ObjectKind::parse(kind.as_str()), Some(kind));
    }
}

#[test]
fn kind_serde_matches_wire_name() {
    for kind in ObjectKind::ALL {
        assert_eq!(serde_json::to_value(kind).unwrap(), json!(kind.as_str()));
    }
}

#[test]
fn kind_parse_unknown_is_none() {
    assert_eq!(ObjectKind::parse("hexagon"), None);
}

#[test]
fn stamp_parse_is_case_insensitive() {
    assert_eq!(StampKind::parse("approved"), Some(StampKind::Approved));
    assert_eq!(StampKind::parse("DRAFT"), Some(StampKind::Draft));
    assert_eq!(StampKind::parse("maybe"), None);
}

#[test]
fn scene_error_codes() {
    assert_eq!(SceneError::LayerLocked(layer()).error_code(), "E_LAYER_LOCKED");
    assert!(SceneError::LayerLocked(layer()).is_absorbed());
    assert_eq!(SceneError::ObjectNotFound(Uuid::nil()).error_code(), "E_OBJECT_NOT_FOUND");
    assert!(!SceneError::ObjectNotFound(Uuid::nil()).is_absorbed());
}

// =============================================================
// Bounds per variant
// =============================================================

#[test]
fn rect_bounds() {
    assert_eq!(rect(10.0, 10.0, 50.0, 30.0).bounds(), Bounds::new(10.0, 10.0, 50.0, 30.0));
}

#[test]
fn line_bounds_normalized() {
    assert_eq!(line(40.0, 40.0, 0.0, 10.0).bounds(), Bounds::new(0.0, 10.0, 40.0, 30.0));
}

#[test]
fn path_bounds_enclose_points() {
    let obj = AnnotationObject::new(
        layer(),
        Shape::FreehandPath(PathShape {
            points: vec![Point::new(1.0, 5.0), Point::new(9.0, 2.0), Point::new(4.0, 8.0)],
            brush: BrushKind::Draw,
        }),
        Paint::default(),
    );
    assert_eq!(obj.bounds(), Bounds::new(1.0, 2.0, 8.0, 6.0));
}

#[test]
fn text_bounds_grow_with_lines() {
    let mut obj = AnnotationObject::new(
        layer(),
        Shape::Text(TextShape { at: Point::new(0.0, 0.0), width: 100.0, font_size: 10.0, text: "one".into() }),
        Paint::default(),
    );
    let one = obj.bounds().height;
    obj.set_text("one\ntwo");
    assert_eq!(obj.bounds().height, one * 2.0);
}

#[test]
fn arrow_bounds_include_head() {
    let mut obj = AnnotationObject::new(
        layer(),
        Shape::Arrow(ArrowShape { a: Point::new(0.0, 0.0), b: Point::new(100.0, 0.0), head: None }),
        Paint::default(),
    );
    assert_eq!(obj.bounds().height, 0.0);
    if let Shape::Arrow(a) = &mut obj.shape {
        a.head = Some(arrow_head(a.a, a.b, 2.0));
    }
    assert!(obj.bounds().height > 0.0);
}

// =============================================================
// Text access
// =============================================================

#[test]
fn text_bearing_variants() {
    assert!(note("hi").is_text_bearing());
    assert!(note("hi").is_composite());
    assert!(!rect(0.0, 0.0, 1.0, 1.0).is_text_bearing());
}

#[test]
fn set_text_on_non_text_is_rejected() {
    let mut r = rect(0.0, 0.0, 1.0, 1.0);
    assert!(!r.set_text("nope"));
    assert!(r.text().is_none());
}

#[test]
fn set_text_on_note() {
    let mut n = note("old");
    assert!(n.set_text("new"));
    assert_eq!(n.text(), Some("new"));
}

// =============================================================
// Translate / resize
// =============================================================

#[test]
fn translate_moves_rect() {
    let mut r = rect(10.0, 10.0, 5.0, 5.0);
    r.translate(3.0, -2.0);
    assert_eq!(r.bounds(), Bounds::new(13.0, 8.0, 5.0, 5.0));
}

#[test]
fn translate_moves_arrow_head_with_line() {
    let mut obj = AnnotationObject::new(
        layer(),
        Shape::Arrow(ArrowShape {
            a: Point::new(0.0, 0.0),
            b: Point::new(50.0, 0.0),
            head: Some(arrow_head(Point::new(0.0, 0.0), Point::new(50.0, 0.0), 2.0)),
        }),
        Paint::default(),
    );
    obj.translate(10.0, 10.0);
    let Shape::Arrow(a) = &obj.shape else {
        panic!("expected arrow");
    };
    assert_eq!(a.head.unwrap().tip, Point::new(60.0, 10.0));
}

#[test]
fn resize_line_scales_endpoints() {
    let mut l = line(0.0, 0.0, 10.0, 10.0);
    l.resize_to(Bounds::new(0.0, 0.0, 20.0, 40.0));
    let Shape::Line(s) = l.shape else {
        panic!("expected line");
    };
    assert_eq!(s.a, Point::new(0.0, 0.0));
    assert_eq!(s.b, Point::new(20.0, 40.0));
}

#[test]
fn resize_degenerate_line_does_not_divide_by_zero() {
    let mut l = line(5.0, 5.0, 5.0, 5.0);
    l.resize_to(Bounds::new(0.0, 0.0, 10.0, 10.0));
    let b = l.bounds();
    assert!(b.x.is_finite() && b.y.is_finite());
}

// =============================================================
// Patch
// =============================================================

#[test]
fn apply_patch_changes_paint() {
    let mut r = rect(0.0, 0.0, 10.0, 10.0);
    let changed = r.apply(&ObjectPatch {
        stroke: Some(Some("#FF0000".into())),
        fill: Some(Some("#00FF00".into())),
        opacity: Some(0.5),
        ..Default::default()
    });
    assert!(changed);
    assert_eq!(r.paint.stroke.as_deref(), Some("#FF0000"));
    assert_eq!(r.paint.fill.as_deref(), Some("#00FF00"));
    assert_eq!(r.paint.opacity, 0.5);
}

#[test]
fn apply_patch_clamps_opacity() {
    let mut r = rect(0.0, 0.0, 10.0, 10.0);
    r.apply(&ObjectPatch { opacity: Some(4.0), ..Default::default() });
    assert_eq!(r.paint.opacity, 1.0);
}

#[test]
fn apply_empty_patch_reports_unchanged() {
    let mut r = rect(0.0, 0.0, 10.0, 10.0);
    assert!(!r.apply(&ObjectPatch::default()));
}

#[test]
fn apply_patch_ignores_fields_for_other_variants() {
    let mut r = rect(0.0, 0.0, 10.0, 10.0);
    let changed = r.apply(&ObjectPatch {
        endpoints: Some((Point::new(1.0, 1.0), Point::new(2.0, 2.0))),
        ..Default::default()
    });
    assert!(!changed);
}

#[test]
fn apply_patch_extra_merge_and_delete() {
    let mut r = rect(0.0, 0.0, 10.0, 10.0);
    r.extra.insert("keep".into(), json!(1));
    r.extra.insert("drop".into(), json!(2));
    let mut merge = Map::new();
    merge.insert("drop".into(), Value::Null);
    merge.insert("add".into(), json!("x"));
    r.apply(&ObjectPatch { extra: Some(merge), ..Default::default() });
    assert_eq!(r.extra.get("keep"), Some(&json!(1)));
    assert_eq!(r.extra.get("add"), Some(&json!("x")));
    assert!(!r.extra.contains_key("drop"));
}

#[test]
fn endpoint_patch_recomputes_arrow_head() {
    let a = Point::new(0.0, 0.0);
    let b = Point::new(50.0, 0.0);
    let mut obj = AnnotationObject::new(
        layer(),
        Shape::Arrow(ArrowShape { a, b, head: Some(arrow_head(a, b, 2.0)) }),
        Paint::default(),
    );
    obj.apply(&ObjectPatch { endpoints: Some((a, Point::new(0.0, 80.0))), ..Default::default() });
    let Shape::Arrow(arrow) = &obj.shape else {
        panic!("expected arrow");
    };
    assert_eq!(arrow.head.unwrap().tip, Point::new(0.0, 80.0));
}

// =============================================================
// Builders
// =============================================================

#[test]
fn arrow_head_is_symmetric_around_shaft() {
    let head = arrow_head(Point::new(0.0, 0.0), Point::new(100.0, 0.0), 1.0);
    assert_eq!(head.tip, Point::new(100.0, 0.0));
    assert!((head.left.y + head.right.y).abs() < 1e-9);
    assert!(head.left.x < 100.0 && head.right.x < 100.0);
}

#[test]
fn arrow_head_has_minimum_size() {
    let head = arrow_head(Point::new(0.0, 0.0), Point::new(100.0, 0.0), 0.1);
    let len = head.tip.distance_to(head.left);
    assert!((len - ARROW_HEAD_MIN).abs() < 1e-9);
}

#[test]
fn squiggly_wave_spans_samples_and_oscillates() {
    let wave = squiggly_wave(&[Point::new(0.0, 0.0), Point::new(40.0, 0.0)]);
    assert!(wave.len() > 2);
    let first = wave[0];
    let last = wave[wave.len() - 1];
    assert!((first.x - 0.0).abs() < 1e-9);
    assert!((last.x - 40.0).abs() < 1e-9);
    let max_y = wave.iter().map(|p| p.y).fold(f64::MIN, f64::max);
    let min_y = wave.iter().map(|p| p.y).fold(f64::MAX, f64::min);
    assert!(max_y > 0.0 && min_y < 0.0);
    assert!(max_y <= SQUIGGLY_AMPLITUDE + 1e-9);
}

#[test]
fn squiggly_wave_single_sample_passthrough() {
    let pts = vec![Point::new(3.0, 3.0)];
    assert_eq!(squiggly_wave(&pts), pts);
}

// =============================================================
// Scene
// =============================================================

#[test]
fn scene_insert_appends_on_top() {
    let mut scene = Scene::new();
    let a = rect(0.0, 0.0, 10.0, 10.0);
    let b = rect(0.0, 0.0, 10.0, 10.0);
    let (ida, idb) = (a.id, b.id);
    scene.insert(a);
    scene.insert(b);
    assert_eq!(scene.position(&ida), Some(0));
    assert_eq!(scene.position(&idb), Some(1));
}

#[test]
fn scene_insert_existing_replaces_in_place() {
    let mut scene = Scene::new();
    let a = rect(0.0, 0.0, 10.0, 10.0);
    let id = a.id;
    scene.insert(a.clone());
    scene.insert(rect(5.0, 5.0, 1.0, 1.0));
    let mut moved = a;
    moved.translate(1.0, 1.0);
    scene.insert(moved);
    assert_eq!(scene.len(), 2);
    assert_eq!(scene.position(&id), Some(0));
    assert_eq!(scene.get(&id).unwrap().bounds().x, 1.0);
}

#[test]
fn scene_remove_returns_object() {
    let mut scene = Scene::new();
    let a = rect(0.0, 0.0, 10.0, 10.0);
    let id = a.id;
    scene.insert(a);
    assert!(scene.remove(&id).is_some());
    assert!(scene.remove(&id).is_none());
    assert!(scene.is_empty());
}

#[test]
fn scene_query_filters_in_paint_order() {
    let mut scene = Scene::new();
    let a = rect(0.0, 0.0, 10.0, 10.0);
    let b = line(0.0, 0.0, 1.0, 1.0);
    let c = rect(0.0, 0.0, 10.0, 10.0);
    let (ida, idc) = (a.id, c.id);
    scene.insert(a);
    scene.insert(b);
    scene.insert(c);
    assert_eq!(scene.query(|o| o.kind() == ObjectKind::Rect), vec![ida, idc]);
}

#[test]
fn scene_topmost_prefers_last_inserted() {
    let mut scene = Scene::new();
    let a = rect(0.0, 0.0, 10.0, 10.0);
    let b = rect(0.0, 0.0, 10.0, 10.0);
    let idb = b.id;
    scene.insert(a);
    scene.insert(b);
    assert_eq!(scene.topmost(|_| true).map(|o| o.id), Some(idb));
}

#[test]
fn scene_insert_at_clamps() {
    let mut scene = Scene::new();
    scene.insert(rect(0.0, 0.0, 1.0, 1.0));
    let b = rect(0.0, 0.0, 1.0, 1.0);
    let idb = b.id;
    scene.insert_at(99, b);
    assert_eq!(scene.position(&idb), Some(1));
}
