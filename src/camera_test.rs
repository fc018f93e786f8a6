#![allow(clippy::clone_on_copy, clippy::float_cmp)]

use super::*;

const EPSILON: f64 = 1e-10;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

fn point_approx_eq(a: Point, b: Point) -> bool {
    approx_eq(a.x, b.x) && approx_eq(a.y, b.y)
}

// --- Point ---

#[test]
fn point_distance() {
    assert_eq!(Point::new(0.0, 0.0).distance_to(Point::new(3.0, 4.0)), 5.0);
}

#[test]
fn point_offset() {
    assert_eq!(Point::new(1.0, 2.0).offset(3.0, -1.0), Point::new(4.0, 1.0));
}

// --- Bounds ---

#[test]
fn bounds_from_corners_normalizes_negative_drag() {
    let b = Bounds::from_corners(Point::new(50.0, 40.0), Point::new(10.0, 10.0));
    assert_eq!(b, Bounds::new(10.0, 10.0, 40.0, 30.0));
}

#[test]
fn bounds_enclosing_points() {
    let pts = [Point::new(5.0, 1.0), Point::new(-2.0, 7.0), Point::new(3.0, 3.0)];
    assert_eq!(Bounds::enclosing(&pts), Some(Bounds::new(-2.0, 1.0, 7.0, 6.0)));
}

#[test]
fn bounds_enclosing_empty_is_none() {
    assert!(Bounds::enclosing(&[]).is_none());
}

#[test]
fn bounds_contains_edges() {
    let b = Bounds::new(0.0, 0.0, 10.0, 10.0);
    assert!(b.contains(Point::new(0.0, 0.0)));
    assert!(b.contains(Point::new(10.0, 10.0)));
    assert!(!b.contains(Point::new(10.1, 5.0)));
}

#[test]
fn bounds_union_covers_both() {
    let a = Bounds::new(0.0, 0.0, 10.0, 10.0);
    let b = Bounds::new(20.0, -5.0, 5.0, 5.0);
    assert_eq!(a.union(&b), Bounds::new(0.0, -5.0, 25.0, 15.0));
}

#[test]
fn bounds_circle_intersection() {
    let b = Bounds::new(0.0, 0.0, 10.0, 10.0);
    assert!(b.intersects_circle(Point::new(5.0, 5.0), 1.0));
    assert!(b.intersects_circle(Point::new(12.0, 5.0), 2.0));
    assert!(!b.intersects_circle(Point::new(13.0, 13.0), 2.0));
}

#[test]
fn bounds_inflate() {
    let b = Bounds::new(10.0, 10.0, 5.0, 5.0).inflate(2.0);
    assert_eq!(b, Bounds::new(8.0, 8.0, 9.0, 9.0));
}

// --- Camera defaults ---

#[test]
fn camera_default_is_identity() {
    let cam = Camera::default();
    assert_eq!(cam.pan_x, 0.0);
    assert_eq!(cam.pan_y, 0.0);
    assert_eq!(cam.zoom(), 1.0);
    assert_eq!(cam.dpr(), 1.0);
    assert_eq!(cam.scale(), 1.0);
}

// --- Scale validation ---

#[test]
fn camera_new_rejects_zero_zoom() {
    assert_eq!(Camera::new(0.0, 1.0), Err(GeometryError::InvalidScale(0.0)));
}

#[test]
fn camera_new_rejects_negative_dpr() {
    assert_eq!(Camera::new(1.0, -2.0), Err(GeometryError::InvalidScale(-2.0)));
}

#[test]
fn camera_new_rejects_nan() {
    assert!(Camera::new(f64::NAN, 1.0).is_err());
}

#[test]
fn set_zoom_rejects_non_positive_and_keeps_previous() {
    let mut cam = Camera::new(1.5, 1.0).unwrap();
    assert!(cam.set_zoom(-1.0).is_err());
    assert_eq!(cam.zoom(), 1.5);
}

#[test]
fn invalid_scale_error_code() {
    assert_eq!(GeometryError::InvalidScale(0.0).error_code(), "E_INVALID_SCALE");
}

// --- Page ↔ canvas ---

#[test]
fn to_canvas_scales_by_zoom() {
    let cam = Camera::new(2.0, 1.0).unwrap();
    assert_eq!(cam.to_canvas(Point::new(10.0, 10.0)), Point::new(20.0, 20.0));
}

#[test]
fn to_canvas_includes_dpr() {
    let cam = Camera::new(2.0, 1.5).unwrap();
    assert!(point_approx_eq(cam.to_canvas(Point::new(10.0, 4.0)), Point::new(30.0, 12.0)));
}

#[test]
fn to_page_inverts_to_canvas() {
    let cam = Camera::new(1.75, 2.0).unwrap();
    let p = Point::new(123.25, -7.5);
    assert!(point_approx_eq(cam.to_page(cam.to_canvas(p)), p));
}

#[test]
fn bounds_to_canvas_at_double_zoom() {
    let cam = Camera::new(2.0, 1.0).unwrap();
    let b = cam.bounds_to_canvas(&Bounds::new(10.0, 10.0, 50.0, 30.0));
    assert_eq!(b, Bounds::new(20.0, 20.0, 100.0, 60.0));
}

#[test]
fn repeated_zoom_changes_do_not_drift() {
    let mut cam = Camera::default();
    let page = Bounds::new(10.0, 10.0, 50.0, 30.0);
    for z in [0.5, 3.0, 1.1, 0.25, 2.0] {
        cam.set_zoom(z).unwrap();
    }
    // Derived from page space each time, never accumulated.
    assert_eq!(cam.bounds_to_canvas(&page), Bounds::new(20.0, 20.0, 100.0, 60.0));
}

// --- Screen ↔ page ---

#[test]
fn screen_to_page_applies_pan_then_zoom() {
    let mut cam = Camera::new(2.0, 3.0).unwrap();
    cam.pan_by(100.0, 50.0);
    assert_eq!(cam.screen_to_page(Point::new(120.0, 70.0)), Point::new(10.0, 10.0));
}

#[test]
fn page_to_screen_round_trip() {
    let mut cam = Camera::new(0.8, 1.0).unwrap();
    cam.pan_by(-30.0, 12.0);
    let p = Point::new(44.0, 55.0);
    assert!(point_approx_eq(cam.screen_to_page(cam.page_to_screen(p)), p));
}

#[test]
fn screen_dist_to_page_divides_by_zoom() {
    let cam = Camera::new(4.0, 2.0).unwrap();
    assert_eq!(cam.screen_dist_to_page(8.0), 2.0);
}
