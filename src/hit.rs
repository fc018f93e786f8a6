#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::camera::{Bounds, Point};
use crate::doc::{AnnotationObject, PathShape, Scene, Shape, SquigglyShape};

/// Anchor position for resize handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeAnchor {
    N,
    Ne,
    E,
    Se,
    S,
    Sw,
    W,
    Nw,
}

impl ResizeAnchor {
    pub const ALL: [ResizeAnchor; 8] = [Self::N, Self::Ne, Self::E, Self::Se, Self::S, Self::Sw, Self::W, Self::Nw];

    /// Handle position on `b`.
    #[must_use]
    pub fn position(self, b: &Bounds) -> Point {
        let c = b.center();
        match self {
            Self::N => Point::new(c.x, b.y),
            Self::Ne => Point::new(b.right(), b.y),
            Self::E => Point::new(b.right(), c.y),
            Self::Se => Point::new(b.right(), b.bottom()),
            Self::S => Point::new(c.x, b.bottom()),
            Self::Sw => Point::new(b.x, b.bottom()),
            Self::W => Point::new(b.x, c.y),
            Self::Nw => Point::new(b.x, b.y),
        }
    }

    /// Drag the edges this anchor controls by `(dx, dy)`. The result is
    /// normalized, so dragging past the opposite edge flips the box.
    #[must_use]
    pub fn resize(self, orig: &Bounds, dx: f64, dy: f64) -> Bounds {
        let (mut left, mut top, mut right, mut bottom) = (orig.x, orig.y, orig.right(), orig.bottom());
        match self {
            Self::N => top += dy,
            Self::Ne => {
                top += dy;
                right += dx;
            }
            Self::E => right += dx,
            Self::Se => {
                right += dx;
                bottom += dy;
            }
            Self::S => bottom += dy,
            Self::Sw => {
                left += dx;
                bottom += dy;
            }
            Self::W => left += dx,
            Self::Nw => {
                left += dx;
                top += dy;
            }
        }
        Bounds::from_corners(Point::new(left, top), Point::new(right, bottom))
    }

    /// CSS cursor for hovering this handle.
    #[must_use]
    pub fn cursor(self) -> &'static str {
        match self {
            Self::N | Self::S => "ns-resize",
            Self::E | Self::W => "ew-resize",
            Self::Ne | Self::Sw => "nesw-resize",
            Self::Se | Self::Nw => "nwse-resize",
        }
    }
}

/// Which resize handle of `bounds` (if any) is within `slop` of `pt`.
#[must_use]
pub fn hit_handle(bounds: &Bounds, pt: Point, slop: f64) -> Option<ResizeAnchor> {
    ResizeAnchor::ALL.into_iter().find(|a| a.position(bounds).distance_to(pt) <= slop)
}

/// Whether `pt` (page space) lies on `obj`, with `slop` page units of tolerance.
#[must_use]
pub fn hit_object(obj: &AnnotationObject, pt: Point, slop: f64) -> bool {
    let pt = unrotate(obj, pt);
    let half_stroke = obj.paint.stroke_width / 2.0;
    match &obj.shape {
        Shape::FreehandPath(PathShape { points, .. }) | Shape::Squiggly(SquigglyShape { points }) => {
            polyline_distance(points, pt) <= slop + half_stroke
        }
        Shape::Line(l) => segment_distance(l.a, l.b, pt) <= slop + half_stroke,
        Shape::Arrow(a) => {
            segment_distance(a.a, a.b, pt) <= slop + half_stroke
                || a.head.is_some_and(|h| Bounds::enclosing(&[h.tip, h.left, h.right]).is_some_and(|b| b.inflate(slop).contains(pt)))
        }
        Shape::Ellipse(s) => ellipse_contains(&s.bounds.inflate(slop + half_stroke), pt),
        _ => obj.bounds().inflate(slop).contains(pt),
    }
}

/// Whether a circle of `radius` around `center` touches `obj`. Used by the eraser.
#[must_use]
pub fn touches_circle(obj: &AnnotationObject, center: Point, radius: f64) -> bool {
    let center = unrotate(obj, center);
    let half_stroke = obj.paint.stroke_width / 2.0;
    match &obj.shape {
        Shape::FreehandPath(PathShape { points, .. }) | Shape::Squiggly(SquigglyShape { points }) => {
            polyline_distance(points, center) <= radius + half_stroke
        }
        Shape::Line(l) => segment_distance(l.a, l.b, center) <= radius + half_stroke,
        Shape::Arrow(a) => segment_distance(a.a, a.b, center) <= radius + half_stroke,
        Shape::Ellipse(s) => ellipse_contains(&s.bounds.inflate(radius + half_stroke), center),
        _ => obj.bounds().intersects_circle(center, radius),
    }
}

/// Topmost object under `pt` that also satisfies `pred`.
pub fn topmost_at<'a, F>(scene: &'a Scene, pt: Point, slop: f64, pred: F) -> Option<&'a AnnotationObject>
where
    F: Fn(&AnnotationObject) -> bool,
{
    scene.topmost(|o| pred(o) && hit_object(o, pt, slop))
}

/// Distance from `p` to the segment `a`–`b`.
#[must_use]
pub fn segment_distance(a: Point, b: Point, p: Point) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len_sq = dx * dx + dy * dy;
    if len_sq <= f64::EPSILON {
        return p.distance_to(a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    p.distance_to(Point::new(a.x + t * dx, a.y + t * dy))
}

/// Distance from `p` to the nearest segment of a polyline. A single point
/// is treated as a dot; an empty polyline is infinitely far away.
#[must_use]
pub fn polyline_distance(points: &[Point], p: Point) -> f64 {
    match points {
        [] => f64::INFINITY,
        [only] => p.distance_to(*only),
        _ => points.windows(2).map(|w| segment_distance(w[0], w[1], p)).fold(f64::INFINITY, f64::min),
    }
}

fn ellipse_contains(b: &Bounds, p: Point) -> bool {
    let (rx, ry) = (b.width / 2.0, b.height / 2.0);
    if rx <= f64::EPSILON || ry <= f64::EPSILON {
        return b.contains(p);
    }
    let c = b.center();
    let (nx, ny) = ((p.x - c.x) / rx, (p.y - c.y) / ry);
    nx * nx + ny * ny <= 1.0
}

/// Map a page point into the object's unrotated frame.
fn unrotate(obj: &AnnotationObject, p: Point) -> Point {
    if obj.angle.abs() <= f64::EPSILON {
        return p;
    }
    let c = obj.bounds().center();
    let (sin, cos) = (-obj.angle.to_radians()).sin_cos();
    let (dx, dy) = (p.x - c.x, p.y - c.y);
    Point::new(c.x + dx * cos - dy * sin, c.y + dx * sin + dy * cos)
}
