//! Page-space / canvas-space transforms.
//!
//! Annotation geometry is always stored in page space (PDF points, origin at
//! the top-left of the page). Canvas space is page space multiplied by the
//! render scale (`zoom × dpr`) and exists only while drawing. Pointer events
//! arrive in screen space (CSS pixels relative to the viewport) and are
//! mapped back through the shared viewport pan and the zoom factor.

#[cfg(test)]
#[path = "camera_test.rs"]
mod camera_test;

use serde::{Deserialize, Serialize};

use crate::error::ErrorCode;

/// Errors raised by transform construction.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum GeometryError {
    #[error("invalid scale: {0} (must be finite and > 0)")]
    InvalidScale(f64),
}

impl ErrorCode for GeometryError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidScale(_) => "E_INVALID_SCALE",
        }
    }
}

/// A point in page, canvas, or screen space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn distance_to(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    #[must_use]
    pub fn offset(self, dx: f64, dy: f64) -> Point {
        Point { x: self.x + dx, y: self.y + dy }
    }
}

/// Axis-aligned box. `width` and `height` are never negative once normalized.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    #[must_use]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Box spanned by two arbitrary corners.
    #[must_use]
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: (a.x - b.x).abs(),
            height: (a.y - b.y).abs(),
        }
    }

    /// Smallest box containing every point. `None` for an empty slice.
    #[must_use]
    pub fn enclosing(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Self { x: min_x, y: min_y, width: max_x - min_x, height: max_y - min_y })
    }

    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    /// Grow every edge outwards by `d`.
    #[must_use]
    pub fn inflate(&self, d: f64) -> Bounds {
        Bounds { x: self.x - d, y: self.y - d, width: self.width + 2.0 * d, height: self.height + 2.0 * d }
    }

    #[must_use]
    pub fn union(&self, other: &Bounds) -> Bounds {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Bounds { x, y, width: self.right().max(other.right()) - x, height: self.bottom().max(other.bottom()) - y }
    }

    /// Whether a circle touches this box (filled, not just the outline).
    #[must_use]
    pub fn intersects_circle(&self, center: Point, radius: f64) -> bool {
        let nx = center.x.clamp(self.x, self.right());
        let ny = center.y.clamp(self.y, self.bottom());
        center.distance_to(Point::new(nx, ny)) <= radius
    }

    #[must_use]
    pub fn translated(&self, dx: f64, dy: f64) -> Bounds {
        Bounds { x: self.x + dx, y: self.y + dy, ..*self }
    }
}

/// Render scale and shared viewport pan.
///
/// `pan_x` / `pan_y` are in CSS pixels, `zoom` is the user zoom factor
/// (1.0 = 100%), `dpr` is the device pixel ratio of the backing canvases.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub pan_x: f64,
    pub pan_y: f64,
    zoom: f64,
    dpr: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self { pan_x: 0.0, pan_y: 0.0, zoom: 1.0, dpr: 1.0 }
    }
}

fn check_scale(value: f64) -> Result<f64, GeometryError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(GeometryError::InvalidScale(value))
    }
}

impl Camera {
    /// Build a camera with no pan.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::InvalidScale`] if `zoom` or `dpr` is not a
    /// positive finite number.
    pub fn new(zoom: f64, dpr: f64) -> Result<Self, GeometryError> {
        Ok(Self { pan_x: 0.0, pan_y: 0.0, zoom: check_scale(zoom)?, dpr: check_scale(dpr)? })
    }

    #[must_use]
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    #[must_use]
    pub fn dpr(&self) -> f64 {
        self.dpr
    }

    /// Factor from page space to canvas (backing-store) space.
    #[must_use]
    pub fn scale(&self) -> f64 {
        self.zoom * self.dpr
    }

    /// Change the zoom factor. Stored geometry is untouched.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::InvalidScale`] and leaves the camera
    /// unchanged if `zoom` is not positive.
    pub fn set_zoom(&mut self, zoom: f64) -> Result<(), GeometryError> {
        self.zoom = check_scale(zoom)?;
        Ok(())
    }

    /// Change the device pixel ratio.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::InvalidScale`] if `dpr` is not positive.
    pub fn set_dpr(&mut self, dpr: f64) -> Result<(), GeometryError> {
        self.dpr = check_scale(dpr)?;
        Ok(())
    }

    /// Page space → canvas space.
    #[must_use]
    pub fn to_canvas(&self, page: Point) -> Point {
        let s = self.scale();
        Point { x: page.x * s, y: page.y * s }
    }

    /// Canvas space → page space.
    #[must_use]
    pub fn to_page(&self, canvas: Point) -> Point {
        let s = self.scale();
        Point { x: canvas.x / s, y: canvas.y / s }
    }

    /// Page-space box → canvas-space box.
    #[must_use]
    pub fn bounds_to_canvas(&self, b: &Bounds) -> Bounds {
        let s = self.scale();
        Bounds { x: b.x * s, y: b.y * s, width: b.width * s, height: b.height * s }
    }

    /// Screen point (CSS pixels) → page space, through pan and zoom.
    #[must_use]
    pub fn screen_to_page(&self, screen: Point) -> Point {
        Point { x: (screen.x - self.pan_x) / self.zoom, y: (screen.y - self.pan_y) / self.zoom }
    }

    /// Page point → screen point (CSS pixels).
    #[must_use]
    pub fn page_to_screen(&self, page: Point) -> Point {
        Point { x: page.x * self.zoom + self.pan_x, y: page.y * self.zoom + self.pan_y }
    }

    /// Convert a screen-space distance (pixels) to page units.
    #[must_use]
    pub fn screen_dist_to_page(&self, screen_dist: f64) -> f64 {
        screen_dist / self.zoom
    }

    /// Shift the shared viewport by a screen-space delta.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.pan_x += dx;
        self.pan_y += dy;
    }
}
