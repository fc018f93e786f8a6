//! Annotation object model: tagged object variants and the per-layer scene store.
//!
//! Every placeable thing is one [`AnnotationObject`]: common fields (id,
//! owning layer, paint, angle, link, group, opaque extra fields) plus a
//! [`Shape`] payload selected by variant. Behaviour that differs per variant
//! (bounds, translation, resizing, text access) dispatches by matching on the
//! tag. All geometry is page space.
//!
//! [`Scene`] is the retained store for one layer. It keeps insertion order,
//! which is the paint order inside the layer (last = topmost). It performs no
//! lock checks; those live on [`crate::layer::LayerCanvas`], the only owner of
//! a scene.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::camera::{Bounds, Point};
use crate::consts::{
    ARROW_HEAD_ANGLE, ARROW_HEAD_MIN, ARROW_HEAD_SCALE, DEFAULT_STROKE, DEFAULT_STROKE_WIDTH, PDF_CONTENT_LAYER_ID,
    SQUIGGLY_AMPLITUDE, SQUIGGLY_WAVELENGTH,
};
use crate::error::ErrorCode;

/// Unique identifier for an annotation object.
pub type ObjectId = Uuid;

/// Identifier of a layer. User layers get a UUID string; the reserved page
/// layer is always `"pdf-content"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(String);

impl LayerId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh random id for a user layer.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// The reserved page-content layer id.
    #[must_use]
    pub fn pdf_content() -> Self {
        Self(PDF_CONTENT_LAYER_ID.to_owned())
    }

    #[must_use]
    pub fn is_reserved(&self) -> bool {
        self.0 == PDF_CONTENT_LAYER_ID
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Errors raised by object-model operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SceneError {
    #[error("layer is locked: {0}")]
    LayerLocked(LayerId),
    #[error("object not found: {0}")]
    ObjectNotFound(ObjectId),
}

impl ErrorCode for SceneError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::LayerLocked(_) => "E_LAYER_LOCKED",
            Self::ObjectNotFound(_) => "E_OBJECT_NOT_FOUND",
        }
    }

    fn is_absorbed(&self) -> bool {
        matches!(self, Self::LayerLocked(_))
    }
}

/// Variant tag of an annotation object, as written in the `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ObjectKind {
    FreehandPath,
    Rect,
    Ellipse,
    Line,
    Arrow,
    Text,
    Note,
    Callout,
    Stamp,
    Checkmark,
    Cross,
    Squiggly,
    Image,
    LinkRegion,
}

impl ObjectKind {
    pub const ALL: [ObjectKind; 14] = [
        Self::FreehandPath,
        Self::Rect,
        Self::Ellipse,
        Self::Line,
        Self::Arrow,
        Self::Text,
        Self::Note,
        Self::Callout,
        Self::Stamp,
        Self::Checkmark,
        Self::Cross,
        Self::Squiggly,
        Self::Image,
        Self::LinkRegion,
    ];

    /// Wire name used in the `type` field.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FreehandPath => "freehandPath",
            Self::Rect => "rect",
            Self::Ellipse => "ellipse",
            Self::Line => "line",
            Self::Arrow => "arrow",
            Self::Text => "text",
            Self::Note => "note",
            Self::Callout => "callout",
            Self::Stamp => "stamp",
            Self::Checkmark => "checkmark",
            Self::Cross => "cross",
            Self::Squiggly => "squiggly",
            Self::Image => "image",
            Self::LinkRegion => "linkRegion",
        }
    }

    /// Parse a wire name. Unknown names yield `None`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == raw)
    }
}

/// Brush preset a freehand path was drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrushKind {
    #[default]
    Draw,
    Highlight,
    Signature,
}

impl BrushKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draw => "draw",
            Self::Highlight => "highlight",
            Self::Signature => "signature",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "draw" => Some(Self::Draw),
            "highlight" => Some(Self::Highlight),
            "signature" => Some(Self::Signature),
            _ => None,
        }
    }
}

/// Preset stamp labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StampKind {
    #[default]
    Approved,
    Rejected,
    Draft,
    Confidential,
    Reviewed,
}

impl StampKind {
    /// Text rendered inside the stamp.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::Draft => "DRAFT",
            Self::Confidential => "CONFIDENTIAL",
            Self::Reviewed => "REVIEWED",
        }
    }

    /// Stamp color: green for approval, red for rejection, blue otherwise.
    #[must_use]
    pub fn color(self) -> &'static str {
        match self {
            Self::Approved => "#1E8E3E",
            Self::Rejected | Self::Confidential => "#D93025",
            Self::Draft | Self::Reviewed => "#1A56DB",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        [Self::Approved, Self::Rejected, Self::Draft, Self::Confidential, Self::Reviewed]
            .into_iter()
            .find(|k| k.label().eq_ignore_ascii_case(raw))
    }
}

// =============================================================
// Variant payloads
// =============================================================

/// Freehand stroke (draw, highlight, signature).
#[derive(Debug, Clone, PartialEq)]
pub struct PathShape {
    pub points: Vec<Point>,
    pub brush: BrushKind,
}

/// Anything fully described by a box: rect, ellipse, checkmark, cross.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxShape {
    pub bounds: Bounds,
}

/// Straight segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineShape {
    pub a: Point,
    pub b: Point,
}

/// Triangle head of an arrow, tip at the arrow's `b` endpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrowHead {
    pub tip: Point,
    pub left: Point,
    pub right: Point,
}

/// Line plus its grouped head. `head` is `None` only while the arrow is
/// still being dragged out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrowShape {
    pub a: Point,
    pub b: Point,
    pub head: Option<ArrowHead>,
}

/// Inline editable text. `at` is the top-left corner.
#[derive(Debug, Clone, PartialEq)]
pub struct TextShape {
    pub at: Point,
    pub width: f64,
    pub font_size: f64,
    pub text: String,
}

/// Box with text inside: used for notes and callouts.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBoxShape {
    pub bounds: Bounds,
    pub font_size: f64,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StampShape {
    pub bounds: Bounds,
    pub stamp: StampKind,
}

/// Wavy underline. `points` is the built wave, not the raw samples.
#[derive(Debug, Clone, PartialEq)]
pub struct SquigglyShape {
    pub points: Vec<Point>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageShape {
    pub bounds: Bounds,
    /// URL or data URL of the bitmap.
    pub src: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinkShape {
    pub bounds: Bounds,
    pub url: String,
}

/// Geometry payload, one variant per object kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    FreehandPath(PathShape),
    Rect(BoxShape),
    Ellipse(BoxShape),
    Line(LineShape),
    Arrow(ArrowShape),
    Text(TextShape),
    Note(TextBoxShape),
    Callout(TextBoxShape),
    Stamp(StampShape),
    Checkmark(BoxShape),
    Cross(BoxShape),
    Squiggly(SquigglyShape),
    Image(ImageShape),
    LinkRegion(LinkShape),
}

impl Shape {
    #[must_use]
    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::FreehandPath(_) => ObjectKind::FreehandPath,
            Self::Rect(_) => ObjectKind::Rect,
            Self::Ellipse(_) => ObjectKind::Ellipse,
            Self::Line(_) => ObjectKind::Line,
            Self::Arrow(_) => ObjectKind::Arrow,
            Self::Text(_) => ObjectKind::Text,
            Self::Note(_) => ObjectKind::Note,
            Self::Callout(_) => ObjectKind::Callout,
            Self::Stamp(_) => ObjectKind::Stamp,
            Self::Checkmark(_) => ObjectKind::Checkmark,
            Self::Cross(_) => ObjectKind::Cross,
            Self::Squiggly(_) => ObjectKind::Squiggly,
            Self::Image(_) => ObjectKind::Image,
            Self::LinkRegion(_) => ObjectKind::LinkRegion,
        }
    }
}

/// Stroke/fill styling shared by every variant.
#[derive(Debug, Clone, PartialEq)]
pub struct Paint {
    pub stroke: Option<String>,
    pub stroke_width: f64,
    pub fill: Option<String>,
    /// 0.0 (transparent) ..= 1.0 (opaque).
    pub opacity: f64,
}

impl Default for Paint {
    fn default() -> Self {
        Self { stroke: Some(DEFAULT_STROKE.to_owned()), stroke_width: DEFAULT_STROKE_WIDTH, fill: None, opacity: 1.0 }
    }
}

/// A placed annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationObject {
    pub id: ObjectId,
    /// Owning layer. Never changes after creation.
    pub layer_id: LayerId,
    pub shape: Shape,
    pub paint: Paint,
    /// Clockwise rotation in degrees around the bounds center.
    pub angle: f64,
    /// URL attached by the link tool.
    pub link: Option<String>,
    /// Composite this object is grouped with (callout arrows point at their box).
    pub group: Option<ObjectId>,
    /// Fields this engine does not understand, kept verbatim for re-save.
    pub extra: Map<String, Value>,
}

impl AnnotationObject {
    /// Build an object with a fresh id.
    #[must_use]
    pub fn new(layer_id: LayerId, shape: Shape, paint: Paint) -> Self {
        Self::with_id(Uuid::new_v4(), layer_id, shape, paint)
    }

    #[must_use]
    pub fn with_id(id: ObjectId, layer_id: LayerId, shape: Shape, paint: Paint) -> Self {
        Self { id, layer_id, shape, paint, angle: 0.0, link: None, group: None, extra: Map::new() }
    }

    #[must_use]
    pub fn kind(&self) -> ObjectKind {
        self.shape.kind()
    }

    /// Axis-aligned page-space bounds, ignoring `angle`.
    #[must_use]
    pub fn bounds(&self) -> Bounds {
        match &self.shape {
            Shape::FreehandPath(PathShape { points, .. }) | Shape::Squiggly(SquigglyShape { points }) => {
                Bounds::enclosing(points).unwrap_or_default()
            }
            Shape::Rect(s) | Shape::Ellipse(s) | Shape::Checkmark(s) | Shape::Cross(s) => s.bounds,
            Shape::Line(LineShape { a, b }) => Bounds::from_corners(*a, *b),
            Shape::Arrow(arrow) => {
                let line = Bounds::from_corners(arrow.a, arrow.b);
                match arrow.head {
                    Some(h) => line.union(&Bounds::from_corners(h.left, h.right)),
                    None => line,
                }
            }
            Shape::Text(t) => Bounds::new(t.at.x, t.at.y, t.width, text_height(&t.text, t.font_size)),
            Shape::Note(t) | Shape::Callout(t) => t.bounds,
            Shape::Stamp(s) => s.bounds,
            Shape::Image(i) => i.bounds,
            Shape::LinkRegion(l) => l.bounds,
        }
    }

    /// Editable text, for text-bearing variants.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match &self.shape {
            Shape::Text(t) => Some(&t.text),
            Shape::Note(t) | Shape::Callout(t) => Some(&t.text),
            _ => None,
        }
    }

    /// Whether double-click opens an inline text editor on this object.
    #[must_use]
    pub fn is_text_bearing(&self) -> bool {
        self.text().is_some()
    }

    /// Whether this is a composite that is split into parts while editing.
    #[must_use]
    pub fn is_composite(&self) -> bool {
        matches!(self.shape, Shape::Note(_) | Shape::Callout(_))
    }

    /// Replace the text of a text-bearing variant. Returns `false` otherwise.
    pub fn set_text(&mut self, text: &str) -> bool {
        match &mut self.shape {
            Shape::Text(t) => t.text = text.to_owned(),
            Shape::Note(t) | Shape::Callout(t) => t.text = text.to_owned(),
            _ => return false,
        }
        true
    }

    /// Move the whole object by a page-space delta.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        match &mut self.shape {
            Shape::FreehandPath(PathShape { points, .. }) | Shape::Squiggly(SquigglyShape { points }) => {
                for p in points.iter_mut() {
                    *p = p.offset(dx, dy);
                }
            }
            Shape::Rect(s) | Shape::Ellipse(s) | Shape::Checkmark(s) | Shape::Cross(s) => {
                s.bounds = s.bounds.translated(dx, dy);
            }
            Shape::Line(l) => {
                l.a = l.a.offset(dx, dy);
                l.b = l.b.offset(dx, dy);
            }
            Shape::Arrow(arrow) => {
                arrow.a = arrow.a.offset(dx, dy);
                arrow.b = arrow.b.offset(dx, dy);
                if let Some(h) = &mut arrow.head {
                    h.tip = h.tip.offset(dx, dy);
                    h.left = h.left.offset(dx, dy);
                    h.right = h.right.offset(dx, dy);
                }
            }
            Shape::Text(t) => t.at = t.at.offset(dx, dy),
            Shape::Note(t) | Shape::Callout(t) => t.bounds = t.bounds.translated(dx, dy),
            Shape::Stamp(s) => s.bounds = s.bounds.translated(dx, dy),
            Shape::Image(i) => i.bounds = i.bounds.translated(dx, dy),
            Shape::LinkRegion(l) => l.bounds = l.bounds.translated(dx, dy),
        }
    }

    /// Fit the object into `target`, scaling point geometry proportionally.
    pub fn resize_to(&mut self, target: Bounds) {
        let from = self.bounds();
        let stroke_width = self.paint.stroke_width;
        match &mut self.shape {
            Shape::FreehandPath(PathShape { points, .. }) | Shape::Squiggly(SquigglyShape { points }) => {
                for p in points.iter_mut() {
                    *p = remap(*p, &from, &target);
                }
            }
            Shape::Rect(s) | Shape::Ellipse(s) | Shape::Checkmark(s) | Shape::Cross(s) => s.bounds = target,
            Shape::Line(l) => {
                l.a = remap(l.a, &from, &target);
                l.b = remap(l.b, &from, &target);
            }
            Shape::Arrow(arrow) => {
                arrow.a = remap(arrow.a, &from, &target);
                arrow.b = remap(arrow.b, &from, &target);
                if arrow.head.is_some() {
                    arrow.head = Some(arrow_head(arrow.a, arrow.b, stroke_width));
                }
            }
            Shape::Text(t) => {
                t.at = Point::new(target.x, target.y);
                t.width = target.width;
            }
            Shape::Note(t) | Shape::Callout(t) => t.bounds = target,
            Shape::Stamp(s) => s.bounds = target,
            Shape::Image(i) => i.bounds = target,
            Shape::LinkRegion(l) => l.bounds = target,
        }
    }

    /// Apply a sparse patch. Fields that do not fit this variant are ignored.
    /// Returns `true` if anything changed.
    pub fn apply(&mut self, patch: &ObjectPatch) -> bool {
        let before = self.clone();
        if let Some(delta) = patch.translate {
            self.translate(delta.x, delta.y);
        }
        if let Some(bounds) = patch.bounds {
            self.resize_to(bounds);
        }
        if let Some((a, b)) = patch.endpoints {
            let stroke_width = self.paint.stroke_width;
            match &mut self.shape {
                Shape::Line(l) => {
                    l.a = a;
                    l.b = b;
                }
                Shape::Arrow(arrow) => {
                    arrow.a = a;
                    arrow.b = b;
                    if arrow.head.is_some() {
                        arrow.head = Some(arrow_head(a, b, stroke_width));
                    }
                }
                _ => {}
            }
        }
        if let Some(points) = &patch.points {
            match &mut self.shape {
                Shape::FreehandPath(PathShape { points: current, .. })
                | Shape::Squiggly(SquigglyShape { points: current }) => current.clone_from(points),
                _ => {}
            }
        }
        if let Some(stroke) = &patch.stroke {
            self.paint.stroke.clone_from(stroke);
        }
        if let Some(w) = patch.stroke_width {
            self.paint.stroke_width = w;
        }
        if let Some(fill) = &patch.fill {
            self.paint.fill.clone_from(fill);
        }
        if let Some(o) = patch.opacity {
            self.paint.opacity = o.clamp(0.0, 1.0);
        }
        if let Some(angle) = patch.angle {
            self.angle = angle;
        }
        if let Some(text) = &patch.text {
            self.set_text(text);
        }
        if let Some(link) = &patch.link {
            self.link.clone_from(link);
        }
        if let Some(extra) = &patch.extra {
            for (k, v) in extra {
                if v.is_null() {
                    self.extra.remove(k);
                } else {
                    self.extra.insert(k.clone(), v.clone());
                }
            }
        }
        *self != before
    }
}

/// Sparse update for an annotation object. Only present fields are applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectPatch {
    /// Page-space delta to move by.
    pub translate: Option<Point>,
    /// New bounds; point geometry is scaled to fit.
    pub bounds: Option<Bounds>,
    /// New endpoints for lines and arrows.
    pub endpoints: Option<(Point, Point)>,
    /// New points for paths and squiggles.
    pub points: Option<Vec<Point>>,
    pub stroke: Option<Option<String>>,
    pub stroke_width: Option<f64>,
    pub fill: Option<Option<String>>,
    pub opacity: Option<f64>,
    pub angle: Option<f64>,
    pub text: Option<String>,
    pub link: Option<Option<String>>,
    /// Extra keys to merge; `null` values delete keys.
    pub extra: Option<Map<String, Value>>,
}

impl ObjectPatch {
    #[must_use]
    pub fn translate(dx: f64, dy: f64) -> Self {
        Self { translate: Some(Point::new(dx, dy)), ..Default::default() }
    }

    #[must_use]
    pub fn bounds(bounds: Bounds) -> Self {
        Self { bounds: Some(bounds), ..Default::default() }
    }

    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: Some(text.into()), ..Default::default() }
    }
}

// =============================================================
// Shape builders
// =============================================================

/// Head triangle for an arrow ending at `b`. Size follows stroke width.
#[must_use]
pub fn arrow_head(a: Point, b: Point, stroke_width: f64) -> ArrowHead {
    let size = (stroke_width * ARROW_HEAD_SCALE).max(ARROW_HEAD_MIN);
    let angle = (b.y - a.y).atan2(b.x - a.x);
    ArrowHead {
        tip: b,
        left: Point::new(b.x - size * (angle - ARROW_HEAD_ANGLE).cos(), b.y - size * (angle - ARROW_HEAD_ANGLE).sin()),
        right: Point::new(b.x - size * (angle + ARROW_HEAD_ANGLE).cos(), b.y - size * (angle + ARROW_HEAD_ANGLE).sin()),
    }
}

/// Build a wave that follows the sampled polyline.
///
/// The wave is sampled every quarter wavelength along the polyline's arc
/// length and offset perpendicular to the local direction. Fewer than two
/// distinct samples yield the samples unchanged.
#[must_use]
pub fn squiggly_wave(samples: &[Point]) -> Vec<Point> {
    let segments: Vec<(Point, Point, f64)> = samples
        .windows(2)
        .filter_map(|w| {
            let len = w[0].distance_to(w[1]);
            (len > f64::EPSILON).then_some((w[0], w[1], len))
        })
        .collect();
    let total: f64 = segments.iter().map(|s| s.2).sum();
    if segments.is_empty() || total <= f64::EPSILON {
        return samples.to_vec();
    }

    let step = SQUIGGLY_WAVELENGTH / 4.0;
    let mut out = Vec::new();
    let mut travelled = 0.0;
    let mut seg_start = 0.0;
    let mut seg_iter = segments.iter();
    let mut current = seg_iter.next();
    while let Some(&(a, b, len)) = current {
        if travelled > seg_start + len {
            seg_start += len;
            current = seg_iter.next();
            continue;
        }
        let t = ((travelled - seg_start) / len).clamp(0.0, 1.0);
        let (ux, uy) = ((b.x - a.x) / len, (b.y - a.y) / len);
        let phase = (travelled / SQUIGGLY_WAVELENGTH) * std::f64::consts::TAU;
        let offset = SQUIGGLY_AMPLITUDE * phase.sin();
        out.push(Point::new(a.x + (b.x - a.x) * t - uy * offset, a.y + (b.y - a.y) * t + ux * offset));
        if travelled >= total {
            break;
        }
        travelled = (travelled + step).min(total);
    }
    out
}

/// Estimated rendered height of wrapped text.
#[must_use]
pub fn text_height(text: &str, font_size: f64) -> f64 {
    let lines = text.lines().count().max(1);
    #[allow(clippy::cast_precision_loss)]
    let lines = lines as f64;
    lines * font_size * 1.25
}

fn remap(p: Point, from: &Bounds, to: &Bounds) -> Point {
    let fx = if from.width > f64::EPSILON { (p.x - from.x) / from.width } else { 0.0 };
    let fy = if from.height > f64::EPSILON { (p.y - from.y) / from.height } else { 0.0 };
    Point::new(to.x + fx * to.width, to.y + fy * to.height)
}

// =============================================================
// Scene store
// =============================================================

/// Insertion-ordered store of one layer's objects.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    objects: Vec<AnnotationObject>,
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self { objects: Vec::new() }
    }

    /// Insert on top, or replace in place if the id already exists.
    pub fn insert(&mut self, obj: AnnotationObject) {
        match self.position(&obj.id) {
            Some(idx) => self.objects[idx] = obj,
            None => self.objects.push(obj),
        }
    }

    /// Insert at a paint position (clamped), used when recomposing groups.
    pub fn insert_at(&mut self, index: usize, obj: AnnotationObject) {
        let index = index.min(self.objects.len());
        self.objects.insert(index, obj);
    }

    pub fn remove(&mut self, id: &ObjectId) -> Option<AnnotationObject> {
        let idx = self.position(id)?;
        Some(self.objects.remove(idx))
    }

    #[must_use]
    pub fn get(&self, id: &ObjectId) -> Option<&AnnotationObject> {
        self.objects.iter().find(|o| o.id == *id)
    }

    pub fn get_mut(&mut self, id: &ObjectId) -> Option<&mut AnnotationObject> {
        self.objects.iter_mut().find(|o| o.id == *id)
    }

    #[must_use]
    pub fn contains(&self, id: &ObjectId) -> bool {
        self.position(id).is_some()
    }

    /// Paint index of an object (0 = bottom).
    #[must_use]
    pub fn position(&self, id: &ObjectId) -> Option<usize> {
        self.objects.iter().position(|o| o.id == *id)
    }

    /// Objects bottom to top.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &AnnotationObject> {
        self.objects.iter()
    }

    /// Ids of every object matching `pred`, bottom to top.
    pub fn query<F>(&self, pred: F) -> Vec<ObjectId>
    where
        F: Fn(&AnnotationObject) -> bool,
    {
        self.objects.iter().filter(|o| pred(o)).map(|o| o.id).collect()
    }

    /// Topmost object matching `pred`.
    pub fn topmost<F>(&self, pred: F) -> Option<&AnnotationObject>
    where
        F: Fn(&AnnotationObject) -> bool,
    {
        self.objects.iter().rev().find(|o| pred(o))
    }

    /// Replace every object, keeping the given order.
    pub fn replace_all(&mut self, objects: Vec<AnnotationObject>) {
        self.objects = objects;
    }

    pub fn clear(&mut self) {
        self.objects.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
