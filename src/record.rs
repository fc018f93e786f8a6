//! Serialization boundary: annotation objects to and from persistable JSON records.
//!
//! DESIGN
//! ======
//! A record is a flat camelCase JSON object:
//! `{ id, type, layerId, <geometry by type>, stroke, strokeWidth, fill,
//! opacity, angle, text?, link?, group? }`. Geometry is page space.
//!
//! Keys this engine does not know are carried in
//! [`AnnotationObject::extra`] and written back unchanged, so records
//! produced by newer clients survive a load/save cycle here.
//!
//! ERROR HANDLING
//! ==============
//! A record missing a field its declared type requires is rejected with a
//! [`LoadError`]. Scene loads skip rejected records, report them, and keep
//! going; one bad record never blocks the rest of a layer.

#[cfg(test)]
#[path = "record_test.rs"]
mod record_test;

use std::collections::HashSet;

use serde_json::{Map, Value, json};
use uuid::Uuid;

use crate::camera::{Bounds, Point};
use crate::doc::{
    AnnotationObject, ArrowHead, ArrowShape, BoxShape, BrushKind, ImageShape, LayerId, LineShape, LinkShape,
    ObjectId, ObjectKind, Paint, PathShape, Shape, SquigglyShape, StampKind, StampShape, TextBoxShape, TextShape,
};
use crate::error::ErrorCode;

/// Why a record could not be turned into an object.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    #[error("record is not a JSON object")]
    NotAnObject,
    #[error("unknown object type: {0}")]
    UnknownType(String),
    #[error("{kind} record missing required field `{field}`")]
    MissingField { kind: &'static str, field: &'static str },
    #[error("field `{field}` has the wrong type")]
    InvalidField { field: &'static str },
    #[error("record belongs to layer {found}, expected {expected}")]
    LayerMismatch { expected: LayerId, found: LayerId },
    #[error("object {0} already loaded")]
    DuplicateId(ObjectId),
}

impl ErrorCode for LoadError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::DuplicateId(_) => "E_LOAD_DUPLICATE",
            _ => "E_LOAD_MALFORMED",
        }
    }
}

/// One record that was skipped during a scene load.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRecord {
    /// Position of the record in the input slice.
    pub index: usize,
    pub error: LoadError,
}

/// Outcome of loading a list of records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub objects: Vec<AnnotationObject>,
    pub skipped: Vec<SkippedRecord>,
}

const COMMON_KEYS: [&str; 10] = ["id", "type", "layerId", "stroke", "strokeWidth", "fill", "opacity", "angle", "link", "group"];

/// Geometry keys owned by each type; everything else is extra.
fn geometry_keys(kind: ObjectKind) -> &'static [&'static str] {
    match kind {
        ObjectKind::FreehandPath => &["points", "brush"],
        ObjectKind::Squiggly => &["points"],
        ObjectKind::Rect | ObjectKind::Ellipse | ObjectKind::Checkmark | ObjectKind::Cross => {
            &["x", "y", "width", "height"]
        }
        ObjectKind::Line => &["x1", "y1", "x2", "y2"],
        ObjectKind::Arrow => &["x1", "y1", "x2", "y2", "head"],
        ObjectKind::Text => &["x", "y", "width", "fontSize", "text"],
        ObjectKind::Note | ObjectKind::Callout => &["x", "y", "width", "height", "fontSize", "text"],
        ObjectKind::Stamp => &["x", "y", "width", "height", "stamp"],
        ObjectKind::Image => &["x", "y", "width", "height", "src"],
        ObjectKind::LinkRegion => &["x", "y", "width", "height", "url"],
    }
}

// =============================================================
// Object → record
// =============================================================

/// Serialize one object to its record form.
#[must_use]
pub fn to_record(obj: &AnnotationObject) -> Value {
    let mut map = obj.extra.clone();
    map.insert("id".into(), json!(obj.id.to_string()));
    map.insert("type".into(), json!(obj.kind().as_str()));
    map.insert("layerId".into(), json!(obj.layer_id.as_str()));
    map.insert("stroke".into(), obj.paint.stroke.as_ref().map_or(Value::Null, |s| json!(s)));
    map.insert("strokeWidth".into(), json!(obj.paint.stroke_width));
    map.insert("fill".into(), obj.paint.fill.as_ref().map_or(Value::Null, |s| json!(s)));
    map.insert("opacity".into(), json!(obj.paint.opacity));
    map.insert("angle".into(), json!(obj.angle));
    if let Some(link) = &obj.link {
        map.insert("link".into(), json!(link));
    }
    if let Some(group) = &obj.group {
        map.insert("group".into(), json!(group.to_string()));
    }

    match &obj.shape {
        Shape::FreehandPath(p) => {
            map.insert("points".into(), points_value(&p.points));
            map.insert("brush".into(), json!(p.brush.as_str()));
        }
        Shape::Squiggly(s) => {
            map.insert("points".into(), points_value(&s.points));
        }
        Shape::Rect(s) | Shape::Ellipse(s) | Shape::Checkmark(s) | Shape::Cross(s) => put_bounds(&mut map, &s.bounds),
        Shape::Line(l) => put_segment(&mut map, l.a, l.b),
        Shape::Arrow(a) => {
            put_segment(&mut map, a.a, a.b);
            if let Some(h) = &a.head {
                map.insert(
                    "head".into(),
                    json!({ "tip": point_value(h.tip), "left": point_value(h.left), "right": point_value(h.right) }),
                );
            }
        }
        Shape::Text(t) => {
            map.insert("x".into(), json!(t.at.x));
            map.insert("y".into(), json!(t.at.y));
            map.insert("width".into(), json!(t.width));
            map.insert("fontSize".into(), json!(t.font_size));
            map.insert("text".into(), json!(t.text));
        }
        Shape::Note(t) | Shape::Callout(t) => {
            put_bounds(&mut map, &t.bounds);
            map.insert("fontSize".into(), json!(t.font_size));
            map.insert("text".into(), json!(t.text));
        }
        Shape::Stamp(s) => {
            put_bounds(&mut map, &s.bounds);
            map.insert("stamp".into(), json!(s.stamp.label()));
        }
        Shape::Image(i) => {
            put_bounds(&mut map, &i.bounds);
            map.insert("src".into(), json!(i.src));
        }
        Shape::LinkRegion(l) => {
            put_bounds(&mut map, &l.bounds);
            map.insert("url".into(), json!(l.url));
        }
    }
    Value::Object(map)
}

/// Serialize a list of objects in paint order.
pub fn to_records<'a, I>(objects: I) -> Vec<Value>
where
    I: IntoIterator<Item = &'a AnnotationObject>,
{
    objects.into_iter().map(to_record).collect()
}

fn point_value(p: Point) -> Value {
    json!({ "x": p.x, "y": p.y })
}

fn points_value(points: &[Point]) -> Value {
    Value::Array(points.iter().map(|p| point_value(*p)).collect())
}

fn put_bounds(map: &mut Map<String, Value>, b: &Bounds) {
    map.insert("x".into(), json!(b.x));
    map.insert("y".into(), json!(b.y));
    map.insert("width".into(), json!(b.width));
    map.insert("height".into(), json!(b.height));
}

fn put_segment(map: &mut Map<String, Value>, a: Point, b: Point) {
    map.insert("x1".into(), json!(a.x));
    map.insert("y1".into(), json!(a.y));
    map.insert("x2".into(), json!(b.x));
    map.insert("y2".into(), json!(b.y));
}

// =============================================================
// Record → object
// =============================================================

/// Typed access to a record's fields, reporting errors against its type.
struct Fields<'a> {
    map: &'a Map<String, Value>,
    kind: &'static str,
}

impl<'a> Fields<'a> {
    fn get(&self, field: &'static str) -> Result<&'a Value, LoadError> {
        match self.map.get(field) {
            Some(v) if !v.is_null() => Ok(v),
            _ => Err(LoadError::MissingField { kind: self.kind, field }),
        }
    }

    fn f64(&self, field: &'static str) -> Result<f64, LoadError> {
        self.get(field)?.as_f64().ok_or(LoadError::InvalidField { field })
    }

    fn f64_or(&self, field: &'static str, default: f64) -> Result<f64, LoadError> {
        match self.map.get(field) {
            None | Some(Value::Null) => Ok(default),
            Some(v) => v.as_f64().ok_or(LoadError::InvalidField { field }),
        }
    }

    fn str(&self, field: &'static str) -> Result<&'a str, LoadError> {
        self.get(field)?.as_str().ok_or(LoadError::InvalidField { field })
    }

    fn opt_str(&self, field: &'static str) -> Result<Option<String>, LoadError> {
        match self.map.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(v) => v.as_str().map(|s| Some(s.to_owned())).ok_or(LoadError::InvalidField { field }),
        }
    }

    fn bounds(&self) -> Result<Bounds, LoadError> {
        Ok(Bounds::new(self.f64("x")?, self.f64("y")?, self.f64("width")?, self.f64("height")?))
    }

    fn segment(&self) -> Result<(Point, Point), LoadError> {
        Ok((Point::new(self.f64("x1")?, self.f64("y1")?), Point::new(self.f64("x2")?, self.f64("y2")?)))
    }

    fn points(&self, field: &'static str) -> Result<Vec<Point>, LoadError> {
        let raw = self.get(field)?.as_array().ok_or(LoadError::InvalidField { field })?;
        raw.iter()
            .map(|v| parse_point(v).ok_or(LoadError::InvalidField { field }))
            .collect()
    }
}

/// Accept `{ "x": .., "y": .. }` or `[x, y]`.
fn parse_point(v: &Value) -> Option<Point> {
    if let Some(arr) = v.as_array() {
        return match arr.as_slice() {
            [x, y] => Some(Point::new(x.as_f64()?, y.as_f64()?)),
            _ => None,
        };
    }
    Some(Point::new(v.get("x")?.as_f64()?, v.get("y")?.as_f64()?))
}

fn parse_head(v: &Value) -> Option<ArrowHead> {
    Some(ArrowHead { tip: parse_point(v.get("tip")?)?, left: parse_point(v.get("left")?)?, right: parse_point(v.get("right")?)? })
}

/// Parse one record into an object.
///
/// # Errors
///
/// Returns a [`LoadError`] when the record is not an object, declares an
/// unknown type, or lacks a field its type requires.
pub fn from_record(value: &Value) -> Result<AnnotationObject, LoadError> {
    let map = value.as_object().ok_or(LoadError::NotAnObject)?;
    let raw_type = map
        .get("type")
        .and_then(Value::as_str)
        .ok_or(LoadError::MissingField { kind: "object", field: "type" })?;
    let kind = ObjectKind::parse(raw_type).ok_or_else(|| LoadError::UnknownType(raw_type.to_owned()))?;
    let f = Fields { map, kind: kind.as_str() };

    let id = Uuid::parse_str(f.str("id")?).map_err(|_| LoadError::InvalidField { field: "id" })?;
    let layer_id = LayerId::new(f.str("layerId")?);

    let shape = match kind {
        ObjectKind::FreehandPath => {
            let brush = match f.opt_str("brush")? {
                Some(raw) => BrushKind::parse(&raw).ok_or(LoadError::InvalidField { field: "brush" })?,
                None => BrushKind::Draw,
            };
            Shape::FreehandPath(PathShape { points: f.points("points")?, brush })
        }
        ObjectKind::Squiggly => Shape::Squiggly(SquigglyShape { points: f.points("points")? }),
        ObjectKind::Rect => Shape::Rect(BoxShape { bounds: f.bounds()? }),
        ObjectKind::Ellipse => Shape::Ellipse(BoxShape { bounds: f.bounds()? }),
        ObjectKind::Checkmark => Shape::Checkmark(BoxShape { bounds: f.bounds()? }),
        ObjectKind::Cross => Shape::Cross(BoxShape { bounds: f.bounds()? }),
        ObjectKind::Line => {
            let (a, b) = f.segment()?;
            Shape::Line(LineShape { a, b })
        }
        ObjectKind::Arrow => {
            let (a, b) = f.segment()?;
            let head = match map.get("head") {
                None | Some(Value::Null) => None,
                Some(v) => Some(parse_head(v).ok_or(LoadError::InvalidField { field: "head" })?),
            };
            Shape::Arrow(ArrowShape { a, b, head })
        }
        ObjectKind::Text => Shape::Text(TextShape {
            at: Point::new(f.f64("x")?, f.f64("y")?),
            width: f.f64("width")?,
            font_size: f.f64("fontSize")?,
            text: f.str("text")?.to_owned(),
        }),
        ObjectKind::Note | ObjectKind::Callout => {
            let body = TextBoxShape { bounds: f.bounds()?, font_size: f.f64("fontSize")?, text: f.str("text")?.to_owned() };
            if kind == ObjectKind::Note {
                Shape::Note(body)
            } else {
                Shape::Callout(body)
            }
        }
        ObjectKind::Stamp => Shape::Stamp(StampShape {
            bounds: f.bounds()?,
            stamp: StampKind::parse(f.str("stamp")?).ok_or(LoadError::InvalidField { field: "stamp" })?,
        }),
        ObjectKind::Image => Shape::Image(ImageShape { bounds: f.bounds()?, src: f.str("src")?.to_owned() }),
        ObjectKind::LinkRegion => Shape::LinkRegion(LinkShape { bounds: f.bounds()?, url: f.str("url")?.to_owned() }),
    };

    let defaults = Paint::default();
    let paint = Paint {
        stroke: if map.contains_key("stroke") { f.opt_str("stroke")? } else { defaults.stroke },
        stroke_width: f.f64_or("strokeWidth", defaults.stroke_width)?,
        fill: f.opt_str("fill")?,
        opacity: f.f64_or("opacity", defaults.opacity)?.clamp(0.0, 1.0),
    };

    let group = match f.opt_str("group")? {
        Some(raw) => Some(Uuid::parse_str(&raw).map_err(|_| LoadError::InvalidField { field: "group" })?),
        None => None,
    };

    let known = geometry_keys(kind);
    let extra = map
        .iter()
        .filter(|(k, _)| !COMMON_KEYS.contains(&k.as_str()) && !known.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    Ok(AnnotationObject {
        id,
        layer_id,
        shape,
        paint,
        angle: f.f64_or("angle", 0.0)?,
        link: f.opt_str("link")?,
        group,
        extra,
    })
}

/// Parse records destined for `layer_id`, skipping malformed ones.
///
/// Records whose `layerId` names another layer are skipped too: an object's
/// layer never changes after creation. The first record with a given id
/// wins; later ones are skipped.
#[must_use]
pub fn load_records(layer_id: &LayerId, records: &[Value]) -> LoadReport {
    let mut report = LoadReport::default();
    let mut seen = HashSet::new();
    for (index, record) in records.iter().enumerate() {
        let parsed = from_record(record).and_then(|obj| {
            if obj.layer_id != *layer_id {
                Err(LoadError::LayerMismatch { expected: layer_id.clone(), found: obj.layer_id })
            } else if seen.contains(&obj.id) {
                Err(LoadError::DuplicateId(obj.id))
            } else {
                Ok(obj)
            }
        });
        match parsed {
            Ok(obj) => {
                seen.insert(obj.id);
                report.objects.push(obj);
            }
            Err(error) => {
                tracing::warn!(%layer_id, index, error = %error, "skipping malformed annotation record");
                report.skipped.push(SkippedRecord { index, error });
            }
        }
    }
    report
}
