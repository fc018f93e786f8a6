//! Rendering: draws one layer's scene onto its own 2D context.
//!
//! This module is the only place that touches [`web_sys::CanvasRenderingContext2d`].
//! It receives a read-only view of one layer and the camera and produces
//! pixels. Geometry is drawn in page units under a `zoom × dpr` transform, so
//! stored coordinates are never rewritten for display.
//!
//! All fallible `Canvas2D` calls propagate errors via `Result<_, JsValue>`.
//! The top-level caller ([`crate::engine::Engine::render`]) handles the result.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::{CanvasRenderingContext2d, HtmlImageElement};

use crate::camera::{Bounds, Camera, Point};
use crate::config::EngineConfig;
use crate::consts::{HANDLE_RADIUS_PX, TEXT_PADDING};
use crate::doc::{AnnotationObject, Paint, Shape, StampShape};
use crate::hit::ResizeAnchor;
use crate::input::{InputState, UiState};
use crate::layer::LayerCanvas;
use crate::tools::brush_paint;

/// Selection dash segment length in screen pixels.
const SELECTION_DASH_PX: f64 = 4.0;
const SELECTION_COLOR: &str = "#1E90FF";
const LINK_FILL: &str = "rgba(30, 144, 255, 0.10)";
const IMAGE_PLACEHOLDER: &str = "rgba(60, 64, 70, 0.12)";
/// Line height as a multiple of font size; matches [`crate::doc::text_height`].
const LINE_HEIGHT: f64 = 1.25;

/// Everything a layer draw needs besides the layer itself.
pub struct Frame<'a> {
    pub camera: &'a Camera,
    pub ui: &'a UiState,
    pub config: &'a EngineConfig,
    /// Page bitmap, drawn under the reserved layer's objects.
    pub page_image: Option<&'a HtmlImageElement>,
    /// Page size in page units.
    pub page_size: (f64, f64),
    /// Draw selection handles and the in-progress freehand stroke.
    pub active: bool,
}

/// Decoded bitmaps for `image` objects, keyed by source.
#[derive(Debug, Default)]
pub struct ImageCache {
    images: HashMap<String, HtmlImageElement>,
}

impl ImageCache {
    fn get(&mut self, src: &str) -> Result<&HtmlImageElement, JsValue> {
        match self.images.entry(src.to_owned()) {
            Entry::Occupied(e) => Ok(e.into_mut()),
            Entry::Vacant(v) => {
                let img = HtmlImageElement::new()?;
                img.set_src(src);
                Ok(v.insert(img))
            }
        }
    }
}

/// Draw one layer: page bitmap (reserved layer only), objects in z-order,
/// then the active layer's gesture and selection UI.
///
/// Returns `Ok(false)` if some image was still loading and was drawn as a
/// placeholder; the caller should keep the layer dirty and try again.
///
/// # Errors
///
/// Returns `Err` if any `Canvas2D` call fails (e.g. invalid context state).
pub fn draw_layer(
    ctx: &CanvasRenderingContext2d,
    canvas: &LayerCanvas,
    frame: &Frame<'_>,
    images: &mut ImageCache,
) -> Result<bool, JsValue> {
    let scale = frame.camera.scale();
    let (page_w, page_h) = frame.page_size;

    ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)?;
    ctx.clear_rect(0.0, 0.0, (page_w * scale).ceil(), (page_h * scale).ceil());
    ctx.set_transform(scale, 0.0, 0.0, scale, 0.0, 0.0)?;

    if let Some(img) = frame.page_image {
        if img.complete() && img.natural_width() > 0 {
            ctx.draw_image_with_html_image_element_and_dw_and_dh(img, 0.0, 0.0, page_w, page_h)?;
        }
    }

    let mut complete = true;
    for obj in canvas.scene().iter() {
        complete &= draw_object(ctx, obj, images)?;
    }

    if frame.active {
        if let InputState::Capturing { brush, points } = &canvas.dispatch().input {
            let paint = brush_paint(*brush, &frame.ui.options, frame.config);
            ctx.save();
            apply_paint(ctx, &paint);
            stroke_polyline(ctx, points);
            ctx.restore();
        }
        if let Some(obj) = canvas.dispatch().selected.and_then(|id| canvas.get(&id)) {
            let handles = canvas.interactivity(&obj.id).movable;
            draw_selection(ctx, obj, frame.camera.zoom(), handles)?;
        }
    }
    Ok(complete)
}

// =============================================================
// Object dispatch
// =============================================================

/// Run `draw` between `save` and `restore`, restoring even when it fails.
fn with_saved_state<T>(
    ctx: &CanvasRenderingContext2d,
    draw: impl FnOnce() -> Result<T, JsValue>,
) -> Result<T, JsValue> {
    ctx.save();
    let drawn = draw();
    ctx.restore();
    drawn
}

fn draw_object(ctx: &CanvasRenderingContext2d, obj: &AnnotationObject, images: &mut ImageCache) -> Result<bool, JsValue> {
    with_saved_state(ctx, || draw_shape(ctx, obj, images))
}

fn draw_shape(ctx: &CanvasRenderingContext2d, obj: &AnnotationObject, images: &mut ImageCache) -> Result<bool, JsValue> {
    apply_paint(ctx, &obj.paint);
    rotate_about_center(ctx, obj)?;

    let mut complete = true;
    match &obj.shape {
        Shape::FreehandPath(p) => stroke_polyline(ctx, &p.points),
        Shape::Squiggly(s) => stroke_polyline(ctx, &s.points),
        Shape::Rect(b) => draw_box(ctx, &b.bounds, &obj.paint),
        Shape::Ellipse(b) => draw_ellipse(ctx, &b.bounds, &obj.paint)?,
        Shape::Line(l) => stroke_polyline(ctx, &[l.a, l.b]),
        Shape::Arrow(a) => {
            stroke_polyline(ctx, &[a.a, a.b]);
            if let Some(head) = a.head {
                ctx.begin_path();
                ctx.move_to(head.tip.x, head.tip.y);
                ctx.line_to(head.left.x, head.left.y);
                ctx.line_to(head.right.x, head.right.y);
                ctx.close_path();
                ctx.set_fill_style_str(obj.paint.stroke.as_deref().unwrap_or("#000"));
                ctx.fill();
            }
        }
        Shape::Text(t) => {
            let color = obj.paint.stroke.as_deref().unwrap_or("#000");
            draw_text(ctx, &t.text, t.at, t.font_size, color)?;
        }
        Shape::Note(t) | Shape::Callout(t) => {
            draw_box(ctx, &t.bounds, &obj.paint);
            let color = obj.paint.stroke.as_deref().unwrap_or("#000");
            let at = Point::new(t.bounds.x + TEXT_PADDING, t.bounds.y + TEXT_PADDING);
            draw_text(ctx, &t.text, at, t.font_size, color)?;
        }
        Shape::Stamp(s) => draw_stamp(ctx, s)?,
        Shape::Checkmark(b) => {
            let r = &b.bounds;
            stroke_polyline(
                ctx,
                &[
                    Point::new(r.x + r.width * 0.15, r.y + r.height * 0.55),
                    Point::new(r.x + r.width * 0.4, r.y + r.height * 0.8),
                    Point::new(r.x + r.width * 0.85, r.y + r.height * 0.2),
                ],
            );
        }
        Shape::Cross(b) => {
            let r = &b.bounds;
            stroke_polyline(ctx, &[Point::new(r.x, r.y), Point::new(r.right(), r.bottom())]);
            stroke_polyline(ctx, &[Point::new(r.right(), r.y), Point::new(r.x, r.bottom())]);
        }
        Shape::Image(i) => {
            let img = images.get(&i.src)?;
            if img.complete() && img.natural_width() > 0 {
                ctx.draw_image_with_html_image_element_and_dw_and_dh(
                    img,
                    i.bounds.x,
                    i.bounds.y,
                    i.bounds.width,
                    i.bounds.height,
                )?;
            } else {
                // Still loading, or failed to decode (complete with no size).
                complete = img.complete();
                ctx.set_fill_style_str(IMAGE_PLACEHOLDER);
                ctx.fill_rect(i.bounds.x, i.bounds.y, i.bounds.width, i.bounds.height);
            }
        }
        Shape::LinkRegion(l) => {
            ctx.set_fill_style_str(LINK_FILL);
            ctx.fill_rect(l.bounds.x, l.bounds.y, l.bounds.width, l.bounds.height);
            set_dash(ctx, 4.0)?;
            ctx.stroke_rect(l.bounds.x, l.bounds.y, l.bounds.width, l.bounds.height);
            clear_dash(ctx)?;
        }
    }

    Ok(complete)
}

// =============================================================
// Shape renderers
// =============================================================

fn draw_box(ctx: &CanvasRenderingContext2d, b: &Bounds, paint: &Paint) {
    if paint.fill.is_some() {
        ctx.fill_rect(b.x, b.y, b.width, b.height);
    }
    if paint.stroke.is_some() {
        ctx.stroke_rect(b.x, b.y, b.width, b.height);
    }
}

fn draw_ellipse(ctx: &CanvasRenderingContext2d, b: &Bounds, paint: &Paint) -> Result<(), JsValue> {
    if b.width <= 0.0 || b.height <= 0.0 {
        return Ok(());
    }
    let c = b.center();
    ctx.begin_path();
    ctx.ellipse(c.x, c.y, b.width / 2.0, b.height / 2.0, 0.0, 0.0, 2.0 * PI)?;
    if paint.fill.is_some() {
        ctx.fill();
    }
    if paint.stroke.is_some() {
        ctx.stroke();
    }
    Ok(())
}

fn draw_stamp(ctx: &CanvasRenderingContext2d, s: &StampShape) -> Result<(), JsValue> {
    let b = &s.bounds;
    let color = s.stamp.color();
    ctx.set_stroke_style_str(color);
    ctx.stroke_rect(b.x, b.y, b.width, b.height);

    let c = b.center();
    ctx.set_fill_style_str(color);
    ctx.set_text_align("center");
    ctx.set_text_baseline("middle");
    ctx.set_font(&format!("bold {:.0}px sans-serif", b.height * 0.45));
    ctx.fill_text(s.stamp.label(), c.x, c.y)?;
    Ok(())
}

/// Hard line breaks only; soft wrapping is left to the host editor.
fn draw_text(ctx: &CanvasRenderingContext2d, text: &str, at: Point, font_size: f64, color: &str) -> Result<(), JsValue> {
    ctx.set_fill_style_str(color);
    ctx.set_text_align("left");
    ctx.set_text_baseline("top");
    ctx.set_font(&format!("{font_size:.0}px sans-serif"));
    let mut y = at.y;
    for line in text.lines() {
        ctx.fill_text(line, at.x, y)?;
        y += font_size * LINE_HEIGHT;
    }
    Ok(())
}

fn stroke_polyline(ctx: &CanvasRenderingContext2d, points: &[Point]) {
    let Some((first, rest)) = points.split_first() else {
        return;
    };
    ctx.begin_path();
    ctx.move_to(first.x, first.y);
    if rest.iter().all(|p| p == first) {
        // Zero-length segments only show with a round cap.
        ctx.line_to(first.x + 0.01, first.y);
    }
    for p in rest {
        ctx.line_to(p.x, p.y);
    }
    ctx.stroke();
}

// =============================================================
// Selection UI
// =============================================================

fn draw_selection(ctx: &CanvasRenderingContext2d, obj: &AnnotationObject, zoom: f64, handles: bool) -> Result<(), JsValue> {
    let b = obj.bounds();
    let pad = 2.0 / zoom;

    with_saved_state(ctx, || {
        ctx.set_global_alpha(1.0);
        ctx.set_stroke_style_str(SELECTION_COLOR);
        ctx.set_line_width(1.0 / zoom);
        set_dash(ctx, SELECTION_DASH_PX / zoom)?;
        ctx.stroke_rect(b.x - pad, b.y - pad, b.width + pad * 2.0, b.height + pad * 2.0);
        clear_dash(ctx)?;

        if handles {
            let half = HANDLE_RADIUS_PX / 2.0 / zoom;
            ctx.set_fill_style_str("#fff");
            for anchor in ResizeAnchor::ALL {
                let pos = anchor.position(&b);
                ctx.fill_rect(pos.x - half, pos.y - half, half * 2.0, half * 2.0);
                ctx.stroke_rect(pos.x - half, pos.y - half, half * 2.0, half * 2.0);
            }
        }
        Ok(())
    })
}

// =============================================================
// Helpers
// =============================================================

fn apply_paint(ctx: &CanvasRenderingContext2d, paint: &Paint) {
    ctx.set_global_alpha(paint.opacity.clamp(0.0, 1.0));
    ctx.set_line_width(paint.stroke_width);
    ctx.set_line_cap("round");
    ctx.set_line_join("round");
    if let Some(stroke) = &paint.stroke {
        ctx.set_stroke_style_str(stroke);
    }
    if let Some(fill) = &paint.fill {
        ctx.set_fill_style_str(fill);
    }
}

/// Rotate the context by the object's angle around its bounds center.
fn rotate_about_center(ctx: &CanvasRenderingContext2d, obj: &AnnotationObject) -> Result<(), JsValue> {
    if obj.angle.abs() < f64::EPSILON {
        return Ok(());
    }
    let c = obj.bounds().center();
    ctx.translate(c.x, c.y)?;
    ctx.rotate(obj.angle.to_radians())?;
    ctx.translate(-c.x, -c.y)?;
    Ok(())
}

fn set_dash(ctx: &CanvasRenderingContext2d, len: f64) -> Result<(), JsValue> {
    let dash_array = js_sys::Array::new();
    dash_array.push(&len.into());
    dash_array.push(&len.into());
    ctx.set_line_dash(&dash_array)
}

fn clear_dash(ctx: &CanvasRenderingContext2d) -> Result<(), JsValue> {
    ctx.set_line_dash(&js_sys::Array::new())
}
