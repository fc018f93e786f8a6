//! Tool dispatch state machine, one per layer canvas.
//!
//! DESIGN
//! ======
//! Pointer and key events reach a layer only after the stack has checked
//! that the layer is active, visible and unlocked. Each handler reads the
//! current [`Tool`] from the shared [`UiState`] and follows one of four
//! patterns:
//!
//! - click-to-place: pointer-down builds a complete object, snapshots, and
//!   reverts the tool to select;
//! - drag-to-draw: pointer-down inserts a provisional zero-size object,
//!   moves reshape it, pointer-up finalizes or discards it;
//! - freehand: points are captured in the gesture state and become one path
//!   object on release;
//! - select / eraser / hand: act on existing objects or the viewport.
//!
//! Handlers return [`Action`]s for the host. Discrete changes snapshot
//! immediately; drags, resizes and typing arm the history debounce.

#[cfg(test)]
#[path = "tools_test.rs"]
mod tools_test;

use std::collections::HashSet;

use tracing::debug;

use crate::camera::{Bounds, Camera, Point};
use crate::config::EngineConfig;
use crate::consts::{
    CALLOUT_ARROW_OFFSET, CALLOUT_HEIGHT, CALLOUT_WIDTH, CHECK_COLOR, CROSS_COLOR, GLYPH_SIZE, HANDLE_RADIUS_PX,
    HIGHLIGHT_COLOR, IMAGE_MAX_SIZE, LINK_HEIGHT, LINK_WIDTH, NOTE_FILL, NOTE_HEIGHT, NOTE_WIDTH, SIGNATURE_COLOR,
    SIGNATURE_WIDTH, STAMP_HEIGHT, STAMP_WIDTH, TEXT_WIDTH,
};
use crate::doc::{
    AnnotationObject, ArrowShape, BoxShape, BrushKind, ImageShape, LineShape, LinkShape, ObjectId, ObjectKind,
    ObjectPatch, Paint, PathShape, SceneError, Shape, SquigglyShape, StampShape, TextBoxShape, TextShape, arrow_head,
    squiggly_wave,
};
use crate::edit::{EditKey, EditSession};
use crate::engine::Action;
use crate::error::ErrorCode;
use crate::hit::{hit_handle, hit_object, topmost_at, touches_circle};
use crate::input::{Button, InputState, Key, Modifiers, PointerEvent, Tool, ToolOptions, ToolPattern, UiState};
use crate::layer::LayerCanvas;

/// Per-layer machine state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolDispatch {
    pub input: InputState,
    pub selected: Option<ObjectId>,
    pub editing: Option<EditSession>,
    /// Page point where an image will land once the host has decoded it.
    pub pending_image: Option<Point>,
}

/// Shared state a tool handler reads and may change.
pub struct ToolContext<'a> {
    pub camera: &'a mut Camera,
    pub ui: &'a mut UiState,
    pub config: &'a EngineConfig,
}

impl ToolContext<'_> {
    /// Hit tolerance in page units: a fixed screen distance at any zoom.
    fn slop(&self) -> f64 {
        self.camera.screen_dist_to_page(HANDLE_RADIUS_PX)
    }

    fn eraser_radius(&self) -> f64 {
        self.ui.options.stroke_width * self.config.eraser_radius_factor
    }
}

impl LayerCanvas {
    // =============================================================
    // Pointer events
    // =============================================================

    pub fn pointer_down(&mut self, ev: &PointerEvent, ctx: &mut ToolContext<'_>) -> Vec<Action> {
        if ev.button != Button::Primary {
            return Vec::new();
        }
        let p = ctx.camera.screen_to_page(ev.screen);
        let mut actions = Vec::new();

        if let Some(session) = &self.dispatch.editing {
            let on_editor = self.scene.iter().any(|o| session.owns(&o.id) && hit_object(o, p, ctx.slop()));
            if on_editor {
                return actions;
            }
            actions.extend(self.commit_edit());
        }

        match ctx.ui.tool {
            Tool::Select => actions.extend(self.select_down(p, ctx)),
            Tool::Eraser => actions.extend(self.erase_down(p, ctx)),
            Tool::Hand => {
                self.dispatch.input = InputState::Panning { last_screen: ev.screen };
                actions.push(Action::SetCursor("grabbing".into()));
            }
            tool => match tool.pattern() {
                ToolPattern::ClickToPlace => actions.extend(self.place(tool, p, ctx)),
                ToolPattern::DragToDraw => {
                    // Settle the previous drag before a provisional shape enters the scene.
                    actions.extend(self.flush_pending());
                    actions.extend(self.start_shape(tool, p, ctx));
                }
                ToolPattern::Freehand => {
                    let brush = tool.brush().unwrap_or_default();
                    self.dispatch.input = InputState::Capturing { brush, points: vec![p] };
                    actions.push(self.render_needed());
                }
                ToolPattern::Direct => {}
            },
        }
        actions
    }

    pub fn pointer_move(&mut self, ev: &PointerEvent, ctx: &mut ToolContext<'_>) -> Vec<Action> {
        let p = ctx.camera.screen_to_page(ev.screen);
        let state = std::mem::take(&mut self.dispatch.input);
        let (next, actions) = match state {
            InputState::Idle => (InputState::Idle, self.hover(p, ctx)),
            InputState::Panning { last_screen } => {
                ctx.camera.pan_by(ev.screen.x - last_screen.x, ev.screen.y - last_screen.y);
                let action =
                    Action::ViewportChanged { pan_x: ctx.camera.pan_x, pan_y: ctx.camera.pan_y, zoom: ctx.camera.zoom() };
                (InputState::Panning { last_screen: ev.screen }, vec![action])
            }
            InputState::DraggingObject { id, last_page, .. } => {
                let actions = self.drag_object(id, p.x - last_page.x, p.y - last_page.y, ev.time_ms);
                (InputState::DraggingObject { id, last_page: p, moved: true }, actions)
            }
            InputState::ResizingObject { id, anchor, start_page, orig } => {
                let target = anchor.resize(&orig, p.x - start_page.x, p.y - start_page.y);
                let actions = self.reshape(id, &ObjectPatch::bounds(target), ev.time_ms);
                (InputState::ResizingObject { id, anchor, start_page, orig }, actions)
            }
            InputState::DrawingShape { id, anchor, mut samples } => {
                samples.push(p);
                let actions = self.stretch_shape(id, anchor, &samples);
                (InputState::DrawingShape { id, anchor, samples }, actions)
            }
            InputState::Capturing { brush, mut points } => {
                if points.last() != Some(&p) {
                    points.push(p);
                }
                (InputState::Capturing { brush, points }, vec![self.render_needed()])
            }
            InputState::Erasing { mut erased } => {
                let actions = self.erase_touching(p, &mut erased, ctx);
                (InputState::Erasing { erased }, actions)
            }
        };
        self.dispatch.input = next;
        actions
    }

    pub fn pointer_up(&mut self, ev: &PointerEvent, ctx: &mut ToolContext<'_>) -> Vec<Action> {
        let p = ctx.camera.screen_to_page(ev.screen);
        match std::mem::take(&mut self.dispatch.input) {
            InputState::Panning { .. } => vec![Action::SetCursor(ctx.ui.tool.cursor().into())],
            InputState::DrawingShape { id, anchor, mut samples } => {
                if samples.last() != Some(&p) {
                    samples.push(p);
                }
                let mut actions = self.stretch_shape(id, anchor, &samples);
                actions.extend(self.finish_shape(id, &samples, ctx));
                actions
            }
            InputState::Capturing { brush, mut points } => {
                if points.last() != Some(&p) {
                    points.push(p);
                }
                self.finish_freehand(brush, points, ctx)
            }
            // Drags and resizes settle through the pending debounce.
            InputState::Idle
            | InputState::DraggingObject { .. }
            | InputState::ResizingObject { .. }
            | InputState::Erasing { .. } => Vec::new(),
        }
    }

    /// Double-click with the select tool opens the text editor.
    pub fn double_click(&mut self, ev: &PointerEvent, ctx: &mut ToolContext<'_>) -> Vec<Action> {
        if ctx.ui.tool != Tool::Select {
            return Vec::new();
        }
        let p = ctx.camera.screen_to_page(ev.screen);
        let hit = topmost_at(&self.scene, p, ctx.slop(), |o| self.interactivity(&o.id).text_editable).map(|o| o.id);
        let Some(id) = hit else {
            return Vec::new();
        };
        self.dispatch.input = InputState::Idle;
        let mut actions = self.commit_edit();
        actions.extend(self.begin_edit(id));
        actions
    }

    // =============================================================
    // Keyboard
    // =============================================================

    pub fn key_down(&mut self, key: &Key, modifiers: Modifiers, now_ms: f64) -> Vec<Action> {
        if self.dispatch.editing.is_some() {
            return self.edit_key(key, modifiers, now_ms);
        }
        match key.as_str() {
            "Delete" | "Backspace" => self.delete_selection(),
            "Escape" => {
                let mut actions = self.cancel_gesture();
                actions.extend(self.clear_selection());
                actions
            }
            k if modifiers.command() && k.eq_ignore_ascii_case("z") => {
                if modifiers.shift {
                    self.absorb_history(LayerCanvas::redo)
                } else {
                    self.absorb_history(LayerCanvas::undo)
                }
            }
            k if modifiers.command() && k.eq_ignore_ascii_case("y") => self.absorb_history(LayerCanvas::redo),
            _ => Vec::new(),
        }
    }

    fn absorb_history<F>(&mut self, step: F) -> Vec<Action>
    where
        F: FnOnce(&mut LayerCanvas) -> Result<Vec<Action>, crate::layer::LayerError>,
    {
        match step(self) {
            Ok(actions) => actions,
            Err(e) => {
                debug!(layer_id = %self.layer.id, code = e.error_code(), error = %e, "history step ignored");
                Vec::new()
            }
        }
    }

    // =============================================================
    // Selection
    // =============================================================

    fn select_down(&mut self, p: Point, ctx: &ToolContext<'_>) -> Vec<Action> {
        let slop = ctx.slop();
        if let Some(id) = self.dispatch.selected {
            if self.interactivity(&id).movable {
                if let Some(orig) = self.scene.get(&id).map(AnnotationObject::bounds) {
                    if let Some(anchor) = hit_handle(&orig, p, slop) {
                        self.dispatch.input = InputState::ResizingObject { id, anchor, start_page: p, orig };
                        return vec![Action::SetCursor(anchor.cursor().into())];
                    }
                }
            }
        }

        let hit = topmost_at(&self.scene, p, slop, |o| self.interactivity(&o.id).selectable).map(|o| o.id);
        let Some(id) = hit else {
            return self.clear_selection();
        };
        let mut actions = Vec::new();
        if self.dispatch.selected != Some(id) {
            self.dispatch.selected = Some(id);
            actions.push(Action::SelectionChanged { layer_id: self.layer.id.clone(), id: Some(id) });
        }
        if self.interactivity(&id).movable {
            self.dispatch.input = InputState::DraggingObject { id, last_page: p, moved: false };
        }
        actions.push(self.render_needed());
        actions
    }

    pub fn clear_selection(&mut self) -> Vec<Action> {
        if self.dispatch.selected.take().is_none() {
            return Vec::new();
        }
        vec![Action::SelectionChanged { layer_id: self.layer.id.clone(), id: None }, self.render_needed()]
    }

    fn hover(&self, p: Point, ctx: &ToolContext<'_>) -> Vec<Action> {
        if ctx.ui.tool != Tool::Select {
            return Vec::new();
        }
        let slop = ctx.slop();
        if let Some(id) = self.dispatch.selected {
            let handle = self
                .scene
                .get(&id)
                .filter(|_| self.interactivity(&id).movable)
                .and_then(|o| hit_handle(&o.bounds(), p, slop));
            if let Some(anchor) = handle {
                return vec![Action::SetCursor(anchor.cursor().into())];
            }
        }
        let cursor = match topmost_at(&self.scene, p, slop, |o| self.interactivity(&o.id).selectable) {
            Some(o) if self.interactivity(&o.id).movable => "move",
            Some(_) => "pointer",
            None => "default",
        };
        vec![Action::SetCursor(cursor.into())]
    }

    /// Move an object and everything grouped to it.
    fn drag_object(&mut self, id: ObjectId, dx: f64, dy: f64, now_ms: f64) -> Vec<Action> {
        let mut ids = vec![id];
        ids.extend(self.scene.query(|o| o.group == Some(id)));
        let patch = ObjectPatch::translate(dx, dy);
        let mut changed = false;
        for member in &ids {
            match self.mutate(member, &patch) {
                Ok(c) => changed |= c,
                Err(e) => return self.absorbed(&e),
            }
        }
        if !changed {
            return Vec::new();
        }
        vec![
            Action::ObjectUpdated { layer_id: self.layer.id.clone(), id },
            self.schedule_snapshot(now_ms),
            self.render_needed(),
        ]
    }

    fn reshape(&mut self, id: ObjectId, patch: &ObjectPatch, now_ms: f64) -> Vec<Action> {
        match self.mutate(&id, patch) {
            Ok(true) => vec![
                Action::ObjectUpdated { layer_id: self.layer.id.clone(), id },
                self.schedule_snapshot(now_ms),
                self.render_needed(),
            ],
            Ok(false) => Vec::new(),
            Err(e) => self.absorbed(&e),
        }
    }

    /// Remove the selected object and snapshot.
    pub fn delete_selection(&mut self) -> Vec<Action> {
        let Some(id) = self.dispatch.selected else {
            return Vec::new();
        };
        if !self.interactivity(&id).selectable {
            return Vec::new();
        }
        match self.remove(&id) {
            Ok(_) => {
                let mut actions = vec![
                    Action::ObjectDeleted { layer_id: self.layer.id.clone(), id },
                    Action::SelectionChanged { layer_id: self.layer.id.clone(), id: None },
                ];
                actions.extend(self.snapshot_now());
                actions.push(self.render_needed());
                actions
            }
            Err(e) => self.absorbed(&e),
        }
    }

    // =============================================================
    // Eraser
    // =============================================================

    fn erase_down(&mut self, p: Point, ctx: &ToolContext<'_>) -> Vec<Action> {
        let radius = ctx.eraser_radius();
        let hit = self.scene.topmost(|o| self.interactivity(&o.id).evented && touches_circle(o, p, radius)).map(|o| o.id);
        let mut erased = HashSet::new();
        let actions = match hit {
            Some(id) => {
                erased.insert(id);
                self.erase_ids(&[id])
            }
            None => Vec::new(),
        };
        self.dispatch.input = InputState::Erasing { erased };
        actions
    }

    fn erase_touching(&mut self, p: Point, erased: &mut HashSet<ObjectId>, ctx: &ToolContext<'_>) -> Vec<Action> {
        let radius = ctx.eraser_radius();
        let ids = self.scene.query(|o| {
            !erased.contains(&o.id) && self.interactivity(&o.id).evented && touches_circle(o, p, radius)
        });
        erased.extend(ids.iter().copied());
        self.erase_ids(&ids)
    }

    fn erase_ids(&mut self, ids: &[ObjectId]) -> Vec<Action> {
        let mut actions = Vec::new();
        for id in ids {
            // Grouped members may already be gone with their composite.
            if !self.scene.contains(id) {
                continue;
            }
            match self.remove(id) {
                Ok(_) => actions.push(Action::ObjectDeleted { layer_id: self.layer.id.clone(), id: *id }),
                Err(e) => return self.absorbed(&e),
            }
        }
        if !actions.is_empty() {
            actions.extend(self.snapshot_now());
            actions.push(self.render_needed());
        }
        actions
    }

    // =============================================================
    // Click-to-place
    // =============================================================

    fn place(&mut self, tool: Tool, p: Point, ctx: &mut ToolContext<'_>) -> Vec<Action> {
        match tool {
            Tool::Image => {
                self.dispatch.pending_image = Some(p);
                vec![Action::ImagePickerRequested { layer_id: self.layer.id.clone(), at: p }]
            }
            Tool::Link => self.place_link(p, ctx),
            _ => {
                let objects = self.build_placement(tool, p, ctx);
                self.commit_placement(objects, ctx)
            }
        }
    }

    fn build_placement(&self, tool: Tool, p: Point, ctx: &ToolContext<'_>) -> Vec<AnnotationObject> {
        let opts = &ctx.ui.options;
        let layer_id = self.layer.id.clone();
        let stroke_paint = |color: &str| Paint {
            stroke: Some(color.to_owned()),
            stroke_width: opts.stroke_width,
            fill: None,
            opacity: opts.opacity,
        };
        let placeholder = ctx.config.placeholder_text.clone();

        match tool {
            Tool::Stamp => vec![AnnotationObject::new(
                layer_id,
                Shape::Stamp(StampShape { bounds: centered(p, STAMP_WIDTH, STAMP_HEIGHT), stamp: opts.stamp }),
                stroke_paint(opts.stamp.color()),
            )],
            Tool::Checkmark => vec![AnnotationObject::new(
                layer_id,
                Shape::Checkmark(BoxShape { bounds: centered(p, GLYPH_SIZE, GLYPH_SIZE) }),
                stroke_paint(CHECK_COLOR),
            )],
            Tool::Cross => vec![AnnotationObject::new(
                layer_id,
                Shape::Cross(BoxShape { bounds: centered(p, GLYPH_SIZE, GLYPH_SIZE) }),
                stroke_paint(CROSS_COLOR),
            )],
            Tool::Text => vec![AnnotationObject::new(
                layer_id,
                Shape::Text(TextShape { at: p, width: TEXT_WIDTH, font_size: opts.font_size, text: placeholder }),
                stroke_paint(&opts.stroke),
            )],
            Tool::Note => vec![AnnotationObject::new(
                layer_id,
                Shape::Note(TextBoxShape {
                    bounds: Bounds::new(p.x, p.y, NOTE_WIDTH, NOTE_HEIGHT),
                    font_size: opts.font_size,
                    text: placeholder,
                }),
                Paint { fill: Some(opts.fill.clone().unwrap_or_else(|| NOTE_FILL.to_owned())), ..stroke_paint(&opts.stroke) },
            )],
            Tool::Callout => {
                // The box sits up and to the right; the arrow tip is the click point.
                let bounds = Bounds::new(
                    p.x + CALLOUT_ARROW_OFFSET,
                    p.y - CALLOUT_ARROW_OFFSET - CALLOUT_HEIGHT,
                    CALLOUT_WIDTH,
                    CALLOUT_HEIGHT,
                );
                let callout = AnnotationObject::new(
                    layer_id.clone(),
                    Shape::Callout(TextBoxShape { bounds, font_size: opts.font_size, text: placeholder }),
                    Paint { fill: opts.fill.clone(), ..stroke_paint(&opts.stroke) },
                );
                let from = Point::new(bounds.x, bounds.bottom());
                let mut arrow = AnnotationObject::new(
                    layer_id,
                    Shape::Arrow(ArrowShape { a: from, b: p, head: Some(arrow_head(from, p, opts.stroke_width)) }),
                    stroke_paint(&opts.stroke),
                );
                arrow.group = Some(callout.id);
                vec![callout, arrow]
            }
            _ => Vec::new(),
        }
    }

    /// Insert placed objects (first one is primary), snapshot, select it,
    /// revert to select, and open the editor on text-bearing objects.
    fn commit_placement(&mut self, objects: Vec<AnnotationObject>, ctx: &mut ToolContext<'_>) -> Vec<Action> {
        let Some((primary, text_bearing)) = objects.first().map(|o| (o.id, o.is_text_bearing())) else {
            return Vec::new();
        };
        let mut actions = Vec::new();
        for obj in objects {
            match self.insert(obj) {
                Ok(id) => actions.push(Action::ObjectCreated { layer_id: self.layer.id.clone(), id }),
                Err(e) => return self.absorbed(&e),
            }
        }
        actions.extend(self.snapshot_now());
        actions.push(self.revert_to_select(ctx));
        self.dispatch.selected = Some(primary);
        actions.push(Action::SelectionChanged { layer_id: self.layer.id.clone(), id: Some(primary) });
        if text_bearing {
            actions.extend(self.begin_edit(primary));
        }
        actions.push(self.render_needed());
        actions
    }

    fn place_link(&mut self, p: Point, ctx: &mut ToolContext<'_>) -> Vec<Action> {
        let url = ctx.ui.options.link_url.trim().to_owned();
        if url.is_empty() {
            debug!(layer_id = %self.layer.id, "link tool used without a url");
            return Vec::new();
        }
        let target = topmost_at(&self.scene, p, ctx.slop(), |_| true).map(|o| o.id);
        match target {
            Some(id) => {
                let patch = ObjectPatch { link: Some(Some(url)), ..ObjectPatch::default() };
                match self.mutate(&id, &patch) {
                    Ok(_) => {
                        let mut actions = vec![Action::ObjectUpdated { layer_id: self.layer.id.clone(), id }];
                        actions.extend(self.snapshot_now());
                        actions.push(self.revert_to_select(ctx));
                        actions.push(self.render_needed());
                        actions
                    }
                    Err(e) => self.absorbed(&e),
                }
            }
            None => {
                let region = AnnotationObject::new(
                    self.layer.id.clone(),
                    Shape::LinkRegion(LinkShape { bounds: Bounds::new(p.x, p.y, LINK_WIDTH, LINK_HEIGHT), url }),
                    Paint { stroke: Some(ctx.ui.options.stroke.clone()), stroke_width: 1.0, fill: None, opacity: 1.0 },
                );
                self.commit_placement(vec![region], ctx)
            }
        }
    }

    /// Place the image the host decoded for the pending click.
    ///
    /// A call with no pending placement (the tool or layer changed while the
    /// picker was open) is dropped.
    pub fn place_image(&mut self, src: &str, width: f64, height: f64, ctx: &mut ToolContext<'_>) -> Vec<Action> {
        let Some(at) = self.dispatch.pending_image.take() else {
            debug!(layer_id = %self.layer.id, "image arrived without a pending placement; dropped");
            return Vec::new();
        };
        let (w, h) = fit_image(width, height);
        let image = AnnotationObject::new(
            self.layer.id.clone(),
            Shape::Image(ImageShape { bounds: Bounds::new(at.x, at.y, w, h), src: src.to_owned() }),
            Paint { stroke: None, stroke_width: 0.0, fill: None, opacity: 1.0 },
        );
        self.commit_placement(vec![image], ctx)
    }

    // =============================================================
    // Drag-to-draw
    // =============================================================

    fn start_shape(&mut self, tool: Tool, p: Point, ctx: &ToolContext<'_>) -> Vec<Action> {
        let opts = &ctx.ui.options;
        let shape = match tool {
            Tool::Rect => Shape::Rect(BoxShape { bounds: Bounds::new(p.x, p.y, 0.0, 0.0) }),
            Tool::Ellipse => Shape::Ellipse(BoxShape { bounds: Bounds::new(p.x, p.y, 0.0, 0.0) }),
            Tool::Line => Shape::Line(LineShape { a: p, b: p }),
            Tool::Arrow => Shape::Arrow(ArrowShape { a: p, b: p, head: None }),
            Tool::Squiggly => Shape::Squiggly(SquigglyShape { points: vec![p] }),
            _ => return Vec::new(),
        };
        let paint = Paint {
            stroke: Some(opts.stroke.clone()),
            stroke_width: opts.stroke_width,
            fill: opts.fill.clone().filter(|_| matches!(tool, Tool::Rect | Tool::Ellipse)),
            opacity: opts.opacity,
        };
        match self.create(shape, paint) {
            Ok(id) => {
                self.dispatch.input = InputState::DrawingShape { id, anchor: p, samples: vec![p] };
                vec![self.render_needed()]
            }
            Err(e) => self.absorbed(&e),
        }
    }

    fn stretch_shape(&mut self, id: ObjectId, anchor: Point, samples: &[Point]) -> Vec<Action> {
        let Some(kind) = self.scene.get(&id).map(AnnotationObject::kind) else {
            return Vec::new();
        };
        let last = samples.last().copied().unwrap_or(anchor);
        let patch = match kind {
            ObjectKind::Rect | ObjectKind::Ellipse => ObjectPatch::bounds(Bounds::from_corners(anchor, last)),
            ObjectKind::Line | ObjectKind::Arrow => ObjectPatch { endpoints: Some((anchor, last)), ..ObjectPatch::default() },
            ObjectKind::Squiggly => ObjectPatch { points: Some(samples.to_vec()), ..ObjectPatch::default() },
            _ => return Vec::new(),
        };
        match self.mutate(&id, &patch) {
            Ok(_) => vec![self.render_needed()],
            Err(e) => self.absorbed(&e),
        }
    }

    fn finish_shape(&mut self, id: ObjectId, samples: &[Point], ctx: &mut ToolContext<'_>) -> Vec<Action> {
        let min = ctx.config.min_drag_size;
        let Some(obj) = self.scene.get_mut(&id) else {
            return Vec::new();
        };
        let stroke_width = obj.paint.stroke_width;
        let size = match &mut obj.shape {
            Shape::Line(l) => l.a.distance_to(l.b),
            Shape::Arrow(a) => {
                let len = a.a.distance_to(a.b);
                a.head = Some(arrow_head(a.a, a.b, stroke_width));
                len
            }
            Shape::Squiggly(s) => {
                s.points = squiggly_wave(samples);
                samples.windows(2).map(|w| w[0].distance_to(w[1])).sum()
            }
            Shape::Rect(b) | Shape::Ellipse(b) => b.bounds.width.max(b.bounds.height),
            _ => 0.0,
        };

        self.mark_dirty();
        if size < min {
            self.scene.remove(&id);
            self.recompute_interactivity();
            debug!(layer_id = %self.layer.id, size, min, "drag below minimum size; discarded");
            return vec![self.render_needed()];
        }

        let mut actions = vec![Action::ObjectCreated { layer_id: self.layer.id.clone(), id }];
        actions.extend(self.snapshot_now());
        actions.push(self.revert_to_select(ctx));
        self.dispatch.selected = Some(id);
        actions.push(Action::SelectionChanged { layer_id: self.layer.id.clone(), id: Some(id) });
        actions.push(self.render_needed());
        actions
    }

    // =============================================================
    // Freehand
    // =============================================================

    fn finish_freehand(&mut self, brush: BrushKind, mut points: Vec<Point>, ctx: &ToolContext<'_>) -> Vec<Action> {
        let Some(&first) = points.first() else {
            return Vec::new();
        };
        if points.len() == 1 {
            // A click draws a dot.
            points.push(first);
        }
        let paint = brush_paint(brush, &ctx.ui.options, ctx.config);
        match self.create(Shape::FreehandPath(PathShape { points, brush }), paint) {
            Ok(id) => {
                let mut actions = vec![Action::ObjectCreated { layer_id: self.layer.id.clone(), id }];
                actions.extend(self.snapshot_now());
                actions.push(self.render_needed());
                actions
            }
            Err(e) => self.absorbed(&e),
        }
    }

    // =============================================================
    // Text editing
    // =============================================================

    /// Open the inline editor on a text-bearing object.
    pub fn begin_edit(&mut self, id: ObjectId) -> Vec<Action> {
        if self.layer.locked {
            return self.absorbed(&SceneError::LayerLocked(self.layer.id.clone()));
        }
        let mut actions = self.flush_pending();
        let Some(session) = EditSession::begin(&mut self.scene, id) else {
            return actions;
        };
        let subject = session.subject();
        let text = session.buffer().to_owned();
        let select_all = session.select_all();
        self.dispatch.selected = Some(subject);
        self.dispatch.editing = Some(session);
        self.recompute_interactivity();
        self.mark_dirty();
        actions.push(Action::EditTextStarted { layer_id: self.layer.id.clone(), id: subject, text, select_all });
        actions.push(self.render_needed());
        actions
    }

    /// Close the inline editor, rebuilding composites, and snapshot if the
    /// text changed.
    pub fn commit_edit(&mut self) -> Vec<Action> {
        let Some(session) = self.dispatch.editing.take() else {
            return Vec::new();
        };
        let outcome = session.commit(&mut self.scene);
        self.recompute_interactivity();
        self.mark_dirty();

        let mut actions = vec![Action::EditTextEnded { layer_id: self.layer.id.clone(), id: outcome.id }];
        if outcome.removed {
            self.dispatch.selected = None;
            actions.push(Action::ObjectDeleted { layer_id: self.layer.id.clone(), id: outcome.id });
        }
        actions.extend(self.snapshot_if_changed());
        actions.push(self.render_needed());
        actions
    }

    /// Replace the edited text wholesale (host-side editor input).
    pub fn set_edit_text(&mut self, text: &str, now_ms: f64) -> Vec<Action> {
        let Some(session) = self.dispatch.editing.as_mut() else {
            return Vec::new();
        };
        if !session.set_buffer(text) {
            return Vec::new();
        }
        self.after_edit(now_ms)
    }

    fn edit_key(&mut self, key: &Key, modifiers: Modifiers, now_ms: f64) -> Vec<Action> {
        let edit = match key.as_str() {
            "Escape" => return self.commit_edit(),
            "Enter" => EditKey::Newline,
            "Backspace" => EditKey::Backspace,
            _ => match key.printable() {
                Some(c) if !modifiers.command() => EditKey::Insert(c),
                _ => return Vec::new(),
            },
        };
        let Some(session) = self.dispatch.editing.as_mut() else {
            return Vec::new();
        };
        if !session.apply_key(edit) {
            return Vec::new();
        }
        self.after_edit(now_ms)
    }

    fn after_edit(&mut self, now_ms: f64) -> Vec<Action> {
        let Some(session) = self.dispatch.editing.as_ref() else {
            return Vec::new();
        };
        session.sync(&mut self.scene);
        let subject = session.subject();
        let composite = session.is_composite();
        self.mark_dirty();

        let mut actions = vec![Action::ObjectUpdated { layer_id: self.layer.id.clone(), id: subject }];
        // Split composites snapshot on commit only.
        if !composite {
            actions.push(self.schedule_snapshot(now_ms));
        }
        actions.push(self.render_needed());
        actions
    }

    // =============================================================
    // Gesture lifecycle
    // =============================================================

    /// Discard any half-finished draw, freehand capture, or pending image.
    pub fn cancel_gesture(&mut self) -> Vec<Action> {
        let mut actions = Vec::new();
        match std::mem::take(&mut self.dispatch.input) {
            InputState::DrawingShape { id, .. } => {
                self.scene.remove(&id);
                self.recompute_interactivity();
                self.mark_dirty();
                debug!(layer_id = %self.layer.id, %id, "provisional shape discarded");
                actions.push(self.render_needed());
            }
            InputState::Capturing { .. } => actions.push(self.render_needed()),
            _ => {}
        }
        if self.dispatch.pending_image.take().is_some() {
            debug!(layer_id = %self.layer.id, "pending image placement discarded");
        }
        actions
    }

    /// Bring the layer to a resting state: commit the editor, drop any
    /// in-flight gesture, and take a pending debounced snapshot.
    pub fn settle(&mut self) -> Vec<Action> {
        let mut actions = self.commit_edit();
        actions.extend(self.cancel_gesture());
        actions.extend(self.flush_pending());
        actions
    }

    /// Tool switch: end everything tied to the previous tool.
    pub fn on_tool_changed(&mut self, tool: Tool) -> Vec<Action> {
        let mut actions = self.commit_edit();
        actions.extend(self.cancel_gesture());
        if tool != Tool::Select {
            actions.extend(self.clear_selection());
        }
        self.set_tool(tool);
        actions
    }

    fn revert_to_select(&mut self, ctx: &mut ToolContext<'_>) -> Action {
        ctx.ui.tool = Tool::Select;
        self.set_tool(Tool::Select);
        Action::ToolChanged(Tool::Select)
    }

    fn render_needed(&self) -> Action {
        Action::RenderNeeded { layer_id: self.layer.id.clone() }
    }

    fn absorbed(&self, e: &SceneError) -> Vec<Action> {
        debug!(layer_id = %self.layer.id, code = e.error_code(), error = %e, "tool mutation ignored");
        Vec::new()
    }
}

/// Box of `w × h` centred on `p`.
fn centered(p: Point, w: f64, h: f64) -> Bounds {
    Bounds::new(p.x - w / 2.0, p.y - h / 2.0, w, h)
}

/// Scale natural image dimensions to fit within the placement maximum.
fn fit_image(width: f64, height: f64) -> (f64, f64) {
    if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
        return (IMAGE_MAX_SIZE, IMAGE_MAX_SIZE);
    }
    let factor = (IMAGE_MAX_SIZE / width.max(height)).min(1.0);
    (width * factor, height * factor)
}

/// Paint of a freehand stroke for `brush`. Highlight and signature ignore
/// the user's stroke options.
pub(crate) fn brush_paint(brush: BrushKind, opts: &ToolOptions, config: &EngineConfig) -> Paint {
    match brush {
        BrushKind::Draw => {
            Paint { stroke: Some(opts.stroke.clone()), stroke_width: opts.stroke_width, fill: None, opacity: opts.opacity }
        }
        BrushKind::Highlight => Paint {
            stroke: Some(HIGHLIGHT_COLOR.to_owned()),
            stroke_width: config.highlight_width,
            fill: None,
            opacity: config.highlight_opacity,
        },
        BrushKind::Signature => {
            Paint { stroke: Some(SIGNATURE_COLOR.to_owned()), stroke_width: SIGNATURE_WIDTH, fill: None, opacity: 1.0 }
        }
    }
}
