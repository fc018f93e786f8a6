//! Engine facade: the host's single handle on the layered canvas.
//!
//! `EngineCore` holds everything that does not need a browser: the layer
//! stack, the shared camera, the tool selection and the page content. It
//! routes pointer and key events to the active layer and returns
//! [`Action`]s for the host to act on (persist, re-render, open pickers).
//!
//! `Engine` wraps the core and owns one `<canvas>` per layer inside a host
//! container element. It repaints only layers flagged dirty and restacks the
//! elements by z-index, so reordering or toggling visibility never repaints
//! an unaffected layer.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use std::collections::HashMap;

use serde_json::Value;
use tracing::{debug, info};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlElement, HtmlImageElement};

use crate::camera::{Camera, GeometryError, Point};
use crate::config::{ConfigError, EngineConfig};
use crate::consts::{DEFAULT_PAGE_HEIGHT, DEFAULT_PAGE_WIDTH};
use crate::doc::{AnnotationObject, LayerId, ObjectId};
use crate::error::ErrorCode;
use crate::input::{Key, Modifiers, PointerEvent, Tool, ToolOptions, UiState};
use crate::layer::{Layer, LayerCanvas, LayerError};
use crate::page::{PageContent, PageError, replacement_objects};
use crate::record::LoadReport;
use crate::render::{self, Frame, ImageCache};
use crate::stack::{Direction, LayerStack};
use crate::tools::ToolContext;

/// Actions returned from handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    ObjectCreated { layer_id: LayerId, id: ObjectId },
    ObjectUpdated { layer_id: LayerId, id: ObjectId },
    ObjectDeleted { layer_id: LayerId, id: ObjectId },
    SelectionChanged { layer_id: LayerId, id: Option<ObjectId> },
    /// Persist the full record list of one layer.
    SaveRequested { layer_id: LayerId, objects: Vec<Value> },
    /// Call [`EngineCore::tick`] at or after `due_ms`.
    HistoryScheduled { layer_id: LayerId, due_ms: f64 },
    SetCursor(String),
    RenderNeeded { layer_id: LayerId },
    ViewportChanged { pan_x: f64, pan_y: f64, zoom: f64 },
    /// The tool machine changed the tool (placement reverts to select).
    ToolChanged(Tool),
    /// Open a file picker; answer with [`EngineCore::place_image`].
    ImagePickerRequested { layer_id: LayerId, at: Point },
    /// Show the inline editor over `id`, seeded with `text`; with
    /// `select_all` the whole text starts selected.
    EditTextStarted { layer_id: LayerId, id: ObjectId, text: String, select_all: bool },
    EditTextEnded { layer_id: LayerId, id: ObjectId },
    LayersChanged(Vec<Layer>),
    LayerRemoved { layer_id: LayerId },
}

/// Errors surfaced by the engine facade.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error(transparent)]
    Layer(#[from] LayerError),
    #[error(transparent)]
    Page(#[from] PageError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("dom error: {0}")]
    Dom(String),
}

impl ErrorCode for EngineError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Geometry(e) => e.error_code(),
            Self::Layer(e) => e.error_code(),
            Self::Page(e) => e.error_code(),
            Self::Config(e) => e.error_code(),
            Self::Dom(_) => "E_DOM",
        }
    }

    fn is_absorbed(&self) -> bool {
        match self {
            Self::Layer(e) => e.is_absorbed(),
            _ => false,
        }
    }
}

impl From<JsValue> for EngineError {
    fn from(value: JsValue) -> Self {
        Self::Dom(value.as_string().unwrap_or_else(|| format!("{value:?}")))
    }
}

/// Core engine state: all logic that doesn't depend on the canvas elements.
///
/// Separated from `Engine` so it can be tested without WASM/browser dependencies.
#[derive(Debug)]
pub struct EngineCore {
    pub stack: LayerStack,
    pub camera: Camera,
    pub ui: UiState,
    pub config: EngineConfig,
    pub page: Option<PageContent>,
}

impl Default for EngineCore {
    fn default() -> Self {
        let config = EngineConfig::default();
        Self {
            stack: LayerStack::new(&config),
            camera: Camera::default(),
            ui: UiState { tool: Tool::default(), options: ToolOptions::from_config(&config) },
            config,
            page: None,
        }
    }
}

impl EngineCore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a core with host-supplied tuning.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the config fails validation.
    pub fn with_config(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            stack: LayerStack::new(&config),
            camera: Camera::default(),
            ui: UiState { tool: Tool::default(), options: ToolOptions::from_config(&config) },
            config,
            page: None,
        })
    }

    // --- Data inputs ---

    /// Replace one layer's objects with persisted records.
    ///
    /// # Errors
    ///
    /// Returns [`LayerError::NotFound`] for an unknown layer.
    pub fn load_objects(&mut self, layer_id: &LayerId, records: &[Value]) -> Result<LoadReport, LayerError> {
        self.stack.load_objects(layer_id, records)
    }

    /// Attach the page size and text spans reported by the page collaborator.
    pub fn set_page(&mut self, content: PageContent) -> Vec<Action> {
        self.page = Some(content);
        self.mark_all_dirty();
        self.stack.paint_order().into_iter().map(|layer_id| Action::RenderNeeded { layer_id }).collect()
    }

    /// Index of the page text span under a screen point, for the host to
    /// pass to [`EngineCore::edit_page_text`].
    #[must_use]
    pub fn page_span_at(&self, screen: Point) -> Option<usize> {
        self.page.as_ref()?.span_at(self.camera.screen_to_page(screen))
    }

    /// Replace the text of one page span: a white cover and new text on the
    /// reserved layer, snapshotted in that layer's own history.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::NoPage`] before [`EngineCore::set_page`],
    /// [`PageError::SpanNotFound`] for a bad index.
    pub fn edit_page_text(&mut self, span_index: usize, text: &str) -> Result<Vec<Action>, EngineError> {
        let page = self.page.as_ref().ok_or(PageError::NoPage)?;
        let span = page.span(span_index)?.clone();
        let color = self.config.default_stroke.clone();

        let reserved = self.stack.reserved_mut()?;
        let layer_id = reserved.id().clone();
        let mut actions = reserved.settle();
        for obj in replacement_objects(&layer_id, &span, text, &color) {
            let id = reserved.insert(obj).map_err(LayerError::from)?;
            actions.push(Action::ObjectCreated { layer_id: layer_id.clone(), id });
        }
        actions.extend(reserved.snapshot_now());
        actions.push(Action::RenderNeeded { layer_id: layer_id.clone() });
        info!(%layer_id, span_index, "page text replaced");
        Ok(self.finish(actions))
    }

    // --- Tool ---

    /// Switch the shared tool for every layer.
    pub fn set_tool(&mut self, tool: Tool) -> Vec<Action> {
        self.ui.tool = tool;
        let mut actions = self.stack.set_tool(tool);
        actions.push(Action::SetCursor(tool.cursor().into()));
        self.finish(actions)
    }

    /// Replace the styling applied to newly created objects.
    pub fn set_tool_options(&mut self, options: ToolOptions) {
        self.ui.options = options;
    }

    // --- Viewport ---

    /// Change the zoom factor. Stored geometry is untouched; every layer
    /// repaints at the new scale.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::InvalidScale`] for a non-positive zoom and
    /// leaves the camera unchanged.
    pub fn set_zoom(&mut self, zoom: f64) -> Result<Vec<Action>, GeometryError> {
        self.camera.set_zoom(zoom)?;
        Ok(self.finish(vec![self.viewport_changed()]))
    }

    /// Change the device pixel ratio of the backing canvases.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::InvalidScale`] for a non-positive ratio.
    pub fn set_dpr(&mut self, dpr: f64) -> Result<Vec<Action>, GeometryError> {
        self.camera.set_dpr(dpr)?;
        Ok(self.finish(vec![self.viewport_changed()]))
    }

    /// Set the shared viewport pan in CSS pixels.
    pub fn set_pan(&mut self, pan_x: f64, pan_y: f64) -> Vec<Action> {
        self.camera.pan_x = pan_x;
        self.camera.pan_y = pan_y;
        vec![self.viewport_changed()]
    }

    // --- Input events ---

    pub fn on_pointer_down(&mut self, ev: &PointerEvent) -> Vec<Action> {
        self.route(|canvas, ctx| canvas.pointer_down(ev, ctx))
    }

    pub fn on_pointer_move(&mut self, ev: &PointerEvent) -> Vec<Action> {
        self.route(|canvas, ctx| canvas.pointer_move(ev, ctx))
    }

    pub fn on_pointer_up(&mut self, ev: &PointerEvent) -> Vec<Action> {
        self.route(|canvas, ctx| canvas.pointer_up(ev, ctx))
    }

    pub fn on_double_click(&mut self, ev: &PointerEvent) -> Vec<Action> {
        self.route(|canvas, ctx| canvas.double_click(ev, ctx))
    }

    pub fn on_key_down(&mut self, key: &Key, modifiers: Modifiers, now_ms: f64) -> Vec<Action> {
        self.route(|canvas, _| canvas.key_down(key, modifiers, now_ms))
    }

    /// Deliver the bitmap the host decoded after [`Action::ImagePickerRequested`].
    pub fn place_image(&mut self, src: &str, width: f64, height: f64) -> Vec<Action> {
        self.route(|canvas, ctx| canvas.place_image(src, width, height, ctx))
    }

    /// Replace the text of the open inline editor.
    pub fn set_edit_text(&mut self, text: &str, now_ms: f64) -> Vec<Action> {
        self.route(|canvas, _| canvas.set_edit_text(text, now_ms))
    }

    /// Close the inline editor, if open.
    pub fn commit_edit(&mut self) -> Vec<Action> {
        self.route(|canvas, _| canvas.commit_edit())
    }

    /// Host timer callback: take every debounced snapshot that is due.
    pub fn tick(&mut self, now_ms: f64) -> Vec<Action> {
        let mut actions = Vec::new();
        for canvas in self.stack.canvases_mut() {
            actions.extend(canvas.tick(now_ms));
        }
        self.finish(actions)
    }

    /// Earliest pending debounce deadline across all layers.
    #[must_use]
    pub fn next_due(&self) -> Option<f64> {
        self.stack.canvases().filter_map(|c| c.history().pending_due()).reduce(f64::min)
    }

    // --- History ---

    /// Undo on the active layer. Locked layers and an exhausted history are
    /// silent no-ops.
    pub fn undo(&mut self) -> Vec<Action> {
        let Some(id) = self.stack.active_id().cloned() else {
            return Vec::new();
        };
        self.undo_layer(&id).unwrap_or_default()
    }

    /// Redo on the active layer.
    pub fn redo(&mut self) -> Vec<Action> {
        let Some(id) = self.stack.active_id().cloned() else {
            return Vec::new();
        };
        self.redo_layer(&id).unwrap_or_default()
    }

    /// Undo on a specific layer, including the reserved page layer.
    ///
    /// # Errors
    ///
    /// Returns [`LayerError::NotFound`] for an unknown layer. Absorbed
    /// errors (locked layer, exhausted history) come back as `Ok` with no
    /// actions.
    pub fn undo_layer(&mut self, id: &LayerId) -> Result<Vec<Action>, LayerError> {
        self.history_step(id, LayerCanvas::undo)
    }

    /// Redo on a specific layer.
    ///
    /// # Errors
    ///
    /// Same as [`EngineCore::undo_layer`].
    pub fn redo_layer(&mut self, id: &LayerId) -> Result<Vec<Action>, LayerError> {
        self.history_step(id, LayerCanvas::redo)
    }

    fn history_step<F>(&mut self, id: &LayerId, step: F) -> Result<Vec<Action>, LayerError>
    where
        F: FnOnce(&mut LayerCanvas) -> Result<Vec<Action>, LayerError>,
    {
        let canvas = self.stack.get_mut(id)?;
        match step(canvas) {
            Ok(actions) => Ok(self.finish(actions)),
            Err(e) if e.is_absorbed() => {
                debug!(layer_id = %id, code = e.error_code(), error = %e, "history step ignored");
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.stack.active().is_some_and(LayerCanvas::can_undo)
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.stack.active().is_some_and(LayerCanvas::can_redo)
    }

    // --- Layers ---

    /// # Errors
    ///
    /// See [`LayerStack::set_active_layer`].
    pub fn set_active_layer(&mut self, id: &LayerId) -> Result<Vec<Action>, LayerError> {
        let actions = self.stack.set_active_layer(id)?;
        Ok(self.finish(actions))
    }

    /// # Errors
    ///
    /// See [`LayerStack::set_locked`].
    pub fn set_locked(&mut self, id: &LayerId, locked: bool) -> Result<Vec<Action>, LayerError> {
        let actions = self.stack.set_locked(id, locked)?;
        Ok(self.finish(actions))
    }

    /// # Errors
    ///
    /// See [`LayerStack::set_visible`].
    pub fn set_visible(&mut self, id: &LayerId, visible: bool) -> Result<Vec<Action>, LayerError> {
        let actions = self.stack.set_visible(id, visible)?;
        Ok(self.finish(actions))
    }

    /// # Errors
    ///
    /// See [`LayerStack::reorder`].
    pub fn reorder(&mut self, id: &LayerId, direction: Direction) -> Result<Vec<Action>, LayerError> {
        let actions = self.stack.reorder(id, direction)?;
        Ok(self.finish(actions))
    }

    pub fn add_layer(&mut self, name: &str) -> (LayerId, Vec<Action>) {
        let (id, actions) = self.stack.add_layer(name);
        (id, self.finish(actions))
    }

    /// # Errors
    ///
    /// See [`LayerStack::rename_layer`].
    pub fn rename_layer(&mut self, id: &LayerId, name: &str) -> Result<Vec<Action>, LayerError> {
        self.stack.rename_layer(id, name)
    }

    /// # Errors
    ///
    /// See [`LayerStack::delete_layer`].
    pub fn delete_layer(&mut self, id: &LayerId) -> Result<Vec<Action>, LayerError> {
        let actions = self.stack.delete_layer(id)?;
        Ok(self.finish(actions))
    }

    // --- Queries ---

    /// Layer metadata in paint order (back to front).
    #[must_use]
    pub fn layers(&self) -> Vec<Layer> {
        self.stack.layers()
    }

    #[must_use]
    pub fn active_layer_id(&self) -> Option<&LayerId> {
        self.stack.active_id()
    }

    #[must_use]
    pub fn tool(&self) -> Tool {
        self.ui.tool
    }

    /// The selected object on the active layer, if any.
    #[must_use]
    pub fn selection(&self) -> Option<ObjectId> {
        self.stack.active().and_then(LayerCanvas::selection)
    }

    /// The current camera state.
    #[must_use]
    pub fn camera(&self) -> Camera {
        self.camera
    }

    /// Look up an object by layer and id.
    #[must_use]
    pub fn object(&self, layer_id: &LayerId, id: &ObjectId) -> Option<&AnnotationObject> {
        match self.stack.get(layer_id) {
            Ok(canvas) => canvas.get(id),
            Err(_) => None,
        }
    }

    /// One layer's objects as persistence records.
    ///
    /// # Errors
    ///
    /// Returns [`LayerError::NotFound`] for an unknown layer.
    pub fn records(&self, layer_id: &LayerId) -> Result<Vec<Value>, LayerError> {
        Ok(self.stack.get(layer_id)?.records())
    }

    /// Page size in page units, US Letter until the page is known.
    #[must_use]
    pub fn page_size(&self) -> (f64, f64) {
        self.page.as_ref().map_or((DEFAULT_PAGE_WIDTH, DEFAULT_PAGE_HEIGHT), |p| (p.width_pt, p.height_pt))
    }

    // --- Internals ---

    /// Hand an event to the active layer, or answer `not-allowed` if it is
    /// hidden or locked.
    fn route<F>(&mut self, handler: F) -> Vec<Action>
    where
        F: FnOnce(&mut LayerCanvas, &mut ToolContext<'_>) -> Vec<Action>,
    {
        let Some(canvas) = self.stack.route_mut() else {
            return vec![Action::SetCursor("not-allowed".into())];
        };
        let mut ctx = ToolContext { camera: &mut self.camera, ui: &mut self.ui, config: &self.config };
        let actions = handler(canvas, &mut ctx);
        self.stack.sync_tool(self.ui.tool);
        self.finish(actions)
    }

    /// Flag the layers an action batch touched for repaint.
    fn finish(&mut self, actions: Vec<Action>) -> Vec<Action> {
        for action in &actions {
            match action {
                Action::RenderNeeded { layer_id } | Action::SelectionChanged { layer_id, .. } => {
                    if let Ok(canvas) = self.stack.get_mut(layer_id) {
                        canvas.mark_dirty();
                    }
                }
                Action::ViewportChanged { .. } => self.mark_all_dirty(),
                _ => {}
            }
        }
        actions
    }

    fn mark_all_dirty(&mut self) {
        for canvas in self.stack.canvases_mut() {
            canvas.mark_dirty();
        }
    }

    fn viewport_changed(&self) -> Action {
        Action::ViewportChanged { pan_x: self.camera.pan_x, pan_y: self.camera.pan_y, zoom: self.camera.zoom() }
    }
}

/// The full canvas engine. Wraps `EngineCore` and owns one canvas element
/// per layer inside the host's container.
pub struct Engine {
    container: HtmlElement,
    surfaces: HashMap<LayerId, HtmlCanvasElement>,
    page_image: Option<HtmlImageElement>,
    images: ImageCache,
    pub core: EngineCore,
}

impl Engine {
    /// Create an engine that stacks its layer canvases inside `container`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`] for an invalid config and
    /// [`EngineError::Dom`] if the canvases cannot be created.
    pub fn new(container: HtmlElement, config: EngineConfig) -> Result<Self, EngineError> {
        let mut engine = Self {
            container,
            surfaces: HashMap::new(),
            page_image: None,
            images: ImageCache::default(),
            core: EngineCore::with_config(config)?,
        };
        engine.sync_surfaces()?;
        Ok(engine)
    }

    /// Attach the rasterized page, drawn under the reserved layer's objects.
    pub fn set_page_image(&mut self, image: HtmlImageElement) {
        self.page_image = Some(image);
        if let Ok(reserved) = self.core.stack.reserved_mut() {
            reserved.mark_dirty();
        }
    }

    // --- Delegated input ---

    pub fn on_pointer_down(&mut self, ev: &PointerEvent) -> Vec<Action> {
        self.core.on_pointer_down(ev)
    }

    pub fn on_pointer_move(&mut self, ev: &PointerEvent) -> Vec<Action> {
        self.core.on_pointer_move(ev)
    }

    pub fn on_pointer_up(&mut self, ev: &PointerEvent) -> Vec<Action> {
        self.core.on_pointer_up(ev)
    }

    pub fn on_double_click(&mut self, ev: &PointerEvent) -> Vec<Action> {
        self.core.on_double_click(ev)
    }

    pub fn on_key_down(&mut self, key: &Key, modifiers: Modifiers, now_ms: f64) -> Vec<Action> {
        self.core.on_key_down(key, modifiers, now_ms)
    }

    pub fn tick(&mut self, now_ms: f64) -> Vec<Action> {
        self.core.tick(now_ms)
    }

    // --- Rendering ---

    /// Restack the layer canvases and repaint the dirty ones.
    ///
    /// Returns `Ok(true)` if some layer is still waiting on an image and
    /// should be rendered again next frame.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Dom`] if a canvas or 2D context call fails.
    pub fn render(&mut self) -> Result<bool, EngineError> {
        self.sync_surfaces()?;
        let camera = self.core.camera;
        let page_size = self.core.page_size();
        let active = self.core.stack.active_id().cloned();
        let mut again = false;

        for canvas in self.core.stack.canvases_mut() {
            let Some(surface) = self.surfaces.get(canvas.id()) else {
                continue;
            };
            place_surface(surface, &camera, page_size)?;
            if !canvas.is_dirty() || !canvas.layer().visible {
                continue;
            }
            let ctx = context_2d(surface)?;
            let frame = Frame {
                camera: &camera,
                ui: &self.core.ui,
                config: &self.core.config,
                page_image: self.page_image.as_ref().filter(|_| canvas.layer().is_reserved()),
                page_size,
                active: active.as_ref() == Some(canvas.id()),
            };
            if render::draw_layer(&ctx, canvas, &frame, &mut self.images)? {
                canvas.clear_dirty();
            } else {
                again = true;
            }
        }
        Ok(again)
    }

    /// Create canvases for new layers, drop those of deleted layers, and set
    /// z-index and display from the stack.
    fn sync_surfaces(&mut self) -> Result<(), EngineError> {
        let order = self.core.stack.layers();
        self.surfaces.retain(|id, surface| {
            let live = order.iter().any(|l| &l.id == id);
            if !live {
                surface.remove();
            }
            live
        });

        for (z, layer) in order.iter().enumerate() {
            if !self.surfaces.contains_key(&layer.id) {
                let surface = self.create_surface(&layer.id)?;
                self.surfaces.insert(layer.id.clone(), surface);
            }
            if let Some(surface) = self.surfaces.get(&layer.id) {
                let style = surface.style();
                style.set_property("z-index", &z.to_string())?;
                style.set_property("display", if layer.visible { "block" } else { "none" })?;
            }
        }
        Ok(())
    }

    fn create_surface(&self, id: &LayerId) -> Result<HtmlCanvasElement, EngineError> {
        let document =
            self.container.owner_document().ok_or_else(|| EngineError::Dom("container has no document".into()))?;
        let surface: HtmlCanvasElement = document
            .create_element("canvas")?
            .dyn_into()
            .map_err(|_| EngineError::Dom("created element is not a canvas".into()))?;
        surface.set_attribute("data-layer-id", id.as_str())?;
        let style = surface.style();
        style.set_property("position", "absolute")?;
        style.set_property("left", "0")?;
        style.set_property("top", "0")?;
        style.set_property("transform-origin", "0 0")?;
        self.container.append_child(&surface)?;
        Ok(surface)
    }
}

/// Size the backing store to page × scale and position it under the pan.
fn place_surface(surface: &HtmlCanvasElement, camera: &Camera, (width, height): (f64, f64)) -> Result<(), EngineError> {
    let (px_w, px_h) = (backing_size(width * camera.scale()), backing_size(height * camera.scale()));
    if surface.width() != px_w || surface.height() != px_h {
        surface.set_width(px_w);
        surface.set_height(px_h);
    }
    let style = surface.style();
    style.set_property("width", &format!("{}px", width * camera.zoom()))?;
    style.set_property("height", &format!("{}px", height * camera.zoom()))?;
    style.set_property("transform", &format!("translate({}px, {}px)", camera.pan_x, camera.pan_y))?;
    Ok(())
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn backing_size(px: f64) -> u32 {
    px.ceil().clamp(0.0, f64::from(u32::MAX)) as u32
}

fn context_2d(surface: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d, EngineError> {
    surface
        .get_context("2d")?
        .ok_or_else(|| EngineError::Dom("2d context unavailable".into()))?
        .dyn_into()
        .map_err(|_| EngineError::Dom("context is not 2d".into()))
}
