//! Ordered layer stack: membership, z-order, lock/visibility, and routing.
//!
//! DESIGN
//! ======
//! The stack owns every [`LayerCanvas`], kept sorted by `order` (paint
//! order, back to front). Exactly one reserved layer (`pdf-content`) holds
//! the page text and image; it paints like any other layer but the generic
//! layer controls refuse to lock, hide, reorder, rename or delete it, and it
//! can never become the active layer.
//!
//! Only the active layer receives pointer and key events, and only while it
//! is visible and unlocked. Every change to the active layer, a layer's
//! flags, or the tool recomputes the cached interactivity of the layers it
//! affects.

#[cfg(test)]
#[path = "stack_test.rs"]
mod stack_test;

use serde_json::Value;
use tracing::info;

use crate::config::EngineConfig;
use crate::consts::DEFAULT_LAYER_NAME;
use crate::doc::LayerId;
use crate::engine::Action;
use crate::input::Tool;
use crate::layer::{Layer, LayerCanvas, LayerError};
use crate::record::LoadReport;

/// Direction for [`LayerStack::reorder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Towards the front (higher order).
    Up,
    /// Towards the back (lower order).
    Down,
}

/// All layers of one page, back to front.
#[derive(Debug)]
pub struct LayerStack {
    canvases: Vec<LayerCanvas>,
    active: Option<LayerId>,
    tool: Tool,
    config: EngineConfig,
}

impl LayerStack {
    /// A stack holding the reserved page layer and one empty user layer,
    /// which is active.
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        let mut stack = Self { canvases: Vec::new(), active: None, tool: Tool::default(), config: config.clone() };
        stack.canvases.push(LayerCanvas::new(Layer::new(LayerId::pdf_content(), "Page", 0), config));
        let first = LayerId::generate();
        stack.canvases.push(LayerCanvas::new(Layer::new(first.clone(), DEFAULT_LAYER_NAME, 1), config));
        stack.active = Some(first);
        stack.refresh_all();
        stack
    }

    // --- Queries ---

    /// Layer metadata in paint order (back to front).
    #[must_use]
    pub fn layers(&self) -> Vec<Layer> {
        self.canvases.iter().map(|c| c.layer().clone()).collect()
    }

    /// Layer ids in paint order (back to front).
    #[must_use]
    pub fn paint_order(&self) -> Vec<LayerId> {
        self.canvases.iter().map(|c| c.id().clone()).collect()
    }

    pub fn canvases(&self) -> impl DoubleEndedIterator<Item = &LayerCanvas> {
        self.canvases.iter()
    }

    pub fn canvases_mut(&mut self) -> impl Iterator<Item = &mut LayerCanvas> {
        self.canvases.iter_mut()
    }

    #[must_use]
    pub fn active_id(&self) -> Option<&LayerId> {
        self.active.as_ref()
    }

    #[must_use]
    pub fn tool(&self) -> Tool {
        self.tool
    }

    /// Look up a layer canvas.
    ///
    /// # Errors
    ///
    /// Returns [`LayerError::NotFound`] for an unknown id.
    pub fn get(&self, id: &LayerId) -> Result<&LayerCanvas, LayerError> {
        self.canvases.iter().find(|c| c.id() == id).ok_or_else(|| LayerError::NotFound(id.clone()))
    }

    /// Look up a layer canvas for mutation.
    ///
    /// # Errors
    ///
    /// Returns [`LayerError::NotFound`] for an unknown id.
    pub fn get_mut(&mut self, id: &LayerId) -> Result<&mut LayerCanvas, LayerError> {
        self.canvases.iter_mut().find(|c| c.id() == id).ok_or_else(|| LayerError::NotFound(id.clone()))
    }

    /// The reserved page layer.
    ///
    /// # Errors
    ///
    /// Returns [`LayerError::NotFound`] if the stack lost it, which only a
    /// bug could cause.
    pub fn reserved_mut(&mut self) -> Result<&mut LayerCanvas, LayerError> {
        self.get_mut(&LayerId::pdf_content())
    }

    #[must_use]
    pub fn active(&self) -> Option<&LayerCanvas> {
        let id = self.active.as_ref()?;
        self.canvases.iter().find(|c| c.id() == id)
    }

    pub fn active_mut(&mut self) -> Option<&mut LayerCanvas> {
        let id = self.active.as_ref()?;
        self.canvases.iter_mut().find(|c| c.id() == id)
    }

    /// The layer that should receive input right now: the active layer, if
    /// it is visible and unlocked.
    pub fn route_mut(&mut self) -> Option<&mut LayerCanvas> {
        if !self.is_routable() {
            return None;
        }
        self.active_mut()
    }

    #[must_use]
    pub fn is_routable(&self) -> bool {
        self.active().is_some_and(|c| c.layer().visible && !c.layer().locked)
    }

    // --- Active layer / tool ---

    /// Make `id` the single interactive layer.
    ///
    /// The outgoing layer's editor is committed, its in-flight draw dropped
    /// and its selection cleared.
    ///
    /// # Errors
    ///
    /// Returns [`LayerError::Reserved`] for the page layer and
    /// [`LayerError::NotFound`] for an unknown id.
    pub fn set_active_layer(&mut self, id: &LayerId) -> Result<Vec<Action>, LayerError> {
        if id.is_reserved() {
            return Err(LayerError::Reserved(id.clone()));
        }
        self.get(id)?;
        if self.active.as_ref() == Some(id) {
            return Ok(Vec::new());
        }
        Ok(self.activate(id))
    }

    fn activate(&mut self, id: &LayerId) -> Vec<Action> {
        let mut actions = Vec::new();
        if let Some(outgoing) = self.active_mut() {
            actions.extend(outgoing.settle());
            actions.extend(outgoing.clear_selection());
        }
        self.active = Some(id.clone());
        self.refresh_all();
        info!(layer_id = %id, "active layer changed");
        actions.push(self.layers_changed());
        actions
    }

    /// Switch the shared tool for every layer.
    pub fn set_tool(&mut self, tool: Tool) -> Vec<Action> {
        let mut actions = Vec::new();
        for canvas in &mut self.canvases {
            actions.extend(canvas.on_tool_changed(tool));
        }
        self.tool = tool;
        self.refresh_all();
        actions
    }

    /// Keep the stack's idea of the tool in sync after a tool machine
    /// reverted it.
    pub(crate) fn sync_tool(&mut self, tool: Tool) {
        if self.tool != tool {
            self.tool = tool;
            self.refresh_all();
        }
    }

    // --- Layer flags ---

    /// Lock or unlock a layer. Locking the active layer commits its editor
    /// and drops any in-flight draw first.
    ///
    /// # Errors
    ///
    /// Returns [`LayerError::Reserved`] for the page layer and
    /// [`LayerError::NotFound`] for an unknown id.
    pub fn set_locked(&mut self, id: &LayerId, locked: bool) -> Result<Vec<Action>, LayerError> {
        if id.is_reserved() {
            return Err(LayerError::Reserved(id.clone()));
        }
        let canvas = self.get_mut(id)?;
        if canvas.layer.locked == locked {
            return Ok(Vec::new());
        }
        let mut actions = Vec::new();
        if locked {
            actions.extend(canvas.settle());
            actions.extend(canvas.clear_selection());
        }
        canvas.layer.locked = locked;
        canvas.mark_dirty();
        self.refresh_all();
        info!(layer_id = %id, locked, "layer lock changed");
        actions.push(Action::RenderNeeded { layer_id: id.clone() });
        actions.push(self.layers_changed());
        Ok(actions)
    }

    /// Show or hide a layer.
    ///
    /// # Errors
    ///
    /// Returns [`LayerError::Reserved`] for the page layer and
    /// [`LayerError::NotFound`] for an unknown id.
    pub fn set_visible(&mut self, id: &LayerId, visible: bool) -> Result<Vec<Action>, LayerError> {
        if id.is_reserved() {
            return Err(LayerError::Reserved(id.clone()));
        }
        let canvas = self.get_mut(id)?;
        if canvas.layer.visible == visible {
            return Ok(Vec::new());
        }
        let mut actions = Vec::new();
        if !visible {
            actions.extend(canvas.settle());
            actions.extend(canvas.clear_selection());
        }
        canvas.layer.visible = visible;
        self.refresh_all();
        info!(layer_id = %id, visible, "layer visibility changed");
        actions.push(self.layers_changed());
        Ok(actions)
    }

    /// Swap `order` with the adjacent user layer in paint order. Moving past
    /// either end is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`LayerError::Reserved`] for the page layer and
    /// [`LayerError::NotFound`] for an unknown id.
    pub fn reorder(&mut self, id: &LayerId, direction: Direction) -> Result<Vec<Action>, LayerError> {
        if id.is_reserved() {
            return Err(LayerError::Reserved(id.clone()));
        }
        let idx = self.index_of(id)?;
        let neighbour = match direction {
            Direction::Up => self.canvases[idx + 1..].iter().position(|c| !c.layer().is_reserved()).map(|i| idx + 1 + i),
            Direction::Down => self.canvases[..idx].iter().rposition(|c| !c.layer().is_reserved()),
        };
        let Some(other) = neighbour else {
            return Ok(Vec::new());
        };
        let (a, b) = (self.canvases[idx].layer.order, self.canvases[other].layer.order);
        self.canvases[idx].layer.order = b;
        self.canvases[other].layer.order = a;
        self.sort();
        info!(layer_id = %id, ?direction, "layer reordered");
        Ok(vec![self.layers_changed()])
    }

    // --- Membership ---

    /// Create a user layer in front of every other layer and make it active.
    pub fn add_layer(&mut self, name: &str) -> (LayerId, Vec<Action>) {
        let order = self.canvases.iter().map(|c| c.layer().order).max().unwrap_or(0) + 1;
        let id = LayerId::generate();
        self.canvases.push(LayerCanvas::new(Layer::new(id.clone(), name, order), &self.config));
        self.sort();
        info!(layer_id = %id, name, order, "layer added");
        let actions = self.activate(&id);
        (id, actions)
    }

    /// Rename a user layer.
    ///
    /// # Errors
    ///
    /// Returns [`LayerError::Reserved`] for the page layer and
    /// [`LayerError::NotFound`] for an unknown id.
    pub fn rename_layer(&mut self, id: &LayerId, name: &str) -> Result<Vec<Action>, LayerError> {
        if id.is_reserved() {
            return Err(LayerError::Reserved(id.clone()));
        }
        name.clone_into(&mut self.get_mut(id)?.layer.name);
        Ok(vec![self.layers_changed()])
    }

    /// Delete a user layer and all its objects. If it was active, the
    /// frontmost remaining user layer becomes active.
    ///
    /// # Errors
    ///
    /// Returns [`LayerError::Reserved`] for the page layer,
    /// [`LayerError::LastLayer`] for the only user layer, and
    /// [`LayerError::NotFound`] for an unknown id.
    pub fn delete_layer(&mut self, id: &LayerId) -> Result<Vec<Action>, LayerError> {
        if id.is_reserved() {
            return Err(LayerError::Reserved(id.clone()));
        }
        let idx = self.index_of(id)?;
        let user_layers = self.canvases.iter().filter(|c| !c.layer().is_reserved()).count();
        if user_layers <= 1 {
            return Err(LayerError::LastLayer);
        }
        let removed = self.canvases.remove(idx);
        info!(layer_id = %id, count = removed.scene().len(), "layer deleted");

        let mut actions = vec![Action::LayerRemoved { layer_id: id.clone() }];
        if self.active.as_ref() == Some(id) {
            self.active = self.canvases.iter().rev().find(|c| !c.layer().is_reserved()).map(|c| c.id().clone());
            self.refresh_all();
        }
        actions.push(self.layers_changed());
        Ok(actions)
    }

    // --- Persistence ---

    /// Load persisted records into one layer, resetting its history.
    ///
    /// # Errors
    ///
    /// Returns [`LayerError::NotFound`] for an unknown id.
    pub fn load_objects(&mut self, id: &LayerId, records: &[Value]) -> Result<LoadReport, LayerError> {
        Ok(self.get_mut(id)?.load_objects(records))
    }

    // --- Internals ---

    fn index_of(&self, id: &LayerId) -> Result<usize, LayerError> {
        self.canvases.iter().position(|c| c.id() == id).ok_or_else(|| LayerError::NotFound(id.clone()))
    }

    /// Stable sort keeps insertion order among equal `order` values.
    fn sort(&mut self) {
        self.canvases.sort_by_key(|c| c.layer().order);
    }

    fn refresh_all(&mut self) {
        let active = self.active.clone();
        for canvas in &mut self.canvases {
            canvas.refresh_interactivity(active.as_ref(), self.tool);
        }
    }

    fn layers_changed(&self) -> Action {
        Action::LayersChanged(self.layers())
    }
}
