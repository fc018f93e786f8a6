//! One layer canvas: layer metadata, its scene, its history, and its tool machine.
//!
//! DESIGN
//! ======
//! `LayerCanvas` is the only owner of a [`Scene`]. Every mutation that comes
//! from the user or the host API goes through [`LayerCanvas::create`],
//! [`LayerCanvas::mutate`] or [`LayerCanvas::remove`], which refuse to touch
//! a locked layer. Loading from persistence and restoring a history snapshot
//! replace the scene wholesale and are not user mutations.
//!
//! Interactivity flags are cached per object and recomputed from
//! [`crate::interact::effective_interactivity`] whenever the scene, the
//! layer flags, the active layer, or the tool change.

#[cfg(test)]
#[path = "layer_test.rs"]
mod layer_test;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::config::EngineConfig;
use crate::doc::{AnnotationObject, LayerId, ObjectId, ObjectPatch, Paint, Scene, SceneError, Shape};
use crate::engine::Action;
use crate::error::ErrorCode;
use crate::history::{History, HistoryError, Snapshot};
use crate::input::Tool;
use crate::interact::{Interactivity, effective_interactivity};
use crate::record::{self, LoadReport};
use crate::tools::ToolDispatch;

/// Errors raised by layer and stack operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LayerError {
    #[error("layer not found: {0}")]
    NotFound(LayerId),
    #[error("reserved layer cannot be changed: {0}")]
    Reserved(LayerId),
    #[error("cannot delete the last layer")]
    LastLayer,
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error(transparent)]
    History(#[from] HistoryError),
}

impl ErrorCode for LayerError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "E_LAYER_NOT_FOUND",
            Self::Reserved(_) => "E_RESERVED_LAYER",
            Self::LastLayer => "E_LAST_LAYER",
            Self::Scene(e) => e.error_code(),
            Self::History(e) => e.error_code(),
        }
    }

    fn is_absorbed(&self) -> bool {
        match self {
            Self::Scene(e) => e.is_absorbed(),
            Self::History(e) => e.is_absorbed(),
            _ => false,
        }
    }
}

/// Layer metadata, as shown in the layer panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    pub id: LayerId,
    pub name: String,
    pub visible: bool,
    pub locked: bool,
    /// Paint order; higher is in front.
    pub order: i64,
}

impl Layer {
    #[must_use]
    pub fn new(id: LayerId, name: impl Into<String>, order: i64) -> Self {
        Self { id, name: name.into(), visible: true, locked: false, order }
    }

    #[must_use]
    pub fn is_reserved(&self) -> bool {
        self.id.is_reserved()
    }
}

/// A layer with its own scene, history and tool machine.
#[derive(Debug)]
pub struct LayerCanvas {
    pub(crate) layer: Layer,
    pub(crate) scene: Scene,
    pub(crate) history: History,
    pub(crate) dispatch: ToolDispatch,
    interactivity: HashMap<ObjectId, Interactivity>,
    active_layer_id: Option<LayerId>,
    tool: Tool,
    dirty: bool,
}

impl LayerCanvas {
    /// An empty layer whose history baseline is the empty scene.
    #[must_use]
    pub fn new(layer: Layer, config: &EngineConfig) -> Self {
        let scene = Scene::new();
        let history = History::new(Snapshot::capture(&scene), config.history_cap, config.debounce_ms);
        Self {
            layer,
            scene,
            history,
            dispatch: ToolDispatch::default(),
            interactivity: HashMap::new(),
            active_layer_id: None,
            tool: Tool::default(),
            dirty: true,
        }
    }

    // --- Queries ---

    #[must_use]
    pub fn layer(&self) -> &Layer {
        &self.layer
    }

    #[must_use]
    pub fn id(&self) -> &LayerId {
        &self.layer.id
    }

    #[must_use]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    #[must_use]
    pub fn history(&self) -> &History {
        &self.history
    }

    #[must_use]
    pub fn dispatch(&self) -> &ToolDispatch {
        &self.dispatch
    }

    #[must_use]
    pub fn selection(&self) -> Option<ObjectId> {
        self.dispatch.selected
    }

    #[must_use]
    pub fn get(&self, id: &ObjectId) -> Option<&AnnotationObject> {
        self.scene.get(id)
    }

    /// Ids of every object matching `pred`, in paint order.
    pub fn query<F>(&self, pred: F) -> Vec<ObjectId>
    where
        F: Fn(&AnnotationObject) -> bool,
    {
        self.scene.query(pred)
    }

    /// Serialized records of the current scene, in paint order.
    #[must_use]
    pub fn records(&self) -> Vec<Value> {
        record::to_records(self.scene.iter())
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // --- Object API ---

    fn ensure_unlocked(&self) -> Result<(), SceneError> {
        if self.layer.locked {
            return Err(SceneError::LayerLocked(self.layer.id.clone()));
        }
        Ok(())
    }

    /// Create an object on this layer.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::LayerLocked`] if the layer is locked.
    pub fn create(&mut self, shape: Shape, paint: Paint) -> Result<ObjectId, SceneError> {
        self.insert(AnnotationObject::new(self.layer.id.clone(), shape, paint))
    }

    /// Insert a prebuilt object on top. Its layer id is forced to this layer.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::LayerLocked`] if the layer is locked.
    pub fn insert(&mut self, mut obj: AnnotationObject) -> Result<ObjectId, SceneError> {
        self.ensure_unlocked()?;
        obj.layer_id = self.layer.id.clone();
        let id = obj.id;
        self.scene.insert(obj);
        self.recompute_interactivity();
        self.dirty = true;
        Ok(id)
    }

    /// Apply a sparse patch. Returns whether anything changed.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::LayerLocked`] if the layer is locked and
    /// [`SceneError::ObjectNotFound`] for an unknown id.
    pub fn mutate(&mut self, id: &ObjectId, patch: &ObjectPatch) -> Result<bool, SceneError> {
        self.ensure_unlocked()?;
        let obj = self.scene.get_mut(id).ok_or(SceneError::ObjectNotFound(*id))?;
        let changed = obj.apply(patch);
        if changed {
            self.dirty = true;
        }
        Ok(changed)
    }

    /// Remove an object along with every object grouped to it.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::LayerLocked`] if the layer is locked and
    /// [`SceneError::ObjectNotFound`] for an unknown id.
    pub fn remove(&mut self, id: &ObjectId) -> Result<AnnotationObject, SceneError> {
        self.ensure_unlocked()?;
        let removed = self.scene.remove(id).ok_or(SceneError::ObjectNotFound(*id))?;
        for member in self.scene.query(|o| o.group == Some(*id)) {
            self.scene.remove(&member);
        }
        if self.dispatch.selected == Some(*id) {
            self.dispatch.selected = None;
        }
        self.recompute_interactivity();
        self.dirty = true;
        Ok(removed)
    }

    // --- History ---

    /// Snapshot immediately and ask the host to persist.
    pub fn snapshot_now(&mut self) -> Vec<Action> {
        let snap = Snapshot::capture(&self.scene);
        let objects = snap.records().to_vec();
        self.history.snapshot(snap);
        vec![Action::SaveRequested { layer_id: self.layer.id.clone(), objects }]
    }

    /// Snapshot only if the scene differs from the current history state.
    /// A pending debounce is cancelled either way.
    pub fn snapshot_if_changed(&mut self) -> Vec<Action> {
        if Snapshot::capture(&self.scene) == *self.history.current() {
            self.history.cancel_pending();
            return Vec::new();
        }
        self.snapshot_now()
    }

    /// Arm the trailing debounce for a continuous mutation.
    pub fn schedule_snapshot(&mut self, now_ms: f64) -> Action {
        let due_ms = self.history.schedule(now_ms);
        Action::HistoryScheduled { layer_id: self.layer.id.clone(), due_ms }
    }

    /// Take the debounced snapshot if its deadline has passed.
    pub fn tick(&mut self, now_ms: f64) -> Vec<Action> {
        if !self.history.is_due(now_ms) {
            return Vec::new();
        }
        if self.dispatch.editing.as_ref().is_some_and(crate::edit::EditSession::is_composite) {
            // A split composite is never persisted; commit snapshots it.
            return Vec::new();
        }
        if self.dispatch.input.is_drawing() {
            // A provisional shape is never persisted; release snapshots it.
            return Vec::new();
        }
        self.snapshot_if_changed()
    }

    /// Take a pending debounced snapshot now, whatever its deadline.
    pub fn flush_pending(&mut self) -> Vec<Action> {
        if self.history.pending_due().is_none() {
            return Vec::new();
        }
        self.snapshot_if_changed()
    }

    /// Step this layer's history back one state.
    ///
    /// Any open edit is committed and any in-flight draw discarded first, and
    /// a pending debounced change is snapshotted so it can itself be undone.
    ///
    /// # Errors
    ///
    /// Returns [`LayerError::Scene`] with `LayerLocked` on a locked layer and
    /// [`LayerError::History`] at the oldest retained state.
    pub fn undo(&mut self) -> Result<Vec<Action>, LayerError> {
        self.ensure_unlocked()?;
        let mut actions = self.settle();
        let snap = self.history.undo()?;
        let objects = snap.restore(&self.layer.id);
        let records = snap.records().to_vec();
        actions.extend(self.restore_scene(objects, records));
        Ok(actions)
    }

    /// Step this layer's history forward one state.
    ///
    /// # Errors
    ///
    /// Same as [`LayerCanvas::undo`], at the newest state.
    pub fn redo(&mut self) -> Result<Vec<Action>, LayerError> {
        self.ensure_unlocked()?;
        let mut actions = self.settle();
        let snap = self.history.redo()?;
        let objects = snap.restore(&self.layer.id);
        let records = snap.records().to_vec();
        actions.extend(self.restore_scene(objects, records));
        Ok(actions)
    }

    fn restore_scene(&mut self, objects: Vec<AnnotationObject>, records: Vec<Value>) -> Vec<Action> {
        self.scene.replace_all(objects);
        self.dispatch.selected = None;
        self.recompute_interactivity();
        self.dirty = true;
        vec![
            Action::SaveRequested { layer_id: self.layer.id.clone(), objects: records },
            Action::RenderNeeded { layer_id: self.layer.id.clone() },
        ]
    }

    /// Replace the scene with persisted records and restart the history
    /// from the loaded state. Malformed records are skipped and reported.
    pub fn load_objects(&mut self, records: &[Value]) -> LoadReport {
        let report = record::load_records(&self.layer.id, records);
        self.dispatch = ToolDispatch::default();
        self.scene.replace_all(report.objects.clone());
        self.history.reset(Snapshot::capture(&self.scene));
        self.recompute_interactivity();
        self.dirty = true;
        debug!(layer_id = %self.layer.id, count = report.objects.len(), skipped = report.skipped.len(), "layer objects loaded");
        report
    }

    // --- Interactivity ---

    /// Recompute every cached flag for a new active layer and tool.
    pub fn refresh_interactivity(&mut self, active_layer_id: Option<&LayerId>, tool: Tool) {
        self.active_layer_id = active_layer_id.cloned();
        self.tool = tool;
        self.recompute_interactivity();
    }

    pub(crate) fn set_tool(&mut self, tool: Tool) {
        self.tool = tool;
        self.recompute_interactivity();
    }

    pub(crate) fn recompute_interactivity(&mut self) {
        let active = self.active_layer_id.as_ref();
        self.interactivity = self
            .scene
            .iter()
            .map(|o| (o.id, effective_interactivity(o, &self.layer, active, self.tool)))
            .collect();
    }

    /// Cached flags for one object (all false for unknown ids).
    #[must_use]
    pub fn interactivity(&self, id: &ObjectId) -> Interactivity {
        self.interactivity.get(id).copied().unwrap_or_default()
    }

    // --- Dirty tracking ---

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }
}
