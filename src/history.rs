//! Per-layer undo/redo history of full scene snapshots.
//!
//! DESIGN
//! ======
//! Each layer owns one `History`: a list of serialized scenes plus a cursor.
//! Snapshot #0 is always the scene the layer started from, so `can_undo` is
//! false until something has changed.
//!
//! Discrete actions (placing or deleting an object) snapshot immediately.
//! Continuous actions (drag, resize, typing) call [`History::schedule`],
//! which arms a trailing deadline; every new call replaces the previous
//! deadline, so a burst of mutations yields one snapshot after the burst
//! settles. There is no timer here: the owner passes event timestamps in and
//! asks [`History::is_due`] when the host ticks.

#[cfg(test)]
#[path = "history_test.rs"]
mod history_test;

use serde_json::Value;
use tracing::debug;

use crate::doc::{AnnotationObject, LayerId, Scene};
use crate::error::ErrorCode;
use crate::record;

/// Undo/redo at a stack boundary. Absorbed as a no-op by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum HistoryError {
    #[error("history exhausted")]
    Exhausted,
}

impl ErrorCode for HistoryError {
    fn error_code(&self) -> &'static str {
        "E_HISTORY_EXHAUSTED"
    }

    fn is_absorbed(&self) -> bool {
        true
    }
}

/// One serialized copy of a layer scene.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    records: Vec<Value>,
}

impl Snapshot {
    /// Serialize every object of `scene` in paint order.
    #[must_use]
    pub fn capture(scene: &Scene) -> Self {
        Self { records: record::to_records(scene.iter()) }
    }

    /// Rebuild the objects this snapshot was taken from.
    #[must_use]
    pub fn restore(&self, layer_id: &LayerId) -> Vec<AnnotationObject> {
        record::load_records(layer_id, &self.records).objects
    }

    #[must_use]
    pub fn records(&self) -> &[Value] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Snapshot list with a cursor and a trailing debounce deadline.
#[derive(Debug, Clone)]
pub struct History {
    states: Vec<Snapshot>,
    index: usize,
    cap: usize,
    debounce_ms: f64,
    pending_due: Option<f64>,
}

impl History {
    /// Start a history whose only state is `baseline`.
    ///
    /// `cap` is clamped to at least 1.
    #[must_use]
    pub fn new(baseline: Snapshot, cap: usize, debounce_ms: f64) -> Self {
        Self { states: vec![baseline], index: 0, cap: cap.max(1), debounce_ms, pending_due: None }
    }

    /// Drop every state and start over from `baseline`.
    pub fn reset(&mut self, baseline: Snapshot) {
        self.states = vec![baseline];
        self.index = 0;
        self.pending_due = None;
    }

    /// Record a new state: discard the redo future, append, enforce the cap.
    ///
    /// Any pending debounce is cancelled; `snap` already contains it.
    pub fn snapshot(&mut self, snap: Snapshot) {
        self.pending_due = None;
        self.states.truncate(self.index + 1);
        self.states.push(snap);
        self.index += 1;
        if self.states.len() > self.cap {
            let overflow = self.states.len() - self.cap;
            self.states.drain(..overflow);
            self.index -= overflow;
            debug!(evicted = overflow, cap = self.cap, "history cap reached; dropped oldest snapshot");
        }
    }

    /// Arm (or re-arm) the trailing debounce. Returns the new deadline.
    pub fn schedule(&mut self, now_ms: f64) -> f64 {
        let due = now_ms + self.debounce_ms;
        self.pending_due = Some(due);
        due
    }

    /// Deadline of the pending debounced snapshot, if any.
    #[must_use]
    pub fn pending_due(&self) -> Option<f64> {
        self.pending_due
    }

    /// Whether a pending debounce has reached its deadline.
    #[must_use]
    pub fn is_due(&self, now_ms: f64) -> bool {
        self.pending_due.is_some_and(|due| now_ms >= due)
    }

    pub fn cancel_pending(&mut self) {
        self.pending_due = None;
    }

    /// Step back one state.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::Exhausted`] at the oldest retained state.
    pub fn undo(&mut self) -> Result<&Snapshot, HistoryError> {
        if self.index == 0 {
            return Err(HistoryError::Exhausted);
        }
        self.index -= 1;
        Ok(&self.states[self.index])
    }

    /// Step forward one state.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::Exhausted`] at the newest state.
    pub fn redo(&mut self) -> Result<&Snapshot, HistoryError> {
        if self.index + 1 >= self.states.len() {
            return Err(HistoryError::Exhausted);
        }
        self.index += 1;
        Ok(&self.states[self.index])
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.states.len()
    }

    /// State the scene currently corresponds to.
    #[must_use]
    pub fn current(&self) -> &Snapshot {
        &self.states[self.index]
    }

    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of retained states, including the baseline.
    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Never true: the baseline is always present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
