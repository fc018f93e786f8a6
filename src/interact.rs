//! Derived interactivity.
//!
//! Whether an object can be picked, hit by the eraser, dragged, or edited is
//! never stored on the object. It is computed from the object variant, its
//! layer's state, which layer is active, and the current tool. Layer canvases
//! cache the result per object and recompute it whenever one of those inputs
//! changes (lock, visibility, active layer, tool, undo/redo, load).

#[cfg(test)]
#[path = "interact_test.rs"]
mod interact_test;

use crate::doc::{AnnotationObject, LayerId, ObjectKind};
use crate::input::Tool;
use crate::layer::Layer;

/// Interaction flags for one object under the current state.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Interactivity {
    /// Can become the selection.
    pub selectable: bool,
    /// Receives pointer hits at all (select or eraser).
    pub evented: bool,
    /// Can be dragged or resized.
    pub movable: bool,
    /// Double-click opens the text editor.
    pub text_editable: bool,
}

impl Interactivity {
    pub const NONE: Interactivity = Interactivity { selectable: false, evented: false, movable: false, text_editable: false };
}

/// Whether a layer accepts input at all: visible, unlocked, and active.
#[must_use]
pub fn layer_is_interactive(layer: &Layer, active_layer_id: Option<&LayerId>) -> bool {
    layer.visible && !layer.locked && active_layer_id == Some(&layer.id)
}

/// Flags for `obj` on `layer` given the active layer and tool.
#[must_use]
pub fn effective_interactivity(
    obj: &AnnotationObject,
    layer: &Layer,
    active_layer_id: Option<&LayerId>,
    tool: Tool,
) -> Interactivity {
    if !layer_is_interactive(layer, active_layer_id) {
        return Interactivity::NONE;
    }
    match tool {
        Tool::Select => Interactivity {
            selectable: true,
            evented: true,
            // Freehand strokes and committed text stay put.
            movable: !matches!(obj.kind(), ObjectKind::FreehandPath | ObjectKind::Text),
            text_editable: obj.is_text_bearing(),
        },
        Tool::Eraser => Interactivity { evented: true, ..Interactivity::NONE },
        _ => Interactivity::NONE,
    }
}
