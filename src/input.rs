//! Input model: tools, tool options, pointer events, and the gesture state.
//!
//! `Tool` and `ToolOptions` capture the user's intent at the time of a
//! pointer event. `InputState` is the gesture being tracked between
//! pointer-down and pointer-up on one layer, carrying whatever context is
//! needed to reshape the object live and finalize it on release.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::camera::{Bounds, Point};
use crate::config::EngineConfig;
use crate::doc::{BrushKind, ObjectId, StampKind};
use crate::hit::ResizeAnchor;

/// Which tool is currently active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    /// Pick, move, resize, double-click to edit (default).
    #[default]
    Select,
    /// Pan the shared viewport.
    Hand,
    /// Remove objects the cursor touches.
    Eraser,
    Draw,
    Highlight,
    Signature,
    Rect,
    Ellipse,
    Line,
    Arrow,
    Squiggly,
    Text,
    Note,
    Callout,
    Stamp,
    Checkmark,
    Cross,
    Image,
    Link,
}

/// How a tool turns pointer input into objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolPattern {
    /// Pointer-down creates a complete object, then the tool reverts to select.
    ClickToPlace,
    /// Pointer-down anchors, move reshapes, pointer-up finalizes.
    DragToDraw,
    /// Continuous path capture until pointer-up.
    Freehand,
    /// Select, eraser, hand: act on existing objects or the viewport.
    Direct,
}

impl Tool {
    pub const ALL: [Tool; 19] = [
        Self::Select,
        Self::Hand,
        Self::Eraser,
        Self::Draw,
        Self::Highlight,
        Self::Signature,
        Self::Rect,
        Self::Ellipse,
        Self::Line,
        Self::Arrow,
        Self::Squiggly,
        Self::Text,
        Self::Note,
        Self::Callout,
        Self::Stamp,
        Self::Checkmark,
        Self::Cross,
        Self::Image,
        Self::Link,
    ];

    #[must_use]
    pub fn pattern(self) -> ToolPattern {
        match self {
            Self::Select | Self::Hand | Self::Eraser => ToolPattern::Direct,
            Self::Draw | Self::Highlight | Self::Signature => ToolPattern::Freehand,
            Self::Rect | Self::Ellipse | Self::Line | Self::Arrow | Self::Squiggly => ToolPattern::DragToDraw,
            Self::Text
            | Self::Note
            | Self::Callout
            | Self::Stamp
            | Self::Checkmark
            | Self::Cross
            | Self::Image
            | Self::Link => ToolPattern::ClickToPlace,
        }
    }

    /// Brush preset for freehand tools.
    #[must_use]
    pub fn brush(self) -> Option<BrushKind> {
        match self {
            Self::Draw => Some(BrushKind::Draw),
            Self::Highlight => Some(BrushKind::Highlight),
            Self::Signature => Some(BrushKind::Signature),
            _ => None,
        }
    }

    /// CSS cursor shown while this tool is active over an interactive layer.
    #[must_use]
    pub fn cursor(self) -> &'static str {
        match self {
            Self::Select => "default",
            Self::Hand => "grab",
            Self::Eraser => "cell",
            Self::Text => "text",
            _ => "crosshair",
        }
    }
}

/// Styling and presets applied to newly created objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ToolOptions {
    pub stroke: String,
    pub stroke_width: f64,
    pub fill: Option<String>,
    pub opacity: f64,
    pub font_size: f64,
    pub stamp: StampKind,
    /// URL the link tool applies.
    pub link_url: String,
}

impl Default for ToolOptions {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl ToolOptions {
    #[must_use]
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            stroke: config.default_stroke.clone(),
            stroke_width: config.default_stroke_width,
            fill: None,
            opacity: 1.0,
            font_size: config.default_font_size,
            stamp: StampKind::default(),
            link_url: String::new(),
        }
    }
}

/// Keyboard/mouse modifier keys held during an event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    /// Ctrl on most platforms, Cmd on macOS.
    #[must_use]
    pub fn command(self) -> bool {
        self.ctrl || self.meta
    }
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Button {
    /// Left mouse button, pen, or single-finger touch.
    #[default]
    Primary,
    Middle,
    Secondary,
}

/// A keyboard key as reported by the browser (`"Delete"`, `"Escape"`, `"a"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

impl Key {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The character this key types, for single-character key names.
    #[must_use]
    pub fn printable(&self) -> Option<char> {
        let mut chars = self.0.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if !c.is_control() => Some(c),
            _ => None,
        }
    }
}

/// One pointer event in screen space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    /// Position in CSS pixels relative to the viewport.
    pub screen: Point,
    pub button: Button,
    pub modifiers: Modifiers,
    /// Event timestamp in milliseconds (DOM `timeStamp`).
    pub time_ms: f64,
}

impl PointerEvent {
    #[must_use]
    pub fn primary(x: f64, y: f64, time_ms: f64) -> Self {
        Self { screen: Point::new(x, y), button: Button::Primary, modifiers: Modifiers::default(), time_ms }
    }
}

/// Tool selection shared by every layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UiState {
    pub tool: Tool,
    pub options: ToolOptions,
}

/// Gesture state of one layer's tool machine.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum InputState {
    /// No gesture in progress.
    #[default]
    Idle,
    /// Hand tool drag.
    Panning {
        /// Screen position of the previous event.
        last_screen: Point,
    },
    /// Select tool moving an object.
    DraggingObject {
        id: ObjectId,
        /// Page position of the previous event.
        last_page: Point,
        /// Whether any move happened yet.
        moved: bool,
    },
    /// Select tool dragging one of the eight handles.
    ResizingObject {
        id: ObjectId,
        anchor: ResizeAnchor,
        /// Page position where the drag started.
        start_page: Point,
        /// Bounds at the start of the drag.
        orig: Bounds,
    },
    /// Drag-to-draw: provisional object anchored at `anchor`.
    DrawingShape {
        id: ObjectId,
        anchor: Point,
        /// Pointer samples; squiggly builds its wave from these.
        samples: Vec<Point>,
    },
    /// Freehand capture; the path object is created on release.
    Capturing { brush: BrushKind, points: Vec<Point> },
    /// Eraser held down. Each object is erased at most once per stroke.
    Erasing { erased: HashSet<ObjectId> },
}

impl InputState {
    /// Whether a drag-to-draw or freehand capture is in progress.
    #[must_use]
    pub fn is_drawing(&self) -> bool {
        matches!(self, Self::DrawingShape { .. } | Self::Capturing { .. })
    }
}
