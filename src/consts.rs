//! Shared numeric constants for the annotation engine.

// ── History ─────────────────────────────────────────────────────

/// Maximum number of snapshots retained per layer history.
pub const HISTORY_CAP: usize = 50;

/// Trailing debounce for continuous mutations, in milliseconds.
pub const HISTORY_DEBOUNCE_MS: f64 = 150.0;

// ── Hit-testing ─────────────────────────────────────────────────

/// Screen-space hit slop in pixels for handles and thin strokes.
pub const HANDLE_RADIUS_PX: f64 = 8.0;

/// Eraser radius as a multiple of the configured stroke width.
pub const ERASER_RADIUS_FACTOR: f64 = 1.5;

/// Releases smaller than this (page units) discard a drag-to-draw object.
pub const MIN_DRAG_SIZE: f64 = 2.0;

// ── Geometry ────────────────────────────────────────────────────

/// Arrowhead length as a multiple of stroke width, never below [`ARROW_HEAD_MIN`].
pub const ARROW_HEAD_SCALE: f64 = 4.0;

/// Minimum arrowhead length in page units.
pub const ARROW_HEAD_MIN: f64 = 10.0;

/// Arrowhead half-angle in radians (~30°).
pub const ARROW_HEAD_ANGLE: f64 = std::f64::consts::PI / 6.0;

/// Peak-to-baseline height of a squiggly underline, in page units.
pub const SQUIGGLY_AMPLITUDE: f64 = 3.0;

/// Distance between two squiggly crests, in page units.
pub const SQUIGGLY_WAVELENGTH: f64 = 8.0;

// ── Placement defaults (page units) ─────────────────────────────

pub const STAMP_WIDTH: f64 = 140.0;
pub const STAMP_HEIGHT: f64 = 44.0;
pub const GLYPH_SIZE: f64 = 24.0;
pub const NOTE_WIDTH: f64 = 160.0;
pub const NOTE_HEIGHT: f64 = 120.0;
pub const CALLOUT_WIDTH: f64 = 160.0;
pub const CALLOUT_HEIGHT: f64 = 60.0;
/// Offset from the callout box to the tip of its arrow.
pub const CALLOUT_ARROW_OFFSET: f64 = 60.0;
pub const TEXT_WIDTH: f64 = 200.0;
pub const TEXT_FONT_SIZE: f64 = 16.0;
/// Inset of the text part inside a note or callout box.
pub const TEXT_PADDING: f64 = 8.0;
pub const LINK_WIDTH: f64 = 120.0;
pub const LINK_HEIGHT: f64 = 24.0;
/// Images wider or taller than this are scaled down on placement.
pub const IMAGE_MAX_SIZE: f64 = 300.0;

// ── Paint defaults ──────────────────────────────────────────────

pub const DEFAULT_STROKE: &str = "#1F1A17";
pub const DEFAULT_STROKE_WIDTH: f64 = 2.0;
pub const NOTE_FILL: &str = "#FFF3A3";
pub const HIGHLIGHT_COLOR: &str = "#FFE600";
pub const HIGHLIGHT_WIDTH: f64 = 16.0;
pub const HIGHLIGHT_OPACITY: f64 = 0.35;
pub const SIGNATURE_COLOR: &str = "#0B2A6F";
pub const SIGNATURE_WIDTH: f64 = 1.5;
pub const CHECK_COLOR: &str = "#1E8E3E";
pub const CROSS_COLOR: &str = "#D93025";
pub const PAGE_EDIT_FILL: &str = "#FFFFFF";

// ── Layers ──────────────────────────────────────────────────────

/// Id of the reserved layer holding the page text and image.
pub const PDF_CONTENT_LAYER_ID: &str = "pdf-content";

/// Display name of the first user layer created with a document.
pub const DEFAULT_LAYER_NAME: &str = "Layer 1";

// ── Page ────────────────────────────────────────────────────────

/// Page size assumed until the page collaborator reports one (US Letter, points).
pub const DEFAULT_PAGE_WIDTH: f64 = 612.0;
pub const DEFAULT_PAGE_HEIGHT: f64 = 792.0;
