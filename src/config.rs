//! Engine tuning knobs handed over by the host.
//!
//! The host passes a JSON object (usually straight from its own settings)
//! to [`EngineConfig::from_json`]. Every field is optional and falls back to
//! the defaults in [`crate::consts`]; the parsed config is validated before
//! use.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_STROKE, DEFAULT_STROKE_WIDTH, ERASER_RADIUS_FACTOR, HIGHLIGHT_OPACITY, HIGHLIGHT_WIDTH, HISTORY_CAP,
    HISTORY_DEBOUNCE_MS, MIN_DRAG_SIZE, TEXT_FONT_SIZE,
};
use crate::error::ErrorCode;

/// Errors raised while building an [`EngineConfig`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("config parse error: {0}")]
    Parse(String),
    #[error("invalid config field {field}: {reason}")]
    Invalid { field: &'static str, reason: &'static str },
}

impl ErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        "E_INVALID_CONFIG"
    }
}

/// Tuning knobs for history, tools and brush presets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Snapshots retained per layer, baseline included.
    pub history_cap: usize,
    /// Trailing debounce for continuous mutations, in milliseconds.
    pub debounce_ms: f64,
    /// Eraser radius as a multiple of the current stroke width.
    pub eraser_radius_factor: f64,
    /// Drag-to-draw releases smaller than this (page units) are discarded.
    pub min_drag_size: f64,
    pub default_stroke: String,
    pub default_stroke_width: f64,
    pub default_font_size: f64,
    pub highlight_width: f64,
    pub highlight_opacity: f64,
    /// Initial text of new text, note and callout objects.
    pub placeholder_text: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            history_cap: HISTORY_CAP,
            debounce_ms: HISTORY_DEBOUNCE_MS,
            eraser_radius_factor: ERASER_RADIUS_FACTOR,
            min_drag_size: MIN_DRAG_SIZE,
            default_stroke: DEFAULT_STROKE.to_owned(),
            default_stroke_width: DEFAULT_STROKE_WIDTH,
            default_font_size: TEXT_FONT_SIZE,
            highlight_width: HIGHLIGHT_WIDTH,
            highlight_opacity: HIGHLIGHT_OPACITY,
            placeholder_text: "Type here".to_owned(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON config string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON or mistyped fields
    /// and [`ConfigError::Invalid`] for out-of-range values.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate an already-decoded JSON value.
    ///
    /// # Errors
    ///
    /// Same as [`EngineConfig::from_json`].
    pub fn from_value(value: serde_json::Value) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_value(value).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check every field is within its usable range.
    ///
    /// # Errors
    ///
    /// Returns the first offending field as [`ConfigError::Invalid`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_cap == 0 {
            return Err(ConfigError::Invalid { field: "historyCap", reason: "must be at least 1" });
        }
        positive("debounceMs", self.debounce_ms, true)?;
        positive("eraserRadiusFactor", self.eraser_radius_factor, false)?;
        positive("minDragSize", self.min_drag_size, true)?;
        positive("defaultStrokeWidth", self.default_stroke_width, false)?;
        positive("defaultFontSize", self.default_font_size, false)?;
        positive("highlightWidth", self.highlight_width, false)?;
        if !(0.0..=1.0).contains(&self.highlight_opacity) {
            return Err(ConfigError::Invalid { field: "highlightOpacity", reason: "must be within 0..=1" });
        }
        if self.default_stroke.trim().is_empty() {
            return Err(ConfigError::Invalid { field: "defaultStroke", reason: "must not be empty" });
        }
        Ok(())
    }
}

fn positive(field: &'static str, value: f64, allow_zero: bool) -> Result<(), ConfigError> {
    let ok = value.is_finite() && if allow_zero { value >= 0.0 } else { value > 0.0 };
    if ok {
        Ok(())
    } else if allow_zero {
        Err(ConfigError::Invalid { field, reason: "must be a finite number >= 0" })
    } else {
        Err(ConfigError::Invalid { field, reason: "must be a finite number > 0" })
    }
}
