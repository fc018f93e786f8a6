#![allow(clippy::float_cmp)]

use serde_json::json;

use super::*;

#[test]
fn defaults_match_constants() {
    let c = EngineConfig::default();
    assert_eq!(c.history_cap, 50);
    assert_eq!(c.debounce_ms, 150.0);
    assert_eq!(c.eraser_radius_factor, 1.5);
    assert_eq!(c.min_drag_size, 2.0);
    assert_eq!(c.highlight_width, 16.0);
    assert_eq!(c.highlight_opacity, 0.35);
    assert_eq!(c.placeholder_text, "Type here");
    assert!(c.validate().is_ok());
}

#[test]
fn empty_object_yields_defaults() {
    assert_eq!(EngineConfig::from_json("{}").unwrap(), EngineConfig::default());
}

#[test]
fn partial_camel_case_overrides() {
    let c = EngineConfig::from_json(r#"{ "historyCap": 10, "debounceMs": 300, "placeholderText": "…" }"#).unwrap();
    assert_eq!(c.history_cap, 10);
    assert_eq!(c.debounce_ms, 300.0);
    assert_eq!(c.placeholder_text, "…");
    assert_eq!(c.min_drag_size, 2.0);
}

#[test]
fn unknown_fields_are_ignored() {
    assert!(EngineConfig::from_value(json!({ "theme": "dark" })).is_ok());
}

#[test]
fn malformed_json_is_parse_error() {
    let err = EngineConfig::from_json("{ historyCap: ").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
    assert_eq!(err.error_code(), "E_INVALID_CONFIG");
}

#[test]
fn mistyped_field_is_parse_error() {
    assert!(matches!(EngineConfig::from_value(json!({ "historyCap": "many" })), Err(ConfigError::Parse(_))));
}

#[test]
fn zero_cap_is_invalid() {
    let err = EngineConfig::from_value(json!({ "historyCap": 0 })).unwrap_err();
    assert_eq!(err, ConfigError::Invalid { field: "historyCap", reason: "must be at least 1" });
}

#[test]
fn zero_debounce_is_allowed() {
    assert!(EngineConfig::from_value(json!({ "debounceMs": 0 })).is_ok());
}

#[test]
fn non_positive_factors_are_invalid() {
    for (field, value) in [("eraserRadiusFactor", 0.0), ("defaultStrokeWidth", -1.0), ("highlightWidth", 0.0)] {
        let err = EngineConfig::from_value(json!({ field: value })).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: f, .. } if f == field), "{field}");
    }
}

#[test]
fn opacity_out_of_range_is_invalid() {
    assert!(EngineConfig::from_value(json!({ "highlightOpacity": 1.5 })).is_err());
}

#[test]
fn blank_stroke_is_invalid() {
    assert!(EngineConfig::from_value(json!({ "defaultStroke": "  " })).is_err());
}
