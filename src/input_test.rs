use super::*;

// =============================================================
// Tool
// =============================================================

#[test]
fn tool_default_is_select() {
    assert_eq!(Tool::default(), Tool::Select);
}

#[test]
fn tool_patterns() {
    assert_eq!(Tool::Select.pattern(), ToolPattern::Direct);
    assert_eq!(Tool::Hand.pattern(), ToolPattern::Direct);
    assert_eq!(Tool::Eraser.pattern(), ToolPattern::Direct);
    assert_eq!(Tool::Highlight.pattern(), ToolPattern::Freehand);
    assert_eq!(Tool::Squiggly.pattern(), ToolPattern::DragToDraw);
    assert_eq!(Tool::Arrow.pattern(), ToolPattern::DragToDraw);
    assert_eq!(Tool::Stamp.pattern(), ToolPattern::ClickToPlace);
    assert_eq!(Tool::Link.pattern(), ToolPattern::ClickToPlace);
}

#[test]
fn every_tool_has_one_pattern_and_cursor() {
    for tool in Tool::ALL {
        assert!(!tool.cursor().is_empty(), "{tool:?}");
        let freehand = tool.pattern() == ToolPattern::Freehand;
        assert_eq!(freehand, tool.brush().is_some(), "{tool:?}");
    }
}

#[test]
fn brush_presets() {
    assert_eq!(Tool::Draw.brush(), Some(BrushKind::Draw));
    assert_eq!(Tool::Signature.brush(), Some(BrushKind::Signature));
    assert_eq!(Tool::Rect.brush(), None);
}

#[test]
fn tool_serializes_lowercase() {
    assert_eq!(serde_json::to_value(Tool::Checkmark).unwrap(), "checkmark");
    let tool: Tool = serde_json::from_value(serde_json::json!("hand")).unwrap();
    assert_eq!(tool, Tool::Hand);
}

// =============================================================
// ToolOptions
// =============================================================

#[test]
fn options_follow_config_defaults() {
    let config = EngineConfig { default_stroke: "#123456".into(), default_stroke_width: 5.0, ..EngineConfig::default() };
    let opts = ToolOptions::from_config(&config);
    assert_eq!(opts.stroke, "#123456");
    assert!((opts.stroke_width - 5.0).abs() < f64::EPSILON);
    assert!(opts.fill.is_none());
}

#[test]
fn options_deserialize_partial_camel_case() {
    let opts: ToolOptions = serde_json::from_value(serde_json::json!({ "strokeWidth": 4.0, "stamp": "draft" })).unwrap();
    assert!((opts.stroke_width - 4.0).abs() < f64::EPSILON);
    assert_eq!(opts.stamp, StampKind::Draft);
    assert_eq!(opts.stroke, EngineConfig::default().default_stroke);
}

// =============================================================
// Modifiers / Key
// =============================================================

#[test]
fn command_is_ctrl_or_meta() {
    assert!(!Modifiers::default().command());
    assert!(Modifiers { ctrl: true, ..Default::default() }.command());
    assert!(Modifiers { meta: true, ..Default::default() }.command());
    assert!(!Modifiers { shift: true, alt: true, ..Default::default() }.command());
}

#[test]
fn printable_keys() {
    assert_eq!(Key::new("a").printable(), Some('a'));
    assert_eq!(Key::new(" ").printable(), Some(' '));
    assert_eq!(Key::new("é").printable(), Some('é'));
    assert_eq!(Key::new("Enter").printable(), None);
    assert_eq!(Key::new("Backspace").printable(), None);
    assert_eq!(Key::new("").printable(), None);
}

// =============================================================
// InputState
// =============================================================

#[test]
fn input_state_default_is_idle() {
    assert_eq!(InputState::default(), InputState::Idle);
    assert!(!InputState::Idle.is_drawing());
}

#[test]
fn drawing_states() {
    let capturing = InputState::Capturing { brush: BrushKind::Draw, points: vec![] };
    assert!(capturing.is_drawing());
    let erasing = InputState::Erasing { erased: HashSet::new() };
    assert!(!erasing.is_drawing());
}

#[test]
fn primary_event_helper() {
    let ev = PointerEvent::primary(3.0, 4.0, 10.0);
    assert_eq!(ev.screen, Point::new(3.0, 4.0));
    assert_eq!(ev.button, Button::Primary);
    assert!(!ev.modifiers.command());
}
