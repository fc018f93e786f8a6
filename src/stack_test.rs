use serde_json::json;

use super::*;
use crate::camera::{Bounds, Camera, Point};
use crate::doc::{BoxShape, ObjectId, Paint, Shape};
use crate::error::ErrorCode;
use crate::input::{PointerEvent, UiState};
use crate::interact::Interactivity;
use crate::tools::ToolContext;

fn stack() -> LayerStack {
    LayerStack::new(&EngineConfig::default())
}

fn first_user(stack: &LayerStack) -> LayerId {
    stack.active_id().cloned().unwrap()
}

fn rect() -> Shape {
    Shape::Rect(BoxShape { bounds: Bounds::new(0.0, 0.0, 10.0, 10.0) })
}

// =============================================================
// Construction
// =============================================================

#[test]
fn new_stack_has_page_layer_and_one_active_user_layer() {
    let s = stack();
    let layers = s.layers();
    assert_eq!(layers.len(), 2);
    assert_eq!(layers[0].id, LayerId::pdf_content());
    assert_eq!(layers[0].order, 0);
    assert_eq!(layers[1].name, DEFAULT_LAYER_NAME);
    assert_eq!(layers[1].order, 1);
    assert_eq!(s.active_id(), Some(&layers[1].id));
    assert!(s.is_routable());
}

// =============================================================
// Reserved layer
// =============================================================

#[test]
fn reserved_layer_refuses_generic_controls() {
    let mut s = stack();
    let page = LayerId::pdf_content();
    let reserved = LayerError::Reserved(page.clone());

    assert_eq!(s.set_active_layer(&page).unwrap_err(), reserved);
    assert_eq!(s.set_locked(&page, true).unwrap_err(), reserved);
    assert_eq!(s.set_visible(&page, false).unwrap_err(), reserved);
    assert_eq!(s.reorder(&page, Direction::Up).unwrap_err(), reserved);
    assert_eq!(s.rename_layer(&page, "x").unwrap_err(), reserved);
    assert_eq!(s.delete_layer(&page).unwrap_err(), reserved);

    let page_layer = s.get(&page).unwrap().layer().clone();
    assert!(page_layer.visible);
    assert!(!page_layer.locked);
    assert_eq!(page_layer.name, "Page");
}

#[test]
fn reserved_layer_is_never_interactive() {
    let mut s = stack();
    let id = s.reserved_mut().unwrap().create(rect(), Paint::default()).unwrap();
    assert_eq!(s.get(&LayerId::pdf_content()).unwrap().interactivity(&id), Interactivity::NONE);
}

// =============================================================
// Order
// =============================================================

#[test]
fn reorder_swaps_with_adjacent_user_layer() {
    let mut s = stack();
    let bottom = first_user(&s);
    let (top, _) = s.add_layer("Layer 2");
    assert_eq!(s.paint_order(), vec![LayerId::pdf_content(), bottom.clone(), top.clone()]);

    let actions = s.reorder(&bottom, Direction::Up).unwrap();
    assert!(matches!(actions.as_slice(), [Action::LayersChanged(_)]));
    assert_eq!(s.paint_order(), vec![LayerId::pdf_content(), top.clone(), bottom.clone()]);
}

#[test]
fn reorder_at_edge_is_noop() {
    let mut s = stack();
    let only = first_user(&s);
    assert!(s.reorder(&only, Direction::Up).unwrap().is_empty());
    // The page layer below is not a swap partner.
    assert!(s.reorder(&only, Direction::Down).unwrap().is_empty());
    assert_eq!(s.paint_order()[0], LayerId::pdf_content());
}

#[test]
fn reorder_unknown_layer_is_not_found() {
    let mut s = stack();
    let ghost = LayerId::new("ghost");
    assert_eq!(s.reorder(&ghost, Direction::Up).unwrap_err(), LayerError::NotFound(ghost));
}

// =============================================================
// Membership
// =============================================================

#[test]
fn add_layer_goes_to_front_and_becomes_active() {
    let mut s = stack();
    let (id, actions) = s.add_layer("Markup");
    assert_eq!(s.paint_order().last(), Some(&id));
    assert_eq!(s.active_id(), Some(&id));
    assert_eq!(s.get(&id).unwrap().layer().name, "Markup");
    assert!(matches!(actions.last(), Some(Action::LayersChanged(layers)) if layers.len() == 3));
}

#[test]
fn rename_changes_name_only() {
    let mut s = stack();
    let id = first_user(&s);
    s.rename_layer(&id, "Review").unwrap();
    assert_eq!(s.get(&id).unwrap().layer().name, "Review");
    assert_eq!(s.get(&id).unwrap().layer().order, 1);
}

#[test]
fn deleting_last_user_layer_is_refused() {
    let mut s = stack();
    let id = first_user(&s);
    let err = s.delete_layer(&id).unwrap_err();
    assert_eq!(err, LayerError::LastLayer);
    assert_eq!(err.error_code(), "E_LAST_LAYER");
    assert_eq!(s.layers().len(), 2);
}

#[test]
fn deleting_active_layer_activates_frontmost_remaining() {
    let mut s = stack();
    let first = first_user(&s);
    let (second, _) = s.add_layer("Layer 2");
    s.get_mut(&second).unwrap().create(rect(), Paint::default()).unwrap();

    let actions = s.delete_layer(&second).unwrap();
    assert_eq!(actions[0], Action::LayerRemoved { layer_id: second.clone() });
    assert_eq!(s.active_id(), Some(&first));
    assert!(s.get(&second).is_err());
}

#[test]
fn deleting_inactive_layer_keeps_active() {
    let mut s = stack();
    let first = first_user(&s);
    let (second, _) = s.add_layer("Layer 2");
    s.delete_layer(&first).unwrap();
    assert_eq!(s.active_id(), Some(&second));
}

// =============================================================
// Active layer and routing
// =============================================================

#[test]
fn switching_active_layer_moves_interactivity() {
    let mut s = stack();
    let first = first_user(&s);
    let obj = s.get_mut(&first).unwrap().create(rect(), Paint::default()).unwrap();
    assert!(s.get(&first).unwrap().interactivity(&obj).selectable);

    let (second, _) = s.add_layer("Layer 2");
    assert_eq!(s.active_id(), Some(&second));
    assert!(!s.get(&first).unwrap().interactivity(&obj).selectable);

    s.set_active_layer(&first).unwrap();
    assert!(s.get(&first).unwrap().interactivity(&obj).selectable);
    assert!(s.set_active_layer(&first).unwrap().is_empty());
}

#[test]
fn switching_away_clears_outgoing_selection() {
    let mut s = stack();
    let first = first_user(&s);
    let obj = s.get_mut(&first).unwrap().create(rect(), Paint::default()).unwrap();
    s.get_mut(&first).unwrap().dispatch.selected = Some(obj);

    let (_, actions) = s.add_layer("Layer 2");
    assert!(actions.contains(&Action::SelectionChanged { layer_id: first.clone(), id: None }));
    assert_eq!(s.get(&first).unwrap().selection(), None);
}

#[test]
fn hidden_or_locked_active_layer_is_not_routed() {
    let mut s = stack();
    let id = first_user(&s);

    s.set_visible(&id, false).unwrap();
    assert!(s.route_mut().is_none());
    assert!(!s.is_routable());
    s.set_visible(&id, true).unwrap();
    assert!(s.route_mut().is_some());

    s.set_locked(&id, true).unwrap();
    assert!(s.route_mut().is_none());
    s.set_locked(&id, false).unwrap();
    assert!(s.is_routable());
}

#[test]
fn locking_settles_in_flight_draw() {
    let mut s = stack();
    let id = first_user(&s);
    s.set_tool(Tool::Rect);

    let config = EngineConfig::default();
    let mut camera = Camera::default();
    let mut ui = UiState { tool: Tool::Rect, ..UiState::default() };
    {
        let canvas = s.route_mut().unwrap();
        let mut ctx = ToolContext { camera: &mut camera, ui: &mut ui, config: &config };
        canvas.pointer_down(&PointerEvent::primary(0.0, 0.0, 0.0), &mut ctx);
        canvas.pointer_move(&PointerEvent::primary(30.0, 30.0, 10.0), &mut ctx);
    }
    assert_eq!(s.get(&id).unwrap().scene().len(), 1);

    let actions = s.set_locked(&id, true).unwrap();
    assert!(s.get(&id).unwrap().scene().is_empty());
    assert!(s.get(&id).unwrap().layer().locked);
    assert!(actions.contains(&Action::RenderNeeded { layer_id: id.clone() }));
    // Repeating the same flag is a no-op.
    assert!(s.set_locked(&id, true).unwrap().is_empty());
}

#[test]
fn set_tool_reaches_every_layer() {
    let mut s = stack();
    let first = first_user(&s);
    let obj = s.get_mut(&first).unwrap().create(rect(), Paint::default()).unwrap();
    s.set_tool(Tool::Eraser);
    assert_eq!(s.tool(), Tool::Eraser);
    let flags = s.get(&first).unwrap().interactivity(&obj);
    assert!(flags.evented);
    assert!(!flags.selectable);

    s.sync_tool(Tool::Select);
    assert!(s.get(&first).unwrap().interactivity(&obj).selectable);
}

// =============================================================
// Persistence
// =============================================================

#[test]
fn load_objects_targets_one_layer() {
    let mut s = stack();
    let id = first_user(&s);
    let record = json!({ "id": ObjectId::new_v4().to_string(), "type": "checkmark",
                         "layerId": id.as_str(), "x": 1.0, "y": 1.0, "width": 20.0, "height": 20.0 });
    let report = s.load_objects(&id, &[record]).unwrap();
    assert_eq!(report.objects.len(), 1);
    let obj = s.get(&id).unwrap().scene().iter().next().unwrap();
    assert_eq!(obj.bounds().center(), Point::new(11.0, 11.0));

    let ghost = LayerId::new("ghost");
    assert_eq!(s.load_objects(&ghost, &[]).unwrap_err(), LayerError::NotFound(ghost));
}
