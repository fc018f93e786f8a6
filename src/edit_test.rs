#![allow(clippy::float_cmp)]

use super::*;
use crate::camera::Bounds;
use crate::doc::{LayerId, ObjectKind, TextBoxShape};

fn layer() -> LayerId {
    LayerId::new("L1")
}

fn text_obj(text: &str) -> AnnotationObject {
    AnnotationObject::new(
        layer(),
        Shape::Text(TextShape { at: Point::new(5.0, 5.0), width: 200.0, font_size: 16.0, text: text.into() }),
        Paint::default(),
    )
}

fn note_obj(text: &str) -> AnnotationObject {
    AnnotationObject::new(
        layer(),
        Shape::Note(TextBoxShape { bounds: Bounds::new(10.0, 10.0, 160.0, 120.0), font_size: 14.0, text: text.into() }),
        Paint { fill: Some("#FFF3A3".into()), ..Paint::default() },
    )
}

fn rect_obj() -> AnnotationObject {
    AnnotationObject::new(layer(), Shape::Rect(BoxShape { bounds: Bounds::new(0.0, 0.0, 1.0, 1.0) }), Paint::default())
}

fn type_str(session: &mut EditSession, s: &str) {
    for c in s.chars() {
        session.apply_key(EditKey::Insert(c));
    }
}

// =============================================================
// Plain text
// =============================================================

#[test]
fn begin_on_non_text_is_none() {
    let mut scene = Scene::new();
    let r = rect_obj();
    let id = r.id;
    scene.insert(r);
    assert!(EditSession::begin(&mut scene, id).is_none());
    assert!(EditSession::begin(&mut scene, ObjectId::new_v4()).is_none());
}

#[test]
fn first_key_replaces_placeholder() {
    let mut scene = Scene::new();
    let t = text_obj("Type here");
    let id = t.id;
    scene.insert(t);

    let mut session = EditSession::begin(&mut scene, id).unwrap();
    assert!(session.select_all());
    type_str(&mut session, "hi");
    assert_eq!(session.buffer(), "hi");
    session.sync(&mut scene);
    assert_eq!(scene.get(&id).unwrap().text(), Some("hi"));
}

#[test]
fn backspace_with_selection_clears_everything() {
    let mut scene = Scene::new();
    let t = text_obj("abc");
    let id = t.id;
    scene.insert(t);
    let mut session = EditSession::begin(&mut scene, id).unwrap();
    assert!(session.apply_key(EditKey::Backspace));
    assert_eq!(session.buffer(), "");
}

#[test]
fn keys_after_first_append_and_delete() {
    let mut scene = Scene::new();
    let t = text_obj("x");
    let id = t.id;
    scene.insert(t);
    let mut session = EditSession::begin(&mut scene, id).unwrap();
    type_str(&mut session, "ab");
    session.apply_key(EditKey::Newline);
    type_str(&mut session, "cd");
    session.apply_key(EditKey::Backspace);
    assert_eq!(session.buffer(), "ab\nc");
}

#[test]
fn backspace_on_empty_buffer_is_no_change() {
    let mut scene = Scene::new();
    let t = text_obj("a");
    let id = t.id;
    scene.insert(t);
    let mut session = EditSession::begin(&mut scene, id).unwrap();
    session.apply_key(EditKey::Backspace);
    assert!(!session.apply_key(EditKey::Backspace));
}

#[test]
fn commit_unchanged_text_reports_no_change() {
    let mut scene = Scene::new();
    let t = text_obj("same");
    let id = t.id;
    scene.insert(t);
    let session = EditSession::begin(&mut scene, id).unwrap();
    let outcome = session.commit(&mut scene);
    assert_eq!(outcome, EditOutcome { id, changed: false, removed: false });
}

#[test]
fn commit_blank_text_removes_object() {
    let mut scene = Scene::new();
    let t = text_obj("bye");
    let id = t.id;
    scene.insert(t);
    let mut session = EditSession::begin(&mut scene, id).unwrap();
    session.set_buffer("   ");
    let outcome = session.commit(&mut scene);
    assert!(outcome.removed);
    assert!(scene.is_empty());
}

#[test]
fn set_buffer_clears_select_all() {
    let mut scene = Scene::new();
    let t = text_obj("a");
    let id = t.id;
    scene.insert(t);
    let mut session = EditSession::begin(&mut scene, id).unwrap();
    assert!(session.set_buffer("hello"));
    assert!(!session.set_buffer("hello"));
    type_str(&mut session, "!");
    assert_eq!(session.buffer(), "hello!");
}

// =============================================================
// Composites
// =============================================================

#[test]
fn note_is_split_into_grouped_parts() {
    let mut scene = Scene::new();
    scene.insert(rect_obj());
    let note = note_obj("memo");
    let id = note.id;
    scene.insert(note);
    scene.insert(rect_obj());

    let session = EditSession::begin(&mut scene, id).unwrap();
    assert!(session.is_composite());
    assert_eq!(session.subject(), id);
    assert!(!scene.contains(&id));
    assert_eq!(scene.len(), 4);

    let kinds: Vec<_> = scene.iter().map(AnnotationObject::kind).collect();
    assert_eq!(kinds, vec![ObjectKind::Rect, ObjectKind::Rect, ObjectKind::Text, ObjectKind::Rect]);
    let part = scene.get(&session.target()).unwrap();
    assert_eq!(part.group, Some(id));
    assert_eq!(part.text(), Some("memo"));
    assert!(session.owns(&part.id));
}

#[test]
fn committing_note_restores_id_and_position() {
    let mut scene = Scene::new();
    scene.insert(rect_obj());
    let note = note_obj("memo");
    let id = note.id;
    scene.insert(note.clone());
    scene.insert(rect_obj());

    let mut session = EditSession::begin(&mut scene, id).unwrap();
    type_str(&mut session, "new text");
    session.sync(&mut scene);
    let outcome = session.commit(&mut scene);

    assert_eq!(outcome, EditOutcome { id, changed: true, removed: false });
    assert_eq!(scene.len(), 3);
    assert_eq!(scene.position(&id), Some(1));
    let rebuilt = scene.get(&id).unwrap();
    assert_eq!(rebuilt.text(), Some("new text"));
    assert_eq!(rebuilt.bounds(), note.bounds());
    assert!(scene.iter().all(|o| o.group.is_none()));
}

#[test]
fn empty_note_survives_commit() {
    let mut scene = Scene::new();
    let note = note_obj("memo");
    let id = note.id;
    scene.insert(note);
    let mut session = EditSession::begin(&mut scene, id).unwrap();
    session.apply_key(EditKey::Backspace);
    let outcome = session.commit(&mut scene);
    assert!(!outcome.removed);
    assert_eq!(scene.get(&id).unwrap().text(), Some(""));
}

#[test]
fn decompose_insets_text_part() {
    let (bg, text) = decompose(&note_obj("n"));
    assert_eq!(bg.bounds(), Bounds::new(10.0, 10.0, 160.0, 120.0));
    assert_eq!(bg.paint.fill.as_deref(), Some("#FFF3A3"));
    let Shape::Text(t) = &text.shape else {
        panic!("expected text part");
    };
    assert_eq!(t.at, Point::new(18.0, 18.0));
    assert_eq!(t.width, 144.0);
    assert!(text.paint.fill.is_none());
}
