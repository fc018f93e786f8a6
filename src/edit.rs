//! Inline text edit sessions.
//!
//! DESIGN
//! ======
//! Plain `text` objects are edited in place. Notes and callouts are
//! composites: entering edit splits the composite into a background `rect`
//! and a `text` part (both grouped to the composite id) so the text can be
//! edited on its own, and committing removes the parts and rebuilds the
//! composite with its original id at its original paint position. The split
//! never outlives the session, so no orphan parts are ever persisted.
//!
//! Sessions operate directly on a [`Scene`]; the owning layer canvas does
//! the lock checks and history bookkeeping.

#[cfg(test)]
#[path = "edit_test.rs"]
mod edit_test;

use crate::camera::Point;
use crate::consts::TEXT_PADDING;
use crate::doc::{AnnotationObject, BoxShape, ObjectId, Paint, Scene, Shape, TextShape};

/// A single editing keystroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKey {
    Insert(char),
    Backspace,
    Newline,
}

/// What committing a session did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditOutcome {
    /// The edited object (the composite id for notes and callouts).
    pub id: ObjectId,
    /// Whether the committed text differs from the text before the session.
    pub changed: bool,
    /// Whether the object was removed because its text ended up empty.
    pub removed: bool,
}

#[derive(Debug, Clone, PartialEq)]
struct Decomposed {
    original: AnnotationObject,
    index: usize,
    background: ObjectId,
}

/// One open text editor.
#[derive(Debug, Clone, PartialEq)]
pub struct EditSession {
    /// Object that receives the text: the text itself or the composite's text part.
    target: ObjectId,
    parts: Option<Decomposed>,
    buffer: String,
    original_text: String,
    /// The whole buffer is selected; the next edit replaces it.
    select_all: bool,
}

impl EditSession {
    /// Open an editor on `id`, splitting composites into parts.
    ///
    /// Returns `None` if `id` is missing or carries no text.
    pub fn begin(scene: &mut Scene, id: ObjectId) -> Option<Self> {
        let obj = scene.get(&id)?;
        let text = obj.text()?.to_owned();

        if !obj.is_composite() {
            return Some(Self { target: id, parts: None, buffer: text.clone(), original_text: text, select_all: true });
        }

        let index = scene.position(&id)?;
        let original = scene.remove(&id)?;
        let (background, text_part) = decompose(&original);
        let (background_id, target) = (background.id, text_part.id);
        scene.insert_at(index, background);
        scene.insert_at(index + 1, text_part);
        Some(Self {
            target,
            parts: Some(Decomposed { original, index, background: background_id }),
            buffer: text.clone(),
            original_text: text,
            select_all: true,
        })
    }

    /// The object the host knows about: the composite id while a composite
    /// is split, otherwise the text object.
    #[must_use]
    pub fn subject(&self) -> ObjectId {
        self.parts.as_ref().map_or(self.target, |p| p.original.id)
    }

    /// The object currently receiving the text.
    #[must_use]
    pub fn target(&self) -> ObjectId {
        self.target
    }

    #[must_use]
    pub fn is_composite(&self) -> bool {
        self.parts.is_some()
    }

    /// Whether `id` is the edited object or one of its transient parts.
    #[must_use]
    pub fn owns(&self, id: &ObjectId) -> bool {
        *id == self.target || self.parts.as_ref().is_some_and(|p| p.background == *id || p.original.id == *id)
    }

    #[must_use]
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    #[must_use]
    pub fn select_all(&self) -> bool {
        self.select_all
    }

    /// Apply one keystroke. Returns `true` if the buffer changed.
    pub fn apply_key(&mut self, key: EditKey) -> bool {
        let before = self.buffer.clone();
        let replacing = std::mem::take(&mut self.select_all);
        if replacing {
            self.buffer.clear();
        }
        match key {
            EditKey::Insert(c) => self.buffer.push(c),
            EditKey::Newline => self.buffer.push('\n'),
            EditKey::Backspace => {
                self.buffer.pop();
            }
        }
        self.buffer != before
    }

    /// Replace the whole buffer (host-side editor input).
    pub fn set_buffer(&mut self, text: &str) -> bool {
        self.select_all = false;
        if self.buffer == text {
            return false;
        }
        text.clone_into(&mut self.buffer);
        true
    }

    /// Write the buffer into the target object.
    pub fn sync(&self, scene: &mut Scene) {
        if let Some(obj) = scene.get_mut(&self.target) {
            obj.set_text(&self.buffer);
        }
    }

    /// Close the editor. Composites are rebuilt under their original id;
    /// a plain text object whose text is blank is removed.
    pub fn commit(self, scene: &mut Scene) -> EditOutcome {
        let changed = self.buffer != self.original_text;
        match self.parts {
            Some(parts) => {
                scene.remove(&parts.background);
                scene.remove(&self.target);
                let mut rebuilt = parts.original;
                rebuilt.set_text(&self.buffer);
                let id = rebuilt.id;
                scene.insert_at(parts.index, rebuilt);
                EditOutcome { id, changed, removed: false }
            }
            None => {
                if self.buffer.trim().is_empty() {
                    scene.remove(&self.target);
                    return EditOutcome { id: self.target, changed: true, removed: true };
                }
                if let Some(obj) = scene.get_mut(&self.target) {
                    obj.set_text(&self.buffer);
                }
                EditOutcome { id: self.target, changed, removed: false }
            }
        }
    }
}

/// Split a note or callout into a background rect and a text part.
#[must_use]
pub fn decompose(composite: &AnnotationObject) -> (AnnotationObject, AnnotationObject) {
    let bounds = composite.bounds();
    let (font_size, text) = match &composite.shape {
        Shape::Note(t) | Shape::Callout(t) => (t.font_size, t.text.clone()),
        _ => (0.0, String::new()),
    };

    let mut background =
        AnnotationObject::new(composite.layer_id.clone(), Shape::Rect(BoxShape { bounds }), composite.paint.clone());
    background.angle = composite.angle;
    background.group = Some(composite.id);

    let text_paint = Paint { fill: None, ..composite.paint.clone() };
    let mut text_part = AnnotationObject::new(
        composite.layer_id.clone(),
        Shape::Text(TextShape {
            at: Point::new(bounds.x + TEXT_PADDING, bounds.y + TEXT_PADDING),
            width: (bounds.width - 2.0 * TEXT_PADDING).max(0.0),
            font_size,
            text,
        }),
        text_paint,
    );
    text_part.angle = composite.angle;
    text_part.group = Some(composite.id);

    (background, text_part)
}
