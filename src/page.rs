//! Page content supplied by the PDF collaborator, and page text edits.
//!
//! The collaborator rasterizes the page and extracts its text runs; the
//! engine only needs the page size and the span boxes. Editing a span
//! places a white box over the original run and a replacement `text` object
//! on top of it, both on the reserved page layer.

#[cfg(test)]
#[path = "page_test.rs"]
mod page_test;

use serde::{Deserialize, Serialize};

use crate::camera::{Bounds, Point};
use crate::consts::PAGE_EDIT_FILL;
use crate::doc::{AnnotationObject, BoxShape, LayerId, Paint, Shape, TextShape};
use crate::error::ErrorCode;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PageError {
    #[error("no page content loaded")]
    NoPage,
    #[error("text span {index} out of range (page has {len})")]
    SpanNotFound { index: usize, len: usize },
}

impl ErrorCode for PageError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NoPage => "E_NO_PAGE",
            Self::SpanNotFound { .. } => "E_SPAN_NOT_FOUND",
        }
    }
}

/// One extracted text run, in page space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextSpan {
    pub text: String,
    pub bounds: Bounds,
    pub font_size: f64,
}

/// Size and text of the rendered page.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageContent {
    pub width_pt: f64,
    pub height_pt: f64,
    #[serde(default)]
    pub spans: Vec<TextSpan>,
}

impl PageContent {
    /// Look up a span by index.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::SpanNotFound`] for an out-of-range index.
    pub fn span(&self, index: usize) -> Result<&TextSpan, PageError> {
        self.spans.get(index).ok_or(PageError::SpanNotFound { index, len: self.spans.len() })
    }

    /// Index of the topmost span containing `pt`.
    #[must_use]
    pub fn span_at(&self, pt: Point) -> Option<usize> {
        self.spans.iter().rposition(|s| s.bounds.contains(pt))
    }
}

/// The cover box and replacement text for editing `span`.
///
/// The text is grouped to the cover so both go away together.
#[must_use]
pub fn replacement_objects(layer_id: &LayerId, span: &TextSpan, text: &str, color: &str) -> [AnnotationObject; 2] {
    let cover = AnnotationObject::new(
        layer_id.clone(),
        Shape::Rect(BoxShape { bounds: span.bounds }),
        Paint { stroke: None, stroke_width: 0.0, fill: Some(PAGE_EDIT_FILL.to_owned()), opacity: 1.0 },
    );
    let mut replacement = AnnotationObject::new(
        layer_id.clone(),
        Shape::Text(TextShape {
            at: Point::new(span.bounds.x, span.bounds.y),
            width: span.bounds.width,
            font_size: span.font_size,
            text: text.to_owned(),
        }),
        Paint { stroke: Some(color.to_owned()), stroke_width: 1.0, fill: None, opacity: 1.0 },
    );
    replacement.group = Some(cover.id);
    [cover, replacement]
}
