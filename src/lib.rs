//! Layered annotation canvas engine for a browser PDF viewer.
//!
//! This crate is compiled to WebAssembly and runs in the browser. It stacks
//! independently rendered annotation layers over a page image supplied by
//! the host. Each layer has its own object scene, undo/redo history and tool
//! state machine; exactly one layer receives input at a time. The host
//! JavaScript layer wires DOM events to the engine, persists the
//! [`engine::Action::SaveRequested`] record lists it returns, and answers
//! picker and editor requests.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Top-level engine and testable [`engine::EngineCore`] |
//! | [`stack`] | Ordered layer stack, active layer and event routing |
//! | [`layer`] | One layer canvas: scene, history, tool machine, interactivity |
//! | [`tools`] | Tool dispatch: click-to-place, drag-to-draw, freehand, select/erase/pan |
//! | [`edit`] | Inline text edit sessions, including note/callout decomposition |
//! | [`doc`] | Annotation object model and the per-layer scene store |
//! | [`history`] | Snapshot history with cap and trailing debounce |
//! | [`record`] | Page-space JSON records for persistence |
//! | [`interact`] | Derived selectable/evented/movable flags |
//! | [`hit`] | Hit-testing against annotation objects |
//! | [`camera`] | Page/canvas/screen transforms |
//! | [`input`] | Tools, tool options and input event types |
//! | [`page`] | Page content and page text replacement |
//! | [`render`] | Per-layer 2D rendering |
//! | [`config`] | Host-supplied engine tuning |
//! | [`error`] | Stable error codes |
//! | [`consts`] | Shared numeric constants (history cap, sizes, colors) |

pub mod camera;
pub mod config;
pub mod consts;
pub mod doc;
pub mod edit;
pub mod engine;
pub mod error;
pub mod history;
pub mod hit;
pub mod input;
pub mod interact;
pub mod layer;
pub mod page;
pub mod record;
pub mod render;
pub mod stack;
pub mod tools;
