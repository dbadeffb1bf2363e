//! Trail editing engine for the fleet map canvas.
//!
//! This crate owns the editable trail document behind the map's "trail
//! following" view: translating pointer and keyboard events into trail
//! mutations, maintaining camera state for pan/zoom, hit-testing points and
//! segments, and keeping an undo/redo history of completed gestures. The host
//! UI layer is responsible only for wiring input events to the engine and
//! drawing the resulting trails.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Top-level [`engine::Engine`] and its gesture handlers |
//! | [`doc`] | Trail document types and the in-memory [`doc::TrailStore`] |
//! | [`camera`] | Pan/zoom camera, coordinate conversions and grid snapping |
//! | [`input`] | Input event types and the gesture state machine |
//! | [`hit`] | Point and segment hit-testing |
//! | [`history`] | Snapshot-based undo/redo stacks |
//! | [`consts`] | Shared numeric constants (zoom limits, hit radii, grid size) |

pub mod camera;
pub mod consts;
pub mod doc;
pub mod engine;
pub mod history;
pub mod hit;
pub mod input;
