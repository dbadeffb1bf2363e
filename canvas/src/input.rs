//! Input model: edit modes, modifier keys, mouse buttons, and the gesture state machine.
//!
//! `EditMode` and `Modifiers` capture the user's intent at the time of a
//! pointer event. `InputState` is the gesture being tracked between
//! pointer-down and pointer-up, carrying the context needed to apply
//! incremental changes and to record a single history entry on release.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::camera::Point;
use crate::doc::{PointRef, Trail, TrailKind};
use crate::hit::SegmentRef;

/// Which editing mode is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditMode {
    /// Pointer-down starts a new trail (default).
    #[default]
    Draw,
    /// Pointer-down picks, inserts or drags individual points.
    Select,
}

/// Keyboard/mouse modifier keys held during an event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default)]
pub struct Modifiers {
    /// Shift key is held.
    pub shift: bool,
    /// Ctrl key is held.
    pub ctrl: bool,
    /// Alt / Option key is held.
    pub alt: bool,
    /// Meta / Command key is held.
    pub meta: bool,
}

impl Modifiers {
    /// Ctrl on most platforms, Command on macOS.
    #[must_use]
    pub fn command(self) -> bool {
        self.ctrl || self.meta
    }
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Left mouse button (or single-finger tap).
    Primary,
    /// Middle mouse button (scroll wheel click).
    Middle,
    /// Right mouse button (or two-finger tap).
    Secondary,
}

/// A keyboard key as reported by the browser (e.g. `"Delete"`, `"z"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

impl Key {
    #[must_use]
    pub fn is(&self, name: &str) -> bool {
        self.0.eq_ignore_ascii_case(name)
    }
}

/// Wheel / trackpad scroll delta.
#[derive(Debug, Clone, Copy)]
pub struct WheelDelta {
    /// Horizontal scroll amount in pixels.
    pub dx: f64,
    /// Vertical scroll amount in pixels (positive = down).
    pub dy: f64,
}

/// Persistent UI state visible to the renderer.
#[derive(Debug, Clone, Default)]
pub struct UiState {
    /// Current edit mode.
    pub mode: EditMode,
    /// Kind applied to newly drawn trails.
    pub trail_kind: TrailKind,
    /// Whether new and moved points, and select presses, snap to the grid.
    pub snap_to_grid: bool,
    /// The selected point, if any.
    pub selected: Option<PointRef>,
    /// Segment under the pointer in select mode, for hover feedback.
    pub hovered_segment: Option<SegmentRef>,
    /// Last pointer position in world coordinates (after snapping).
    pub pointer_world: Option<Point>,
}

/// Internal state for the input state machine.
///
/// `Idle` is the rest state in draw mode and `SelectIdle` the rest state in
/// select mode. Active variants carry the gesture context.
#[derive(Debug, Clone, Default)]
pub enum InputState {
    /// Draw mode, no gesture in progress.
    #[default]
    Idle,
    /// A new trail is being drawn.
    Drawing {
        /// Index of the trail receiving points.
        trail: usize,
        /// Collection as it was before the stroke began.
        before: Vec<Trail>,
    },
    /// Select mode, no gesture in progress.
    SelectIdle,
    /// A selected point follows the pointer.
    DraggingPoint {
        /// The point being dragged.
        point: PointRef,
        /// Collection as it was before the gesture began.
        before: Vec<Trail>,
        /// Whether the gesture already changed the document (insertion or movement).
        changed: bool,
    },
    /// The camera is being panned.
    Panning {
        /// Screen-space position of the previous pointer event.
        last_screen: Point,
    },
}

impl InputState {
    /// The rest state for `mode`.
    #[must_use]
    pub fn rest(mode: EditMode) -> Self {
        match mode {
            EditMode::Draw => Self::Idle,
            EditMode::Select => Self::SelectIdle,
        }
    }

    /// Whether a pointer gesture is in flight.
    #[must_use]
    pub fn is_gesture(&self) -> bool {
        matches!(self, Self::Drawing { .. } | Self::DraggingPoint { .. } | Self::Panning { .. })
    }
}
