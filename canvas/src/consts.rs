//! Shared numeric constants for the canvas crate.

// ── Canvas ──────────────────────────────────────────────────────

/// Drawable canvas width in world units.
pub const CANVAS_WIDTH: f64 = 800.0;

/// Drawable canvas height in world units.
pub const CANVAS_HEIGHT: f64 = 600.0;

/// Grid cell size used for snapping and grid lines.
pub const GRID_SIZE: f64 = 40.0;

// ── Camera ──────────────────────────────────────────────────────

/// Lower zoom bound.
pub const MIN_ZOOM: f64 = 0.5;

/// Upper zoom bound.
pub const MAX_ZOOM: f64 = 2.5;

/// Zoom change per pixel of vertical wheel delta.
pub const WHEEL_ZOOM_FACTOR: f64 = 0.001;

/// Zoom change for a single zoom-in / zoom-out button press.
pub const ZOOM_STEP: f64 = 0.1;

// ── Hit-testing ─────────────────────────────────────────────────

/// Maximum distance from a point for it to be picked.
pub const POINT_HIT_RADIUS: f64 = 10.0;

/// Maximum distance from a segment for a click to insert a point on it.
pub const SEGMENT_HIT_RADIUS: f64 = 15.0;
