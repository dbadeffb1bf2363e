use std::time::{SystemTime, UNIX_EPOCH};

use crate::camera::{Camera, Point};
use crate::consts::{CANVAS_HEIGHT, CANVAS_WIDTH, GRID_SIZE};
use crate::doc::{PointRef, Trail, TrailIoError, TrailKind, TrailPoint, TrailStore};
use crate::history::EditHistory;
use crate::hit::{Hit, HitRadii, hit_segment, hit_test};
use crate::input::{Button, EditMode, InputState, Key, Modifiers, UiState, WheelDelta};

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// The trail collection changed; re-read [`Engine::trails`].
    TrailsChanged,
    /// The selected point changed.
    SelectionChanged(Option<PointRef>),
    /// The host should switch the pointer cursor.
    SetCursor(&'static str),
    RenderNeeded,
}

/// Trail editing engine: document, camera, history and the gesture state machine.
///
/// All handlers take screen-space points and convert them through the camera.
/// Handlers never fail; a gesture that cannot apply returns no actions.
pub struct Engine {
    pub doc: TrailStore,
    pub camera: Camera,
    pub ui: UiState,
    pub input: InputState,
    pub history: EditHistory,
    pub radii: HitRadii,
    pub grid_size: f64,
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            doc: TrailStore::new(),
            camera: Camera::default(),
            ui: UiState::default(),
            input: InputState::default(),
            history: EditHistory::new(),
            radii: HitRadii::default(),
            grid_size: GRID_SIZE,
        }
    }
}

impl Engine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Settings ---

    /// Switch edit mode and drop the selection. Refused while a gesture is in flight.
    pub fn set_mode(&mut self, mode: EditMode) -> bool {
        if self.input.is_gesture() {
            return false;
        }
        self.ui.mode = mode;
        self.ui.selected = None;
        self.ui.hovered_segment = None;
        self.input = InputState::rest(mode);
        true
    }

    /// Kind used for trails drawn from now on.
    pub fn set_trail_kind(&mut self, kind: TrailKind) {
        self.ui.trail_kind = kind;
    }

    pub fn set_snap_to_grid(&mut self, on: bool) {
        self.ui.snap_to_grid = on;
    }

    // --- Input events ---

    pub fn on_pointer_down(&mut self, screen_pt: Point, button: Button, _modifiers: Modifiers) -> Vec<Action> {
        if button == Button::Secondary {
            return self.delete_selected();
        }
        if self.input.is_gesture() {
            return Vec::new();
        }

        let world = self.camera.screen_to_world(screen_pt);
        match (button, self.ui.mode) {
            (Button::Middle, _) => self.begin_pan(screen_pt),
            (Button::Primary, EditMode::Draw) => {
                if inside_canvas(world) {
                    self.begin_stroke(world)
                } else {
                    self.begin_pan(screen_pt)
                }
            }
            (Button::Primary, EditMode::Select) => self.pick(world),
            (Button::Secondary, _) => Vec::new(),
        }
    }

    pub fn on_pointer_move(&mut self, screen_pt: Point, _modifiers: Modifiers) -> Vec<Action> {
        let world = self.camera.screen_to_world(screen_pt);
        let snapped = self.snap(world);
        self.ui.pointer_world = Some(snapped);

        match &mut self.input {
            InputState::Drawing { trail, .. } => {
                let point = TrailPoint::new(snapped, now_ms(), self.ui.trail_kind);
                if self.doc.append_point(*trail, point) {
                    vec![Action::TrailsChanged, Action::RenderNeeded]
                } else {
                    Vec::new()
                }
            }
            InputState::DraggingPoint { point, changed, .. } => {
                let at = *point;
                match self.doc.point(at) {
                    Some(current) if current.position() != snapped => {
                        self.doc.move_point(at, snapped);
                        *changed = true;
                        vec![Action::TrailsChanged, Action::RenderNeeded]
                    }
                    _ => Vec::new(),
                }
            }
            InputState::Panning { last_screen } => {
                self.camera.pan_by(screen_pt.x - last_screen.x, screen_pt.y - last_screen.y);
                *last_screen = screen_pt;
                vec![Action::RenderNeeded]
            }
            InputState::SelectIdle => {
                let hovered = hit_segment(world, &self.doc, self.radii.segment).map(|h| h.at);
                if hovered == self.ui.hovered_segment {
                    Vec::new()
                } else {
                    self.ui.hovered_segment = hovered;
                    vec![Action::RenderNeeded]
                }
            }
            InputState::Idle => Vec::new(),
        }
    }

    pub fn on_pointer_up(&mut self, _screen_pt: Point, _button: Button, _modifiers: Modifiers) -> Vec<Action> {
        let rest = InputState::rest(self.ui.mode);
        match std::mem::replace(&mut self.input, rest) {
            InputState::Drawing { trail, before } => {
                let kept = self.doc.trail(trail).is_some_and(|t| t.len() > 1);
                if kept {
                    self.history.record(before);
                } else {
                    self.doc.remove_trail(trail);
                }
                vec![Action::TrailsChanged, Action::RenderNeeded]
            }
            InputState::DraggingPoint { before, changed, .. } => {
                if changed {
                    self.history.record(before);
                }
                vec![Action::RenderNeeded]
            }
            InputState::Panning { .. } => vec![Action::SetCursor(self.rest_cursor())],
            idle @ (InputState::Idle | InputState::SelectIdle) => {
                self.input = idle;
                Vec::new()
            }
        }
    }

    pub fn on_wheel(&mut self, _screen_pt: Point, delta: WheelDelta, _modifiers: Modifiers) -> Vec<Action> {
        self.camera.zoom_by_wheel(delta.dy);
        vec![Action::RenderNeeded]
    }

    pub fn on_key_down(&mut self, key: &Key, modifiers: Modifiers) -> Vec<Action> {
        if key.is("Delete") || key.is("Backspace") {
            return self.delete_selected();
        }
        if key.is("Escape") {
            return self.clear_selection();
        }
        if modifiers.command() {
            if key.is("z") && !modifiers.shift {
                return self.undo();
            }
            if key.is("y") || (key.is("z") && modifiers.shift) {
                return self.redo();
            }
        }
        Vec::new()
    }

    // --- Commands ---

    /// Restore the collection before the last completed gesture.
    pub fn undo(&mut self) -> Vec<Action> {
        if self.input.is_gesture() {
            return Vec::new();
        }
        let Some(previous) = self.history.undo(self.doc.snapshot()) else {
            return Vec::new();
        };
        self.restore(previous)
    }

    /// Re-apply the last undone gesture.
    pub fn redo(&mut self) -> Vec<Action> {
        if self.input.is_gesture() {
            return Vec::new();
        }
        let Some(next) = self.history.redo(self.doc.snapshot()) else {
            return Vec::new();
        };
        self.restore(next)
    }

    /// Remove every trail. Undoable.
    pub fn clear(&mut self) -> Vec<Action> {
        if self.input.is_gesture() || self.doc.is_empty() {
            return Vec::new();
        }
        self.history.record(self.doc.snapshot());
        self.doc.clear();
        self.restore_selection_free()
    }

    pub fn zoom_in(&mut self) -> Vec<Action> {
        self.camera.zoom_in();
        vec![Action::RenderNeeded]
    }

    pub fn zoom_out(&mut self) -> Vec<Action> {
        self.camera.zoom_out();
        vec![Action::RenderNeeded]
    }

    /// Export the document as a JSON array of non-empty point arrays.
    ///
    /// # Errors
    ///
    /// Propagates serialization failures.
    pub fn export_json(&self) -> Result<String, TrailIoError> {
        self.doc.export_json()
    }

    /// Replace the document with an exported one. Undoable.
    ///
    /// # Errors
    ///
    /// Returns [`TrailIoError`] if `raw` is not a valid trail document; the
    /// current document is left untouched.
    pub fn import_json(&mut self, raw: &str) -> Result<Vec<Action>, TrailIoError> {
        let imported = TrailStore::import_json(raw)?;
        if self.input.is_gesture() {
            return Ok(Vec::new());
        }
        self.history.record(self.doc.snapshot());
        self.doc = imported;
        Ok(self.restore_selection_free())
    }

    // --- Queries ---

    #[must_use]
    pub fn trails(&self) -> &[Trail] {
        self.doc.trails()
    }

    #[must_use]
    pub fn selection(&self) -> Option<PointRef> {
        self.ui.selected
    }

    #[must_use]
    pub fn camera(&self) -> Camera {
        self.camera
    }

    /// Flattened trail points, in drawing order, for mission planning.
    #[must_use]
    pub fn waypoints(&self) -> Vec<Point> {
        self.doc.waypoints()
    }

    // --- Internals ---

    fn snap(&self, world: Point) -> Point {
        if self.ui.snap_to_grid {
            world.snapped(self.grid_size)
        } else {
            world
        }
    }

    fn rest_cursor(&self) -> &'static str {
        match self.ui.mode {
            EditMode::Draw => "grab",
            EditMode::Select => "crosshair",
        }
    }

    fn begin_pan(&mut self, screen_pt: Point) -> Vec<Action> {
        self.input = InputState::Panning { last_screen: screen_pt };
        vec![Action::SetCursor("grabbing")]
    }

    fn begin_stroke(&mut self, world: Point) -> Vec<Action> {
        let before = self.doc.snapshot();
        self.history.clear_redo();
        let first = TrailPoint::new(self.snap(world), now_ms(), self.ui.trail_kind);
        let trail = self.doc.begin_trail(first);
        self.input = InputState::Drawing { trail, before };
        vec![Action::TrailsChanged, Action::RenderNeeded]
    }

    fn pick(&mut self, world: Point) -> Vec<Action> {
        match hit_test(self.snap(world), &self.doc, self.radii) {
            Some(Hit::Point(hit)) => {
                self.ui.selected = Some(hit.at);
                self.input = InputState::DraggingPoint { point: hit.at, before: self.doc.snapshot(), changed: false };
                vec![Action::SelectionChanged(Some(hit.at)), Action::RenderNeeded]
            }
            Some(Hit::Segment(hit)) => {
                let before = self.doc.snapshot();
                let at = hit.at.insertion_point();
                let kind = self.doc.trail(hit.at.trail).map(Trail::kind).unwrap_or_default();
                let point = TrailPoint::new(self.snap(hit.projected), now_ms(), kind);
                if !self.doc.insert_point(at, point) {
                    return Vec::new();
                }
                self.ui.selected = Some(at);
                self.ui.hovered_segment = None;
                self.input = InputState::DraggingPoint { point: at, before, changed: true };
                vec![Action::TrailsChanged, Action::SelectionChanged(Some(at)), Action::RenderNeeded]
            }
            None => self.clear_selection(),
        }
    }

    fn clear_selection(&mut self) -> Vec<Action> {
        if self.ui.selected.take().is_none() {
            return Vec::new();
        }
        vec![Action::SelectionChanged(None), Action::RenderNeeded]
    }

    /// Only a drag may be interrupted; strokes and pans keep their history boundary.
    fn delete_selected(&mut self) -> Vec<Action> {
        if matches!(self.input, InputState::Drawing { .. } | InputState::Panning { .. }) {
            return Vec::new();
        }
        let Some(at) = self.ui.selected else {
            return Vec::new();
        };
        let before = if let InputState::DraggingPoint { before, .. } = &mut self.input {
            let before = std::mem::take(before);
            self.input = InputState::rest(self.ui.mode);
            before
        } else {
            self.doc.snapshot()
        };
        if self.doc.remove_point(at).is_none() {
            return self.clear_selection();
        }
        self.history.record(before);
        self.restore_selection_free()
    }

    fn restore(&mut self, trails: Vec<Trail>) -> Vec<Action> {
        self.doc.replace(trails);
        self.restore_selection_free()
    }

    /// Drop index-based UI references after a structural change.
    fn restore_selection_free(&mut self) -> Vec<Action> {
        self.ui.selected = None;
        self.ui.hovered_segment = None;
        vec![Action::TrailsChanged, Action::SelectionChanged(None), Action::RenderNeeded]
    }
}

fn inside_canvas(world: Point) -> bool {
    (0.0..=CANVAS_WIDTH).contains(&world.x) && (0.0..=CANVAS_HEIGHT).contains(&world.y)
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or_default()
}
