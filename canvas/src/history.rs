//! Undo/redo stacks of full trail-collection snapshots.
//!
//! Each entry is the whole collection as it was before (undo) or after
//! (redo) one completed gesture. Collections are small enough that copying
//! them per gesture is cheaper than tracking diffs.

#[cfg(test)]
#[path = "history_test.rs"]
mod history_test;

use crate::doc::Trail;

/// Snapshot history for the trail document.
#[derive(Debug, Clone, Default)]
pub struct EditHistory {
    undo: Vec<Vec<Trail>>,
    redo: Vec<Vec<Trail>>,
}

impl EditHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed edit. `before` is the collection prior to the edit.
    /// Invalidates the redo stack.
    pub fn record(&mut self, before: Vec<Trail>) {
        self.undo.push(before);
        self.redo.clear();
    }

    /// Drop pending redo entries without recording anything.
    pub fn clear_redo(&mut self) {
        self.redo.clear();
    }

    /// Step back. `current` moves onto the redo stack and the previous
    /// collection is returned, or `None` when there is nothing to undo.
    pub fn undo(&mut self, current: Vec<Trail>) -> Option<Vec<Trail>> {
        let previous = self.undo.pop()?;
        self.redo.push(current);
        Some(previous)
    }

    /// Step forward again after an undo.
    pub fn redo(&mut self, current: Vec<Trail>) -> Option<Vec<Trail>> {
        let next = self.redo.pop()?;
        self.undo.push(current);
        Some(next)
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Forget all history.
    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}
