//! Document model: trail points, trails, and the in-memory trail store.
//!
//! A trail is an ordered list of [`TrailPoint`]s describing a drawn or planned
//! route. The editable document is an ordered collection of trails held by
//! [`TrailStore`]. Every mutation goes through the store so the "no empty
//! trail is ever visible" rule is enforced in one place.
//!
//! Lookups are total: an out-of-range trail or point index returns `None` /
//! `false` instead of panicking, because hit-testing can always come back
//! empty-handed.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use serde::{Deserialize, Serialize};

use crate::camera::Point;

/// Category tag of a trail, serialized as its integer index (`"type": 0`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum TrailKind {
    #[default]
    Default,
    Warning,
    Danger,
}

impl TrailKind {
    /// Stroke color the dashboard uses for this kind.
    #[must_use]
    pub fn color(self) -> &'static str {
        match self {
            Self::Default => "#3366ff",
            Self::Warning => "#fbbf24",
            Self::Danger => "#e53935",
        }
    }
}

impl From<TrailKind> for u8 {
    fn from(kind: TrailKind) -> Self {
        match kind {
            TrailKind::Default => 0,
            TrailKind::Warning => 1,
            TrailKind::Danger => 2,
        }
    }
}

impl TryFrom<u8> for TrailKind {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Default),
            1 => Ok(Self::Warning),
            2 => Ok(Self::Danger),
            other => Err(format!("unknown trail type {other}")),
        }
    }
}

/// One vertex of a trail.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrailPoint {
    pub x: f64,
    pub y: f64,
    /// Milliseconds since the Unix epoch when the point was recorded.
    #[serde(default)]
    pub timestamp: i64,
    #[serde(rename = "type", default)]
    pub kind: TrailKind,
}

impl TrailPoint {
    #[must_use]
    pub fn new(at: Point, timestamp: i64, kind: TrailKind) -> Self {
        Self { x: at.x, y: at.y, timestamp, kind }
    }

    #[must_use]
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// An ordered sequence of trail points.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Trail {
    pub points: Vec<TrailPoint>,
}

impl Trail {
    #[must_use]
    pub fn new(first: TrailPoint) -> Self {
        Self { points: vec![first] }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The kind of the trail, taken from its first point.
    #[must_use]
    pub fn kind(&self) -> TrailKind {
        self.points.first().map(|p| p.kind).unwrap_or_default()
    }
}

/// Address of a single point inside a [`TrailStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PointRef {
    pub trail: usize,
    pub point: usize,
}

/// Errors produced when reading an exported trail document.
#[derive(Debug, thiserror::Error)]
pub enum TrailIoError {
    #[error("invalid trail JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// In-memory ordered collection of trails.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrailStore {
    trails: Vec<Trail>,
}

impl TrailStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All trails in drawing order.
    #[must_use]
    pub fn trails(&self) -> &[Trail] {
        &self.trails
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.trails.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trails.is_empty()
    }

    #[must_use]
    pub fn trail(&self, index: usize) -> Option<&Trail> {
        self.trails.get(index)
    }

    #[must_use]
    pub fn point(&self, at: PointRef) -> Option<&TrailPoint> {
        self.trails.get(at.trail)?.points.get(at.point)
    }

    /// Replace the whole collection (used by undo/redo and import).
    /// Empty trails in `trails` are dropped.
    pub fn replace(&mut self, trails: Vec<Trail>) {
        self.trails = trails;
        self.prune_empty();
    }

    /// Clone of the current collection, for history snapshots.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Trail> {
        self.trails.clone()
    }

    /// Start a new trail with its first point and return its index.
    pub fn begin_trail(&mut self, first: TrailPoint) -> usize {
        self.trails.push(Trail::new(first));
        self.trails.len() - 1
    }

    /// Append `point` to trail `index` unless it sits exactly on the trail's
    /// last point. Returns whether the point was appended.
    #[allow(clippy::float_cmp)]
    pub fn append_point(&mut self, index: usize, point: TrailPoint) -> bool {
        let Some(trail) = self.trails.get_mut(index) else {
            return false;
        };
        if let Some(last) = trail.points.last() {
            if last.x == point.x && last.y == point.y {
                return false;
            }
        }
        trail.points.push(point);
        true
    }

    /// Insert a point at `at`, shifting later points of that trail.
    /// Returns false if the trail does not exist or the index is past its end.
    pub fn insert_point(&mut self, at: PointRef, point: TrailPoint) -> bool {
        let Some(trail) = self.trails.get_mut(at.trail) else {
            return false;
        };
        if at.point > trail.points.len() {
            return false;
        }
        trail.points.insert(at.point, point);
        true
    }

    /// Move an existing point to `to`, keeping its timestamp and kind.
    pub fn move_point(&mut self, at: PointRef, to: Point) -> bool {
        let Some(point) = self.trails.get_mut(at.trail).and_then(|t| t.points.get_mut(at.point)) else {
            return false;
        };
        point.x = to.x;
        point.y = to.y;
        true
    }

    /// Remove a point. If its trail becomes empty the trail is removed too.
    pub fn remove_point(&mut self, at: PointRef) -> Option<TrailPoint> {
        let trail = self.trails.get_mut(at.trail)?;
        if at.point >= trail.points.len() {
            return None;
        }
        let removed = trail.points.remove(at.point);
        if trail.points.is_empty() {
            self.trails.remove(at.trail);
        }
        Some(removed)
    }

    /// Remove a whole trail.
    pub fn remove_trail(&mut self, index: usize) -> Option<Trail> {
        (index < self.trails.len()).then(|| self.trails.remove(index))
    }

    /// Drop trails that have no points.
    pub fn prune_empty(&mut self) {
        self.trails.retain(|t| !t.is_empty());
    }

    /// Remove every trail.
    pub fn clear(&mut self) {
        self.trails.clear();
    }

    /// Flattened positions of every point in drawing order.
    #[must_use]
    pub fn waypoints(&self) -> Vec<Point> {
        self.trails
            .iter()
            .flat_map(|t| t.points.iter().map(TrailPoint::position))
            .collect()
    }

    /// Serialize the document as a JSON array of non-empty point arrays.
    ///
    /// # Errors
    ///
    /// Returns an error only if serialization itself fails.
    pub fn export_json(&self) -> Result<String, TrailIoError> {
        let non_empty: Vec<&Trail> = self.trails.iter().filter(|t| !t.is_empty()).collect();
        Ok(serde_json::to_string_pretty(&non_empty)?)
    }

    /// Parse a document produced by [`TrailStore::export_json`].
    ///
    /// Points only need `x` and `y`; `timestamp` and `type` default.
    ///
    /// # Errors
    ///
    /// Returns [`TrailIoError::Json`] for malformed input.
    pub fn import_json(raw: &str) -> Result<Self, TrailIoError> {
        let trails: Vec<Trail> = serde_json::from_str(raw)?;
        let mut store = Self::new();
        store.replace(trails);
        Ok(store)
    }
}
