#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::camera::Point;
use crate::consts::{POINT_HIT_RADIUS, SEGMENT_HIT_RADIUS};
use crate::doc::{PointRef, TrailStore};

/// Address of a segment: the edge from point `segment` to point `segment + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SegmentRef {
    pub trail: usize,
    pub segment: usize,
}

impl SegmentRef {
    /// Where a point inserted on this segment lands: between its endpoints.
    #[must_use]
    pub fn insertion_point(self) -> PointRef {
        PointRef { trail: self.trail, point: self.segment + 1 }
    }
}

/// A point hit with its distance from the probe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointHit {
    pub at: PointRef,
    pub distance: f64,
}

/// A segment hit with the clamped projection of the probe onto it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentHit {
    pub at: SegmentRef,
    pub distance: f64,
    pub projected: Point,
}

/// Result of a combined hit test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Hit {
    Point(PointHit),
    Segment(SegmentHit),
}

/// Hit radii for [`hit_test`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitRadii {
    pub point: f64,
    pub segment: f64,
}

impl Default for HitRadii {
    fn default() -> Self {
        Self { point: POINT_HIT_RADIUS, segment: SEGMENT_HIT_RADIUS }
    }
}

/// Project `p` onto segment `a`–`b`, clamping the parameter to `[0, 1]`.
///
/// A degenerate segment (`a == b`) projects onto `a`.
#[must_use]
pub fn project_onto_segment(p: Point, a: Point, b: Point) -> Point {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return a;
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    Point::new(a.x + t * dx, a.y + t * dy)
}

/// The closest point within `radius` of `probe`, if any.
#[must_use]
pub fn hit_point(probe: Point, doc: &TrailStore, radius: f64) -> Option<PointHit> {
    let mut best: Option<PointHit> = None;
    for (ti, trail) in doc.trails().iter().enumerate() {
        for (pi, point) in trail.points.iter().enumerate() {
            let distance = probe.distance(point.position());
            if distance <= radius && best.is_none_or(|b| distance < b.distance) {
                best = Some(PointHit { at: PointRef { trail: ti, point: pi }, distance });
            }
        }
    }
    best
}

/// The closest segment within `radius` of `probe`, if any.
#[must_use]
pub fn hit_segment(probe: Point, doc: &TrailStore, radius: f64) -> Option<SegmentHit> {
    let mut best: Option<SegmentHit> = None;
    for (ti, trail) in doc.trails().iter().enumerate() {
        for (si, pair) in trail.points.windows(2).enumerate() {
            let projected = project_onto_segment(probe, pair[0].position(), pair[1].position());
            let distance = probe.distance(projected);
            if distance <= radius && best.is_none_or(|b| distance < b.distance) {
                best = Some(SegmentHit { at: SegmentRef { trail: ti, segment: si }, distance, projected });
            }
        }
    }
    best
}

/// Test what is under `probe`. Points take precedence over segments.
#[must_use]
pub fn hit_test(probe: Point, doc: &TrailStore, radii: HitRadii) -> Option<Hit> {
    if let Some(hit) = hit_point(probe, doc, radii.point) {
        return Some(Hit::Point(hit));
    }
    hit_segment(probe, doc, radii.segment).map(Hit::Segment)
}
