#![allow(clippy::float_cmp)]

use super::*;
use crate::doc::{Trail, TrailKind, TrailPoint};

fn store_with(trails: &[&[(f64, f64)]]) -> TrailStore {
    let mut store = TrailStore::new();
    store.replace(
        trails
            .iter()
            .map(|pts| Trail {
                points: pts
                    .iter()
                    .map(|&(x, y)| TrailPoint { x, y, timestamp: 0, kind: TrailKind::Default })
                    .collect(),
            })
            .collect(),
    );
    store
}

fn pt(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

// =============================================================
// project_onto_segment
// =============================================================

#[test]
fn projection_inside_segment() {
    let p = project_onto_segment(pt(50.0, 10.0), pt(0.0, 0.0), pt(100.0, 0.0));
    assert_eq!(p, pt(50.0, 0.0));
}

#[test]
fn projection_clamps_before_start() {
    let p = project_onto_segment(pt(-30.0, 5.0), pt(0.0, 0.0), pt(100.0, 0.0));
    assert_eq!(p, pt(0.0, 0.0));
}

#[test]
fn projection_clamps_past_end() {
    let p = project_onto_segment(pt(130.0, -5.0), pt(0.0, 0.0), pt(100.0, 0.0));
    assert_eq!(p, pt(100.0, 0.0));
}

#[test]
fn projection_on_degenerate_segment_is_start() {
    let p = project_onto_segment(pt(3.0, 4.0), pt(1.0, 1.0), pt(1.0, 1.0));
    assert_eq!(p, pt(1.0, 1.0));
}

// =============================================================
// hit_point
// =============================================================

#[test]
fn point_hit_within_radius() {
    let doc = store_with(&[&[(100.0, 100.0), (200.0, 100.0)]]);
    let hit = hit_point(pt(106.0, 108.0), &doc, 10.0).unwrap();
    assert_eq!(hit.at, PointRef { trail: 0, point: 0 });
    assert_eq!(hit.distance, 10.0);
}

#[test]
fn point_miss_outside_radius() {
    let doc = store_with(&[&[(100.0, 100.0)]]);
    assert!(hit_point(pt(111.0, 100.0), &doc, 10.0).is_none());
}

#[test]
fn point_hit_prefers_closest_across_trails() {
    let doc = store_with(&[&[(0.0, 0.0), (100.0, 0.0)], &[(6.0, 0.0)]]);
    let hit = hit_point(pt(5.0, 0.0), &doc, 10.0).unwrap();
    assert_eq!(hit.at, PointRef { trail: 1, point: 0 });
}

#[test]
fn point_hit_on_empty_doc_is_none() {
    assert!(hit_point(pt(0.0, 0.0), &TrailStore::new(), 10.0).is_none());
}

// =============================================================
// hit_segment
// =============================================================

#[test]
fn segment_hit_reports_projection() {
    let doc = store_with(&[&[(0.0, 0.0), (100.0, 0.0), (100.0, 100.0)]]);
    let hit = hit_segment(pt(40.0, 12.0), &doc, 15.0).unwrap();
    assert_eq!(hit.at, SegmentRef { trail: 0, segment: 0 });
    assert_eq!(hit.projected, pt(40.0, 0.0));
    assert_eq!(hit.distance, 12.0);
}

#[test]
fn segment_hit_picks_second_segment() {
    let doc = store_with(&[&[(0.0, 0.0), (100.0, 0.0), (100.0, 100.0)]]);
    let hit = hit_segment(pt(110.0, 60.0), &doc, 15.0).unwrap();
    assert_eq!(hit.at, SegmentRef { trail: 0, segment: 1 });
    assert_eq!(hit.projected, pt(100.0, 60.0));
}

#[test]
fn segment_miss_outside_radius() {
    let doc = store_with(&[&[(0.0, 0.0), (100.0, 0.0)]]);
    assert!(hit_segment(pt(50.0, 16.0), &doc, 15.0).is_none());
}

#[test]
fn single_point_trail_has_no_segments() {
    let doc = store_with(&[&[(0.0, 0.0)]]);
    assert!(hit_segment(pt(0.0, 0.0), &doc, 15.0).is_none());
}

#[test]
fn segment_insertion_point_is_between_endpoints() {
    let seg = SegmentRef { trail: 2, segment: 3 };
    assert_eq!(seg.insertion_point(), PointRef { trail: 2, point: 4 });
}

// =============================================================
// hit_test precedence
// =============================================================

#[test]
fn point_wins_over_segment() {
    let doc = store_with(&[&[(0.0, 0.0), (100.0, 0.0)]]);
    // Within 10 of the endpoint and within 15 of the segment.
    let hit = hit_test(pt(4.0, 3.0), &doc, HitRadii::default()).unwrap();
    assert!(matches!(hit, Hit::Point(PointHit { at: PointRef { trail: 0, point: 0 }, .. })));
}

#[test]
fn segment_hit_when_no_point_in_range() {
    let doc = store_with(&[&[(0.0, 0.0), (100.0, 0.0)]]);
    let hit = hit_test(pt(50.0, 14.0), &doc, HitRadii::default()).unwrap();
    assert!(matches!(hit, Hit::Segment(_)));
}

#[test]
fn empty_space_is_none() {
    let doc = store_with(&[&[(0.0, 0.0), (100.0, 0.0)]]);
    assert!(hit_test(pt(50.0, 80.0), &doc, HitRadii::default()).is_none());
}

#[test]
fn default_radii_match_constants() {
    let r = HitRadii::default();
    assert_eq!(r.point, POINT_HIT_RADIUS);
    assert_eq!(r.segment, SEGMENT_HIT_RADIUS);
}
