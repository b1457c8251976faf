//! Property-based tests for sampling and triangle geometry.

use cad_core::{closest_point_on_triangle, farthest_point_sample, Point3, Triangle};
use proptest::prelude::*;

fn point_strategy() -> impl Strategy<Value = Point3> {
    (-1.0f32..1.0, -1.0f32..1.0, -1.0f32..1.0).prop_map(Point3::from)
}

/// Dedup by bit pattern so farthest-point sampling sees distinct points.
fn distinct(points: Vec<Point3>) -> Vec<Point3> {
    let mut out: Vec<Point3> = Vec::with_capacity(points.len());
    for p in points {
        if !out.iter().any(|q| q.as_array() == p.as_array()) {
            out.push(p);
        }
    }
    out
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Selected indices are unique, in range, and start at 0.
    #[test]
    fn fps_indices_unique(points in prop::collection::vec(point_strategy(), 1..200), frac in 0.0f32..=1.0) {
        let points = distinct(points);
        let k = ((points.len() as f32 * frac) as usize).clamp(1, points.len());
        let picked = farthest_point_sample(&points, k).unwrap();

        prop_assert_eq!(picked.len(), k);
        prop_assert_eq!(picked[0], 0);
        let mut sorted = picked.clone();
        sorted.sort_unstable();
        sorted.dedup();
        prop_assert_eq!(sorted.len(), k);
        prop_assert!(picked.iter().all(|&i| i < points.len()));
    }

    /// Sampling is deterministic.
    #[test]
    fn fps_deterministic(points in prop::collection::vec(point_strategy(), 1..100)) {
        let k = points.len().min(16);
        let a = farthest_point_sample(&points, k).unwrap();
        let b = farthest_point_sample(&points, k).unwrap();
        prop_assert_eq!(a, b);
    }

    /// The closest point is never farther than any corner.
    #[test]
    fn closest_point_beats_corners(p in point_strategy(), a in point_strategy(), b in point_strategy(), c in point_strategy()) {
        let (closest, _) = closest_point_on_triangle(p, a, b, c);
        let d = p.distance_squared(closest);
        for corner in [a, b, c] {
            prop_assert!(d <= p.distance_squared(corner) + 1e-4);
        }
    }

    /// Uniform triangle samples stay inside the triangle's bounding box.
    #[test]
    fn triangle_samples_in_bounds(a in point_strategy(), b in point_strategy(), c in point_strategy(), u in 0.0f32..1.0, v in 0.0f32..1.0) {
        let tri = Triangle::new(a, b, c);
        let p = tri.point_at(u, v);
        let lo = a.min(b).min(c);
        let hi = a.max(b).max(c);
        prop_assert!(p.x >= lo.x - 1e-5 && p.x <= hi.x + 1e-5);
        prop_assert!(p.y >= lo.y - 1e-5 && p.y <= hi.y + 1e-5);
        prop_assert!(p.z >= lo.z - 1e-5 && p.z <= hi.z + 1e-5);
    }
}
