//! Farthest-point sampling.
//!
//! Reduces a dense surface sample to a fixed number of points with good
//! spatial coverage. The selection always starts at index 0, so identical
//! input always yields the identical subset.

use crate::alloc_prelude::Vec;
use crate::error::{CadCoreError, Result};
use crate::types::Point3;

/// Select `k` indices from `points` by iterative farthest-point sampling.
///
/// The first selected index is 0. Each following pick maximizes the squared
/// distance to the nearest already-selected point; ties resolve to the lowest
/// index.
///
/// # Errors
/// - [`CadCoreError::EmptyInput`] if `points` is empty and `k > 0`
/// - [`CadCoreError::SampleCountExceeded`] if `k > points.len()`
pub fn farthest_point_sample(points: &[Point3], k: usize) -> Result<Vec<usize>> {
    if k == 0 {
        return Ok(Vec::new());
    }
    if points.is_empty() {
        return Err(CadCoreError::EmptyInput);
    }
    if k > points.len() {
        return Err(CadCoreError::SampleCountExceeded {
            requested: k,
            available: points.len(),
        });
    }

    let mut selected = Vec::with_capacity(k);
    let mut min_dist = Vec::with_capacity(points.len());
    min_dist.resize(points.len(), f32::INFINITY);

    let mut current = 0usize;
    for _ in 0..k {
        selected.push(current);
        let anchor = points[current];

        let mut best = 0usize;
        let mut best_dist = f32::NEG_INFINITY;
        for (i, p) in points.iter().enumerate() {
            let d = p.distance_squared(anchor);
            if d < min_dist[i] {
                min_dist[i] = d;
            }
            if min_dist[i] > best_dist {
                best_dist = min_dist[i];
                best = i;
            }
        }
        current = best;
    }

    Ok(selected)
}

/// Gather the points at `indices`, preserving index order.
///
/// # Panics
/// Panics if an index is out of bounds; use indices returned by
/// [`farthest_point_sample`] on the same slice.
pub fn gather_points(points: &[Point3], indices: &[usize]) -> Vec<Point3> {
    indices.iter().map(|&i| points[i]).collect()
}
