//! Chamfer distance between surface samples.
//!
//! The distance is the mean squared nearest-neighbour distance from the first
//! set to the second plus the same quantity in the other direction. It is not
//! square-rooted; reports scale it by 1000 for readability.

use cad_core::Point3;
use cad_io::{sample_surface, PointKdTree, TriangleMesh};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::{CadEvalError, Result};

/// Mean squared distance from each point of `from` to its nearest point in `to`.
pub fn directed_mean_squared(from: &[Point3], to: &PointKdTree) -> Result<f32> {
    if from.is_empty() || to.is_empty() {
        return Err(CadEvalError::EmptyPointSet);
    }

    let nearest = |p: &Point3| to.nearest(*p).map(|(_, d)| d as f64);

    #[cfg(feature = "parallel")]
    let total: Option<f64> = from.par_iter().map(nearest).sum();
    #[cfg(not(feature = "parallel"))]
    let total: Option<f64> = from.iter().map(nearest).sum();

    let total = total.ok_or(CadEvalError::NonFinitePoint)?;
    Ok((total / from.len() as f64) as f32)
}

/// Symmetric Chamfer distance between two point sets.
pub fn chamfer_distance(a: &[Point3], b: &[Point3]) -> Result<f32> {
    if a.is_empty() || b.is_empty() {
        return Err(CadEvalError::EmptyPointSet);
    }
    let tree_a = PointKdTree::build(a);
    let tree_b = PointKdTree::build(b);
    Ok(directed_mean_squared(a, &tree_b)? + directed_mean_squared(b, &tree_a)?)
}

/// Chamfer distance between `samples` uniform surface samples of each mesh.
///
/// The reference is sampled with `seed` and the reconstruction with
/// `seed + 1`, so identical meshes still get independent samples.
pub fn mesh_chamfer_distance(
    gt: &TriangleMesh,
    pred: &TriangleMesh,
    samples: usize,
    seed: u64,
) -> Result<f32> {
    let gt_points = sample_surface(gt, samples, seed)?;
    let pred_points = sample_surface(pred, samples, seed.wrapping_add(1))?;
    chamfer_distance(&gt_points, &pred_points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cad_io::box_mesh;

    #[test]
    fn test_identical_sets_are_zero() {
        let pts = vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 2.0, 3.0)];
        assert_eq!(chamfer_distance(&pts, &pts).unwrap(), 0.0);
    }

    #[test]
    fn test_hand_computed_value() {
        let a = vec![Point3::new(0.0, 0.0, 0.0)];
        let b = vec![Point3::new(1.0, 0.0, 0.0), Point3::new(3.0, 0.0, 0.0)];
        // a -> b: 1. b -> a: (1 + 9) / 2 = 5.
        assert!((chamfer_distance(&a, &b).unwrap() - 6.0).abs() < 1e-6);
        assert_eq!(
            chamfer_distance(&a, &b).unwrap(),
            chamfer_distance(&b, &a).unwrap()
        );
    }

    #[test]
    fn test_empty_is_error() {
        let a = vec![Point3::ZERO];
        assert_eq!(chamfer_distance(&a, &[]), Err(CadEvalError::EmptyPointSet));
        assert_eq!(chamfer_distance(&[], &a), Err(CadEvalError::EmptyPointSet));
    }

    #[test]
    fn test_non_finite_point_is_error() {
        let a = vec![Point3::new(f32::NAN, 0.0, 0.0)];
        let b = vec![Point3::ZERO, Point3::new(1.0, 0.0, 0.0)];
        assert_eq!(chamfer_distance(&a, &b), Err(CadEvalError::NonFinitePoint));
        assert_eq!(chamfer_distance(&b, &a), Err(CadEvalError::NonFinitePoint));

        let inf = vec![Point3::new(0.0, f32::INFINITY, 0.0)];
        assert_eq!(chamfer_distance(&inf, &b), Err(CadEvalError::NonFinitePoint));
    }

    #[test]
    fn test_mesh_chamfer_tracks_offset() {
        let gt = box_mesh(Point3::ZERO, Point3::splat(1.0));
        let same = mesh_chamfer_distance(&gt, &gt, 2048, 1).unwrap();
        // Independent samples of one surface: small but not zero.
        assert!(same > 0.0, "cd = {}", same);
        assert!(same < 1e-2, "cd = {}", same);

        let mut shifted = gt.clone();
        shifted.translate(Point3::new(0.2, 0.0, 0.0));
        let cd = mesh_chamfer_distance(&gt, &shifted, 2048, 1).unwrap();
        assert!(cd > 1e-3, "cd = {}", cd);
        assert!(cd < 2.0 * 0.2 * 0.2 + 1e-3, "cd = {}", cd);
    }
}
