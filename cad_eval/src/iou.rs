//! Volumetric intersection-over-union of two closed meshes.
//!
//! Each mesh is split into connected components. Component volumes are exact
//! (divergence theorem). The intersection of every component pair with
//! overlapping bounding boxes is computed as a mesh boolean with `csgrs`, and
//! its volume is taken from the resulting polygons with the same divergence
//! sum. When the boolean result is not a plausible volume (non-finite, negative
//! or larger than either operand) the pair falls back to a lattice estimate:
//! cell centres over the box overlap, counted when inside both solids.

use cad_core::{Point3, Triangle};
use cad_io::{Aabb, TriangleBvh, TriangleMesh};
use csgrs::float_types::Real;
use csgrs::mesh::polygon::Polygon;
use csgrs::mesh::vertex::Vertex;
use csgrs::traits::CSG;
use nalgebra::{Point3 as NPoint3, Vector3};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::{CadEvalError, Result};

/// Default number of lattice cells along the longest overlap axis, used when a
/// pair falls back to the lattice estimate.
pub const DEFAULT_IOU_RESOLUTION: usize = 64;

/// Relative slack allowed when checking a boolean result against its operands.
const BOOLEAN_VOLUME_SLACK: f32 = 1e-3;

type BooleanMesh = csgrs::mesh::Mesh<()>;

/// One connected component with its acceleration structure and boolean operand.
struct Solid {
    mesh: TriangleMesh,
    bvh: TriangleBvh,
    bounds: Aabb,
    volume: f32,
    boolean: BooleanMesh,
}

impl Solid {
    fn new(mesh: TriangleMesh) -> Self {
        let bvh = TriangleBvh::new(&mesh);
        let bounds = Aabb::from_points(mesh.vertices.iter());
        let volume = mesh.volume();
        let boolean = to_boolean_mesh(&mesh);
        Self {
            mesh,
            bvh,
            bounds,
            volume,
            boolean,
        }
    }

    fn contains(&self, p: Point3) -> bool {
        self.bvh.contains(&self.mesh, p)
    }
}

fn solids(mesh: &TriangleMesh) -> Vec<Solid> {
    mesh.connected_components()
        .into_iter()
        .map(Solid::new)
        .collect()
}

/// Convert a closed component into outward-facing boolean polygons.
///
/// Inward-wound components are flipped; zero-area triangles are dropped.
fn to_boolean_mesh(mesh: &TriangleMesh) -> BooleanMesh {
    let flip = mesh.signed_volume() < 0.0;
    let vertex = |p: Point3, n: Point3| {
        Vertex::new(
            NPoint3::new(p.x as Real, p.y as Real, p.z as Real),
            Vector3::new(n.x as Real, n.y as Real, n.z as Real),
        )
    };

    let polygons: Vec<Polygon<()>> = mesh
        .iter_triangles()
        .filter(|t| t.area() > 0.0)
        .map(|t| {
            let t = if flip { Triangle::new(t.a(), t.c(), t.b()) } else { t };
            let n = t.normal();
            Polygon::new(
                vec![vertex(t.a(), n), vertex(t.b(), n), vertex(t.c(), n)],
                None,
            )
        })
        .collect();
    BooleanMesh::from_polygons(&polygons, None)
}

/// Signed volume enclosed by boolean output polygons.
///
/// Output polygons are convex and planar, so a fan from the first corner
/// covers each one exactly.
fn boolean_volume(mesh: &BooleanMesh) -> f32 {
    let corner = |v: &Vertex| Point3::new(v.pos.x as f32, v.pos.y as f32, v.pos.z as f32);
    mesh.polygons
        .iter()
        .filter(|poly| poly.vertices.len() >= 3)
        .flat_map(|poly| {
            let apex = corner(&poly.vertices[0]);
            poly.vertices[1..]
                .windows(2)
                .map(move |w| Triangle::new(apex, corner(&w[0]), corner(&w[1])))
        })
        .map(|t| t.signed_volume() as f64)
        .sum::<f64>() as f32
}

/// Exact intersection volume of two components, if the boolean result is usable.
fn boolean_intersection(a: &Solid, b: &Solid) -> Option<f32> {
    let volume = boolean_volume(&a.boolean.intersection(&b.boolean));
    let limit = a.volume.min(b.volume);
    let slack = BOOLEAN_VOLUME_SLACK * limit.max(f32::MIN_POSITIVE);
    if volume.is_finite() && volume >= -slack && volume <= limit + slack {
        Some(volume.clamp(0.0, limit))
    } else {
        None
    }
}

/// Lattice estimate of the volume inside both solids within `region`.
fn lattice_intersection(a: &Solid, b: &Solid, region: &Aabb, resolution: usize) -> f32 {
    let extent = region.extent();
    let cell = extent.max_element() / resolution as f32;
    let dims = [
        ((extent.x / cell).ceil() as usize).max(1),
        ((extent.y / cell).ceil() as usize).max(1),
        ((extent.z / cell).ceil() as usize).max(1),
    ];
    let step = Point3::new(
        extent.x / dims[0] as f32,
        extent.y / dims[1] as f32,
        extent.z / dims[2] as f32,
    );

    let count_slice = |k: usize| -> usize {
        let z = region.min.z + (k as f32 + 0.5) * step.z;
        let mut inside = 0;
        for j in 0..dims[1] {
            let y = region.min.y + (j as f32 + 0.5) * step.y;
            for i in 0..dims[0] {
                let p = Point3::new(region.min.x + (i as f32 + 0.5) * step.x, y, z);
                if a.contains(p) && b.contains(p) {
                    inside += 1;
                }
            }
        }
        inside
    };

    #[cfg(feature = "parallel")]
    let inside: usize = (0..dims[2]).into_par_iter().map(count_slice).sum();
    #[cfg(not(feature = "parallel"))]
    let inside: usize = (0..dims[2]).map(count_slice).sum();

    inside as f32 * step.x * step.y * step.z
}

/// Intersection volume summed over every component pair.
///
/// `resolution` only matters for pairs that fall back to the lattice estimate.
pub fn intersection_volume(gt: &TriangleMesh, pred: &TriangleMesh, resolution: usize) -> Result<f32> {
    if resolution == 0 {
        return Err(CadEvalError::ZeroResolution);
    }
    let gt_solids = solids(gt);
    let pred_solids = solids(pred);
    log::debug!(
        "Intersecting {} reference and {} reconstructed components",
        gt_solids.len(),
        pred_solids.len()
    );

    let mut total = 0.0f32;
    for a in &gt_solids {
        for b in &pred_solids {
            let Some(region) = a.bounds.intersection(&b.bounds) else {
                continue;
            };
            let pair = match boolean_intersection(a, b) {
                Some(volume) => volume,
                None => {
                    log::warn!("Mesh boolean volume out of range, falling back to the lattice");
                    lattice_intersection(a, b, &region, resolution)
                        .min(a.volume.min(b.volume))
                }
            };
            total += pair;
        }
    }
    Ok(total)
}

/// Volumetric IoU in `[0, 1]`.
///
/// # Errors
/// [`CadEvalError::DegenerateUnion`] when both meshes enclose no volume and
/// [`CadEvalError::ZeroResolution`] for a zero fallback lattice resolution.
pub fn volumetric_iou(gt: &TriangleMesh, pred: &TriangleMesh, resolution: usize) -> Result<f32> {
    let gt_volume = gt.volume();
    let pred_volume = pred.volume();
    let inter = intersection_volume(gt, pred, resolution)?
        .min(gt_volume)
        .min(pred_volume);
    let union = gt_volume + pred_volume - inter;
    if union <= 0.0 {
        return Err(CadEvalError::DegenerateUnion {
            gt_volume,
            pred_volume,
        });
    }
    Ok((inter / union).clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cad_io::box_mesh;

    fn unit_box(offset: Point3) -> TriangleMesh {
        box_mesh(offset, offset + Point3::splat(1.0))
    }

    /// Rotate about the x axis by `degrees`, then translate.
    fn tilted(mut mesh: TriangleMesh, degrees: f32, offset: Point3) -> TriangleMesh {
        let (sin, cos) = degrees.to_radians().sin_cos();
        for v in &mut mesh.vertices {
            *v = Point3::new(v.x, v.y * cos - v.z * sin, v.y * sin + v.z * cos) + offset;
        }
        mesh
    }

    #[test]
    fn test_identical_boxes() {
        let m = unit_box(Point3::ZERO);
        let iou = volumetric_iou(&m, &m, 32).unwrap();
        assert!((iou - 1.0).abs() < 1e-4, "iou = {}", iou);
    }

    #[test]
    fn test_half_overlap() {
        let a = unit_box(Point3::ZERO);
        let b = unit_box(Point3::new(0.5, 0.0, 0.0));
        // Intersection 0.5, union 1.5.
        let iou = volumetric_iou(&a, &b, 32).unwrap();
        assert!((iou - 1.0 / 3.0).abs() < 1e-4, "iou = {}", iou);
    }

    #[test]
    fn test_tilted_plates_offset_by_half_thickness() {
        let plate = box_mesh(Point3::new(-1.0, -1.0, -0.03), Point3::new(1.0, 1.0, 0.03));
        let (sin, cos) = 30f32.to_radians().sin_cos();
        let normal = Point3::new(0.0, -sin, cos);
        let a = tilted(plate.clone(), 30.0, Point3::ZERO);
        let b = tilted(plate, 30.0, normal * 0.03);

        // Half of each plate overlaps: 0.5 V / 1.5 V.
        let iou = volumetric_iou(&a, &b, 16).unwrap();
        assert!((iou - 1.0 / 3.0).abs() < 1e-3, "iou = {}", iou);
    }

    #[test]
    fn test_disjoint_is_zero() {
        let a = unit_box(Point3::ZERO);
        let b = unit_box(Point3::splat(3.0));
        assert_eq!(intersection_volume(&a, &b, 16).unwrap(), 0.0);
        assert_eq!(volumetric_iou(&a, &b, 16).unwrap(), 0.0);
    }

    #[test]
    fn test_nested_boxes() {
        let outer = box_mesh(Point3::ZERO, Point3::splat(2.0));
        let inner = box_mesh(Point3::splat(0.5), Point3::splat(1.5));
        let iou = volumetric_iou(&outer, &inner, 32).unwrap();
        assert!((iou - 1.0 / 8.0).abs() < 1e-4, "iou = {}", iou);
    }

    #[test]
    fn test_components_summed_pairwise() {
        let mut gt = unit_box(Point3::ZERO);
        gt.append(&unit_box(Point3::new(2.0, 0.0, 0.0)));
        let mut pred = unit_box(Point3::ZERO);
        pred.append(&unit_box(Point3::new(2.0, 0.0, 0.0)));
        let inter = intersection_volume(&gt, &pred, 32).unwrap();
        assert!((inter - 2.0).abs() < 1e-3, "inter = {}", inter);

        // Only one of the two components reconstructed.
        let single = unit_box(Point3::ZERO);
        let iou = volumetric_iou(&gt, &single, 32).unwrap();
        assert!((iou - 0.5).abs() < 1e-3, "iou = {}", iou);
    }

    #[test]
    fn test_inward_winding_is_flipped() {
        let mut inverted = unit_box(Point3::ZERO);
        for tri in &mut inverted.triangles {
            tri.swap(1, 2);
        }
        assert!(inverted.signed_volume() < 0.0);
        let solid = Solid::new(inverted);
        assert!((boolean_volume(&solid.boolean) - 1.0).abs() < 1e-5);

        let other = Solid::new(unit_box(Point3::new(0.25, 0.0, 0.0)));
        let inter = boolean_intersection(&solid, &other).unwrap();
        assert!((inter - 0.75).abs() < 1e-4, "inter = {}", inter);
    }

    #[test]
    fn test_lattice_fallback_estimate() {
        let a = Solid::new(unit_box(Point3::ZERO));
        let b = Solid::new(unit_box(Point3::new(0.5, 0.0, 0.0)));
        let region = a.bounds.intersection(&b.bounds).unwrap();
        let estimate = lattice_intersection(&a, &b, &region, 32);
        assert!((estimate - 0.5).abs() < 0.02, "estimate = {}", estimate);
    }

    #[test]
    fn test_errors() {
        let m = unit_box(Point3::ZERO);
        assert_eq!(intersection_volume(&m, &m, 0), Err(CadEvalError::ZeroResolution));

        let empty = TriangleMesh::default();
        assert!(matches!(
            volumetric_iou(&empty, &empty, 8),
            Err(CadEvalError::DegenerateUnion { .. })
        ));
    }
}
