//! Indexed triangle meshes.
//!
//! STL files are triangle soups; [`TriangleMesh::from_triangles`] welds
//! coincident corners so that connectivity (and therefore connected components)
//! can be recovered.

use std::collections::HashMap;

use cad_core::{Point3, Triangle};

use crate::error::{CadIoError, Result};

/// Default welding tolerance for triangle soups, in model units.
pub const DEFAULT_WELD_TOLERANCE: f32 = 1e-6;

/// Side length of the cube meshes are normalized into.
pub const NORMALIZED_CUBE_SIDE: f32 = 2.0;

/// Indexed triangle mesh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriangleMesh {
    /// Vertex positions.
    pub vertices: Vec<Point3>,
    /// Triangle indices (3 per triangle, counter-clockwise seen from outside).
    pub triangles: Vec<[usize; 3]>,
}

impl TriangleMesh {
    /// Create a mesh from vertices and triangle indices.
    pub fn new(vertices: Vec<Point3>, triangles: Vec<[usize; 3]>) -> Self {
        Self {
            vertices,
            triangles,
        }
    }

    /// Build a welded mesh from a triangle soup.
    ///
    /// Corners closer than `tolerance` on every axis (after quantization) share
    /// a vertex. Triangles that collapse to fewer than three distinct vertices
    /// are dropped.
    pub fn from_triangles(soup: &[Triangle], tolerance: f32) -> Self {
        let mut lookup: HashMap<[i64; 3], usize> = HashMap::with_capacity(soup.len() * 3 / 2);
        let mut vertices = Vec::new();
        let mut triangles = Vec::with_capacity(soup.len());

        let quantize = |p: Point3| -> [i64; 3] {
            if tolerance > 0.0 {
                [
                    libm::roundf(p.x / tolerance) as i64,
                    libm::roundf(p.y / tolerance) as i64,
                    libm::roundf(p.z / tolerance) as i64,
                ]
            } else {
                [p.x.to_bits() as i64, p.y.to_bits() as i64, p.z.to_bits() as i64]
            }
        };

        for tri in soup {
            let mut idx = [0usize; 3];
            for (slot, corner) in idx.iter_mut().zip(tri.0.iter()) {
                *slot = *lookup.entry(quantize(*corner)).or_insert_with(|| {
                    vertices.push(*corner);
                    vertices.len() - 1
                });
            }
            if idx[0] != idx[1] && idx[1] != idx[2] && idx[0] != idx[2] {
                triangles.push(idx);
            }
        }

        log::debug!(
            "Welded {} soup triangles into {} vertices / {} triangles",
            soup.len(),
            vertices.len(),
            triangles.len()
        );

        Self {
            vertices,
            triangles,
        }
    }

    /// Number of vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Number of triangles.
    #[inline]
    pub fn num_triangles(&self) -> usize {
        self.triangles.len()
    }

    /// Check if the mesh has no triangles.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Triangle `i` as corner positions.
    #[inline]
    pub fn triangle(&self, i: usize) -> Triangle {
        let [a, b, c] = self.triangles[i];
        Triangle::new(self.vertices[a], self.vertices[b], self.vertices[c])
    }

    /// Iterate over all triangles as corner positions.
    pub fn iter_triangles(&self) -> impl Iterator<Item = Triangle> + '_ {
        (0..self.triangles.len()).map(move |i| self.triangle(i))
    }

    /// Axis-aligned bounding box of the referenced vertices, `None` if empty.
    pub fn bounding_box(&self) -> Option<(Point3, Point3)> {
        let first = *self.vertices.first()?;
        Some(
            self.vertices
                .iter()
                .fold((first, first), |(lo, hi), v| (lo.min(*v), hi.max(*v))),
        )
    }

    /// Size of the bounding box along each axis.
    pub fn extents(&self) -> Point3 {
        self.bounding_box()
            .map(|(lo, hi)| hi - lo)
            .unwrap_or(Point3::ZERO)
    }

    /// Total surface area.
    pub fn surface_area(&self) -> f32 {
        self.iter_triangles().map(|t| t.area() as f64).sum::<f64>() as f32
    }

    /// Signed enclosed volume (divergence theorem).
    ///
    /// Positive for closed meshes with outward-facing triangles.
    pub fn signed_volume(&self) -> f32 {
        self.iter_triangles()
            .map(|t| t.signed_volume() as f64)
            .sum::<f64>() as f32
    }

    /// Enclosed volume, independent of winding orientation.
    pub fn volume(&self) -> f32 {
        self.signed_volume().abs()
    }

    /// Translate every vertex by `offset`.
    pub fn translate(&mut self, offset: Point3) {
        for v in &mut self.vertices {
            *v += offset;
        }
    }

    /// Scale every vertex about the origin.
    pub fn scale(&mut self, factor: f32) {
        for v in &mut self.vertices {
            *v = *v * factor;
        }
    }

    /// Center the bounding box at the origin and scale the longest extent to 2.
    ///
    /// Returns the applied `(translation, scale)` so callers can undo it.
    ///
    /// # Errors
    /// [`CadIoError::EmptyMesh`] for an empty mesh and
    /// [`CadIoError::DegenerateMesh`] when every extent is zero.
    pub fn normalize_to_cube(&mut self) -> Result<(Point3, f32)> {
        let (lo, hi) = self.bounding_box().ok_or(CadIoError::EmptyMesh)?;
        let longest = (hi - lo).max_element();
        if longest <= 0.0 || !longest.is_finite() {
            return Err(CadIoError::DegenerateMesh {
                message: "bounding box has zero extent",
            });
        }

        let translation = -((lo + hi) * 0.5);
        let factor = NORMALIZED_CUBE_SIDE / longest;
        self.translate(translation);
        self.scale(factor);
        Ok((translation, factor))
    }

    /// Split the mesh into triangle sets connected through shared vertices.
    ///
    /// Components are returned in order of their first triangle, each with
    /// compacted vertex indices.
    pub fn connected_components(&self) -> Vec<TriangleMesh> {
        let mut parent: Vec<usize> = (0..self.vertices.len()).collect();

        fn find(parent: &mut [usize], mut i: usize) -> usize {
            while parent[i] != i {
                parent[i] = parent[parent[i]];
                i = parent[i];
            }
            i
        }

        for &[a, b, c] in &self.triangles {
            for (u, v) in [(a, b), (b, c)] {
                let ru = find(&mut parent, u);
                let rv = find(&mut parent, v);
                if ru != rv {
                    parent[rv] = ru;
                }
            }
        }

        let mut component_of_root: HashMap<usize, usize> = HashMap::new();
        let mut groups: Vec<Vec<usize>> = Vec::new();
        for (tri_idx, tri) in self.triangles.iter().enumerate() {
            let root = find(&mut parent, tri[0]);
            let slot = *component_of_root.entry(root).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[slot].push(tri_idx);
        }

        groups
            .into_iter()
            .map(|tri_indices| self.submesh(&tri_indices))
            .collect()
    }

    /// Extract the given triangles into a new mesh with compacted vertices.
    fn submesh(&self, tri_indices: &[usize]) -> TriangleMesh {
        let mut remap: HashMap<usize, usize> = HashMap::new();
        let mut vertices = Vec::new();
        let triangles = tri_indices
            .iter()
            .map(|&t| {
                let mut out = [0usize; 3];
                for (slot, &v) in out.iter_mut().zip(self.triangles[t].iter()) {
                    *slot = *remap.entry(v).or_insert_with(|| {
                        vertices.push(self.vertices[v]);
                        vertices.len() - 1
                    });
                }
                out
            })
            .collect();

        TriangleMesh {
            vertices,
            triangles,
        }
    }

    /// Append another mesh, offsetting its indices.
    pub fn append(&mut self, other: &TriangleMesh) {
        let offset = self.vertices.len();
        self.vertices.extend_from_slice(&other.vertices);
        self.triangles.extend(
            other
                .triangles
                .iter()
                .map(|&[a, b, c]| [a + offset, b + offset, c + offset]),
        );
    }
}

/// Closed axis-aligned box mesh with outward-facing triangles.
///
/// Handy for fixtures and sanity checks of volume-based metrics.
pub fn box_mesh(min: Point3, max: Point3) -> TriangleMesh {
    let vertices = vec![
        Point3::new(min.x, min.y, min.z),
        Point3::new(max.x, min.y, min.z),
        Point3::new(max.x, max.y, min.z),
        Point3::new(min.x, max.y, min.z),
        Point3::new(min.x, min.y, max.z),
        Point3::new(max.x, min.y, max.z),
        Point3::new(max.x, max.y, max.z),
        Point3::new(min.x, max.y, max.z),
    ];
    let triangles = vec![
        // -z
        [0, 2, 1],
        [0, 3, 2],
        // +z
        [4, 5, 6],
        [4, 6, 7],
        // -y
        [0, 1, 5],
        [0, 5, 4],
        // +y
        [3, 7, 6],
        [3, 6, 2],
        // -x
        [0, 4, 7],
        [0, 7, 3],
        // +x
        [1, 2, 6],
        [1, 6, 5],
    ];
    TriangleMesh::new(vertices, triangles)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_volume_and_area() {
        let mesh = box_mesh(Point3::splat(0.0), Point3::new(2.0, 3.0, 4.0));
        assert!((mesh.signed_volume() - 24.0).abs() < 1e-4);
        assert!((mesh.surface_area() - 52.0).abs() < 1e-4);
    }

    #[test]
    fn test_weld_soup() {
        let mesh = box_mesh(Point3::splat(0.0), Point3::splat(1.0));
        let soup: Vec<Triangle> = mesh.iter_triangles().collect();
        let welded = TriangleMesh::from_triangles(&soup, DEFAULT_WELD_TOLERANCE);
        assert_eq!(welded.num_vertices(), 8);
        assert_eq!(welded.num_triangles(), 12);
    }

    #[test]
    fn test_weld_drops_collapsed_triangles() {
        let p = Point3::splat(0.0);
        let soup = [Triangle::new(p, p, Point3::new(1.0, 0.0, 0.0))];
        assert!(TriangleMesh::from_triangles(&soup, DEFAULT_WELD_TOLERANCE).is_empty());
    }

    #[test]
    fn test_normalize_to_cube() {
        let mut mesh = box_mesh(Point3::new(1.0, 1.0, 1.0), Point3::new(5.0, 3.0, 2.0));
        let (translation, factor) = mesh.normalize_to_cube().unwrap();

        assert_eq!(translation, Point3::new(-3.0, -2.0, -1.5));
        assert!((factor - 0.5).abs() < 1e-6);

        let (lo, hi) = mesh.bounding_box().unwrap();
        assert!((lo.x + 1.0).abs() < 1e-6 && (hi.x - 1.0).abs() < 1e-6);
        assert!((lo.y + 0.5).abs() < 1e-6 && (hi.y - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_degenerate() {
        let mut empty = TriangleMesh::default();
        assert_eq!(empty.normalize_to_cube(), Err(CadIoError::EmptyMesh));

        let p = Point3::splat(1.0);
        let mut point_mesh = TriangleMesh::new(vec![p, p, p], vec![[0, 1, 2]]);
        assert!(matches!(
            point_mesh.normalize_to_cube(),
            Err(CadIoError::DegenerateMesh { .. })
        ));
    }

    #[test]
    fn test_connected_components() {
        let mut mesh = box_mesh(Point3::splat(0.0), Point3::splat(1.0));
        mesh.append(&box_mesh(Point3::splat(3.0), Point3::splat(5.0)));

        let parts = mesh.connected_components();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].num_vertices(), 8);
        assert!((parts[0].volume() - 1.0).abs() < 1e-5);
        assert!((parts[1].volume() - 8.0).abs() < 1e-4);
    }

    #[test]
    fn test_volume_ignores_winding() {
        let mut mesh = box_mesh(Point3::splat(0.0), Point3::splat(1.0));
        for tri in &mut mesh.triangles {
            tri.swap(1, 2);
        }
        assert!(mesh.signed_volume() < 0.0);
        assert!((mesh.volume() - 1.0).abs() < 1e-5);
    }
}
