//! Bounding volume hierarchy over the triangles of a [`TriangleMesh`].
//!
//! Supports nearest-triangle queries (surface distance) and ray casting
//! (point-in-solid tests through crossing parity). Nodes live in a flat arena;
//! children are addressed by index.

use cad_core::{closest_point_on_triangle, ray_triangle_intersect, Point3};

use crate::mesh::TriangleMesh;

/// Default maximum number of triangles in a leaf.
pub const DEFAULT_LEAF_SIZE: usize = 4;

/// Ray directions used for the inside test. Deliberately skewed so rays rarely
/// graze the axis-aligned edges CAD solids are full of.
const PARITY_DIRECTIONS: [Point3; 3] = [
    Point3::new(0.342_637, 0.714_251, 0.610_199),
    Point3::new(-0.577_802, 0.213_413, 0.787_793),
    Point3::new(0.431_175, -0.662_319, -0.612_699),
];

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    /// Minimum corner.
    pub min: Point3,
    /// Maximum corner.
    pub max: Point3,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::empty()
    }
}

impl Aabb {
    /// Empty (inverted) box; the identity of [`Aabb::union`].
    #[inline]
    pub fn empty() -> Self {
        Self {
            min: Point3::splat(f32::MAX),
            max: Point3::splat(f32::MIN),
        }
    }

    /// Box from its corners.
    #[inline]
    pub fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    /// Tight box around a set of points.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3>) -> Self {
        let mut bounds = Self::empty();
        for &p in points {
            bounds.expand_point(p);
        }
        bounds
    }

    /// Grow to include `p`.
    #[inline]
    pub fn expand_point(&mut self, p: Point3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    /// Smallest box containing both.
    #[inline]
    pub fn union(&self, other: &Aabb) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Overlap of two boxes, `None` when they are disjoint or only touch.
    pub fn intersection(&self, other: &Aabb) -> Option<Aabb> {
        let min = self.min.max(other.min);
        let max = self.max.min(other.max);
        if min.x < max.x && min.y < max.y && min.z < max.z {
            Some(Aabb { min, max })
        } else {
            None
        }
    }

    /// Edge lengths.
    #[inline]
    pub fn extent(&self) -> Point3 {
        self.max - self.min
    }

    /// Centre point.
    #[inline]
    pub fn centroid(&self) -> Point3 {
        (self.min + self.max) * 0.5
    }

    /// Enclosed volume, 0 for empty boxes.
    pub fn volume(&self) -> f32 {
        if !self.is_valid() {
            return 0.0;
        }
        let e = self.extent();
        e.x * e.y * e.z
    }

    /// Longest axis (0=x, 1=y, 2=z).
    #[inline]
    pub fn longest_axis(&self) -> usize {
        let e = self.extent();
        if e.x >= e.y && e.x >= e.z {
            0
        } else if e.y >= e.z {
            1
        } else {
            2
        }
    }

    /// Whether `min <= max` on every axis.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y && self.min.z <= self.max.z
    }

    /// Squared distance from `p` to the box, 0 inside.
    #[inline]
    pub fn distance_squared(&self, p: Point3) -> f32 {
        let d = (self.min - p).max(p - self.max).max(Point3::ZERO);
        d.length_squared()
    }

    /// Slab test: whether the ray `origin + t * dir`, `t >= 0`, touches the box.
    pub fn hit_by_ray(&self, origin: Point3, inv_dir: Point3) -> bool {
        let mut t_near = 0.0f32;
        let mut t_far = f32::INFINITY;
        for axis in 0..3 {
            let inv = inv_dir.axis(axis);
            let o = origin.axis(axis);
            let mut t0 = (self.min.axis(axis) - o) * inv;
            let mut t1 = (self.max.axis(axis) - o) * inv;
            if t0 > t1 {
                core::mem::swap(&mut t0, &mut t1);
            }
            // NaN from 0 * inf (origin on a slab plane, parallel ray) keeps the slab open.
            if t0 > t_near {
                t_near = t0;
            }
            if t1 < t_far {
                t_far = t1;
            }
            if t_near > t_far {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf { bounds: Aabb, start: usize, end: usize },
    Split { bounds: Aabb, left: usize, right: usize },
}

impl Node {
    fn bounds(&self) -> &Aabb {
        match self {
            Node::Leaf { bounds, .. } | Node::Split { bounds, .. } => bounds,
        }
    }
}

/// Closest surface point returned by [`TriangleBvh::nearest_triangle`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceHit {
    /// Index of the nearest triangle in the mesh.
    pub triangle: usize,
    /// Closest point on that triangle.
    pub point: Point3,
    /// Barycentric coordinates of `point`.
    pub barycentric: [f32; 3],
    /// Squared distance from the query.
    pub distance_squared: f32,
}

/// Median-split BVH over mesh triangles.
///
/// The hierarchy stores only indices; queries take the mesh it was built from.
#[derive(Debug, Clone)]
pub struct TriangleBvh {
    nodes: Vec<Node>,
    order: Vec<usize>,
}

impl TriangleBvh {
    /// Build with [`DEFAULT_LEAF_SIZE`].
    pub fn new(mesh: &TriangleMesh) -> Self {
        Self::build(mesh, DEFAULT_LEAF_SIZE)
    }

    /// Build splitting at the centroid median along the longest axis until
    /// leaves hold at most `max_leaf_size` triangles.
    pub fn build(mesh: &TriangleMesh, max_leaf_size: usize) -> Self {
        let max_leaf_size = max_leaf_size.max(1);
        let bounds: Vec<Aabb> = mesh
            .iter_triangles()
            .map(|t| Aabb::from_points(t.0.iter()))
            .collect();
        let mut order: Vec<usize> = (0..bounds.len()).collect();
        let mut nodes = Vec::with_capacity(2 * bounds.len() / max_leaf_size + 1);

        if !order.is_empty() {
            let len = order.len();
            Self::build_range(&bounds, &mut order, 0, len, max_leaf_size, &mut nodes);
        }

        Self { nodes, order }
    }

    fn build_range(
        tri_bounds: &[Aabb],
        order: &mut [usize],
        start: usize,
        end: usize,
        max_leaf_size: usize,
        nodes: &mut Vec<Node>,
    ) -> usize {
        let bounds = order[start..end]
            .iter()
            .fold(Aabb::empty(), |acc, &i| acc.union(&tri_bounds[i]));

        let slot = nodes.len();
        if end - start <= max_leaf_size {
            nodes.push(Node::Leaf { bounds, start, end });
            return slot;
        }

        // Placeholder, patched once the children exist.
        nodes.push(Node::Leaf { bounds, start, end });

        let axis = bounds.longest_axis();
        let mid = start + (end - start) / 2;
        order[start..end].select_nth_unstable_by(mid - start, |&a, &b| {
            let ca = tri_bounds[a].centroid().axis(axis);
            let cb = tri_bounds[b].centroid().axis(axis);
            ca.total_cmp(&cb)
        });

        let left = Self::build_range(tri_bounds, order, start, mid, max_leaf_size, nodes);
        let right = Self::build_range(tri_bounds, order, mid, end, max_leaf_size, nodes);
        nodes[slot] = Node::Split {
            bounds,
            left,
            right,
        };
        slot
    }

    /// Whether the hierarchy holds no triangles.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of indexed triangles.
    pub fn num_triangles(&self) -> usize {
        self.order.len()
    }

    /// Bounds of the whole mesh.
    pub fn bounds(&self) -> Option<Aabb> {
        self.nodes.first().map(|n| *n.bounds())
    }

    /// Nearest surface point to `query`, `None` for an empty hierarchy.
    pub fn nearest_triangle(&self, mesh: &TriangleMesh, query: Point3) -> Option<SurfaceHit> {
        if self.nodes.is_empty() {
            return None;
        }
        let mut best: Option<SurfaceHit> = None;
        let mut best_dist = f32::INFINITY;
        let mut stack = vec![0usize];

        while let Some(idx) = stack.pop() {
            let node = &self.nodes[idx];
            if node.bounds().distance_squared(query) >= best_dist {
                continue;
            }
            match *node {
                Node::Leaf { start, end, .. } => {
                    for &tri_idx in &self.order[start..end] {
                        let tri = mesh.triangle(tri_idx);
                        let (point, barycentric) =
                            closest_point_on_triangle(query, tri.a(), tri.b(), tri.c());
                        let d = query.distance_squared(point);
                        if d < best_dist {
                            best_dist = d;
                            best = Some(SurfaceHit {
                                triangle: tri_idx,
                                point,
                                barycentric,
                                distance_squared: d,
                            });
                        }
                    }
                }
                Node::Split { left, right, .. } => {
                    let dl = self.nodes[left].bounds().distance_squared(query);
                    let dr = self.nodes[right].bounds().distance_squared(query);
                    // Push the farther child first so the closer one is visited next.
                    if dl < dr {
                        stack.push(right);
                        stack.push(left);
                    } else {
                        stack.push(left);
                        stack.push(right);
                    }
                }
            }
        }

        best
    }

    /// Count triangles crossed by the ray `origin + t * dir`, `t > 0`.
    pub fn count_ray_hits(&self, mesh: &TriangleMesh, origin: Point3, dir: Point3) -> usize {
        if self.nodes.is_empty() {
            return 0;
        }
        let inv_dir = Point3::new(1.0 / dir.x, 1.0 / dir.y, 1.0 / dir.z);
        let mut hits = 0;
        let mut stack = vec![0usize];

        while let Some(idx) = stack.pop() {
            let node = &self.nodes[idx];
            if !node.bounds().hit_by_ray(origin, inv_dir) {
                continue;
            }
            match *node {
                Node::Leaf { start, end, .. } => {
                    hits += self.order[start..end]
                        .iter()
                        .filter(|&&tri_idx| {
                            let tri = mesh.triangle(tri_idx);
                            ray_triangle_intersect(origin, dir, tri.a(), tri.b(), tri.c()).is_some()
                        })
                        .count();
                }
                Node::Split { left, right, .. } => {
                    stack.push(left);
                    stack.push(right);
                }
            }
        }

        hits
    }

    /// Whether `p` lies inside the closed surface.
    ///
    /// Casts three skewed rays and takes the majority of their crossing
    /// parities, which tolerates a ray slipping through a shared edge.
    pub fn contains(&self, mesh: &TriangleMesh, p: Point3) -> bool {
        match self.bounds() {
            Some(b) if b.distance_squared(p) == 0.0 => {}
            _ => return false,
        }
        let votes = PARITY_DIRECTIONS
            .iter()
            .filter(|&&dir| self.count_ray_hits(mesh, p, dir) % 2 == 1)
            .count();
        votes >= 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::box_mesh;

    fn unit_cube() -> TriangleMesh {
        box_mesh(Point3::ZERO, Point3::splat(1.0))
    }

    #[test]
    fn test_empty_bvh() {
        let mesh = TriangleMesh::default();
        let bvh = TriangleBvh::new(&mesh);
        assert!(bvh.is_empty());
        assert!(bvh.bounds().is_none());
        assert!(bvh.nearest_triangle(&mesh, Point3::ZERO).is_none());
        assert!(!bvh.contains(&mesh, Point3::ZERO));
    }

    #[test]
    fn test_bounds_cover_mesh() {
        let mesh = unit_cube();
        let bvh = TriangleBvh::build(&mesh, 1);
        assert_eq!(bvh.num_triangles(), 12);
        let b = bvh.bounds().unwrap();
        assert_eq!(b.min, Point3::ZERO);
        assert_eq!(b.max, Point3::splat(1.0));
    }

    #[test]
    fn test_nearest_matches_brute_force() {
        let mesh = unit_cube();
        for leaf in [1, 2, 4, 16] {
            let bvh = TriangleBvh::build(&mesh, leaf);
            for q in [
                Point3::new(0.5, 0.5, 0.5),
                Point3::new(2.0, 0.5, 0.5),
                Point3::new(0.5, 0.5, -1.0),
                Point3::new(1.5, 1.5, 1.5),
                Point3::new(0.1, 0.9, 0.3),
            ] {
                let hit = bvh.nearest_triangle(&mesh, q).unwrap();
                let brute = mesh
                    .iter_triangles()
                    .map(|t| {
                        let (c, _) = closest_point_on_triangle(q, t.a(), t.b(), t.c());
                        q.distance_squared(c)
                    })
                    .fold(f32::INFINITY, f32::min);
                assert!(
                    (hit.distance_squared - brute).abs() < 1e-6,
                    "leaf {} query {:?}: {} vs {}",
                    leaf,
                    q,
                    hit.distance_squared,
                    brute
                );
            }
        }
    }

    #[test]
    fn test_ray_hits_through_cube() {
        let mesh = unit_cube();
        let bvh = TriangleBvh::new(&mesh);
        let dir = PARITY_DIRECTIONS[0];
        assert_eq!(bvh.count_ray_hits(&mesh, Point3::splat(0.5), dir) % 2, 1);
        assert_eq!(bvh.count_ray_hits(&mesh, Point3::splat(-0.5), dir) % 2, 0);
    }

    #[test]
    fn test_contains() {
        let mesh = unit_cube();
        let bvh = TriangleBvh::new(&mesh);
        assert!(bvh.contains(&mesh, Point3::new(0.5, 0.5, 0.5)));
        assert!(bvh.contains(&mesh, Point3::new(0.05, 0.9, 0.2)));
        assert!(!bvh.contains(&mesh, Point3::new(1.5, 0.5, 0.5)));
        assert!(!bvh.contains(&mesh, Point3::new(0.5, -0.01, 0.5)));
    }

    #[test]
    fn test_aabb_queries() {
        let a = Aabb::new(Point3::ZERO, Point3::splat(2.0));
        let b = Aabb::new(Point3::splat(1.0), Point3::splat(3.0));
        let overlap = a.intersection(&b).unwrap();
        assert_eq!(overlap.min, Point3::splat(1.0));
        assert_eq!(overlap.max, Point3::splat(2.0));
        assert!((overlap.volume() - 1.0).abs() < 1e-6);

        let far = Aabb::new(Point3::splat(5.0), Point3::splat(6.0));
        assert!(a.intersection(&far).is_none());
        assert!((a.distance_squared(Point3::new(3.0, 1.0, 1.0)) - 1.0).abs() < 1e-6);
        assert_eq!(a.distance_squared(Point3::splat(1.0)), 0.0);
        assert_eq!(Aabb::empty().volume(), 0.0);
    }

    #[test]
    fn test_ray_slab() {
        let b = Aabb::new(Point3::ZERO, Point3::splat(1.0));
        let inv = |d: Point3| Point3::new(1.0 / d.x, 1.0 / d.y, 1.0 / d.z);
        assert!(b.hit_by_ray(Point3::new(-1.0, 0.5, 0.5), inv(Point3::new(1.0, 0.0, 0.0))));
        assert!(!b.hit_by_ray(Point3::new(-1.0, 0.5, 0.5), inv(Point3::new(-1.0, 0.0, 0.0))));
        assert!(!b.hit_by_ray(Point3::new(-1.0, 2.0, 0.5), inv(Point3::new(1.0, 0.0, 0.0))));
        assert!(b.hit_by_ray(Point3::splat(0.5), inv(Point3::new(0.3, -0.2, 0.9))));
    }
}
