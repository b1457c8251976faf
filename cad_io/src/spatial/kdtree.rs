//! Static kd-tree over a point cloud for nearest-neighbour lookups.

use cad_core::Point3;

const LEAF_SIZE: usize = 8;

#[derive(Debug, Clone)]
enum KdNode {
    Leaf { start: usize, end: usize },
    Split { axis: usize, value: f32, left: usize, right: usize },
}

/// Median-split kd-tree. Points are copied into tree order; query results
/// report indices into the original slice.
#[derive(Debug, Clone)]
pub struct PointKdTree {
    nodes: Vec<KdNode>,
    points: Vec<Point3>,
    original: Vec<usize>,
}

impl PointKdTree {
    /// Build a tree over `points`.
    pub fn build(points: &[Point3]) -> Self {
        let mut original: Vec<usize> = (0..points.len()).collect();
        let mut nodes = Vec::new();
        if !points.is_empty() {
            Self::split(points, &mut original, 0, points.len(), &mut nodes);
        }
        let ordered = original.iter().map(|&i| points[i]).collect();
        Self {
            nodes,
            points: ordered,
            original,
        }
    }

    fn split(
        points: &[Point3],
        order: &mut [usize],
        start: usize,
        end: usize,
        nodes: &mut Vec<KdNode>,
    ) -> usize {
        let slot = nodes.len();
        nodes.push(KdNode::Leaf { start, end });
        if end - start <= LEAF_SIZE {
            return slot;
        }

        let mut lo = Point3::splat(f32::MAX);
        let mut hi = Point3::splat(f32::MIN);
        for &i in &order[start..end] {
            lo = lo.min(points[i]);
            hi = hi.max(points[i]);
        }
        let extent = hi - lo;
        let axis = if extent.x >= extent.y && extent.x >= extent.z {
            0
        } else if extent.y >= extent.z {
            1
        } else {
            2
        };

        let mid = start + (end - start) / 2;
        order[start..end].select_nth_unstable_by(mid - start, |&a, &b| {
            points[a].axis(axis).total_cmp(&points[b].axis(axis))
        });
        let value = points[order[mid]].axis(axis);

        let left = Self::split(points, order, start, mid, nodes);
        let right = Self::split(points, order, mid, end, nodes);
        nodes[slot] = KdNode::Split {
            axis,
            value,
            left,
            right,
        };
        slot
    }

    /// Number of indexed points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the tree is empty.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Nearest indexed point to `query` as `(original index, squared distance)`.
    ///
    /// Returns `None` for an empty tree, and when no finite distance exists
    /// (a NaN or infinite query, or a tree of non-finite points).
    pub fn nearest(&self, query: Point3) -> Option<(usize, f32)> {
        if self.nodes.is_empty() {
            return None;
        }
        let mut best = (usize::MAX, f32::INFINITY);
        self.descend(0, query, &mut best);
        if best.0 == usize::MAX {
            return None;
        }
        Some((self.original[best.0], best.1))
    }

    fn descend(&self, node: usize, query: Point3, best: &mut (usize, f32)) {
        match self.nodes[node] {
            KdNode::Leaf { start, end } => {
                for slot in start..end {
                    let d = query.distance_squared(self.points[slot]);
                    if d < best.1 {
                        *best = (slot, d);
                    }
                }
            }
            KdNode::Split {
                axis,
                value,
                left,
                right,
            } => {
                let delta = query.axis(axis) - value;
                let (near, far) = if delta < 0.0 { (left, right) } else { (right, left) };
                self.descend(near, query, best);
                if delta * delta < best.1 {
                    self.descend(far, query, best);
                }
            }
        }
    }
}
