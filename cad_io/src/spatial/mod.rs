//! Spatial acceleration structures for geometry queries.
//!
//! - `bvh`: triangle hierarchy for surface distance and inside tests
//! - `kdtree`: point kd-tree for nearest-neighbour distances

pub mod bvh;
pub mod kdtree;

pub use bvh::{Aabb, SurfaceHit, TriangleBvh, DEFAULT_LEAF_SIZE};
pub use kdtree::PointKdTree;
