//! cad_io - mesh I/O, surface sampling and spatial queries.
//!
//! This crate turns mesh files into the inputs the rest of the workspace
//! needs: welded [`TriangleMesh`]es normalized into the unit cube of side 2,
//! fixed-size point clouds for the encoder, and spatial indices used by the
//! metrics.
//!
//! # Core Types
//!
//! - [`TriangleMesh`]: indexed mesh with volume, area, normalization and
//!   connected components
//! - [`PointCloudSampler`]: dense surface sampling plus farthest-point reduction
//! - [`TriangleBvh`]: nearest-surface and point-in-solid queries
//! - [`PointKdTree`]: nearest-neighbour queries over point clouds
//!
//! # Example
//!
//! ```ignore
//! use cad_io::{load_mesh, PointCloudSampler};
//!
//! let mut mesh = load_mesh("table.stl")?;
//! mesh.normalize_to_cube()?;
//! let cloud = PointCloudSampler::default().sample(&mesh)?;
//! assert_eq!(cloud.len(), 256);
//! ```

pub mod error;
pub mod mesh;
pub mod obj;
pub mod points;
pub mod sampling;
pub mod spatial;
pub mod stl;

use std::path::Path;

pub use cad_core::{Point3, Triangle};

pub use error::{CadIoError, Result};
pub use mesh::{box_mesh, TriangleMesh, DEFAULT_WELD_TOLERANCE, NORMALIZED_CUBE_SIDE};
pub use obj::{export_obj, export_obj_to_file, parse_obj, parse_obj_file, MeshStats};
pub use points::{read_xyz, read_xyz_file, write_xyz, write_xyz_file};
pub use sampling::{sample_surface, PointCloudSampler, DEFAULT_DENSE_SAMPLES, DEFAULT_NUM_POINTS};
pub use spatial::{Aabb, PointKdTree, SurfaceHit, TriangleBvh};
pub use stl::{parse_stl, parse_stl_file, write_stl_ascii, write_stl_binary, write_stl_file};

/// Load a mesh, choosing the parser from the file extension (`.obj`, anything
/// else is read as STL).
pub fn load_mesh<P: AsRef<Path>>(path: P) -> Result<TriangleMesh> {
    let path = path.as_ref();
    let is_obj = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("obj"));
    if is_obj {
        parse_obj_file(path)
    } else {
        parse_stl_file(path)
    }
}
