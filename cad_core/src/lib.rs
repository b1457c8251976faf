//! # cad_core
//!
//! Pure geometric primitives for reconstructing CAD programs from point clouds.
//!
//! This crate holds the math shared by the rest of the workspace: a small
//! `Point3` vector type, triangle helpers used for surface sampling and volume
//! computation, exact point/triangle queries, and farthest-point sampling that
//! reduces a dense surface sample to the fixed-size cloud the encoder consumes.
//!
//! ## Features
//!
//! - **no_std compatible**: the geometry works without the standard library
//! - **Deterministic sampling**: farthest-point selection has no hidden randomness
//! - **Exact volumes**: signed tetrahedron volumes for divergence-theorem integration
//!
//! ## Feature Flags
//!
//! - `std` (default): Enables standard library support
//! - `alloc`: Enables heap allocation (needed by [`sampling`]) without full std
//!
//! ## Modules
//!
//! - [`types`]: `Point3` and `Triangle`
//! - [`geometry`]: Closest point on triangle, ray/triangle intersection
//! - [`sampling`]: Farthest-point sampling
//! - [`error`]: Error types
//!
//! ## Usage
//!
//! ```ignore
//! use cad_core::prelude::*;
//!
//! let dense: Vec<Point3> = sample_surface_somehow();
//! let picked = farthest_point_sample(&dense, 256)?;
//! let cloud: Vec<Point3> = picked.iter().map(|&i| dense[i]).collect();
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(clippy::all)]

#[cfg(feature = "std")]
extern crate std;

#[cfg(all(feature = "alloc", not(feature = "std")))]
extern crate alloc;

#[cfg(feature = "std")]
mod alloc_prelude {
    pub use std::vec::Vec;
}

#[cfg(all(feature = "alloc", not(feature = "std")))]
mod alloc_prelude {
    pub use alloc::vec::Vec;
}

pub mod error;
pub mod geometry;
#[cfg(any(feature = "std", feature = "alloc"))]
pub mod sampling;
pub mod types;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{CadCoreError, Result};
    pub use crate::geometry::{closest_point_on_triangle, ray_triangle_intersect};
    pub use crate::types::{Point3, Triangle};

    #[cfg(any(feature = "std", feature = "alloc"))]
    pub use crate::sampling::{farthest_point_sample, gather_points};
}

pub use error::{CadCoreError, Result};
pub use geometry::{closest_point_on_triangle, ray_triangle_intersect};
pub use types::{Point3, Triangle};

#[cfg(any(feature = "std", feature = "alloc"))]
pub use sampling::{farthest_point_sample, gather_points};
