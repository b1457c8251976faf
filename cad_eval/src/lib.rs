//! # cad_eval
//!
//! Geometric metrics for judging a reconstructed solid against its reference
//! mesh:
//!
//! - **Chamfer distance**: symmetric mean squared nearest-neighbour distance
//!   between surface samples ([`chamfer`])
//! - **Volumetric IoU**: intersection over union of the enclosed volumes, the
//!   intersection summed over connected-component pairs, each pair intersected
//!   as a mesh boolean ([`iou`])
//!
//! ## Quick Start
//!
//! ```ignore
//! use cad_eval::{evaluate_files, EvalConfig};
//!
//! let metrics = evaluate_files("table.stl", "/tmp/prediction.stl", &EvalConfig::default())?;
//! println!("{}", metrics); // CD x 1000: 0.2830, IoU: 0.9430
//! ```
//!
//! ## Feature Flags
//!
//! - `parallel` (default): Nearest-neighbour queries and fallback IoU lattice
//!   slices run on the rayon thread pool

pub mod chamfer;
pub mod error;
pub mod iou;
pub mod report;

pub use chamfer::{chamfer_distance, directed_mean_squared, mesh_chamfer_distance};
pub use error::{CadEvalError, Result};
pub use iou::{intersection_volume, volumetric_iou, DEFAULT_IOU_RESOLUTION};
pub use report::{evaluate_files, evaluate_meshes, EvalConfig, MeshMetrics, CHAMFER_DISPLAY_SCALE};
