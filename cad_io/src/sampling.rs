//! Surface sampling of meshes into fixed-size point clouds.

use cad_core::{farthest_point_sample, gather_points, Point3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{CadIoError, Result};
use crate::mesh::TriangleMesh;

/// Dense samples drawn before farthest-point reduction.
pub const DEFAULT_DENSE_SAMPLES: usize = 8192;

/// Points handed to the encoder.
pub const DEFAULT_NUM_POINTS: usize = 256;

/// Draw `count` points uniformly over the mesh surface.
///
/// Triangles are picked with probability proportional to their area, then a
/// point is placed uniformly inside the picked triangle. The same `seed`
/// reproduces the same samples.
///
/// # Errors
/// [`CadIoError::EmptyMesh`] for a mesh without triangles and
/// [`CadIoError::DegenerateMesh`] when the total area is zero.
pub fn sample_surface(mesh: &TriangleMesh, count: usize, seed: u64) -> Result<Vec<Point3>> {
    if mesh.is_empty() {
        return Err(CadIoError::EmptyMesh);
    }

    let mut cumulative = Vec::with_capacity(mesh.num_triangles());
    let mut total = 0.0f64;
    for tri in mesh.iter_triangles() {
        total += tri.area() as f64;
        cumulative.push(total);
    }
    if total <= 0.0 {
        return Err(CadIoError::DegenerateMesh {
            message: "surface area is zero",
        });
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let last = cumulative.len() - 1;
    let samples = (0..count)
        .map(|_| {
            let target = rng.random::<f64>() * total;
            let idx = cumulative.partition_point(|&c| c <= target).min(last);
            let (u, v) = (rng.random::<f32>(), rng.random::<f32>());
            mesh.triangle(idx).point_at(u, v)
        })
        .collect();

    Ok(samples)
}

/// Turns a mesh into the fixed-size cloud the encoder consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointCloudSampler {
    /// Uniform surface samples drawn first.
    pub dense_samples: usize,
    /// Points kept by farthest-point selection.
    pub points: usize,
    /// Seed of the surface sampler.
    pub seed: u64,
}

impl Default for PointCloudSampler {
    fn default() -> Self {
        Self {
            dense_samples: DEFAULT_DENSE_SAMPLES,
            points: DEFAULT_NUM_POINTS,
            seed: 0,
        }
    }
}

impl PointCloudSampler {
    /// Sampler producing `points` points with default density.
    pub fn new(points: usize) -> Self {
        Self {
            points,
            ..Self::default()
        }
    }

    /// Set the dense sample count.
    pub fn with_dense_samples(mut self, dense_samples: usize) -> Self {
        self.dense_samples = dense_samples;
        self
    }

    /// Set the seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sample the surface densely, then keep `points` by farthest-point selection.
    ///
    /// The mesh is sampled as given; normalize it first with
    /// [`TriangleMesh::normalize_to_cube`] when feeding the encoder.
    pub fn sample(&self, mesh: &TriangleMesh) -> Result<Vec<Point3>> {
        let dense = sample_surface(mesh, self.dense_samples, self.seed)?;
        let picked = farthest_point_sample(&dense, self.points)?;
        log::debug!(
            "Reduced {} surface samples to {} points",
            dense.len(),
            picked.len()
        );
        Ok(gather_points(&dense, &picked))
    }
}
