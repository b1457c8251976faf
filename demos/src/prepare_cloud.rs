//! Mesh → normalized point cloud
//!
//! This example:
//! 1. Loads an STL or OBJ mesh
//! 2. Normalizes it into the origin-centred cube of side 2
//! 3. Samples the surface densely and reduces it with farthest-point sampling
//! 4. Writes the cloud as an `.xyz` file
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin prepare_cloud -- input/table.stl output/table.xyz [points] [seed]
//! ```

use std::env;
use std::path::Path;

use instant::Instant;

use cad_io::{load_mesh, write_xyz_file, PointCloudSampler, DEFAULT_NUM_POINTS};

fn main() {
    env_logger::init();

    println!("═══════════════════════════════════════════════════════════════");
    println!("                Mesh → Point Cloud Preparation");
    println!("═══════════════════════════════════════════════════════════════");
    println!();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        println!("Usage: {} <mesh.stl|mesh.obj> [output.xyz] [points] [seed]", args[0]);
        std::process::exit(2);
    }
    let input_path = args[1].clone();
    let output_path = args
        .get(2)
        .cloned()
        .unwrap_or_else(|| "output/cloud.xyz".to_string());
    let num_points = args
        .get(3)
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_NUM_POINTS);
    let seed = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(0);

    if let Some(parent) = Path::new(&output_path).parent() {
        std::fs::create_dir_all(parent).ok();
    }

    // =========================================================================
    // Step 1: Load and normalize
    // =========================================================================
    println!("┌─────────────────────────────────────────────────────────────┐");
    println!("│ Step 1: Load Mesh                                           │");
    println!("└─────────────────────────────────────────────────────────────┘");

    let start = Instant::now();
    let mut mesh = match load_mesh(&input_path) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Error loading mesh '{}': {}", input_path, e);
            std::process::exit(1);
        }
    };
    let (center, scale) = match mesh.normalize_to_cube() {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Error normalizing mesh: {}", e);
            std::process::exit(1);
        }
    };
    let load_time = start.elapsed();

    println!("  Vertices:        {}", mesh.num_vertices());
    println!("  Triangles:       {}", mesh.num_triangles());
    println!("  Components:      {}", mesh.connected_components().len());
    println!("  Original centre: ({:.4}, {:.4}, {:.4})", center.x, center.y, center.z);
    println!("  Scale factor:    {:.6}", scale);
    println!("  Volume:          {:.6}", mesh.volume());
    println!("  Time:            {:.2?}", load_time);
    println!();

    // =========================================================================
    // Step 2: Sample
    // =========================================================================
    println!("┌─────────────────────────────────────────────────────────────┐");
    println!("│ Step 2: Sample Point Cloud                                  │");
    println!("└─────────────────────────────────────────────────────────────┘");

    let sampler = PointCloudSampler::new(num_points).with_seed(seed);
    let start = Instant::now();
    let cloud = match sampler.sample(&mesh) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error sampling mesh: {}", e);
            std::process::exit(1);
        }
    };
    let sample_time = start.elapsed();

    println!("  Dense samples:   {}", sampler.dense_samples);
    println!("  Points:          {}", cloud.len());
    println!("  Seed:            {}", seed);
    println!("  Time:            {:.2?}", sample_time);
    println!();

    // =========================================================================
    // Step 3: Write
    // =========================================================================
    if let Err(e) = write_xyz_file(&cloud, &output_path) {
        eprintln!("Error writing '{}': {}", output_path, e);
        std::process::exit(1);
    }
    println!("  Wrote {}", output_path);
}
