//! Point cloud → decoder-width embeddings
//!
//! This example:
//! 1. Reads a point cloud from an `.xyz` file
//! 2. Loads the point encoder from a checkpoint directory (or initializes it)
//! 3. Encodes the cloud twice and checks the outputs are identical
//! 4. Optionally saves the encoder in the split checkpoint format
//!
//! # Usage
//!
//! ```bash
//! cargo run --release --bin encode_cloud -- cloud.xyz [--checkpoint DIR] [--hidden N] [--save FILE]
//! ```

use std::env;

use burn::backend::NdArray;
use instant::Instant;

use cad_io::read_xyz_file;
use neural_cad::prelude::*;

type MyBackend = NdArray;

/// Hidden width of the reference decoder.
const DEFAULT_HIDDEN: usize = 1536;

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        println!(
            "Usage: {} <cloud.xyz> [--checkpoint DIR] [--hidden N] [--save FILE]",
            args[0]
        );
        std::process::exit(2);
    }

    let mut checkpoint = None;
    let mut hidden = DEFAULT_HIDDEN;
    let mut save_path = None;
    let mut rest = args[2..].iter();
    while let Some(flag) = rest.next() {
        match flag.as_str() {
            "--checkpoint" => checkpoint = rest.next().cloned(),
            "--hidden" => {
                if let Some(n) = rest.next().and_then(|s| s.parse().ok()) {
                    hidden = n;
                }
            }
            "--save" => save_path = rest.next().cloned(),
            other => eprintln!("Ignoring unknown argument '{}'", other),
        }
    }

    println!("═══════════════════════════════════════════════════════════════");
    println!("                 Fourier Point Encoding");
    println!("═══════════════════════════════════════════════════════════════");
    println!();

    let cloud = match read_xyz_file(&args[1]) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error reading '{}': {}", args[1], e);
            std::process::exit(1);
        }
    };

    let device = burn::backend::ndarray::NdArrayDevice::Cpu;
    let config = PointEncoderConfig::new(hidden);

    let encoder = match &checkpoint {
        Some(dir) => {
            let loaded = CheckpointLayout::detect(dir)
                .and_then(|layout| load_point_encoder::<MyBackend>(&config, &layout, &device));
            match loaded {
                Ok(e) => e,
                Err(e) => {
                    eprintln!("Error loading checkpoint '{}': {}", dir, e);
                    std::process::exit(1);
                }
            }
        }
        None => config.init::<MyBackend>(&device),
    };

    println!("  Points:          {}", cloud.len());
    println!("  Frequencies:     {:?}", encoder.bank().multipliers());
    println!("  Feature width:   {}", encoder.feature_dim());
    println!("  Hidden width:    {}", encoder.hidden_dim());
    println!(
        "  Weights:         {}",
        checkpoint.as_deref().unwrap_or("random initialization")
    );
    println!();

    let start = Instant::now();
    let first = encoder.forward(points_to_tensor(&cloud, &device));
    let encode_time = start.elapsed();
    let second = encoder.forward(points_to_tensor(&cloud, &device));

    let values: Vec<f32> = first.clone().into_data().iter::<f32>().collect();
    let count = values.len().max(1) as f64;
    let mean = values.iter().map(|&v| v as f64).sum::<f64>() / count;
    let variance = values
        .iter()
        .map(|&v| (v as f64 - mean).powi(2))
        .sum::<f64>()
        / count;

    println!("  Output shape:    {:?}", first.dims());
    println!("  Mean:            {:.6}", mean);
    println!("  Std:             {:.6}", variance.sqrt());
    println!(
        "  Deterministic:   {}",
        first.into_data() == second.into_data()
    );
    println!("  Time:            {:.2?}", encode_time);

    if let Some(path) = save_path {
        match save_point_encoder(&encoder, &path) {
            Ok(()) => println!("  Saved encoder to {}", path),
            Err(e) => {
                eprintln!("Error saving encoder: {}", e);
                std::process::exit(1);
            }
        }
    }
}
