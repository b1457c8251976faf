//! Reconstruction metrics between two meshes
//!
//! Prints the Chamfer distance (× 1000) and the volumetric IoU of a predicted
//! mesh against its reference.
//!
//! # Usage
//!
//! ```bash
//! cargo run --release --bin evaluate_meshes -- gt.stl pred.stl [--normalize] [--resolution N]
//! ```

use std::env;

use instant::Instant;

use cad_eval::{evaluate_files, EvalConfig};

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        println!(
            "Usage: {} <gt.stl> <pred.stl> [--normalize] [--resolution N] [--samples N]",
            args[0]
        );
        std::process::exit(2);
    }

    let mut config = EvalConfig::default();
    let mut rest = args[3..].iter();
    while let Some(flag) = rest.next() {
        match flag.as_str() {
            "--normalize" => config.normalize = true,
            "--resolution" => {
                if let Some(n) = rest.next().and_then(|s| s.parse().ok()) {
                    config.iou_resolution = n;
                }
            }
            "--samples" => {
                if let Some(n) = rest.next().and_then(|s| s.parse().ok()) {
                    config.surface_samples = n;
                }
            }
            other => eprintln!("Ignoring unknown argument '{}'", other),
        }
    }

    println!("═══════════════════════════════════════════════════════════════");
    println!("                  Reconstruction Metrics");
    println!("═══════════════════════════════════════════════════════════════");
    println!("  Reference:       {}", args[1]);
    println!("  Prediction:      {}", args[2]);
    println!("  Surface samples: {}", config.surface_samples);
    println!("  IoU resolution:  {}", config.iou_resolution);
    println!("  Normalize:       {}", config.normalize);
    println!();

    let start = Instant::now();
    match evaluate_files(&args[1], &args[2], &config) {
        Ok(metrics) => {
            println!("  {}", metrics);
            println!("  Time:            {:.2?}", start.elapsed());
        }
        Err(e) => {
            eprintln!("Evaluation failed: {}", e);
            std::process::exit(1);
        }
    }
}
