//! Program → solid → metrics
//!
//! This example:
//! 1. Reads a CAD program from disk
//! 2. Checks its syntax with the interpreter
//! 3. Runs it in a time-limited child process that exports STL and STEP
//! 4. Optionally scores the exported mesh against a reference mesh
//!
//! # Usage
//!
//! ```bash
//! cargo run --release --bin execute_program -- program.py [--gt table.stl] [--timeout 30] [--work-dir /tmp]
//! ```

use std::env;

use instant::Instant;

use cad_eval::{evaluate_meshes, EvalConfig};
use cad_io::load_mesh;
use neural_cad::{CodeExecutor, ExecutionConfig};

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        println!(
            "Usage: {} <program.py> [--gt MESH] [--timeout SECS] [--work-dir DIR] [--interpreter BIN]",
            args[0]
        );
        std::process::exit(2);
    }

    let mut config = ExecutionConfig::new();
    let mut gt_path = None;
    let mut rest = args[2..].iter();
    while let Some(flag) = rest.next() {
        match (flag.as_str(), rest.next()) {
            ("--gt", Some(v)) => gt_path = Some(v.clone()),
            ("--timeout", Some(v)) => {
                if let Ok(secs) = v.parse() {
                    config.timeout_secs = secs;
                }
            }
            ("--work-dir", Some(v)) => config.work_dir = v.clone(),
            ("--interpreter", Some(v)) => config.interpreter = v.clone(),
            (other, _) => eprintln!("Ignoring argument '{}'", other),
        }
    }

    println!("═══════════════════════════════════════════════════════════════");
    println!("                  CAD Program Execution");
    println!("═══════════════════════════════════════════════════════════════");
    println!();

    let code = match std::fs::read_to_string(&args[1]) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error reading '{}': {}", args[1], e);
            std::process::exit(1);
        }
    };
    let executor = CodeExecutor::new(config);

    // =========================================================================
    // Step 1: Syntax check
    // =========================================================================
    println!("┌─────────────────────────────────────────────────────────────┐");
    println!("│ Step 1: Syntax Check                                        │");
    println!("└─────────────────────────────────────────────────────────────┘");

    if let Err(e) = executor.check_syntax_blocking(&code) {
        eprintln!("  {}", e);
        std::process::exit(1);
    }
    println!("  Lines:           {}", code.lines().count());
    println!("  Status:          ok");
    println!();

    // =========================================================================
    // Step 2: Execute
    // =========================================================================
    println!("┌─────────────────────────────────────────────────────────────┐");
    println!("│ Step 2: Execute                                             │");
    println!("└─────────────────────────────────────────────────────────────┘");

    let start = Instant::now();
    let artifacts = match executor.execute_blocking(&code) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("  Execution failed: {}", e);
            std::process::exit(1);
        }
    };
    println!("  STL:             {}", artifacts.stl_path.display());
    println!("  STEP:            {}", artifacts.step_path.display());
    println!("  Time:            {:.2?}", start.elapsed());
    println!();

    let pred = match artifacts.load_mesh() {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Error loading exported mesh: {}", e);
            std::process::exit(1);
        }
    };
    println!("  Triangles:       {}", pred.num_triangles());
    println!("  Volume:          {:.6}", pred.volume());
    println!();

    // =========================================================================
    // Step 3: Evaluate
    // =========================================================================
    let Some(gt_path) = gt_path else {
        return;
    };
    println!("┌─────────────────────────────────────────────────────────────┐");
    println!("│ Step 3: Evaluate                                            │");
    println!("└─────────────────────────────────────────────────────────────┘");

    let gt = match load_mesh(&gt_path) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Error loading '{}': {}", gt_path, e);
            std::process::exit(1);
        }
    };
    match evaluate_meshes(&gt, &pred, &EvalConfig::default()) {
        Ok(metrics) => println!("  {}", metrics),
        Err(e) => {
            eprintln!("Evaluation failed: {}", e);
            std::process::exit(1);
        }
    }
}
