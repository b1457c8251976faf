//! Program execution through the external CAD scripting kernel.
//!
//! Generated programs are untrusted. Each one runs in its own interpreter
//! process with a wall-clock limit; the process is killed when the limit
//! expires.

mod executor;
mod harness;

pub use executor::{CodeExecutor, ExecutionArtifacts};
pub use harness::{build_harness, STEP_PATH_VAR, STL_PATH_VAR, SYNTAX_CHECK};
