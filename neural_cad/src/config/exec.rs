//! Program execution configuration.

use burn::config::Config;

/// How generated programs are run by the external CAD scripting kernel.
#[derive(Config, Debug)]
pub struct ExecutionConfig {
    /// Interpreter executable.
    #[config(default = "String::from(\"python3\")")]
    pub interpreter: String,

    /// Arguments placed before the script path.
    #[config(default = "vec![]")]
    pub interpreter_args: Vec<String>,

    /// Wall-clock limit per program, in seconds.
    #[config(default = 30)]
    pub timeout_secs: u64,

    /// Variable holding the workplane the program builds.
    #[config(default = "String::from(\"r\")")]
    pub result_variable: String,

    /// Linear tessellation tolerance for the STL export.
    #[config(default = 0.001)]
    pub tolerance: f64,

    /// Angular tessellation tolerance for the STL export.
    #[config(default = 0.1)]
    pub angular_tolerance: f64,

    /// Directory receiving scripts and exported artifacts.
    #[config(default = "String::from(\"/tmp\")")]
    pub work_dir: String,
}
