//! Export harness appended to generated programs.

use crate::config::ExecutionConfig;

/// Environment variable naming the STL output path.
pub const STL_PATH_VAR: &str = "CAD_STL_PATH";

/// Environment variable naming the STEP output path.
pub const STEP_PATH_VAR: &str = "CAD_STEP_PATH";

/// Interpreter snippet that parses standard input without running it.
pub const SYNTAX_CHECK: &str = "import ast, sys; ast.parse(sys.stdin.read())";

/// Append the export calls for the configured result variable to `code`.
///
/// Output paths are read from [`STL_PATH_VAR`] and [`STEP_PATH_VAR`] so the
/// script never has to quote a filesystem path.
pub fn build_harness(code: &str, config: &ExecutionConfig) -> String {
    let mut script = String::with_capacity(code.len() + 320);
    script.push_str(code);
    if !code.ends_with('\n') {
        script.push('\n');
    }
    script.push_str("\nimport os\nimport cadquery as cq\n");
    script.push_str(&format!("_result = {}.val()\n", config.result_variable));
    script.push_str(&format!(
        "cq.exporters.export(_result, os.environ[\"{}\"], tolerance={}, angularTolerance={})\n",
        STL_PATH_VAR, config.tolerance, config.angular_tolerance
    ));
    script.push_str(&format!(
        "cq.exporters.export(_result, os.environ[\"{}\"])\n",
        STEP_PATH_VAR
    ));
    script
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_harness_appends_exports() {
        let config = ExecutionConfig::new();
        let script = build_harness("r = cq.Workplane().box(1, 1, 1)", &config);
        assert!(script.starts_with("r = cq.Workplane().box(1, 1, 1)\n"));
        assert!(script.contains("_result = r.val()\n"));
        assert!(script.contains("os.environ[\"CAD_STL_PATH\"], tolerance=0.001, angularTolerance=0.1)"));
        assert!(script.contains("os.environ[\"CAD_STEP_PATH\"])"));
    }

    #[test]
    fn test_harness_uses_result_variable() {
        let config = ExecutionConfig::new().with_result_variable("solid".into());
        let script = build_harness("solid = None\n", &config);
        assert!(script.contains("_result = solid.val()"));
        assert!(!script.contains("\n\n\n"));
    }
}
