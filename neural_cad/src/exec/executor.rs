//! Running generated programs in a time-bounded child process.

use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use cad_io::TriangleMesh;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::config::ExecutionConfig;
use crate::error::{NeuralCadError, Result};
use crate::exec::harness::{build_harness, STEP_PATH_VAR, STL_PATH_VAR, SYNTAX_CHECK};

static NEXT_RUN: AtomicU64 = AtomicU64::new(0);

fn unique_stem() -> String {
    format!(
        "cad_program_{}_{}",
        std::process::id(),
        NEXT_RUN.fetch_add(1, Ordering::Relaxed)
    )
}

/// Files written by a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionArtifacts {
    /// Tessellated solid.
    pub stl_path: PathBuf,
    /// Exact solid.
    pub step_path: PathBuf,
}

impl ExecutionArtifacts {
    /// Load the STL artifact.
    pub fn load_mesh(&self) -> Result<TriangleMesh> {
        Ok(cad_io::parse_stl_file(&self.stl_path)?)
    }
}

/// Runs programs through the external CAD scripting kernel.
#[derive(Debug, Clone)]
pub struct CodeExecutor {
    config: ExecutionConfig,
}

impl CodeExecutor {
    /// Create an executor.
    pub fn new(config: ExecutionConfig) -> Self {
        Self { config }
    }

    /// Executor configuration.
    pub fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    /// Program plus the export harness.
    pub fn harness(&self, code: &str) -> String {
        build_harness(code, &self.config)
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_secs)
    }

    async fn wait(&self, child: tokio::process::Child) -> Result<Output> {
        match tokio::time::timeout(self.timeout(), child.wait_with_output()).await {
            Ok(output) => Ok(output?),
            Err(_) => {
                log::warn!(
                    "Program killed after {} s",
                    self.config.timeout_secs
                );
                Err(NeuralCadError::ExecutionTimeout {
                    seconds: self.config.timeout_secs,
                })
            }
        }
    }

    /// Parse `code` with the interpreter without running it.
    ///
    /// # Errors
    /// [`NeuralCadError::SyntaxError`] carrying the interpreter's diagnostic.
    pub async fn check_syntax(&self, code: &str) -> Result<()> {
        let mut child = Command::new(&self.config.interpreter)
            .arg("-c")
            .arg(SYNTAX_CHECK)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            match stdin.write_all(code.as_bytes()).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
                Err(e) => return Err(e.into()),
            }
        }

        let output = self.wait(child).await?;
        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = stderr
                .lines()
                .rev()
                .find(|l| !l.trim().is_empty())
                .unwrap_or("interpreter rejected the program");
            Err(NeuralCadError::SyntaxError(message.trim().to_string()))
        }
    }

    /// Run `code` with the export harness and return the exported files.
    ///
    /// The child is killed when the wall-clock limit expires.
    pub async fn execute(&self, code: &str) -> Result<ExecutionArtifacts> {
        let work_dir = Path::new(&self.config.work_dir);
        tokio::fs::create_dir_all(work_dir).await?;

        let stem = unique_stem();
        let script = work_dir.join(format!("{}.py", stem));
        let artifacts = ExecutionArtifacts {
            stl_path: work_dir.join(format!("{}.stl", stem)),
            step_path: work_dir.join(format!("{}.step", stem)),
        };
        tokio::fs::write(&script, self.harness(code)).await?;

        let child = Command::new(&self.config.interpreter)
            .args(&self.config.interpreter_args)
            .arg(&script)
            .env(STL_PATH_VAR, &artifacts.stl_path)
            .env(STEP_PATH_VAR, &artifacts.step_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;
        log::debug!("Running {:?}", script);

        let result = self.wait(child).await;
        if let Err(e) = tokio::fs::remove_file(&script).await {
            log::debug!("Could not remove {:?}: {}", script, e);
        }
        let output = result?;

        if !output.status.success() {
            return Err(NeuralCadError::ExecutionFailed {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        for path in [&artifacts.stl_path, &artifacts.step_path] {
            if !path.is_file() {
                return Err(NeuralCadError::MissingArtifact(path.clone()));
            }
        }

        log::info!("Program exported {:?}", artifacts.stl_path);
        Ok(artifacts)
    }

    /// [`execute`](Self::execute) on a current-thread runtime.
    pub fn execute_blocking(&self, code: &str) -> Result<ExecutionArtifacts> {
        current_thread_runtime()?.block_on(self.execute(code))
    }

    /// [`check_syntax`](Self::check_syntax) on a current-thread runtime.
    pub fn check_syntax_blocking(&self, code: &str) -> Result<()> {
        current_thread_runtime()?.block_on(self.check_syntax(code))
    }
}

fn current_thread_runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}
