// src/build/builder.rs

use std::path::PathBuf;
use std::sync::Arc;

use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::build::spec::BuildSpec;
use crate::errors::{DevloopError, Result};
use crate::exec::process::spawn_pump;
use crate::exec::sink::MemorySink;

/// Outcome of the most recent `Builder::build` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildResult {
    /// Combined stdout + stderr of the compiler; empty on success.
    pub output: String,
    pub success: bool,
}

/// Runs the external toolchain for a fixed [`BuildSpec`].
#[derive(Debug)]
pub struct Builder {
    spec: BuildSpec,
    last: BuildResult,
}

impl Builder {
    pub fn new(spec: BuildSpec) -> Self {
        Self {
            spec,
            last: BuildResult::default(),
        }
    }

    /// Invoke `<toolchain> build -o <output> <args...>` in the source dir.
    ///
    /// Any captured output counts as failure, even with a zero exit status.
    pub async fn build(&mut self) -> Result<()> {
        let argv = self.spec.command_args();
        info!(
            toolchain = %self.spec.toolchain(),
            source_dir = %self.spec.source_dir().display(),
            output = %self.spec.output_path().display(),
            "building"
        );
        debug!(?argv, "toolchain arguments");

        let mut cmd = Command::new(self.spec.toolchain());
        cmd.args(&argv)
            .current_dir(self.spec.source_dir())
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .kill_on_drop(true);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(source) => {
                let err = DevloopError::Spawn {
                    program: self.spec.toolchain().to_string(),
                    source,
                };
                self.last = BuildResult {
                    output: err.to_string(),
                    success: false,
                };
                return Err(err);
            }
        };

        let pid = child.id().unwrap_or(0);
        let combined = MemorySink::new();
        let mut pumps = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            pumps.push(spawn_pump(stdout, Arc::new(combined.clone()), "stdout", pid));
        }
        if let Some(stderr) = child.stderr.take() {
            pumps.push(spawn_pump(stderr, Arc::new(combined.clone()), "stderr", pid));
        }

        let status = child.wait().await;
        for pump in pumps {
            let _ = pump.await;
        }
        let output = combined.contents();

        let success = match &status {
            Ok(status) => status.success() && output.is_empty(),
            Err(e) => {
                warn!(error = %e, "failed to wait for toolchain");
                false
            }
        };

        if success {
            info!(binary = %self.spec.binary(), "build succeeded");
            self.last = BuildResult {
                output: String::new(),
                success: true,
            };
            return Ok(());
        }

        // `errors()` stays the raw output; only the error value gets a fallback.
        let message = match status {
            Err(e) if output.is_empty() => e.to_string(),
            Ok(status) if output.is_empty() => format!("{} exited with {status}", self.spec.toolchain()),
            _ => output.clone(),
        };

        warn!(binary = %self.spec.binary(), "build failed");
        self.last = BuildResult {
            output,
            success: false,
        };
        Err(DevloopError::BuildFailed(message))
    }

    /// Platform-adjusted binary name.
    pub fn binary(&self) -> &str {
        self.spec.binary()
    }

    /// Output of the last failed build, or `""` after a success.
    pub fn errors(&self) -> &str {
        &self.last.output
    }

    pub fn last_result(&self) -> &BuildResult {
        &self.last
    }

    pub fn spec(&self) -> &BuildSpec {
        &self.spec
    }

    pub fn output_path(&self) -> PathBuf {
        self.spec.output_path()
    }
}
