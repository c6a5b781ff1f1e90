// src/runner/mod.rs

//! Lifecycle of the supervised application and its optional debug server.
//!
//! The runner owns at most one application process and at most one debug
//! server attached to it. All operations take `&mut self`; callers drive the
//! runner from a single task.
//!
//! - [`Runner::run`] is the reconciliation step: restart when the binary on
//!   disk is newer than the last start, start when nothing is running, and
//!   otherwise leave the running process alone.
//! - [`Runner::kill`] (see [`shutdown`]) stops the debug server, then asks the
//!   application to stop and force-kills it after [`GRACEFUL_STOP_TIMEOUT`].
//! - [`debug_server`] attaches an external debugger to the running process.

pub mod debug_server;
pub mod shutdown;

use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::process::Command;
use tracing::{debug, error, info};

use crate::build::BuildSpec;
use crate::build::spec::artifact_path;
use crate::errors::{DevloopError, Result};
use crate::exec::process::{ManagedProcess, ProcessHandle, spawn_managed};
use crate::exec::sink::{DiscardSink, SharedSink};
use crate::exec::stop::StopStrategy;

pub use debug_server::{DEFAULT_DEBUGGER, DebugServerSettings};

/// How long `kill` waits for a graceful exit before force-killing.
pub const GRACEFUL_STOP_TIMEOUT: Duration = Duration::from_secs(3);

/// Pause after starting the application so startup failures surface before
/// `run` returns.
pub const STARTUP_SETTLE_DELAY: Duration = Duration::from_millis(250);

#[derive(Debug)]
pub struct Runner {
    work_dir: PathBuf,
    binary: String,
    sink: SharedSink,
    debug: Option<DebugServerSettings>,
    stop_strategy: StopStrategy,
    app: Option<ManagedProcess>,
    debug_server: Option<ManagedProcess>,
    starttime: SystemTime,
}

impl Runner {
    /// Runner for `<work_dir>/<binary>`, writing output nowhere until
    /// [`Runner::set_writer`] is called.
    pub fn new(work_dir: impl Into<PathBuf>, binary: impl Into<String>) -> Self {
        Self {
            work_dir: work_dir.into(),
            binary: binary.into(),
            sink: Arc::new(DiscardSink),
            debug: None,
            stop_strategy: StopStrategy::for_host(),
            app: None,
            debug_server: None,
            starttime: SystemTime::now(),
        }
    }

    /// Runner for the artifact a [`BuildSpec`] produces.
    pub fn for_build(spec: &BuildSpec) -> Self {
        Self::new(spec.work_dir(), spec.binary())
    }

    /// Enable [`Runner::start_debug_server`].
    pub fn with_debug_server(mut self, settings: DebugServerSettings) -> Self {
        self.debug = Some(settings);
        self
    }

    /// Ensure the application is running and up to date.
    ///
    /// Returns the handle of the running process, which is the same handle as
    /// the previous call when nothing changed.
    pub async fn run(&mut self) -> Result<ProcessHandle> {
        let running = self.app.as_ref().is_some_and(|app| !app.has_exited());

        if running && self.is_stale() {
            info!(binary = %self.binary, "binary changed since last start; restarting");
            self.kill().await?;
        }

        if let Some(app) = &self.app {
            if !app.has_exited() {
                return Ok(app.handle().clone());
            }
        }

        if let Some(previous) = self.app.take() {
            debug!(
                pid = previous.pid(),
                exit = ?previous.handle().exit(),
                "previous process exited on its own"
            );
            self.stop_debug_server().await?;
        }

        let path = self.binary_path();
        let mut cmd = Command::new(&path);

        match spawn_managed(&mut cmd, &self.binary, self.sink.clone()) {
            Ok(process) => {
                let handle = process.handle().clone();
                self.starttime = handle.started_at();
                self.app = Some(process);

                tokio::time::sleep(STARTUP_SETTLE_DELAY).await;
                Ok(handle)
            }
            Err(e) => {
                error!(binary = %path.display(), error = %e, "error running binary");
                Err(e)
            }
        }
    }

    /// Stat the binary on disk.
    pub fn info(&self) -> Result<Metadata> {
        let path = self.binary_path();
        std::fs::metadata(&path).map_err(|source| DevloopError::Stat { path, source })
    }

    /// Output sink for processes started from now on. Running processes keep
    /// writing to the sink they were started with.
    pub fn set_writer(&mut self, sink: SharedSink) {
        self.sink = sink;
    }

    /// True when the binary on disk was modified after the last start.
    /// A binary that cannot be stat'd is never stale.
    pub fn is_stale(&self) -> bool {
        let meta = match self.info() {
            Ok(meta) => meta,
            Err(e) => {
                debug!(error = %e, "staleness check skipped");
                return false;
            }
        };

        match meta.modified() {
            Ok(mtime) => mtime > self.starttime,
            Err(e) => {
                debug!(error = %e, "binary has no modification time; not stale");
                false
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.app.as_ref().is_some_and(|app| !app.has_exited())
    }

    /// Handle of the tracked application process, if any.
    pub fn app(&self) -> Option<ProcessHandle> {
        self.app.as_ref().map(|app| app.handle().clone())
    }

    /// Handle of the tracked debug server, if any.
    pub fn debug_server(&self) -> Option<ProcessHandle> {
        self.debug_server.as_ref().map(|server| server.handle().clone())
    }

    /// Time of the last successful start (application or debug server).
    pub fn start_time(&self) -> SystemTime {
        self.starttime
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn binary_path(&self) -> PathBuf {
        artifact_path(&self.work_dir, &self.binary)
    }
}
