// src/engine/session.rs

use tracing::{debug, error, info, warn};

use crate::build::Builder;
use crate::errors::{DevloopError, Result};
use crate::runner::Runner;

use super::{RuntimeEvent, SessionOptions};

/// One supervised program: its builder, its runner, and whether the last
/// build produced something worth running.
#[derive(Debug)]
pub struct Session {
    builder: Builder,
    runner: Runner,
    options: SessionOptions,
    last_build_ok: bool,
}

impl Session {
    pub fn new(builder: Builder, runner: Runner, options: SessionOptions) -> Self {
        Self {
            builder,
            runner,
            options,
            last_build_ok: false,
        }
    }

    /// Feed one event in. Returns `false` once the session should stop.
    pub async fn handle_event(&mut self, event: RuntimeEvent) -> Result<bool> {
        match event {
            RuntimeEvent::Poll => self.ensure_running().await?,
            RuntimeEvent::RebuildRequested => self.rebuild().await?,
            RuntimeEvent::ShutdownRequested => {
                self.shutdown().await?;
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Stop the program, compile, and start it again when the build is clean.
    ///
    /// A failed build is logged and leaves nothing running until the next
    /// successful rebuild.
    pub async fn rebuild(&mut self) -> Result<()> {
        if let Err(e) = self.runner.kill().await {
            warn!(error = %e, "could not stop running program before rebuild");
        }

        match self.builder.build().await {
            Ok(()) => self.last_build_ok = true,
            Err(DevloopError::BuildFailed(output)) => {
                self.last_build_ok = false;
                error!("build failed:\n{}", output.trim_end());
                return Ok(());
            }
            Err(e @ DevloopError::Spawn { .. }) => {
                self.last_build_ok = false;
                error!(error = %e, "could not run the toolchain");
                return Ok(());
            }
            Err(e) => return Err(e),
        }

        self.ensure_running().await
    }

    /// Start (or restart) the program if the last build succeeded.
    pub async fn ensure_running(&mut self) -> Result<()> {
        if !self.last_build_ok {
            debug!("last build failed; not running");
            return Ok(());
        }

        let before = self.runner.app();
        let handle = match self.runner.run().await {
            Ok(handle) => handle,
            Err(e) => {
                warn!(error = %e, "program not running; retrying on next poll");
                return Ok(());
            }
        };

        if before.as_ref() == Some(&handle) {
            return Ok(());
        }

        info!(pid = handle.pid(), binary = %self.runner.binary(), "program started");

        if self.options.debug {
            if let Err(e) = self.runner.start_debug_server().await {
                warn!(error = %e, "could not attach debug server");
            }
        }

        Ok(())
    }

    /// Stop the debug server and the program.
    pub async fn shutdown(&mut self) -> Result<()> {
        info!("shutting down");
        self.runner.kill().await
    }

    pub fn last_build_ok(&self) -> bool {
        self.last_build_ok
    }

    pub fn builder(&self) -> &Builder {
        &self.builder
    }

    pub fn runner(&self) -> &Runner {
        &self.runner
    }
}
