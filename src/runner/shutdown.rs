// src/runner/shutdown.rs

use tracing::{debug, info, warn};

use crate::errors::{DevloopError, Result};

use super::{GRACEFUL_STOP_TIMEOUT, Runner};

impl Runner {
    /// Stop the application.
    ///
    /// The debug server (if any) is hard-killed first. The application then
    /// gets a graceful stop request and [`GRACEFUL_STOP_TIMEOUT`] to exit
    /// before it is force-killed. A failed force kill is only logged; the
    /// handle is cleared either way.
    ///
    /// If the stop request itself cannot be delivered, returns
    /// `DevloopError::Signal` and keeps tracking the application.
    pub async fn kill(&mut self) -> Result<()> {
        if self.app.is_none() {
            return Ok(());
        }

        self.stop_debug_server().await?;

        let already_exited = self.app.as_ref().is_some_and(|app| app.has_exited());
        if already_exited {
            debug!("application already exited; clearing handle");
            self.app = None;
            return Ok(());
        }

        let strategy = self.stop_strategy;
        let Some(app) = self.app.as_ref() else {
            return Ok(());
        };
        let pid = app.pid();

        strategy.request_stop(app).await?;

        let exit = app.handle().clone();
        tokio::select! {
            status = exit.wait() => {
                info!(pid, exit_code = ?status.code(), "application stopped");
            }
            _ = tokio::time::sleep(GRACEFUL_STOP_TIMEOUT) => {
                warn!(
                    pid,
                    timeout_secs = GRACEFUL_STOP_TIMEOUT.as_secs(),
                    "application ignored stop request; force killing"
                );
                if let Err(source) = app.force_kill().await {
                    let err = DevloopError::ForceKill { pid, source };
                    warn!(error = %err, "process may be left running");
                }
            }
        }

        self.app = None;
        Ok(())
    }
}
