// src/runner/debug_server.rs

use std::path::Path;

use tokio::process::Command;
use tracing::{info, warn};

use crate::errors::{DevloopError, Result};
use crate::exec::process::{ProcessHandle, spawn_managed};

use super::Runner;

/// Debugger launched when none is configured.
pub const DEFAULT_DEBUGGER: &str = "dlv";

/// Where and how to attach a headless debugger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugServerSettings {
    pub port: u16,
    pub program: String,
}

impl DebugServerSettings {
    pub fn new(port: u16) -> Self {
        Self {
            port,
            program: DEFAULT_DEBUGGER.to_string(),
        }
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Arguments attaching to `pid`, listening on `:<port>` for any number of
    /// headless clients, and letting the target keep running.
    pub fn attach_args(&self, pid: u32, work_dir: &Path) -> Vec<String> {
        vec![
            "attach".to_string(),
            pid.to_string(),
            work_dir.to_string_lossy().into_owned(),
            format!("--listen=:{}", self.port),
            "--headless=true".to_string(),
            "--continue".to_string(),
            "--accept-multiclient".to_string(),
            "--only-same-user=false".to_string(),
            "--api-version=2".to_string(),
            "--log".to_string(),
        ]
    }
}

impl Runner {
    /// Attach a debug server to the running application, replacing any
    /// previous one.
    pub async fn start_debug_server(&mut self) -> Result<ProcessHandle> {
        self.stop_debug_server().await?;

        let settings = self.debug.clone().ok_or_else(|| {
            DevloopError::DebugServerPrecondition("no debug server configured".to_string())
        })?;

        let pid = match &self.app {
            Some(app) if !app.has_exited() => app.pid(),
            _ => {
                return Err(DevloopError::DebugServerPrecondition(
                    "application is not running".to_string(),
                ));
            }
        };
        if pid == 0 {
            return Err(DevloopError::DebugServerPrecondition(
                "application pid is unavailable".to_string(),
            ));
        }

        let mut cmd = Command::new(&settings.program);
        cmd.args(settings.attach_args(pid, &self.work_dir));

        let server = spawn_managed(&mut cmd, &settings.program, self.sink.clone())?;
        let handle = server.handle().clone();
        self.starttime = handle.started_at();
        self.debug_server = Some(server);

        info!(
            app_pid = pid,
            debugger_pid = handle.pid(),
            port = settings.port,
            "debug server attached"
        );
        Ok(handle)
    }

    /// Hard-kill the debug server if one is tracked. Always succeeds.
    pub async fn stop_debug_server(&mut self) -> Result<()> {
        if let Some(server) = self.debug_server.take() {
            let pid = server.pid();
            match server.force_kill().await {
                Ok(()) => info!(pid, "debug server stopped"),
                Err(e) => warn!(pid, error = %e, "failed to kill debug server"),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attach_args_follow_headless_multiclient_layout() {
        let settings = DebugServerSettings::new(2345);
        let args = settings.attach_args(4242, Path::new("/srv/app"));

        assert_eq!(
            args,
            vec![
                "attach",
                "4242",
                "/srv/app",
                "--listen=:2345",
                "--headless=true",
                "--continue",
                "--accept-multiclient",
                "--only-same-user=false",
                "--api-version=2",
                "--log",
            ]
        );
    }

    #[test]
    fn default_program_can_be_overridden() {
        assert_eq!(DebugServerSettings::new(1).program, DEFAULT_DEBUGGER);
        assert_eq!(DebugServerSettings::new(1).with_program("gdbserver").program, "gdbserver");
    }
}
