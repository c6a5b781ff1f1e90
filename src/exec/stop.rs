// src/exec/stop.rs

//! Platform-selected "please stop" request.

use tracing::debug;

use crate::errors::{DevloopError, Result};
use crate::exec::process::ManagedProcess;

/// How a graceful stop is requested from a managed process.
///
/// - `Interrupt`: deliver `SIGINT`, letting the program run its shutdown path.
/// - `Terminate`: no signal semantics on the host; terminate the process
///   directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopStrategy {
    Interrupt,
    Terminate,
}

impl StopStrategy {
    pub fn for_host() -> Self {
        if cfg!(unix) {
            StopStrategy::Interrupt
        } else {
            StopStrategy::Terminate
        }
    }

    /// Send the stop request. Does not wait for the process to exit.
    pub async fn request_stop(self, process: &ManagedProcess) -> Result<()> {
        let pid = process.pid();
        debug!(pid, strategy = ?self, "requesting graceful stop");

        match self {
            #[cfg(unix)]
            StopStrategy::Interrupt => interrupt(pid),
            // Without signals an interrupt request degrades to termination.
            #[cfg(not(unix))]
            StopStrategy::Interrupt => terminate(process).await,
            StopStrategy::Terminate => terminate(process).await,
        }
    }
}

async fn terminate(process: &ManagedProcess) -> Result<()> {
    process.force_kill().await.map_err(|e| DevloopError::Signal {
        pid: process.pid(),
        reason: e.to_string(),
    })
}

#[cfg(unix)]
fn interrupt(pid: u32) -> Result<()> {
    use nix::errno::Errno;
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    let raw = i32::try_from(pid)
        .ok()
        .filter(|p| *p > 0)
        .ok_or_else(|| DevloopError::Signal {
            pid,
            reason: "invalid process id".to_string(),
        })?;

    match kill(Pid::from_raw(raw), Signal::SIGINT) {
        Ok(()) => Ok(()),
        // Already reaped; the exit observer will report it.
        Err(Errno::ESRCH) => {
            debug!(pid, "process already gone when interrupting");
            Ok(())
        }
        Err(errno) => Err(DevloopError::Signal {
            pid,
            reason: errno.desc().to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_strategy_matches_platform() {
        let expected = if cfg!(unix) {
            StopStrategy::Interrupt
        } else {
            StopStrategy::Terminate
        };
        assert_eq!(StopStrategy::for_host(), expected);
    }

    #[tokio::test]
    async fn failed_termination_is_a_signal_error() {
        let process = ManagedProcess::scripted(4242, vec![Err(std::io::Error::other("denied"))]);

        let err = StopStrategy::Terminate.request_stop(&process).await.unwrap_err();

        match err {
            DevloopError::Signal { pid, reason } => {
                assert_eq!(pid, 4242);
                assert_eq!(reason, "denied");
            }
            other => panic!("expected Signal error, got {other:?}"),
        }
        assert!(!process.has_exited());
    }

    #[cfg(unix)]
    #[test]
    fn interrupting_pid_zero_is_rejected() {
        let err = interrupt(0).unwrap_err();
        assert!(matches!(err, DevloopError::Signal { pid: 0, .. }));
    }
}
