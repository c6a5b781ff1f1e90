// src/exec/process.rs

//! Managed child processes.
//!
//! Every process devloop launches (the application, the debug server) goes
//! through [`spawn_managed`], which wires up:
//!
//! - two output pumps copying stdout/stderr into the configured sink,
//! - one reaper task that owns the `Child`, waits for it, and publishes the
//!   exit on a `watch` channel: first as soon as the child is reaped, then
//!   again once its output has been drained.
//!
//! These tasks are fire-and-forget. They never reference the `Runner`; the
//! runner only keeps a [`ManagedProcess`] holding the force-kill channel and an
//! exit observer.

use std::io;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, SystemTime};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::errors::{DevloopError, Result};
use crate::exec::sink::SharedSink;

/// How long the reaper waits for the pumps to hit EOF after the process has
/// exited, before declaring the output drained anyway. Pipes inherited by
/// grandchildren can stay open indefinitely.
pub const OUTPUT_DRAIN_GRACE: Duration = Duration::from_millis(500);

type KillReply = oneshot::Sender<io::Result<()>>;

/// How a managed process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessExit {
    Status(ExitStatus),
    /// Waiting on the child failed, or the reaper went away without reporting.
    WaitFailed,
}

impl ProcessExit {
    pub fn code(&self) -> Option<i32> {
        match self {
            ProcessExit::Status(status) => status.code(),
            ProcessExit::WaitFailed => None,
        }
    }

    pub fn success(&self) -> bool {
        matches!(self, ProcessExit::Status(status) if status.success())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExitState {
    Running,
    /// Reaped; the pumps may still be copying buffered output.
    Reaped(ProcessExit),
    Drained(ProcessExit),
}

impl ExitState {
    fn exit(&self) -> Option<ProcessExit> {
        match self {
            ExitState::Running => None,
            ExitState::Reaped(exit) | ExitState::Drained(exit) => Some(*exit),
        }
    }
}

/// Observer for one launched process.
///
/// Handles are cheap to clone and never keep the process alive; two handles
/// compare equal when they refer to the same launch.
#[derive(Debug, Clone)]
pub struct ProcessHandle {
    pid: u32,
    started_at: SystemTime,
    state: watch::Receiver<ExitState>,
}

impl ProcessHandle {
    /// OS process id. Zero if the OS did not report one.
    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn started_at(&self) -> SystemTime {
        self.started_at
    }

    /// True once the process has been reaped, even if output is still
    /// being drained.
    pub fn has_exited(&self) -> bool {
        self.state.borrow().exit().is_some()
    }

    pub fn exit(&self) -> Option<ProcessExit> {
        self.state.borrow().exit()
    }

    /// Wait until the process has exited and its output has been drained.
    pub async fn wait(&self) -> ProcessExit {
        let mut rx = self.state.clone();
        let drained = rx
            .wait_for(|state| matches!(state, ExitState::Drained(_)))
            .await
            .map(|state| state.exit());

        match drained {
            Ok(exit) => exit.unwrap_or(ProcessExit::WaitFailed),
            Err(_) => rx.borrow().exit().unwrap_or(ProcessExit::WaitFailed),
        }
    }
}

impl PartialEq for ProcessHandle {
    fn eq(&self, other: &Self) -> bool {
        self.pid == other.pid && self.started_at == other.started_at
    }
}

impl Eq for ProcessHandle {}

/// A process owned by the runner.
///
/// Dropping it while the process is still running makes the reaper kill the
/// process.
#[derive(Debug)]
pub struct ManagedProcess {
    handle: ProcessHandle,
    kill_tx: mpsc::Sender<KillReply>,
}

impl ManagedProcess {
    pub fn handle(&self) -> &ProcessHandle {
        &self.handle
    }

    pub fn pid(&self) -> u32 {
        self.handle.pid
    }

    pub fn has_exited(&self) -> bool {
        self.handle.has_exited()
    }

    /// Hard-kill the process and wait until its exit has been published.
    ///
    /// Succeeds without doing anything if the process already exited. After
    /// a failed kill the process stays tracked and the call can be retried.
    pub async fn force_kill(&self) -> io::Result<()> {
        if self.has_exited() {
            self.handle.wait().await;
            return Ok(());
        }

        let (reply_tx, reply_rx) = oneshot::channel();
        if self.kill_tx.send(reply_tx).await.is_err() {
            debug!(pid = self.pid(), "process already exited; nothing to kill");
            self.handle.wait().await;
            return Ok(());
        }

        match reply_rx.await {
            Ok(Err(e)) => Err(e),
            // Killed, or the reaper finished before answering.
            Ok(Ok(())) | Err(_) => {
                self.handle.wait().await;
                Ok(())
            }
        }
    }
}

/// Spawn `cmd` with piped stdout/stderr pumped into `sink`, and hand it to a
/// background reaper.
pub fn spawn_managed(cmd: &mut Command, program: &str, sink: SharedSink) -> Result<ManagedProcess> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd.spawn().map_err(|source| DevloopError::Spawn {
        program: program.to_string(),
        source,
    })?;

    let started_at = SystemTime::now();
    let pid = child.id().unwrap_or(0);

    let mut pumps = Vec::with_capacity(2);
    if let Some(stdout) = child.stdout.take() {
        pumps.push(spawn_pump(stdout, sink.clone(), "stdout", pid));
    }
    if let Some(stderr) = child.stderr.take() {
        pumps.push(spawn_pump(stderr, sink, "stderr", pid));
    }

    let (kill_tx, kill_rx) = mpsc::channel::<KillReply>(1);
    let (state_tx, state_rx) = watch::channel(ExitState::Running);

    tokio::spawn(reap(child, kill_rx, state_tx, pumps, program.to_string(), pid));

    info!(pid, program = %program, "process started");

    Ok(ManagedProcess {
        handle: ProcessHandle {
            pid,
            started_at,
            state: state_rx,
        },
        kill_tx,
    })
}

/// Copy everything from `reader` into `sink` until EOF.
///
/// If the sink starts failing the pump keeps draining the pipe so the child
/// never blocks on a full buffer.
pub fn spawn_pump<R>(mut reader: R, sink: SharedSink, stream: &'static str, pid: u32) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = vec![0u8; 8 * 1024];
        let mut sink_ok = true;

        loop {
            match reader.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => {
                    if sink_ok {
                        if let Err(e) = sink.write_chunk(&buf[..n]) {
                            warn!(pid, stream, error = %e, "output sink failed; discarding further output");
                            sink_ok = false;
                        }
                    }
                }
                Err(e) => {
                    debug!(pid, stream, error = %e, "read error on child pipe");
                    break;
                }
            }
        }

        debug!(pid, stream, "output pump ended");
    })
}

async fn reap(
    mut child: Child,
    mut kill_rx: mpsc::Receiver<KillReply>,
    state_tx: watch::Sender<ExitState>,
    pumps: Vec<JoinHandle<()>>,
    program: String,
    pid: u32,
) {
    let waited = loop {
        tokio::select! {
            res = child.wait() => break res,
            req = kill_rx.recv() => match req {
                Some(reply) => {
                    debug!(pid, program = %program, "force kill requested");
                    match child.kill().await {
                        Ok(()) => {
                            let _ = reply.send(Ok(()));
                            break child.wait().await;
                        }
                        Err(e) => {
                            warn!(pid, program = %program, error = %e, "force kill failed; process still running");
                            let _ = reply.send(Err(e));
                        }
                    }
                }
                None => {
                    debug!(pid, program = %program, "owner dropped a running process; killing it");
                    if let Err(e) = child.kill().await {
                        warn!(pid, program = %program, error = %e, "failed to kill orphaned process");
                    }
                    break child.wait().await;
                }
            },
        }
    };
    drop(kill_rx);

    let exit = match waited {
        Ok(status) => ProcessExit::Status(status),
        Err(e) => {
            warn!(pid, program = %program, error = %e, "failed to wait for process");
            ProcessExit::WaitFailed
        }
    };

    info!(
        pid,
        program = %program,
        exit_code = ?exit.code(),
        success = exit.success(),
        "process exited"
    );
    state_tx.send_replace(ExitState::Reaped(exit));

    let drain = async {
        for pump in pumps {
            let _ = pump.await;
        }
    };
    if tokio::time::timeout(OUTPUT_DRAIN_GRACE, drain).await.is_err() {
        debug!(pid, program = %program, "output pipes still open after exit; not waiting further");
    }

    state_tx.send_replace(ExitState::Drained(exit));
}

#[cfg(test)]
impl ManagedProcess {
    /// A stand-in process whose kill requests are answered from `replies`
    /// in order. The first `Ok` marks it exited.
    pub(crate) fn scripted(pid: u32, replies: Vec<io::Result<()>>) -> Self {
        let (kill_tx, mut kill_rx) = mpsc::channel::<KillReply>(1);
        let (state_tx, state_rx) = watch::channel(ExitState::Running);

        tokio::spawn(async move {
            for reply in replies {
                let Some(request) = kill_rx.recv().await else {
                    return;
                };
                let killed = reply.is_ok();
                let _ = request.send(reply);
                if killed {
                    state_tx.send_replace(ExitState::Drained(ProcessExit::WaitFailed));
                    return;
                }
            }
            state_tx.closed().await;
        });

        Self {
            handle: ProcessHandle {
                pid,
                started_at: SystemTime::now(),
                state: state_rx,
            },
            kill_tx,
        }
    }
}
