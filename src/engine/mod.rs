// src/engine/mod.rs

//! Driver loop for devloop.
//!
//! The engine reacts to:
//!   - periodic polls (restart a stale or exited program),
//!   - manual rebuild requests (typed on stdin),
//!   - shutdown signals.
//!
//! The build/run/kill decisions live in [`session`]; the async event sources
//! and the loop around them are in [`runtime`].

use std::time::Duration;

/// Events flowing into the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeEvent {
    /// Re-check the running program (staleness, unexpected exit).
    Poll,
    /// Stop everything, rebuild, start again.
    RebuildRequested,
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

/// Options shared by the session and the runtime shell.
#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    /// Attach a debug server after every (re)start.
    pub debug: bool,
    /// Interval between `Poll` events.
    pub poll_interval: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            debug: false,
            poll_interval: Duration::from_secs(1),
        }
    }
}

pub mod runtime;
pub mod session;

pub use runtime::{run_session, spawn_event_sources};
pub use session::Session;
