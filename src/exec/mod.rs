// src/exec/mod.rs

//! Process execution layer.
//!
//! Shared plumbing for everything devloop launches, built on
//! `tokio::process::Command`:
//!
//! - [`sink`] defines the `OutputSink` trait and the stock sinks.
//! - [`process`] spawns managed processes with output pumps and a reaper.
//! - [`stop`] holds the platform-selected graceful stop request.

pub mod process;
pub mod sink;
pub mod stop;

pub use process::{ManagedProcess, ProcessExit, ProcessHandle, spawn_managed};
pub use sink::{DiscardSink, MemorySink, OutputSink, SharedSink, StderrSink, StdoutSink, sink_for};
pub use stop::StopStrategy;
