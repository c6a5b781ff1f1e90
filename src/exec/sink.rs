// src/exec/sink.rs

//! Output sinks shared by every pump of every supervised process.
//!
//! A sink is written concurrently from several tokio tasks (application
//! stdout + stderr, debug-server stdout + stderr), so implementations take
//! `&self` and serialize internally.

use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use crate::types::OutputTarget;

/// Destination for raw output chunks.
pub trait OutputSink: Send + Sync + fmt::Debug {
    /// Write one chunk in full.
    fn write_chunk(&self, chunk: &[u8]) -> io::Result<()>;
}

/// Reference-counted sink, as captured by running pumps.
pub type SharedSink = Arc<dyn OutputSink>;

/// Drops everything. Default sink of a fresh `Runner`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardSink;

impl OutputSink for DiscardSink {
    fn write_chunk(&self, _chunk: &[u8]) -> io::Result<()> {
        Ok(())
    }
}

/// Forwards to this process's stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSink;

impl OutputSink for StdoutSink {
    fn write_chunk(&self, chunk: &[u8]) -> io::Result<()> {
        let mut out = io::stdout().lock();
        out.write_all(chunk)?;
        out.flush()
    }
}

/// Forwards to this process's stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrSink;

impl OutputSink for StderrSink {
    fn write_chunk(&self, chunk: &[u8]) -> io::Result<()> {
        io::stderr().lock().write_all(chunk)
    }
}

/// In-memory buffer. Clones share the same buffer, so one clone can be handed
/// to the runner while another is inspected.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything written so far.
    pub fn bytes(&self) -> Vec<u8> {
        match self.buf.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Snapshot decoded lossily as UTF-8.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.bytes()).into_owned()
    }
}

impl OutputSink for MemorySink {
    fn write_chunk(&self, chunk: &[u8]) -> io::Result<()> {
        let mut guard = self
            .buf
            .lock()
            .map_err(|_| io::Error::other("memory sink mutex poisoned"))?;
        guard.extend_from_slice(chunk);
        Ok(())
    }
}

/// Build the sink configured by `[run].output`.
pub fn sink_for(target: OutputTarget) -> SharedSink {
    match target {
        OutputTarget::Stdout => Arc::new(StdoutSink),
        OutputTarget::Stderr => Arc::new(StderrSink),
        OutputTarget::Discard => Arc::new(DiscardSink),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_clones_share_buffer() {
        let sink = MemorySink::new();
        let shared: SharedSink = Arc::new(sink.clone());

        shared.write_chunk(b"Hello ").unwrap();
        shared.write_chunk(b"world\n").unwrap();

        assert_eq!(sink.contents(), "Hello world\n");
    }

    #[test]
    fn memory_sink_accepts_concurrent_writers() {
        let sink = MemorySink::new();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let sink = sink.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        sink.write_chunk(b"ab").unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(sink.bytes().len(), 4 * 100 * 2);
    }

    #[test]
    fn discard_sink_accepts_anything() {
        assert!(DiscardSink.write_chunk(b"ignored").is_ok());
    }
}
