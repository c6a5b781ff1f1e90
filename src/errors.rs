// src/errors.rs

//! Crate-wide error type and result alias.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DevloopError {
    /// The compiler exited non-zero or wrote anything to stdout/stderr.
    /// Carries the raw combined output.
    #[error("build failed:\n{0}")]
    BuildFailed(String),

    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to send stop request to process {pid}: {reason}")]
    Signal { pid: u32, reason: String },

    /// Only ever logged; `Runner::kill` clears its state regardless.
    #[error("failed to force-kill process {pid}: {source}")]
    ForceKill {
        pid: u32,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot start debug server: {0}")]
    DebugServerPrecondition(String),

    #[error("cannot stat {path:?}: {source}")]
    Stat {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, DevloopError>;
