// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

use crate::build::{BuildSpec, DEFAULT_TOOLCHAIN};
use crate::runner::{DEFAULT_DEBUGGER, DebugServerSettings};
use crate::types::OutputTarget;

/// Configuration as read from TOML, before validation.
///
/// ```toml
/// [build]
/// source_dir = "."
/// binary = "app"
/// work_dir = "."
/// toolchain = "go"
/// args = ["-tags", "dev"]
///
/// [run]
/// output = "stdout"
/// poll_interval_ms = 1000
///
/// [debug]
/// enabled = true
/// port = 2345
/// program = "dlv"
/// ```
///
/// Every section is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub build: BuildSection,

    #[serde(default)]
    pub run: RunSection,

    #[serde(default)]
    pub debug: DebugSection,
}

/// Validated configuration. Only obtainable through `TryFrom<RawConfigFile>`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub build: BuildSection,
    pub run: RunSection,
    pub debug: DebugSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(build: BuildSection, run: RunSection, debug: DebugSection) -> Self {
        Self { build, run, debug }
    }

    pub fn build_spec(&self) -> BuildSpec {
        BuildSpec::new(
            &self.build.source_dir,
            self.build.binary.as_deref(),
            &self.build.work_dir,
            self.build.args.clone(),
        )
        .with_toolchain(&self.build.toolchain)
    }

    /// Debug-server settings when `[debug].enabled` is set.
    pub fn debug_settings(&self) -> Option<DebugServerSettings> {
        self.debug
            .enabled
            .then(|| DebugServerSettings::new(self.debug.port).with_program(&self.debug.program))
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self::new_unchecked(
            BuildSection::default(),
            RunSection::default(),
            DebugSection::default(),
        )
    }
}

/// `[build]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildSection {
    /// Directory the toolchain runs in.
    #[serde(default = "default_dir")]
    pub source_dir: PathBuf,

    /// Output binary name; `bin` when omitted.
    #[serde(default)]
    pub binary: Option<String>,

    /// Directory the artifact is written to and launched from.
    #[serde(default = "default_dir")]
    pub work_dir: PathBuf,

    #[serde(default = "default_toolchain")]
    pub toolchain: String,

    /// Extra compiler arguments.
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            source_dir: default_dir(),
            binary: None,
            work_dir: default_dir(),
            toolchain: default_toolchain(),
            args: Vec::new(),
        }
    }
}

/// `[run]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunSection {
    #[serde(default)]
    pub output: OutputTarget,

    /// How often the session re-checks the binary for staleness.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            output: OutputTarget::default(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

/// `[debug]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DebugSection {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_debug_port")]
    pub port: u16,

    #[serde(default = "default_debugger")]
    pub program: String,
}

impl Default for DebugSection {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_debug_port(),
            program: default_debugger(),
        }
    }
}

fn default_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_toolchain() -> String {
    DEFAULT_TOOLCHAIN.to_string()
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_debug_port() -> u16 {
    2345
}

fn default_debugger() -> String {
    DEFAULT_DEBUGGER.to_string()
}
