// src/build/spec.rs

use std::path::{Path, PathBuf};

/// Binary name used when none is configured.
pub const DEFAULT_BINARY: &str = "bin";

/// Toolchain program used when none is configured.
pub const DEFAULT_TOOLCHAIN: &str = "go";

/// Always appended to the compiler arguments: keep debug symbols, disable
/// optimizations and inlining so a debugger can attach meaningfully.
pub const DEBUG_BUILD_FLAG: &str = "-gcflags=all=-N -l";

/// Immutable description of how to build the supervised program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSpec {
    source_dir: PathBuf,
    binary: String,
    work_dir: PathBuf,
    toolchain: String,
    args: Vec<String>,
}

impl BuildSpec {
    /// - `binary`: `None` or an empty name falls back to [`DEFAULT_BINARY`];
    ///   the host executable suffix is appended if missing.
    /// - `args`: extra compiler arguments; [`DEBUG_BUILD_FLAG`] is appended.
    pub fn new(
        source_dir: impl Into<PathBuf>,
        binary: Option<&str>,
        work_dir: impl Into<PathBuf>,
        args: Vec<String>,
    ) -> Self {
        let mut args = args;
        args.push(DEBUG_BUILD_FLAG.to_string());

        Self {
            source_dir: source_dir.into(),
            binary: normalize_binary_name(binary, std::env::consts::EXE_SUFFIX),
            work_dir: work_dir.into(),
            toolchain: DEFAULT_TOOLCHAIN.to_string(),
            args,
        }
    }

    /// Use a different toolchain program (default `go`).
    pub fn with_toolchain(mut self, toolchain: impl Into<String>) -> Self {
        self.toolchain = toolchain.into();
        self
    }

    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn toolchain(&self) -> &str {
        &self.toolchain
    }

    /// Extra arguments, debug flag included.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Where the compiler is told to write the artifact.
    pub fn output_path(&self) -> PathBuf {
        artifact_path(&self.work_dir, &self.binary)
    }

    /// Full argument list passed to the toolchain:
    /// `build -o <output> <args...>`.
    pub fn command_args(&self) -> Vec<String> {
        let mut argv = vec![
            "build".to_string(),
            "-o".to_string(),
            self.output_path().to_string_lossy().into_owned(),
        ];
        argv.extend(self.args.iter().cloned());
        argv
    }
}

/// Apply the default name and the platform executable suffix.
pub fn normalize_binary_name(binary: Option<&str>, exe_suffix: &str) -> String {
    let mut name = match binary {
        Some(b) if !b.is_empty() => b.to_string(),
        _ => DEFAULT_BINARY.to_string(),
    };

    if !exe_suffix.is_empty() && !name.ends_with(exe_suffix) {
        name.push_str(exe_suffix);
    }

    name
}

/// `<work_dir>/<binary>`, with an explicit `.` for an empty work dir so the
/// result is never looked up on `PATH`.
pub fn artifact_path(work_dir: &Path, binary: &str) -> PathBuf {
    if work_dir.as_os_str().is_empty() {
        Path::new(".").join(binary)
    } else {
        work_dir.join(binary)
    }
}
