#![allow(dead_code)]

//! Shell-script fixtures standing in for the toolchain, the supervised
//! program and the debugger.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Bodies for fake application binaries.
pub mod scripts {
    /// Prints one line and exits.
    pub const HELLO: &str = "echo \"Hello world\"";

    /// Runs until interrupted, then exits cleanly.
    pub const LONG_RUNNING: &str = "trap 'exit 0' INT\nwhile true; do sleep 0.05; done";

    /// Ignores SIGINT; only a hard kill stops it.
    pub const IGNORES_INTERRUPT: &str = "trap '' INT\nwhile true; do sleep 0.05; done";

    /// Exits immediately with a failure.
    pub const FAILS_FAST: &str = "echo \"boom\" 1>&2\nexit 3";
}

/// Scratch directory holding executable scripts.
#[derive(Debug)]
pub struct ScriptDir {
    dir: TempDir,
}

impl ScriptDir {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("creating temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn join(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Write `#!/bin/sh` + `body` to `name` and make it executable.
    pub fn write_script(&self, name: &str, body: &str) -> PathBuf {
        let path = self.join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("writing script");
        make_executable(&path);
        path
    }

    /// Read a file the scripts wrote, e.g. recorded arguments.
    pub fn read(&self, name: &str) -> String {
        fs::read_to_string(self.join(name)).unwrap_or_default()
    }

    /// Lines of a recorded-arguments file.
    pub fn read_lines(&self, name: &str) -> Vec<String> {
        self.read(name).lines().map(str::to_string).collect()
    }
}

impl Default for ScriptDir {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for a fake `<toolchain> build -o <path> ...`.
///
/// The generated script records its arguments to `toolchain.args`, writes
/// `binary_body` as an executable script to the `-o` path, prints `output`
/// and exits with `exit_code`.
#[derive(Debug, Clone)]
pub struct FakeToolchain {
    binary_body: String,
    output: String,
    exit_code: i32,
    write_binary: bool,
}

impl FakeToolchain {
    pub const ARGS_FILE: &'static str = "toolchain.args";

    pub fn new() -> Self {
        Self {
            binary_body: scripts::HELLO.to_string(),
            output: String::new(),
            exit_code: 0,
            write_binary: true,
        }
    }

    pub fn binary_body(mut self, body: &str) -> Self {
        self.binary_body = body.to_string();
        self
    }

    pub fn prints(mut self, output: &str) -> Self {
        self.output = output.to_string();
        self
    }

    pub fn exits_with(mut self, code: i32) -> Self {
        self.exit_code = code;
        self
    }

    pub fn without_binary(mut self) -> Self {
        self.write_binary = false;
        self
    }

    /// Write the toolchain script into `dir` and return its absolute path.
    pub fn install(&self, dir: &ScriptDir) -> PathBuf {
        let args_file = dir.join(Self::ARGS_FILE);
        let mut body = format!("printf '%s\\n' \"$@\" > {}\n", sh_quote(&args_file.to_string_lossy()));

        if self.write_binary {
            body.push_str(&format!(
                "cat > \"$3\" <<'DEVLOOP_BINARY'\n#!/bin/sh\n{}\nDEVLOOP_BINARY\nchmod +x \"$3\"\n",
                self.binary_body
            ));
        }
        if !self.output.is_empty() {
            body.push_str(&format!("printf '%s' {}\n", sh_quote(&self.output)));
        }
        body.push_str(&format!("exit {}", self.exit_code));

        dir.write_script("fake-toolchain", &body)
    }
}

impl Default for FakeToolchain {
    fn default() -> Self {
        Self::new()
    }
}

/// Fake debugger: records its arguments to `debugger.args`, its pid to
/// `debugger.pid`, then sleeps until killed.
#[derive(Debug, Clone, Copy, Default)]
pub struct FakeDebugger;

impl FakeDebugger {
    pub const ARGS_FILE: &'static str = "debugger.args";
    pub const PID_FILE: &'static str = "debugger.pid";

    pub fn install(dir: &ScriptDir) -> PathBuf {
        let body = format!(
            "printf '%s\\n' \"$@\" > {}\necho $$ > {}\nexec sleep 30",
            sh_quote(&dir.join(Self::ARGS_FILE).to_string_lossy()),
            sh_quote(&dir.join(Self::PID_FILE).to_string_lossy()),
        );
        dir.write_script("fake-debugger", &body)
    }
}

/// Single-quote `s` for sh.
fn sh_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "'\\''"))
}

#[cfg(unix)]
fn make_executable(path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = fs::metadata(path).expect("stat script").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms).expect("chmod script");
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) {}
