// src/config/loader.rs

use std::fs;
use std::path::Path;

use tracing::info;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Default config file name, looked up in the current working directory.
pub const DEFAULT_CONFIG_FILE: &str = "Devloop.toml";

/// Read a config file into a `RawConfigFile` (TOML deserialization only).
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Read and validate a config file.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Like [`load_and_validate`], but a missing file yields the defaults.
///
/// Used for the implicit `Devloop.toml`; an explicitly requested file that
/// does not exist is still an error.
pub fn load_or_default(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    if !path.exists() {
        info!(path = %path.display(), "no config file found; using defaults");
        return Ok(ConfigFile::default());
    }
    load_and_validate(path)
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::path::PathBuf;

    use tempfile::NamedTempFile;

    use super::*;
    use crate::errors::DevloopError;
    use crate::types::OutputTarget;

    fn write_config(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{contents}").unwrap();
        file
    }

    #[test]
    fn empty_file_yields_defaults() {
        let file = write_config("");
        let cfg = load_and_validate(file.path()).unwrap();

        assert_eq!(cfg.build.source_dir, PathBuf::from("."));
        assert_eq!(cfg.build.binary, None);
        assert_eq!(cfg.build.toolchain, "go");
        assert_eq!(cfg.run.output, OutputTarget::Stdout);
        assert_eq!(cfg.run.poll_interval_ms, 1000);
        assert!(!cfg.debug.enabled);
        assert!(cfg.debug_settings().is_none());
    }

    #[test]
    fn full_file_is_parsed() {
        let file = write_config(
            r#"
[build]
source_dir = "cmd/server"
binary = "server"
work_dir = "tmp"
toolchain = "tinygo"
args = ["-tags", "dev"]

[run]
output = "discard"
poll_interval_ms = 250

[debug]
enabled = true
port = 40000
program = "/usr/local/bin/dlv"
"#,
        );
        let cfg = load_and_validate(file.path()).unwrap();

        let spec = cfg.build_spec();
        assert_eq!(spec.source_dir(), Path::new("cmd/server"));
        assert!(spec.binary().starts_with("server"));
        assert_eq!(spec.toolchain(), "tinygo");
        assert_eq!(&spec.args()[..2], ["-tags", "dev"]);
        assert_eq!(cfg.run.output, OutputTarget::Discard);
        assert_eq!(cfg.run.poll_interval_ms, 250);

        let debug = cfg.debug_settings().unwrap();
        assert_eq!(debug.port, 40000);
        assert_eq!(debug.program, "/usr/local/bin/dlv");
    }

    #[test]
    fn binary_with_path_separator_is_rejected() {
        let file = write_config("[build]\nbinary = \"out/app\"\n");
        match load_and_validate(file.path()) {
            Err(DevloopError::ConfigError(msg)) => assert!(msg.contains("[build].binary")),
            other => panic!("expected ConfigError, got {other:?}"),
        }
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let file = write_config("[run]\npoll_interval_ms = 0\n");
        assert!(matches!(
            load_and_validate(file.path()),
            Err(DevloopError::ConfigError(_))
        ));
    }

    #[test]
    fn zero_port_only_matters_when_debugging() {
        let disabled = write_config("[debug]\nport = 0\n");
        assert!(load_and_validate(disabled.path()).is_ok());

        let enabled = write_config("[debug]\nenabled = true\nport = 0\n");
        assert!(matches!(
            load_and_validate(enabled.path()),
            Err(DevloopError::ConfigError(_))
        ));
    }

    #[test]
    fn unknown_keys_are_toml_errors() {
        let file = write_config("[run]\nrestart = true\n");
        assert!(matches!(
            load_and_validate(file.path()),
            Err(DevloopError::TomlError(_))
        ));
    }

    #[test]
    fn missing_default_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_or_default(dir.path().join(DEFAULT_CONFIG_FILE)).unwrap();
        assert_eq!(cfg.run.poll_interval_ms, 1000);
    }

    #[test]
    fn missing_explicit_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_and_validate(dir.path().join("nope.toml")),
            Err(DevloopError::IoError(_))
        ));
    }
}
