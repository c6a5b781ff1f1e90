// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{DevloopError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::DevloopError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.build, raw.run, raw.debug))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_build_section(cfg)?;
    validate_run_section(cfg)?;
    validate_debug_section(cfg)?;
    Ok(())
}

fn validate_build_section(cfg: &RawConfigFile) -> Result<()> {
    if let Some(binary) = &cfg.build.binary {
        if binary.contains('/') || binary.contains('\\') {
            return Err(DevloopError::ConfigError(format!(
                "[build].binary must be a file name, not a path (got '{binary}'); use [build].work_dir for the directory"
            )));
        }
    }

    if cfg.build.toolchain.trim().is_empty() {
        return Err(DevloopError::ConfigError(
            "[build].toolchain must not be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_run_section(cfg: &RawConfigFile) -> Result<()> {
    if cfg.run.poll_interval_ms == 0 {
        return Err(DevloopError::ConfigError(
            "[run].poll_interval_ms must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_debug_section(cfg: &RawConfigFile) -> Result<()> {
    if !cfg.debug.enabled {
        return Ok(());
    }

    if cfg.debug.port == 0 {
        return Err(DevloopError::ConfigError(
            "[debug].port must be set to a non-zero port when debugging is enabled".to_string(),
        ));
    }

    if cfg.debug.program.trim().is_empty() {
        return Err(DevloopError::ConfigError(
            "[debug].program must not be empty".to_string(),
        ));
    }

    Ok(())
}
