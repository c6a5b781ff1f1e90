// src/lib.rs

pub mod build;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod runner;
pub mod types;

use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::build::Builder;
use crate::cli::CliArgs;
use crate::config::{ConfigFile, DEFAULT_CONFIG_FILE, load_and_validate, load_or_default};
use crate::engine::{RuntimeEvent, Session, SessionOptions, run_session, spawn_event_sources};
use crate::errors::DevloopError;
use crate::exec::sink_for;
use crate::runner::{DebugServerSettings, Runner};
use crate::types::OutputTarget;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - builder / runner / session
/// - event sources (poll ticker, stdin rebuild trigger, Ctrl-C)
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_config(&args.config)?;

    let output = args.output.unwrap_or(cfg.run.output);

    if args.dry_run {
        print_dry_run(&cfg, output, args.debug);
        return Ok(());
    }

    let spec = cfg.build_spec();
    let mut runner = Runner::for_build(&spec);
    runner.set_writer(sink_for(output));

    let debug_settings = match cfg.debug_settings() {
        Some(settings) => Some(settings),
        None if args.debug => Some(forced_debug_settings(&cfg)?),
        None => None,
    };
    let debug_enabled = debug_settings.is_some();
    if let Some(settings) = debug_settings {
        runner = runner.with_debug_server(settings);
    }

    let options = SessionOptions {
        debug: debug_enabled,
        poll_interval: Duration::from_millis(cfg.run.poll_interval_ms),
    };
    let mut session = Session::new(Builder::new(spec), runner, options);

    session.rebuild().await?;

    if args.once {
        return run_once(session).await;
    }

    let (tx, rx) = mpsc::channel::<RuntimeEvent>(16);
    let _sources = spawn_event_sources(tx, options.poll_interval);

    run_session(session, rx).await?;
    Ok(())
}

/// An explicit `--config` must exist; the implicit default may be absent.
fn load_config(path: &str) -> crate::errors::Result<ConfigFile> {
    if path == DEFAULT_CONFIG_FILE {
        load_or_default(path)
    } else {
        load_and_validate(path)
    }
}

/// `--debug` on a config with `[debug].enabled = false`: the `[debug]` section
/// was not validated, so check it here.
fn forced_debug_settings(cfg: &ConfigFile) -> crate::errors::Result<DebugServerSettings> {
    if cfg.debug.port == 0 {
        return Err(DevloopError::ConfigError(
            "--debug requires a non-zero [debug].port".to_string(),
        ));
    }
    if cfg.debug.program.trim().is_empty() {
        return Err(DevloopError::ConfigError(
            "--debug requires a non-empty [debug].program".to_string(),
        ));
    }
    Ok(DebugServerSettings::new(cfg.debug.port).with_program(&cfg.debug.program))
}

/// `--once`: wait for the program to exit on its own (or Ctrl-C), then stop.
async fn run_once(mut session: Session) -> Result<()> {
    if !session.last_build_ok() {
        return Err(DevloopError::BuildFailed(session.builder().errors().to_string()).into());
    }

    let Some(app) = session.runner().app() else {
        info!("program did not start; nothing to wait for");
        return Ok(());
    };

    tokio::select! {
        exit = app.wait() => {
            info!(exit_code = ?exit.code(), "program exited");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("interrupted");
        }
    }

    session.shutdown().await?;
    Ok(())
}

/// Print what would be built and run.
fn print_dry_run(cfg: &ConfigFile, output: OutputTarget, force_debug: bool) {
    let spec = cfg.build_spec();

    println!("devloop dry-run");
    println!("  source_dir: {}", spec.source_dir().display());
    println!("  build:      {} {}", spec.toolchain(), spec.command_args().join(" "));
    println!("  run:        {}", spec.output_path().display());
    println!("  output:     {output:?}");
    println!("  poll:       {}ms", cfg.run.poll_interval_ms);

    if cfg.debug.enabled || force_debug {
        println!(
            "  debug:      {} attach <pid> --listen=:{}",
            cfg.debug.program, cfg.debug.port
        );
    }

    debug!("dry-run complete (no execution)");
}
