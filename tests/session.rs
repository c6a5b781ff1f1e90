// tests/session.rs
#![cfg(unix)]

mod common;
use crate::common::{
    FakeDebugger, FakeToolchain, ScriptDir, TestResult, init_tracing, scripts, with_timeout,
};

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use devloop::build::{BuildSpec, Builder};
use devloop::engine::{RuntimeEvent, Session, SessionOptions, run_session};
use devloop::exec::MemorySink;
use devloop::runner::{DebugServerSettings, Runner};

fn session_for(dir: &ScriptDir, toolchain: &FakeToolchain, options: SessionOptions) -> (Session, MemorySink) {
    let program = toolchain.install(dir);
    let spec = BuildSpec::new(dir.path(), Some("app"), dir.path(), vec![])
        .with_toolchain(program.to_string_lossy());

    let sink = MemorySink::new();
    let mut runner = Runner::for_build(&spec);
    runner.set_writer(Arc::new(sink.clone()));
    if options.debug {
        let debugger = FakeDebugger::install(dir);
        runner = runner.with_debug_server(
            DebugServerSettings::new(2345).with_program(debugger.to_string_lossy()),
        );
    }

    (Session::new(Builder::new(spec), runner, options), sink)
}

#[tokio::test]
async fn rebuild_builds_and_starts_the_program() -> TestResult {
    init_tracing();
    let dir = ScriptDir::new();
    let (mut session, sink) = session_for(&dir, &FakeToolchain::new(), SessionOptions::default());

    session.rebuild().await?;

    assert!(session.last_build_ok());
    let app = session.runner().app().expect("program should be running");
    with_timeout(app.wait()).await;
    assert_eq!(sink.contents(), "Hello world\n");
    Ok(())
}

#[tokio::test]
async fn failed_build_does_not_run_anything() -> TestResult {
    init_tracing();
    let dir = ScriptDir::new();
    let toolchain = FakeToolchain::new().prints("undefined: foo\n").exits_with(1);
    let (mut session, _sink) = session_for(&dir, &toolchain, SessionOptions::default());

    session.rebuild().await?;
    session.handle_event(RuntimeEvent::Poll).await?;

    assert!(!session.last_build_ok());
    assert_eq!(session.builder().errors(), "undefined: foo\n");
    assert!(session.runner().app().is_none());
    Ok(())
}

#[tokio::test]
async fn rebuild_replaces_the_running_program() -> TestResult {
    init_tracing();
    let dir = ScriptDir::new();
    let toolchain = FakeToolchain::new().binary_body(scripts::LONG_RUNNING);
    let (mut session, _sink) = session_for(&dir, &toolchain, SessionOptions::default());

    session.rebuild().await?;
    let first = session.runner().app().expect("first run");

    session.handle_event(RuntimeEvent::RebuildRequested).await?;
    let second = session.runner().app().expect("second run");

    assert_ne!(first, second);
    assert!(first.has_exited());

    assert!(!session.handle_event(RuntimeEvent::ShutdownRequested).await?);
    assert!(second.has_exited());
    Ok(())
}

#[tokio::test]
async fn debug_option_attaches_debugger_after_start() -> TestResult {
    init_tracing();
    let dir = ScriptDir::new();
    let toolchain = FakeToolchain::new().binary_body(scripts::LONG_RUNNING);
    let options = SessionOptions {
        debug: true,
        ..SessionOptions::default()
    };
    let (mut session, _sink) = session_for(&dir, &toolchain, options);

    session.rebuild().await?;

    let server = session.runner().debug_server().expect("debugger attached");
    session.shutdown().await?;
    assert!(server.has_exited());
    assert!(session.runner().debug_server().is_none());
    Ok(())
}

#[tokio::test]
async fn run_session_stops_on_shutdown_event() -> TestResult {
    init_tracing();
    let dir = ScriptDir::new();
    let toolchain = FakeToolchain::new().binary_body(scripts::LONG_RUNNING);
    let (mut session, _sink) = session_for(&dir, &toolchain, SessionOptions::default());

    session.rebuild().await?;
    let app = session.runner().app().expect("running");

    let (tx, rx) = mpsc::channel(4);
    tx.send(RuntimeEvent::Poll).await?;
    tx.send(RuntimeEvent::ShutdownRequested).await?;

    with_timeout(run_session(session, rx)).await?;

    tokio::time::timeout(Duration::from_secs(1), app.wait()).await?;
    assert!(app.has_exited());
    Ok(())
}
