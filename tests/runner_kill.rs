// tests/runner_kill.rs
#![cfg(unix)]

mod common;
use crate::common::{ScriptDir, TestResult, capturing_runner, init_tracing, scripts, with_timeout};

use std::time::{Duration, Instant};

use devloop::runner::{GRACEFUL_STOP_TIMEOUT, Runner};

#[tokio::test]
async fn kill_without_process_is_a_no_op() -> TestResult {
    init_tracing();
    let mut runner = Runner::new("/nonexistent", "app");

    runner.kill().await?;
    runner.kill().await?;

    assert!(runner.app().is_none());
    Ok(())
}

#[tokio::test]
async fn cooperative_process_stops_before_timeout() -> TestResult {
    init_tracing();
    let dir = ScriptDir::new();
    dir.write_script("app", scripts::LONG_RUNNING);
    let (mut runner, _sink) = capturing_runner(&dir, "app");

    let handle = runner.run().await?;
    let started = Instant::now();
    runner.kill().await?;
    let elapsed = started.elapsed();

    assert!(elapsed < GRACEFUL_STOP_TIMEOUT, "graceful stop took {elapsed:?}");
    assert!(handle.has_exited());
    assert_eq!(handle.exit().and_then(|e| e.code()), Some(0));
    assert!(runner.app().is_none());
    Ok(())
}

#[tokio::test]
async fn stubborn_process_is_force_killed_after_timeout() -> TestResult {
    init_tracing();
    let dir = ScriptDir::new();
    dir.write_script("app", scripts::IGNORES_INTERRUPT);
    let (mut runner, _sink) = capturing_runner(&dir, "app");

    let handle = runner.run().await?;
    let started = Instant::now();
    with_timeout(runner.kill()).await?;
    let elapsed = started.elapsed();

    assert!(elapsed >= GRACEFUL_STOP_TIMEOUT, "kill returned early after {elapsed:?}");
    assert!(
        elapsed < GRACEFUL_STOP_TIMEOUT + Duration::from_secs(2),
        "kill took too long: {elapsed:?}"
    );

    with_timeout(handle.wait()).await;
    assert!(handle.has_exited());
    assert!(runner.app().is_none());
    Ok(())
}

#[tokio::test]
async fn kill_after_process_exited_just_clears_the_handle() -> TestResult {
    init_tracing();
    let dir = ScriptDir::new();
    dir.write_script("app", scripts::FAILS_FAST);
    let (mut runner, sink) = capturing_runner(&dir, "app");

    let handle = runner.run().await?;
    let exit = with_timeout(handle.wait()).await;
    assert_eq!(exit.code(), Some(3));
    assert_eq!(sink.contents(), "boom\n");

    let started = Instant::now();
    runner.kill().await?;
    assert!(started.elapsed() < Duration::from_millis(500));
    assert!(runner.app().is_none());
    Ok(())
}

#[tokio::test]
async fn dropping_the_runner_stops_its_process() -> TestResult {
    init_tracing();
    let dir = ScriptDir::new();
    dir.write_script("app", scripts::IGNORES_INTERRUPT);
    let (mut runner, _sink) = capturing_runner(&dir, "app");

    let handle = runner.run().await?;
    drop(runner);

    with_timeout(handle.wait()).await;
    assert!(handle.has_exited());
    Ok(())
}
