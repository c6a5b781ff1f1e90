pub mod builders;

use std::sync::{Arc, Once};
use tracing_subscriber::{fmt, EnvFilter};

use devloop::exec::MemorySink;
use devloop::runner::Runner;

pub use builders::{FakeDebugger, FakeToolchain, ScriptDir, scripts};

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer() // print only for failing tests unless --nocapture
            .with_target(true)
            .init();
    });
}

/// Run a future with a 10-second timeout.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(std::time::Duration::from_secs(10), f)
        .await
        .expect("Test timed out after 10 seconds")
}

/// Runner for `<dir>/<binary>` whose output is captured in the returned sink.
pub fn capturing_runner(dir: &ScriptDir, binary: &str) -> (Runner, MemorySink) {
    let sink = MemorySink::new();
    let mut runner = Runner::new(dir.path(), binary);
    runner.set_writer(Arc::new(sink.clone()));
    (runner, sink)
}
