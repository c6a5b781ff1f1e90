#![allow(dead_code)]

pub use devloop_test_utils::{
    FakeDebugger, FakeToolchain, ScriptDir, capturing_runner, init_tracing, scripts, with_timeout,
};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;
