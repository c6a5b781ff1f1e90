// src/build/mod.rs

//! Compiling the supervised program.
//!
//! - [`spec`] holds the immutable `BuildSpec` (paths, binary name, arguments).
//! - [`builder`] runs the external toolchain and remembers the last result.

pub mod builder;
pub mod spec;

pub use builder::{BuildResult, Builder};
pub use spec::{BuildSpec, DEBUG_BUILD_FLAG, DEFAULT_BINARY, DEFAULT_TOOLCHAIN};
