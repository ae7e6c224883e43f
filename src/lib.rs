//! interp-bench - Interpreter Benchmarking Harness
//!
//! Runs interpreter binaries as black-box child processes, over and over,
//! and reports their average wall time, average CPU time and peak memory.
//!
//! # Architecture
//!
//! - **Benchmark**: the execution engine (accounting, executor, runner, report)
//! - **Models**: cases, trial samples and per-case aggregates
//! - **Config**: compiled-in defaults with environment overrides

pub mod benchmark;
pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use error::{BenchError, BenchResult};
