//! Error types for run-terminating failures
//!
//! Per-trial problems (spawn failures, timeouts, non-zero exits, accounting
//! gaps) are not errors; they are recorded as a [`crate::models::TrialOutcome`].
//! Only failures at the I/O boundary end up here.

use std::io;
use std::path::PathBuf;

use crate::config::ConfigError;

/// Application-wide error type
#[derive(Debug, thiserror::Error)]
pub enum BenchError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Cannot open log file {}: {source}", .path.display())]
    LogSink {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type alias for run-level operations
pub type BenchResult<T> = Result<T, BenchError>;
