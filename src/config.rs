//! Application configuration management
//!
//! Every value has a compiled-in default from [`crate::constants`]; environment
//! variables (optionally from a `.env` file) override them.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::constants::{
    DEFAULT_ITERATIONS, DEFAULT_LOG_FILE, DEFAULT_PIET_EXAMPLES_DIR, DEFAULT_PIET_INTERP,
    DEFAULT_RUST_LOG, DEFAULT_TIMEOUT_SECONDS, DEFAULT_WHITESPACE_EXAMPLES_DIR,
    DEFAULT_WHITESPACE_INTERP,
};

/// Variable lookup, `std::env::var` in production
type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub benchmark: BenchmarkConfig,
    pub interpreters: InterpreterConfig,
    pub logging: LoggingConfig,
}

/// Trial execution configuration
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// Trials per case
    pub iterations: u32,
    /// Deadline for a single trial
    pub timeout: Duration,
    /// File the report is appended to
    pub log_file: PathBuf,
}

/// Locations of the interpreters under test and their example programs
#[derive(Debug, Clone)]
pub struct InterpreterConfig {
    pub piet_path: PathBuf,
    pub whitespace_path: PathBuf,
    pub piet_examples_dir: PathBuf,
    pub whitespace_examples_dir: PathBuf,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub rust_log: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(&|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source
    pub fn from_lookup(vars: Lookup<'_>) -> Result<Self, ConfigError> {
        Ok(Self {
            benchmark: BenchmarkConfig::from_lookup(vars)?,
            interpreters: InterpreterConfig::from_lookup(vars),
            logging: LoggingConfig::from_lookup(vars),
        })
    }
}

impl BenchmarkConfig {
    fn from_lookup(vars: Lookup<'_>) -> Result<Self, ConfigError> {
        let iterations: u32 = parse_var(vars, "BENCH_ITERATIONS", DEFAULT_ITERATIONS)?;
        if iterations == 0 {
            return Err(ConfigError::InvalidValue("BENCH_ITERATIONS".to_string()));
        }

        let timeout_seconds: u64 = parse_var(vars, "BENCH_TIMEOUT_SECONDS", DEFAULT_TIMEOUT_SECONDS)?;
        if timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue("BENCH_TIMEOUT_SECONDS".to_string()));
        }

        Ok(Self {
            iterations,
            timeout: Duration::from_secs(timeout_seconds),
            log_file: PathBuf::from(vars("BENCH_LOG_FILE").unwrap_or_else(|| DEFAULT_LOG_FILE.to_string())),
        })
    }
}

impl InterpreterConfig {
    fn from_lookup(vars: Lookup<'_>) -> Self {
        let binary = |key: &str, default: &str| {
            PathBuf::from(
                vars(key).unwrap_or_else(|| format!("{}{}", default, env::consts::EXE_SUFFIX)),
            )
        };
        let dir = |key: &str, default: &str| {
            PathBuf::from(vars(key).unwrap_or_else(|| default.to_string()))
        };

        Self {
            piet_path: binary("PIET_INTERP", DEFAULT_PIET_INTERP),
            whitespace_path: binary("WHITESPACE_INTERP", DEFAULT_WHITESPACE_INTERP),
            piet_examples_dir: dir("PIET_EXAMPLES_DIR", DEFAULT_PIET_EXAMPLES_DIR),
            whitespace_examples_dir: dir("WHITESPACE_EXAMPLES_DIR", DEFAULT_WHITESPACE_EXAMPLES_DIR),
        }
    }
}

impl LoggingConfig {
    fn from_lookup(vars: Lookup<'_>) -> Self {
        Self {
            rust_log: vars("RUST_LOG").unwrap_or_else(|| DEFAULT_RUST_LOG.to_string()),
        }
    }
}

fn parse_var<T: FromStr>(vars: Lookup<'_>, key: &str, default: T) -> Result<T, ConfigError> {
    match vars(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}
