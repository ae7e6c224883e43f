//! Benchmark models
//!
//! A [`BenchmarkCase`] names one interpreter + program combination, each run of
//! it produces a [`TrialSample`], and the samples of one case fold into a
//! [`CaseAggregate`].

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// One binary + argument combination to be measured
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchmarkCase {
    /// Interpreter name (e.g. "Piet")
    pub name: String,
    /// Path to the interpreter binary
    pub executable_path: PathBuf,
    /// Single argument passed to the binary (the program to interpret)
    pub argument: String,
    /// Bytes written to the child's stdin, if any
    pub stdin_payload: Option<Vec<u8>>,
}

impl BenchmarkCase {
    pub fn new(
        name: impl Into<String>,
        executable_path: impl Into<PathBuf>,
        argument: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            executable_path: executable_path.into(),
            argument: argument.into(),
            stdin_payload: None,
        }
    }

    /// Attach a stdin payload
    pub fn with_stdin(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.stdin_payload = Some(payload.into());
        self
    }

    /// Label used in the report, `"<name> (<argument>)"`
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.argument)
    }
}

/// How a single trial ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrialOutcome {
    /// Process exited with a success status
    Succeeded,
    /// Process exited with a failure status, or was killed by a signal (`code` is `None`)
    NonZeroExit { code: Option<i32> },
    /// Process outlived its deadline and was killed
    TimedOut,
    /// Process could not be started or waited on
    SpawnFailed { reason: String },
}

impl fmt::Display for TrialOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrialOutcome::Succeeded => write!(f, "succeeded"),
            TrialOutcome::NonZeroExit { code: Some(code) } => write!(f, "exited with code {}", code),
            TrialOutcome::NonZeroExit { code: None } => write!(f, "terminated by signal"),
            TrialOutcome::TimedOut => write!(f, "timed out"),
            TrialOutcome::SpawnFailed { reason } => write!(f, "failed to run: {}", reason),
        }
    }
}

/// Measurements for one execution of one case
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialSample {
    /// Spawn-to-termination wall clock time
    pub wall_duration: Duration,
    /// User + system CPU time (zero unless the trial succeeded)
    pub cpu_time: Duration,
    /// Peak resident set / working set in KB (zero unless the trial succeeded)
    pub peak_memory_kb: u64,
    pub outcome: TrialOutcome,
}

impl TrialSample {
    /// A successful trial with its resource usage
    pub fn succeeded(wall_duration: Duration, cpu_time: Duration, peak_memory_kb: u64) -> Self {
        Self {
            wall_duration,
            cpu_time,
            peak_memory_kb,
            outcome: TrialOutcome::Succeeded,
        }
    }

    /// A failed trial; resource fields are zeroed
    pub fn failed(wall_duration: Duration, outcome: TrialOutcome) -> Self {
        Self {
            wall_duration,
            cpu_time: Duration::ZERO,
            peak_memory_kb: 0,
            outcome,
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == TrialOutcome::Succeeded
    }
}

/// Summary statistics over all trials of one case
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseAggregate {
    pub case_label: String,
    /// Mean wall duration of the successful trials
    pub avg_duration: Duration,
    /// Mean CPU time of the successful trials
    pub avg_cpu_time: Duration,
    /// Maximum peak memory over the successful trials, in KB
    pub max_memory_kb: u64,
    pub success_count: u32,
    /// Configured iteration count, regardless of outcomes
    pub total_count: u32,
}
