//! Benchmark execution engine
//!
//! Layers, leaves first:
//!
//! 1. **Accounting** (`accounting`): CPU time and peak memory of a reaped child.
//! 2. **Executor** (`executor.rs`): one deadline-bounded child process per trial.
//! 3. **Runner** (`runner.rs` + `metrics.rs`): N sequential trials per case,
//!    folded into a [`CaseAggregate`].
//! 4. **Report** (`report.rs`): summary table fanned out to console and log file.

pub mod accounting;
pub mod cases;
pub mod executor;
pub mod metrics;
pub mod report;
pub mod runner;

use std::io::{self, Write};

pub use executor::Executor;
pub use metrics::CaseAccumulator;
pub use report::FanOut;
pub use runner::{BenchmarkRunner, TrialRunner};

use crate::config::Config;
use crate::error::BenchResult;
use crate::models::{BenchmarkCase, CaseAggregate};
use crate::utils::{format_clock, now_local};

/// Run the configured case table with real child processes.
///
/// The report goes to stdout and is appended to the configured log file.
/// Failing to open or write the log file aborts the run.
pub async fn run(config: &Config) -> BenchResult<Vec<CaseAggregate>> {
    let log = report::open_log_sink(&config.benchmark.log_file)?;
    let mut sinks = FanOut::new().with(io::stdout()).with(log);

    let cases = cases::default_cases(&config.interpreters);
    let runner = BenchmarkRunner::new(Executor::new(), &config.benchmark);

    run_suite(&runner, &cases, &mut sinks, &mut io::stdout()).await
}

/// Run `cases`, framing the summary with start and end timestamps.
///
/// Per-case progress goes to `console` only; timestamps and the summary go
/// to every sink.
pub async fn run_suite<R, W>(
    runner: &BenchmarkRunner<R>,
    cases: &[BenchmarkCase],
    sinks: &mut FanOut,
    console: &mut W,
) -> BenchResult<Vec<CaseAggregate>>
where
    R: TrialRunner,
    W: Write,
{
    report::emit(
        &format!("Benchmark start: {}\n", format_clock(&now_local())),
        sinks,
    )?;

    let aggregates = runner.run_all(cases, console).await?;

    report::emit(&report::render(&aggregates), sinks)?;
    report::emit(
        &format!("\nBenchmark end: {}\n", format_clock(&now_local())),
        sinks,
    )?;

    Ok(aggregates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BenchmarkConfig;
    use crate::models::{TrialOutcome, TrialSample};
    use super::runner::MockTrialRunner;
    use std::path::PathBuf;
    use std::time::Duration;

    fn benchmark_config(log_file: PathBuf) -> BenchmarkConfig {
        BenchmarkConfig {
            iterations: 2,
            timeout: Duration::from_secs(1),
            log_file,
        }
    }

    #[tokio::test]
    async fn test_suite_appends_report_to_log() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("benchmark.log");

        let mut mock = MockTrialRunner::new();
        mock.expect_run_trial().returning(|case, _| {
            if case.name == "Piet" {
                TrialSample::succeeded(Duration::from_millis(20), Duration::from_millis(10), 2048)
            } else {
                TrialSample::failed(Duration::from_secs(1), TrialOutcome::TimedOut)
            }
        });

        let cases = vec![
            BenchmarkCase::new("Piet", "./piet", "fib.png"),
            BenchmarkCase::new("Whitespace", "./ws", "h.ws"),
        ];
        let runner = BenchmarkRunner::new(mock, &benchmark_config(log_path.clone()));
        let mut sinks = FanOut::new().with(report::open_log_sink(&log_path).unwrap());
        let mut console = Vec::new();

        let aggregates = run_suite(&runner, &cases, &mut sinks, &mut console)
            .await
            .unwrap();
        drop(sinks);

        assert_eq!(aggregates.len(), 1);

        let log = std::fs::read_to_string(&log_path).unwrap();
        assert!(log.starts_with("Benchmark start: "));
        assert!(log.contains(&report::render(&aggregates)));
        assert!(log.contains("\nBenchmark end: "));
        assert!(!log.contains("Whitespace"));

        // Progress lines stay on the console.
        let console = String::from_utf8(console).unwrap();
        assert!(console.contains("Piet test (fib.png):"));
        assert!(!log.contains("Piet test (fib.png):"));
    }

    #[tokio::test]
    async fn test_run_fails_when_log_cannot_open() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::from_lookup(&|_| None).unwrap();
        config.benchmark = benchmark_config(dir.path().join("no-such-dir").join("benchmark.log"));

        let err = run(&config).await.unwrap_err();
        assert!(matches!(err, crate::error::BenchError::LogSink { .. }));
    }
}
