//! Benchmark runner - drives trials case by case
//!
//! Trials never overlap: one child process is in flight at a time so that the
//! CPU and memory figures of one trial are not disturbed by another.

use std::io::{self, Write};
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::BenchmarkConfig;
use crate::models::{BenchmarkCase, CaseAggregate, TrialSample};
use crate::utils::format_duration;

use super::metrics::CaseAccumulator;

/// Something that can execute a single trial of a case
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TrialRunner {
    async fn run_trial(&self, case: &BenchmarkCase, deadline: Duration) -> TrialSample;
}

/// Run `iterations` sequential trials of `case`.
///
/// Returns `None` when not a single trial succeeded.
pub async fn run_case<R>(
    runner: &R,
    case: &BenchmarkCase,
    iterations: u32,
    deadline: Duration,
) -> Option<CaseAggregate>
where
    R: TrialRunner + ?Sized,
{
    let mut accumulator = CaseAccumulator::new(case.label(), iterations);

    for iteration in 0..iterations {
        let sample = runner.run_trial(case, deadline).await;
        if !sample.is_success() {
            tracing::debug!(
                case = %case.label(),
                iteration,
                outcome = %sample.outcome,
                "Trial failed"
            );
        }
        accumulator.accumulate(&sample);
    }

    accumulator.finalize()
}

/// Runs every configured case in order and collects their aggregates
pub struct BenchmarkRunner<R> {
    runner: R,
    iterations: u32,
    timeout: Duration,
}

impl<R: TrialRunner> BenchmarkRunner<R> {
    pub fn new(runner: R, config: &BenchmarkConfig) -> Self {
        Self {
            runner,
            iterations: config.iterations,
            timeout: config.timeout,
        }
    }

    /// Run all cases, printing a progress line per case to `console`.
    ///
    /// Cases without a single successful trial are left out of the result;
    /// the others keep their input order.
    pub async fn run_all<W: Write>(
        &self,
        cases: &[BenchmarkCase],
        console: &mut W,
    ) -> io::Result<Vec<CaseAggregate>> {
        info!(
            cases = cases.len(),
            iterations = self.iterations,
            timeout = ?self.timeout,
            "Starting benchmark run"
        );

        let mut aggregates = Vec::with_capacity(cases.len());

        for case in cases {
            writeln!(console, "\n{} test ({}):", case.name, case.argument)?;
            info!(case = %case.label(), "Running case");

            match run_case(&self.runner, case, self.iterations, self.timeout).await {
                Some(aggregate) => {
                    writeln!(
                        console,
                        "Avg: {} | CPU: {} | Max RAM: {} KB (Success: {}/{})",
                        format_duration(aggregate.avg_duration),
                        format_duration(aggregate.avg_cpu_time),
                        aggregate.max_memory_kb,
                        aggregate.success_count,
                        aggregate.total_count
                    )?;
                    info!(
                        case = %aggregate.case_label,
                        success = aggregate.success_count,
                        total = aggregate.total_count,
                        "Case finished"
                    );
                    aggregates.push(aggregate);
                }
                None => {
                    writeln!(console, "No successful trials (0/{})", self.iterations)?;
                    warn!(case = %case.label(), "No successful trials, omitting case from report");
                }
            }
        }

        Ok(aggregates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TrialOutcome;
    use std::path::PathBuf;

    fn config(iterations: u32) -> BenchmarkConfig {
        BenchmarkConfig {
            iterations,
            timeout: Duration::from_secs(10),
            log_file: PathBuf::from("benchmark.log"),
        }
    }

    fn ok(ms: u64, cpu_ms: u64, kb: u64) -> TrialSample {
        TrialSample::succeeded(Duration::from_millis(ms), Duration::from_millis(cpu_ms), kb)
    }

    fn timed_out() -> TrialSample {
        TrialSample::failed(Duration::from_secs(10), TrialOutcome::TimedOut)
    }

    #[tokio::test]
    async fn test_run_case_tolerates_failures() {
        let mut samples = vec![ok(10, 5, 512), timed_out(), ok(20, 10, 2048), ok(30, 15, 1024)].into_iter();
        let mut runner = MockTrialRunner::new();
        runner
            .expect_run_trial()
            .times(4)
            .returning(move |_, _| samples.next().unwrap());

        let case = BenchmarkCase::new("Piet", "./piet", "fib.png");
        let aggregate = run_case(&runner, &case, 4, Duration::from_secs(10)).await.unwrap();

        assert_eq!(aggregate.avg_duration, Duration::from_millis(20));
        assert_eq!(aggregate.avg_cpu_time, Duration::from_millis(10));
        assert_eq!(aggregate.max_memory_kb, 2048);
        assert_eq!(aggregate.success_count, 3);
        assert_eq!(aggregate.total_count, 4);
    }

    #[tokio::test]
    async fn test_run_case_passes_deadline() {
        let mut runner = MockTrialRunner::new();
        runner
            .expect_run_trial()
            .withf(|case, deadline| case.name == "Whitespace" && *deadline == Duration::from_millis(250))
            .times(3)
            .returning(|_, _| ok(1, 1, 1));

        let case = BenchmarkCase::new("Whitespace", "./ws", "count.ws");
        let aggregate = run_case(&runner, &case, 3, Duration::from_millis(250)).await;
        assert!(aggregate.is_some());
    }

    #[tokio::test]
    async fn test_hung_case_omitted_next_case_runs() {
        let mut runner = MockTrialRunner::new();
        runner
            .expect_run_trial()
            .withf(|case, _| case.name == "hung")
            .times(2)
            .returning(|_, _| timed_out());
        runner
            .expect_run_trial()
            .withf(|case, _| case.name == "fine")
            .times(2)
            .returning(|_, _| ok(4, 2, 64));

        let cases = vec![
            BenchmarkCase::new("hung", "./hung", "a"),
            BenchmarkCase::new("fine", "./fine", "b"),
        ];
        let mut console = Vec::new();
        let aggregates = BenchmarkRunner::new(runner, &config(2))
            .run_all(&cases, &mut console)
            .await
            .unwrap();

        assert_eq!(aggregates.len(), 1);
        assert_eq!(aggregates[0].case_label, "fine (b)");
        assert_eq!(aggregates[0].success_count, 2);

        let console = String::from_utf8(console).unwrap();
        assert!(console.contains("\nhung test (a):\nNo successful trials (0/2)\n"));
        assert!(console.contains("\nfine test (b):\nAvg: 4.000ms | CPU: 2.000ms | Max RAM: 64 KB (Success: 2/2)\n"));
    }

    #[tokio::test]
    async fn test_run_all_preserves_case_order() {
        let mut runner = MockTrialRunner::new();
        runner.expect_run_trial().returning(|case, _| match case.name.as_str() {
            "broken" => TrialSample::failed(
                Duration::ZERO,
                TrialOutcome::SpawnFailed {
                    reason: "not found".to_string(),
                },
            ),
            _ => ok(1, 1, 8),
        });

        let cases = vec![
            BenchmarkCase::new("c", "./c", "1"),
            BenchmarkCase::new("broken", "./missing", "2"),
            BenchmarkCase::new("a", "./a", "3"),
            BenchmarkCase::new("b", "./b", "4"),
        ];
        let aggregates = BenchmarkRunner::new(runner, &config(1))
            .run_all(&cases, &mut io::sink())
            .await
            .unwrap();

        let labels: Vec<_> = aggregates.iter().map(|a| a.case_label.as_str()).collect();
        assert_eq!(labels, vec!["c (1)", "a (3)", "b (4)"]);
    }
}
