//! Running totals for the trials of one case

use std::time::Duration;

use crate::models::{CaseAggregate, TrialSample};

/// Folds trial samples into a [`CaseAggregate`].
///
/// Only successful samples contribute to the totals; failed ones are counted
/// implicitly through `iterations - success_count`.
#[derive(Debug, Clone)]
pub struct CaseAccumulator {
    case_label: String,
    iterations: u32,
    total_duration: Duration,
    total_cpu_time: Duration,
    max_memory_kb: u64,
    success_count: u32,
}

impl CaseAccumulator {
    /// Create an empty accumulator for a case configured with `iterations` trials
    pub fn new(case_label: impl Into<String>, iterations: u32) -> Self {
        Self {
            case_label: case_label.into(),
            iterations,
            total_duration: Duration::ZERO,
            total_cpu_time: Duration::ZERO,
            max_memory_kb: 0,
            success_count: 0,
        }
    }

    /// Add one sample
    pub fn accumulate(&mut self, sample: &TrialSample) {
        if !sample.is_success() {
            return;
        }

        self.total_duration += sample.wall_duration;
        self.total_cpu_time += sample.cpu_time;
        self.max_memory_kb = self.max_memory_kb.max(sample.peak_memory_kb);
        self.success_count += 1;
    }

    pub fn success_count(&self) -> u32 {
        self.success_count
    }

    /// Largest peak memory seen so far among successful samples
    pub fn max_memory_kb(&self) -> u64 {
        self.max_memory_kb
    }

    /// Compute averages; `None` when no trial succeeded
    pub fn finalize(self) -> Option<CaseAggregate> {
        if self.success_count == 0 {
            return None;
        }

        Some(CaseAggregate {
            case_label: self.case_label,
            avg_duration: self.total_duration / self.success_count,
            avg_cpu_time: self.total_cpu_time / self.success_count,
            max_memory_kb: self.max_memory_kb,
            success_count: self.success_count,
            total_count: self.iterations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TrialOutcome;

    fn ok(ms: u64, cpu_ms: u64, kb: u64) -> TrialSample {
        TrialSample::succeeded(Duration::from_millis(ms), Duration::from_millis(cpu_ms), kb)
    }

    #[test]
    fn test_partial_failures_excluded_from_averages() {
        let mut acc = CaseAccumulator::new("Piet (fib.png)", 4);
        acc.accumulate(&ok(10, 5, 100));
        acc.accumulate(&TrialSample::failed(
            Duration::from_secs(10),
            TrialOutcome::TimedOut,
        ));
        acc.accumulate(&ok(20, 10, 100));
        acc.accumulate(&ok(30, 15, 100));

        let aggregate = acc.finalize().unwrap();
        assert_eq!(aggregate.avg_duration, Duration::from_millis(20));
        assert_eq!(aggregate.avg_cpu_time, Duration::from_millis(10));
        assert_eq!(aggregate.success_count, 3);
        assert_eq!(aggregate.total_count, 4);
        assert_eq!(aggregate.case_label, "Piet (fib.png)");
    }

    #[test]
    fn test_no_successes_yields_nothing() {
        let mut acc = CaseAccumulator::new("Whitespace (h.ws)", 2);
        acc.accumulate(&TrialSample::failed(Duration::from_secs(10), TrialOutcome::TimedOut));
        acc.accumulate(&TrialSample::failed(
            Duration::from_millis(1),
            TrialOutcome::SpawnFailed {
                reason: "No such file or directory".to_string(),
            },
        ));

        assert_eq!(acc.success_count(), 0);
        assert!(acc.finalize().is_none());
    }

    #[test]
    fn test_zero_iterations_yields_nothing() {
        assert!(CaseAccumulator::new("empty", 0).finalize().is_none());
    }

    #[test]
    fn test_max_memory_is_running_maximum() {
        let mut acc = CaseAccumulator::new("mem", 3);
        let mut seen = Vec::new();
        for kb in [512, 2048, 1024] {
            acc.accumulate(&ok(1, 1, kb));
            seen.push(acc.max_memory_kb());
        }

        assert_eq!(seen, vec![512, 2048, 2048]);
        assert_eq!(acc.finalize().unwrap().max_memory_kb, 2048);
    }

    #[test]
    fn test_failed_sample_memory_ignored() {
        let mut acc = CaseAccumulator::new("mem", 2);
        acc.accumulate(&ok(1, 1, 300));
        acc.accumulate(&TrialSample {
            wall_duration: Duration::from_millis(1),
            cpu_time: Duration::from_millis(1),
            peak_memory_kb: 9_999,
            outcome: TrialOutcome::NonZeroExit { code: Some(1) },
        });

        let aggregate = acc.finalize().unwrap();
        assert_eq!(aggregate.max_memory_kb, 300);
        assert_eq!(aggregate.avg_duration, Duration::from_millis(1));
    }
}
