//! Process executor for a single benchmark trial

use std::io::{self, Write};
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::task::{self, JoinError};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::models::{BenchmarkCase, TrialOutcome, TrialSample};

use super::accounting::{self, PlatformAccountant, ReapLatch, ResourceAccountant, TerminatedProcess};
use super::runner::TrialRunner;

/// Runs one child process per trial and measures it
pub struct Executor<A = PlatformAccountant> {
    accountant: Arc<A>,
}

impl Executor<PlatformAccountant> {
    /// Create an executor using the platform accountant
    pub fn new() -> Self {
        Self::with_accountant(PlatformAccountant)
    }
}

impl Default for Executor<PlatformAccountant> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: ResourceAccountant + 'static> Executor<A> {
    pub fn with_accountant(accountant: A) -> Self {
        Self {
            accountant: Arc::new(accountant),
        }
    }

    /// Run `case` once, killing the child if it is still alive after `deadline`.
    ///
    /// Never fails: spawn errors, non-zero exits and timeouts all come back as
    /// a failed [`TrialSample`]. The child has been reaped by the time this returns.
    pub async fn run_trial(&self, case: &BenchmarkCase, deadline: Duration) -> TrialSample {
        let start = Instant::now();
        let child = match command_for(case).spawn() {
            Ok(child) => child,
            Err(e) => {
                debug!(
                    executable = %case.executable_path.display(),
                    error = %e,
                    "Failed to spawn benchmark process"
                );
                return TrialSample::failed(
                    start.elapsed(),
                    TrialOutcome::SpawnFailed {
                        reason: e.to_string(),
                    },
                );
            }
        };

        let pid = child.id();
        let payload = case.stdin_payload.clone();
        let latch = Arc::new(ReapLatch::new());
        let reaper_latch = Arc::clone(&latch);
        let mut reaper = task::spawn_blocking(move || feed_and_wait(child, payload, &reaper_latch));

        let (joined, timed_out) = match timeout(deadline, &mut reaper).await {
            Ok(joined) => (joined, false),
            Err(_) => {
                let killed = match latch.kill_unless_reaped(|| accounting::terminate(pid)) {
                    Ok(killed) => killed,
                    Err(e) => {
                        warn!(pid, error = %e, "Failed to kill timed out process");
                        true
                    }
                };
                if killed {
                    debug!(pid, ?deadline, "Deadline exceeded, killed process");
                } else {
                    debug!(pid, ?deadline, "Process was reaped at the deadline, keeping its result");
                }
                // Still reap it, so no zombie or handle outlives the trial.
                (reaper.await, killed)
            }
        };

        let (process, ended) = match flatten(joined) {
            Ok(reaped) => reaped,
            Err(e) => {
                warn!(pid, error = %e, "Failed to wait for benchmark process");
                return TrialSample::failed(
                    start.elapsed(),
                    TrialOutcome::SpawnFailed {
                        reason: e.to_string(),
                    },
                );
            }
        };
        let elapsed = ended.saturating_duration_since(start);

        if timed_out {
            return TrialSample::failed(elapsed, TrialOutcome::TimedOut);
        }

        let status = process.status();
        if !status.success() {
            debug!(pid, ?status, "Benchmark process failed");
            return TrialSample::failed(
                elapsed,
                TrialOutcome::NonZeroExit {
                    code: status.code(),
                },
            );
        }

        let usage = self.accountant.measure(&process);
        TrialSample::succeeded(elapsed, usage.cpu_time, usage.peak_memory_kb)
    }
}

#[async_trait]
impl<A: ResourceAccountant + 'static> TrialRunner for Executor<A> {
    async fn run_trial(&self, case: &BenchmarkCase, deadline: Duration) -> TrialSample {
        Executor::run_trial(self, case, deadline).await
    }
}

/// `<executable> <argument>` with stdin fed only when the case has a payload
fn command_for(case: &BenchmarkCase) -> Command {
    let mut command = Command::new(&case.executable_path);
    command
        .arg(&case.argument)
        .stdin(if case.stdin_payload.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    command
}

/// Write the stdin payload (if any), close stdin, then reap the child.
///
/// Runs on the blocking pool. The returned instant is taken as soon as the
/// wait returns.
fn feed_and_wait(
    mut child: Child,
    payload: Option<Vec<u8>>,
    latch: &ReapLatch,
) -> io::Result<(TerminatedProcess, Instant)> {
    if let (Some(mut stdin), Some(payload)) = (child.stdin.take(), payload) {
        // The child may exit without draining stdin.
        if let Err(e) = stdin.write_all(&payload) {
            tracing::trace!(pid = child.id(), error = %e, "Stdin payload not fully delivered");
        }
    }

    let process = accounting::wait_for_exit(child, latch)?;
    Ok((process, Instant::now()))
}

fn flatten<T>(joined: Result<io::Result<T>, JoinError>) -> io::Result<T> {
    joined.map_err(io::Error::other)?
}
