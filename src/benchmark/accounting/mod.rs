//! Resource accounting for terminated child processes
//!
//! Exactly one backend is compiled in per target family:
//!
//! - **unix**: the child is reaped with `wait4(2)`, which hands back the
//!   kernel's `rusage` record for that child.
//! - **windows**: the exited process is opened by pid with query-only access
//!   and its peak working set and CPU times are read through the handle.
//!
//! Reaping and deadline kills are serialized through a [`ReapLatch`] so a
//! kill never reaches a pid the kernel has already released.
//!
//! Accounting is best effort. Any failure degrades to a zeroed
//! [`ResourceUsage`] instead of failing the trial.

use std::io;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

#[cfg(unix)]
mod unix;
#[cfg(windows)]
mod windows;

#[cfg(unix)]
pub use unix::{PlatformAccountant, TerminatedProcess, terminate, wait_for_exit};
#[cfg(windows)]
pub use windows::{PlatformAccountant, TerminatedProcess, terminate, wait_for_exit};

/// CPU and memory consumed by one child process
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceUsage {
    /// User + kernel CPU time
    pub cpu_time: Duration,
    /// Peak resident set (unix) or peak working set (windows), in KB
    pub peak_memory_kb: u64,
}

/// Extracts resource usage from a process that has already been reaped
pub trait ResourceAccountant: Send + Sync {
    fn measure(&self, process: &TerminatedProcess) -> ResourceUsage;
}

/// Orders the final reap of a child against a deadline kill
#[derive(Debug, Default)]
pub struct ReapLatch {
    reaped: Mutex<bool>,
}

impl ReapLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `reap` and mark the child as reaped.
    ///
    /// No kill can run while `reap` is in progress.
    pub fn reap<T>(&self, reap: impl FnOnce() -> T) -> T {
        let mut reaped = self.lock();
        let out = reap();
        *reaped = true;
        out
    }

    /// Run `kill` unless the child has already been reaped.
    ///
    /// Returns whether `kill` ran.
    pub fn kill_unless_reaped(&self, kill: impl FnOnce() -> io::Result<()>) -> io::Result<bool> {
        let reaped = self.lock();
        if *reaped {
            return Ok(false);
        }
        kill()?;
        Ok(true)
    }

    pub fn is_reaped(&self) -> bool {
        *self.lock()
    }

    fn lock(&self) -> MutexGuard<'_, bool> {
        self.reaped.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
