//! POSIX accounting via `wait4(2)`

use std::io;
use std::mem::MaybeUninit;
use std::os::unix::process::ExitStatusExt;
use std::process::{Child, ExitStatus};
use std::time::Duration;

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;

use super::{ReapLatch, ResourceAccountant, ResourceUsage};

/// Host families that disagree on the unit of `ru_maxrss`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HostFamily {
    /// macOS / iOS report bytes
    Darwin,
    /// Linux and the BSDs report kilobytes
    Other,
}

impl HostFamily {
    pub(crate) const fn current() -> Self {
        if cfg!(target_vendor = "apple") {
            HostFamily::Darwin
        } else {
            HostFamily::Other
        }
    }
}

/// Normalize a raw `ru_maxrss` value to kilobytes
pub(crate) fn max_rss_to_kb(raw: i64, family: HostFamily) -> u64 {
    let raw = u64::try_from(raw).unwrap_or(0);
    match family {
        HostFamily::Darwin => raw / 1024,
        HostFamily::Other => raw,
    }
}

fn timeval_to_duration(tv: libc::timeval) -> Duration {
    let secs = u64::try_from(tv.tv_sec).unwrap_or(0);
    let micros = u64::try_from(tv.tv_usec).unwrap_or(0);
    Duration::from_secs(secs) + Duration::from_micros(micros)
}

/// A reaped child together with the `rusage` the kernel reported for it
pub struct TerminatedProcess {
    pid: u32,
    status: ExitStatus,
    rusage: libc::rusage,
}

impl TerminatedProcess {
    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn status(&self) -> ExitStatus {
        self.status
    }
}

/// Retry a libc call that fails with `EINTR`
fn retry_interrupted(mut call: impl FnMut() -> libc::c_int) -> io::Result<libc::c_int> {
    loop {
        let ret = call();
        if ret != -1 {
            return Ok(ret);
        }
        let err = io::Error::last_os_error();
        if err.kind() != io::ErrorKind::Interrupted {
            return Err(err);
        }
    }
}

/// Block until `child` exits and reap it.
///
/// The child must not have been waited on before. The exit is first observed
/// with `WNOWAIT`, which leaves a zombie holding the pid; the pid is released
/// only inside [`ReapLatch::reap`], so a concurrent kill through the same latch
/// never reaches a recycled pid.
pub fn wait_for_exit(child: Child, latch: &ReapLatch) -> io::Result<TerminatedProcess> {
    let pid = child.id();

    retry_interrupted(|| {
        let mut info = MaybeUninit::<libc::siginfo_t>::zeroed();
        // SAFETY: `info` is valid for writes for the whole call.
        unsafe {
            libc::waitid(
                libc::P_PID,
                pid as libc::id_t,
                info.as_mut_ptr(),
                libc::WEXITED | libc::WNOWAIT,
            )
        }
    })?;

    let mut status: libc::c_int = 0;
    let mut rusage = MaybeUninit::<libc::rusage>::zeroed();

    latch.reap(|| {
        retry_interrupted(|| {
            // SAFETY: `status` and `rusage` are valid for writes for the whole call.
            unsafe { libc::wait4(pid as libc::pid_t, &mut status, 0, rusage.as_mut_ptr()) }
        })
    })?;

    drop(child);

    Ok(TerminatedProcess {
        pid,
        status: ExitStatus::from_raw(status),
        // SAFETY: zero-initialised and then filled in by a successful wait4.
        rusage: unsafe { rusage.assume_init() },
    })
}

/// Force-kill a child that has not been reaped yet
pub fn terminate(pid: u32) -> io::Result<()> {
    let pid = i32::try_from(pid).map_err(|_| io::Error::from(io::ErrorKind::InvalidInput))?;
    signal::kill(Pid::from_raw(pid), Signal::SIGKILL).map_err(io::Error::from)
}

/// `rusage`-backed accountant
#[derive(Debug, Clone, Copy, Default)]
pub struct PlatformAccountant;

impl ResourceAccountant for PlatformAccountant {
    fn measure(&self, process: &TerminatedProcess) -> ResourceUsage {
        let ru = &process.rusage;
        let usage = ResourceUsage {
            cpu_time: timeval_to_duration(ru.ru_utime) + timeval_to_duration(ru.ru_stime),
            peak_memory_kb: max_rss_to_kb(i64::from(ru.ru_maxrss), HostFamily::current()),
        };
        tracing::trace!(pid = process.pid, ?usage, "Collected rusage");
        usage
    }
}
