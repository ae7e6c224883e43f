//! Windows accounting via process memory counters and process times

use std::io;
use std::mem;
use std::process::{Child, ExitStatus};
use std::time::Duration;

use windows_sys::Win32::Foundation::{CloseHandle, FILETIME, HANDLE};
use windows_sys::Win32::System::ProcessStatus::{GetProcessMemoryInfo, PROCESS_MEMORY_COUNTERS};
use windows_sys::Win32::System::Threading::{
    GetProcessTimes, OpenProcess, PROCESS_QUERY_INFORMATION, PROCESS_TERMINATE, PROCESS_VM_READ,
    TerminateProcess,
};

use super::{ReapLatch, ResourceAccountant, ResourceUsage};

/// Exit code reported for children killed at their deadline
const KILLED_EXIT_CODE: u32 = 1;

/// Owned process handle, closed on drop
struct ProcessHandle(HANDLE);

impl ProcessHandle {
    fn open(pid: u32, access: u32) -> io::Result<Self> {
        // SAFETY: OpenProcess has no pointer arguments.
        let handle = unsafe { OpenProcess(access, 0, pid) };
        if handle.is_null() {
            Err(io::Error::last_os_error())
        } else {
            Ok(Self(handle))
        }
    }

    fn peak_working_set_kb(&self) -> io::Result<u64> {
        // SAFETY: PROCESS_MEMORY_COUNTERS is plain data; all-zero is valid.
        let mut counters: PROCESS_MEMORY_COUNTERS = unsafe { mem::zeroed() };
        let cb = mem::size_of::<PROCESS_MEMORY_COUNTERS>() as u32;
        counters.cb = cb;

        // SAFETY: `counters` is writable and `cb` holds its size.
        let ok = unsafe { GetProcessMemoryInfo(self.0, &mut counters, cb) };
        if ok == 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(counters.PeakWorkingSetSize as u64 / 1024)
    }

    fn cpu_time(&self) -> io::Result<Duration> {
        let zero = FILETIME {
            dwLowDateTime: 0,
            dwHighDateTime: 0,
        };
        let (mut creation, mut exit, mut kernel, mut user) = (zero, zero, zero, zero);

        // SAFETY: all four out-pointers are valid FILETIMEs.
        let ok = unsafe { GetProcessTimes(self.0, &mut creation, &mut exit, &mut kernel, &mut user) };
        if ok == 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(filetime_to_duration(kernel) + filetime_to_duration(user))
    }
}

impl Drop for ProcessHandle {
    fn drop(&mut self) {
        // SAFETY: the handle came from a successful OpenProcess and is closed once.
        unsafe {
            CloseHandle(self.0);
        }
    }
}

/// FILETIME intervals count 100ns ticks
fn filetime_to_duration(ft: FILETIME) -> Duration {
    let ticks = (u64::from(ft.dwHighDateTime) << 32) | u64::from(ft.dwLowDateTime);
    Duration::from_nanos(ticks.saturating_mul(100))
}

/// An exited child.
///
/// The `Child` is kept alive so that its handle pins the process object and
/// the pid still refers to it when the accountant opens it.
pub struct TerminatedProcess {
    pid: u32,
    status: ExitStatus,
    _child: Child,
}

impl TerminatedProcess {
    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn status(&self) -> ExitStatus {
        self.status
    }
}

/// Block until `child` exits.
///
/// The `Child` handle keeps the pid valid; the latch only records that the
/// exit has been observed, so a late deadline kill is skipped.
pub fn wait_for_exit(mut child: Child, latch: &ReapLatch) -> io::Result<TerminatedProcess> {
    let pid = child.id();
    let status = child.wait()?;
    latch.reap(|| ());
    Ok(TerminatedProcess {
        pid,
        status,
        _child: child,
    })
}

/// Force-kill a child that is still being waited on
pub fn terminate(pid: u32) -> io::Result<()> {
    let handle = ProcessHandle::open(pid, PROCESS_TERMINATE)?;
    // SAFETY: `handle` was opened with PROCESS_TERMINATE.
    let ok = unsafe { TerminateProcess(handle.0, KILLED_EXIT_CODE) };
    if ok == 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Working-set and process-times accountant
#[derive(Debug, Clone, Copy, Default)]
pub struct PlatformAccountant;

impl ResourceAccountant for PlatformAccountant {
    fn measure(&self, process: &TerminatedProcess) -> ResourceUsage {
        let handle = match ProcessHandle::open(process.pid, PROCESS_QUERY_INFORMATION | PROCESS_VM_READ) {
            Ok(handle) => handle,
            Err(e) => {
                tracing::debug!(pid = process.pid, error = %e, "Cannot open process for accounting");
                return ResourceUsage::default();
            }
        };

        let peak_memory_kb = handle.peak_working_set_kb().unwrap_or_else(|e| {
            tracing::debug!(pid = process.pid, error = %e, "GetProcessMemoryInfo failed");
            0
        });
        let cpu_time = handle.cpu_time().unwrap_or_else(|e| {
            tracing::debug!(pid = process.pid, error = %e, "GetProcessTimes failed");
            Duration::ZERO
        });

        ResourceUsage {
            cpu_time,
            peak_memory_kb,
        }
    }
}
