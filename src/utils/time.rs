//! Time utilities

use std::time::Duration;

use chrono::{DateTime, Local};

/// Get current local time
pub fn now_local() -> DateTime<Local> {
    Local::now()
}

/// Format a timestamp as local time of day, e.g. `14:05:09`
pub fn format_clock(dt: &DateTime<Local>) -> String {
    dt.format("%H:%M:%S").to_string()
}

/// Format a duration with the largest fitting unit.
///
/// Sub-microsecond values print as whole nanoseconds, everything else with
/// three decimals, so identical durations always render identically.
pub fn format_duration(duration: Duration) -> String {
    let nanos = duration.as_nanos();

    if nanos < 1_000 {
        format!("{}ns", nanos)
    } else if nanos < 1_000_000 {
        format!("{:.3}µs", nanos as f64 / 1_000.0)
    } else if nanos < 1_000_000_000 {
        format!("{:.3}ms", nanos as f64 / 1_000_000.0)
    } else {
        format!("{:.3}s", duration.as_secs_f64())
    }
}
