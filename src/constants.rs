//! Application-wide constants
//!
//! Defaults for every configurable value, plus the fixed parts of the
//! benchmark case table.

// =============================================================================
// RUN DEFAULTS
// =============================================================================

/// Default number of trials per case
pub const DEFAULT_ITERATIONS: u32 = 1000;

/// Default per-trial deadline in seconds
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

/// Default log file the report is appended to
pub const DEFAULT_LOG_FILE: &str = "benchmark.log";

/// Default tracing filter
pub const DEFAULT_RUST_LOG: &str = "interp_bench=info";

// =============================================================================
// INTERPRETERS
// =============================================================================

/// Default Piet interpreter location, without the platform executable suffix
pub const DEFAULT_PIET_INTERP: &str = "./../Piet-interp/cmake-build-debug/Piet_interp";

/// Default Whitespace interpreter location, without the platform executable suffix
pub const DEFAULT_WHITESPACE_INTERP: &str =
    "./../Whitespace-interp/cmake-build-debug/Whitespace_interp";

/// Default directory holding the Piet example programs
pub const DEFAULT_PIET_EXAMPLES_DIR: &str = "../Piet-interp/examples";

/// Default directory holding the Whitespace example programs
pub const DEFAULT_WHITESPACE_EXAMPLES_DIR: &str = "../Whitespace-interp/examples";

// =============================================================================
// CASE TABLE
// =============================================================================

/// Input fed to programs that read a number from stdin
pub const STDIN_PAYLOAD: &[u8] = b"14\n";

/// Case table entries: (interpreter, program file, reads stdin)
pub mod cases {
    pub const PIET: &str = "Piet";
    pub const WHITESPACE: &str = "Whitespace";

    pub const TABLE: [(&str, &str, bool); 8] = [
        (PIET, "fib.png", false),
        (WHITESPACE, "fibonacci.ws", true),
        (PIET, "Countdown.png", false),
        (WHITESPACE, "count.ws", false),
        (PIET, "p.png", false),
        (WHITESPACE, "h.ws", false),
        (PIET, "piet_factorial_big.png", true),
        (WHITESPACE, "fact.ws", true),
    ];
}

// =============================================================================
// REPORT LAYOUT
// =============================================================================

/// Width of the label and duration columns
pub const REPORT_COLUMN_WIDTH: usize = 15;

/// Width of the memory column header
pub const REPORT_MEMORY_COLUMN_WIDTH: usize = 10;

/// Characters of the case label kept in a report row
pub const REPORT_LABEL_CHARS: usize = 13;

/// Length of the separator line under the header
pub const REPORT_SEPARATOR_WIDTH: usize = 65;
