//! Summary report rendering and fan-out to output sinks

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use crate::constants::{
    REPORT_COLUMN_WIDTH, REPORT_LABEL_CHARS, REPORT_MEMORY_COLUMN_WIDTH, REPORT_SEPARATOR_WIDTH,
};
use crate::error::{BenchError, BenchResult};
use crate::models::CaseAggregate;
use crate::utils::format_duration;

/// Render the summary table for `aggregates`, in the order given
pub fn render(aggregates: &[CaseAggregate]) -> String {
    let w = REPORT_COLUMN_WIDTH;
    let mut out = String::new();

    out.push_str("\nSummary:\n");
    out.push_str(&format!(
        "{:<w$} | {:<w$} | {:<w$} | {:<m$}\n",
        "Case",
        "Avg Duration",
        "CPU Time",
        "Max RAM",
        m = REPORT_MEMORY_COLUMN_WIDTH
    ));
    out.push_str(&"-".repeat(REPORT_SEPARATOR_WIDTH));
    out.push('\n');

    for (index, aggregate) in aggregates.iter().enumerate() {
        let label: String = aggregate.case_label.chars().take(REPORT_LABEL_CHARS).collect();
        out.push_str(&format!(
            "{:<w$} | {:<w$} | {:<w$} | {} KB\n",
            format!("{} {}", index, label),
            format_duration(aggregate.avg_duration),
            format_duration(aggregate.avg_cpu_time),
            aggregate.max_memory_kb
        ));
    }

    out
}

/// Open the log file for appending, creating it if needed
pub fn open_log_sink(path: &Path) -> BenchResult<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| BenchError::LogSink {
            path: path.to_path_buf(),
            source,
        })
}

/// A writer that duplicates everything to several sinks.
///
/// Each write is attempted on every sink, even after one has failed; the
/// first error is reported once all sinks have been tried.
#[derive(Default)]
pub struct FanOut {
    sinks: Vec<Box<dyn Write + Send>>,
}

impl FanOut {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sink
    pub fn with(mut self, sink: impl Write + Send + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    fn for_each_sink(
        &mut self,
        mut op: impl FnMut(&mut (dyn Write + Send)) -> io::Result<()>,
    ) -> io::Result<()> {
        let mut first_err = None;
        for sink in &mut self.sinks {
            if let Err(e) = op(sink.as_mut()) {
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}

impl Write for FanOut {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.for_each_sink(|sink| sink.write_all(buf))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.for_each_sink(|sink| sink.flush())
    }
}

/// Write `text` to every sink and flush them
pub fn emit(text: &str, sinks: &mut FanOut) -> io::Result<()> {
    sinks.write_all(text.as_bytes())?;
    sinks.flush()
}
