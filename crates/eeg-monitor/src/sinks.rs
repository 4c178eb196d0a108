//! Report sinks for the monitor

use eeg_core::{EegError, EegResult, FeatureRecord, ReportFormat, ReportHistory, ReportSink};
use std::io::Write;

fn sink_error(e: impl std::fmt::Display) -> EegError {
    EegError::SinkError { message: e.to_string() }
}

/// One `key:value` report line per window
pub struct LineSink<W: Write> {
    writer: W,
    format: ReportFormat,
}

impl<W: Write> LineSink<W> {
    pub fn new(writer: W, format: ReportFormat) -> Self {
        Self { writer, format }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ReportSink for LineSink<W> {
    fn emit(&mut self, record: &FeatureRecord) -> EegResult<()> {
        writeln!(self.writer, "{}", self.format.format(record)).map_err(sink_error)
    }

    fn flush(&mut self) -> EegResult<()> {
        self.writer.flush().map_err(sink_error)
    }
}

/// One JSON object per window (JSON lines)
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ReportSink for JsonLinesSink<W> {
    fn emit(&mut self, record: &FeatureRecord) -> EegResult<()> {
        serde_json::to_writer(&mut self.writer, record).map_err(sink_error)?;
        self.writer.write_all(b"\n").map_err(sink_error)
    }

    fn flush(&mut self) -> EegResult<()> {
        self.writer.flush().map_err(sink_error)
    }
}

/// Forwards to another sink while keeping a rolling history
pub struct RecordingSink<K> {
    inner: K,
    history: ReportHistory,
    total: u64,
}

impl<K: ReportSink> RecordingSink<K> {
    pub fn new(inner: K, capacity: usize) -> Self {
        Self {
            inner,
            history: ReportHistory::new(capacity),
            total: 0,
        }
    }

    pub fn history(&self) -> &ReportHistory {
        &self.history
    }

    /// Records seen over the whole run
    pub fn total(&self) -> u64 {
        self.total
    }
}

impl<K: ReportSink> ReportSink for RecordingSink<K> {
    fn emit(&mut self, record: &FeatureRecord) -> EegResult<()> {
        self.inner.emit(record)?;
        self.history.push(*record);
        self.total += 1;
        Ok(())
    }

    fn flush(&mut self) -> EegResult<()> {
        self.inner.flush()
    }
}
