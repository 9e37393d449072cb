//! # Data Log Sink
//!
//! Append-only text log of telemetry events. Each run writes to the first
//! unused name among `data.log`, `data1.log`, `data2.log`, ... so earlier
//! runs are never overwritten.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use super::event::{LogEvent, Severity};
use crate::config::LogConfig;
use crate::error::{Result, TelemetryError};

/// Platform line terminator appended to each record
#[cfg(windows)]
pub const LINE_ENDING: &str = "\r\n";
#[cfg(not(windows))]
pub const LINE_ENDING: &str = "\n";

/// Destination for log events
pub trait EventSink: Send {
    /// Record one event. Failures are reported, never propagated.
    fn append(&mut self, event: LogEvent);
}

/// Pick the first non-existing `<stem>.<ext>`, `<stem>1.<ext>`, ... in `dir`
///
/// # Examples
///
/// ```no_run
/// use gps_range_logger::telemetry::logger::select_log_path;
///
/// let path = select_log_path(".", "data", "log");
/// println!("Logging to {}", path.display());
/// ```
pub fn select_log_path<P: AsRef<Path>>(dir: P, stem: &str, extension: &str) -> PathBuf {
    let dir = dir.as_ref();
    let first = dir.join(format!("{}.{}", stem, extension));
    if !first.exists() {
        return first;
    }

    let mut counter: u64 = 1;
    loop {
        let candidate = dir.join(format!("{}{}.{}", stem, counter, extension));
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}

/// Timestamped append-only writer for one log file
///
/// The file is opened for each record and closed again, so it can be
/// inspected or rotated externally while the logger runs.
#[derive(Debug, Clone)]
pub struct LogSink {
    path: PathBuf,
    timestamp_format: String,
}

impl LogSink {
    pub fn new(path: impl Into<PathBuf>, timestamp_format: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            timestamp_format: timestamp_format.into(),
        }
    }

    /// Create a sink on a freshly selected file name per `config`
    pub fn from_config(config: &LogConfig) -> Self {
        let path = select_log_path(&config.dir, &config.file_stem, &config.extension);
        Self::new(path, config.timestamp_format.clone())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Format one record: `[<timestamp>] <message><EOL>`
    pub fn format_record(&self, event: &LogEvent) -> String {
        let mut record = format!(
            "[{}] {}",
            event.timestamp.format(&self.timestamp_format),
            event.message
        );
        if !record.ends_with(LINE_ENDING) {
            record.push_str(LINE_ENDING);
        }
        record
    }

    /// Append one record
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::SinkWrite`] if the file cannot be opened or written
    pub fn try_append(&self, event: &LogEvent) -> Result<()> {
        let record = self.format_record(event);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(TelemetryError::SinkWrite)?;
        file.write_all(record.as_bytes())
            .map_err(TelemetryError::SinkWrite)?;
        Ok(())
    }
}

impl EventSink for LogSink {
    fn append(&mut self, event: LogEvent) {
        match event.severity {
            Severity::Info => info!("{}", event.message),
            Severity::Warning => warn!("{}", event.message),
        }

        if let Err(e) = self.try_append(&event) {
            error!("{}", e);
        }
    }
}
