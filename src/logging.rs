//! Append-only provisioning log.
//!
//! Console diagnostics go through `tracing`; the run log is the durable
//! audit trail the user is pointed at when a run fails. Every entry is a
//! single `<timestamp> - <message>` line. The file and its directory are
//! created on the first write, and write failures never abort a run.

use chrono::{DateTime, Utc};
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::ProvisionError;

/// Timestamp layout used for every log line.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A single log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

impl LogEntry {
    /// Create an entry stamped with the current time.
    pub fn now(message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            message: message.into(),
        }
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.message
        )
    }
}

/// The run log sink.
#[derive(Debug, Clone)]
pub struct RunLog {
    path: PathBuf,
}

impl RunLog {
    /// Create a log writing to `path`. Nothing touches disk until the first entry.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding the log file.
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    /// Append an informational entry.
    pub fn info(&self, message: impl AsRef<str>) {
        let message = message.as_ref();
        tracing::debug!("{}", message);
        self.append(LogEntry::now(message));
    }

    /// Append a warning entry.
    pub fn warn(&self, message: impl AsRef<str>) {
        let message = message.as_ref();
        tracing::warn!("{}", message);
        self.append(LogEntry::now(format!("WARN: {}", message)));
    }

    /// Append an error entry carrying the error's kind marker.
    pub fn error(&self, err: &ProvisionError) {
        tracing::error!("{}", err);
        self.append(LogEntry::now(format!("ERROR [{}]: {}", err.kind(), err)));
    }

    fn append(&self, entry: LogEntry) {
        if let Err(e) = self.try_append(&entry) {
            tracing::warn!("Could not write to {}: {}", self.path.display(), e);
        }
    }

    fn try_append(&self, entry: &LogEntry) -> std::io::Result<()> {
        fs::create_dir_all(self.dir())?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", entry)
    }
}
