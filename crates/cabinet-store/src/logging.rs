//! The logging call-out used by the store, and its sinks
//!
//! The store never prints. Warnings and recovered errors go through a
//! [`LogSink`], which the embedding application picks:
//!
//! - [`TracingSink`] forwards to `tracing` events
//! - [`DailyFileSink`] appends to `<dir>/<date>/LOG_DAILY_<date>.log` and
//!   echoes to stdout
//! - [`MemorySink`] records messages for assertions in tests

use crate::error::{IoOperation, StoreError, StoreResult};
use chrono::{Local, NaiveDate};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

/// Severity accepted by the logging call-out
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
            LogLevel::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warning),
            "error" => Ok(LogLevel::Error),
            "critical" => Ok(LogLevel::Critical),
            other => Err(StoreError::invalid_argument(format!(
                "Invalid log level: {}. Must be one of debug, info, warn, warning, error, critical.",
                other
            ))),
        }
    }
}

/// Destination for the store's warnings and recovered errors
pub trait LogSink: Send + Sync {
    /// Record `message` at `level`
    ///
    /// An empty message is an `InvalidArgument`.
    fn log(&self, message: &str, level: LogLevel) -> StoreResult<()>;
}

fn check_message(message: &str) -> StoreResult<()> {
    if message.is_empty() {
        return Err(StoreError::invalid_argument("log message must not be empty"));
    }
    Ok(())
}

/// Forwards to the global `tracing` subscriber
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, message: &str, level: LogLevel) -> StoreResult<()> {
        check_message(message)?;
        match level {
            LogLevel::Debug => tracing::debug!("{}", message),
            LogLevel::Info => tracing::info!("{}", message),
            LogLevel::Warning => tracing::warn!("{}", message),
            LogLevel::Error => tracing::error!("{}", message),
            LogLevel::Critical => tracing::error!(critical = true, "{}", message),
        }
        Ok(())
    }
}

/// Daily-rotating file log
///
/// Every day gets its own directory; messages below `min_level` are dropped.
#[derive(Debug, Clone)]
pub struct DailyFileSink {
    dir: PathBuf,
    log_name: Option<String>,
    min_level: LogLevel,
    quiet: bool,
}

impl DailyFileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            log_name: None,
            min_level: LogLevel::Debug,
            quiet: false,
        }
    }

    /// Use `name` instead of `LOG_DAILY_<date>`
    pub fn with_log_name(mut self, name: impl Into<String>) -> Self {
        self.log_name = Some(name.into());
        self
    }

    pub fn with_min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    /// Write to the file only, not to stdout
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File that messages logged on `date` end up in
    pub fn file_for(&self, date: NaiveDate) -> PathBuf {
        let day = date.format("%Y-%m-%d").to_string();
        let name = self
            .log_name
            .clone()
            .unwrap_or_else(|| format!("LOG_DAILY_{}", day));
        self.dir.join(&day).join(format!("{}.log", name))
    }

    /// Format one log line
    pub fn format_line(message: &str, level: LogLevel) -> String {
        format!(
            "{} - {} - {}",
            Local::now().format("%Y-%m-%d %H:%M:%S,%3f"),
            level,
            message
        )
    }
}

impl LogSink for DailyFileSink {
    fn log(&self, message: &str, level: LogLevel) -> StoreResult<()> {
        check_message(message)?;
        if level < self.min_level {
            return Ok(());
        }

        let path = self.file_for(Local::now().date_naive());
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)
                    .map_err(|e| StoreError::directory_creation_failed(parent.to_path_buf(), e))?;
            }
        }

        let line = Self::format_line(message, level);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| StoreError::io_error(path.clone(), IoOperation::Write, e))?;
        writeln!(file, "{}", line)
            .map_err(|e| StoreError::io_error(path.clone(), IoOperation::Write, e))?;

        if !self.quiet {
            println!("{}", line);
        }
        Ok(())
    }
}

/// Keeps every message in memory; clones share the same buffer
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<(LogLevel, String)>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<(LogLevel, String)> {
        self.records.lock().clone()
    }

    /// Number of messages logged at exactly `level`
    pub fn count(&self, level: LogLevel) -> usize {
        self.records.lock().iter().filter(|(l, _)| *l == level).count()
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl LogSink for MemorySink {
    fn log(&self, message: &str, level: LogLevel) -> StoreResult<()> {
        check_message(message)?;
        self.records.lock().push((level, message.to_string()));
        Ok(())
    }
}
