// Logging setup and the terminal log sink

use crate::output::OutputStyle;
use cabinet_store::{DailyFileSink, LogLevel, LogSink, StoreError, StoreResult};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Environment variable holding a tracing filter directive
pub const LOG_ENV: &str = "CABINET_LOG";

/// Filter directive used when `CABINET_LOG` is unset
pub fn default_directive(verbose: bool, quiet: bool) -> &'static str {
    if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    }
}

/// Initialize the tracing subscriber based on CLI flags
///
/// `--verbose` wins over `CABINET_LOG`; otherwise the variable wins over
/// the default. Calling it twice is harmless.
pub fn init_logging(verbose: bool, quiet: bool) {
    let directive = default_directive(verbose, quiet);
    let filter = if verbose {
        EnvFilter::new(directive)
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(directive))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Sink used by the CLI: appends to the daily log and prints to stderr
pub struct TerminalSink {
    file: Option<DailyFileSink>,
    style: OutputStyle,
    quiet: bool,
}

impl TerminalSink {
    /// Log to `<log_dir>/<date>/LOG_DAILY_<date>.log`, or to stderr only when `None`
    pub fn new(log_dir: Option<PathBuf>, quiet: bool) -> Self {
        Self {
            file: log_dir.map(|dir| {
                DailyFileSink::new(dir)
                    .with_min_level(LogLevel::Warning)
                    .quiet(true)
            }),
            style: OutputStyle {
                use_colors: atty::is(atty::Stream::Stderr),
            },
            quiet,
        }
    }

    fn render(&self, message: &str, level: LogLevel) -> String {
        match level {
            LogLevel::Debug | LogLevel::Info => self.style.info(message),
            LogLevel::Warning => self.style.warning(message),
            LogLevel::Error | LogLevel::Critical => self.style.error(message),
        }
    }
}

impl LogSink for TerminalSink {
    fn log(&self, message: &str, level: LogLevel) -> StoreResult<()> {
        if message.is_empty() {
            return Err(StoreError::invalid_argument("log message must not be empty"));
        }
        if let Some(file) = &self.file {
            if let Err(e) = file.log(message, level) {
                tracing::warn!("Could not write daily log: {}", e);
            }
        }
        if !self.quiet || level >= LogLevel::Error {
            eprintln!("{}", self.render(message, level));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(true, false), "debug");
        assert_eq!(default_directive(false, true), "error");
        assert_eq!(default_directive(false, false), "warn");
        assert_eq!(default_directive(true, true), "debug");
    }

    #[test]
    fn test_init_logging_twice_does_not_panic() {
        init_logging(false, true);
        init_logging(true, false);
    }

    #[test]
    fn test_terminal_sink_writes_daily_file() {
        let temp_dir = TempDir::new().unwrap();
        let sink = TerminalSink::new(Some(temp_dir.path().to_path_buf()), true);

        sink.log("missing value", LogLevel::Warning).unwrap();

        let day_dirs: Vec<_> = std::fs::read_dir(temp_dir.path()).unwrap().collect();
        assert_eq!(day_dirs.len(), 1);
    }

    #[test]
    fn test_terminal_sink_rejects_empty_message() {
        let sink = TerminalSink::new(None, true);
        assert!(sink.log("", LogLevel::Info).is_err());
    }
}
