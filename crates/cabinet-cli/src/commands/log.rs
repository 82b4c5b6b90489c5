// Append a message to the daily log

use super::{Command, CommandContext};
use crate::error::CliResult;
use cabinet_store::{DailyFileSink, LogLevel, LogSink};
use std::path::PathBuf;

/// Write one message to `<dir>/<date>/LOG_DAILY_<date>.log`
pub struct LogCommand {
    pub message: String,
    pub level: LogLevel,
    pub name: Option<String>,
    pub dir: Option<PathBuf>,
}

impl LogCommand {
    pub fn new(message: String, level: LogLevel, name: Option<String>, dir: Option<PathBuf>) -> Self {
        Self {
            message,
            level,
            name,
            dir,
        }
    }

    fn sink(&self, ctx: &CommandContext) -> CliResult<DailyFileSink> {
        let dir = match &self.dir {
            Some(dir) => dir.clone(),
            None => ctx.config.log_dir()?,
        };
        let sink = DailyFileSink::new(dir).quiet(ctx.quiet);
        Ok(match &self.name {
            Some(name) => sink.with_log_name(name.clone()),
            None => sink,
        })
    }
}

impl Command for LogCommand {
    fn execute(&self, ctx: &CommandContext) -> CliResult<()> {
        self.sink(ctx)?.log(&self.message, self.level)?;
        Ok(())
    }
}
