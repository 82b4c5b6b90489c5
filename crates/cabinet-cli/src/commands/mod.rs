// Command handlers for the cabinet CLI

pub mod cache;
pub mod config;
pub mod export;
pub mod files;
pub mod get;
pub mod log;
pub mod put;
pub mod remove;

pub use cache::{CacheAction, CacheCommand};
pub use config::{ConfigAction, ConfigCommand};
pub use export::ExportCommand;
pub use files::{ReadFileCommand, WriteFileCommand};
pub use get::GetCommand;
pub use log::LogCommand;
pub use put::PutCommand;
pub use remove::RemoveCommand;

use crate::error::CliResult;
use crate::logging::TerminalSink;
use crate::output::OutputStyle;
use cabinet_store::{CabinetConfig, KeyValueStore};
use std::path::PathBuf;

/// Settings and flags shared by every command
pub struct CommandContext {
    pub config: CabinetConfig,
    pub config_path: PathBuf,
    pub quiet: bool,
    pub style: OutputStyle,
}

impl CommandContext {
    /// Connect to the configured backend
    ///
    /// A remote backend connects here; failing to do so ends the command.
    pub fn open_store(&self) -> CliResult<KeyValueStore> {
        Ok(self.config.open_store(Box::new(self.sink()))?)
    }

    /// Sink for messages reported outside the store
    pub fn sink(&self) -> TerminalSink {
        TerminalSink::new(self.config.log_dir().ok(), self.quiet)
    }

    /// Print a confirmation unless `--quiet`
    pub fn confirm(&self, message: &str) {
        if !self.quiet {
            println!("{}", self.style.success(message));
        }
    }
}

/// Trait for command handlers
pub trait Command {
    /// Execute the command
    fn execute(&self, ctx: &CommandContext) -> CliResult<()>;
}
