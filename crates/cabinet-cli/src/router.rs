// Command routing and dispatch

use crate::commands::*;
use crate::error::CliResult;
use crate::output::OutputStyle;
use cabinet_store::{ConfigStore, LogLevel, ReturnType};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Cabinet - a personal key-value store
#[derive(Parser, Debug)]
#[command(name = "cabinet")]
#[command(bin_name = "cabinet")]
#[command(about = "Personal key-value store backed by a JSON file or a remote document database")]
#[command(
    long_about = "Cabinet stores nested values under paths of keys.\n\nExamples:\n  • cabinet put person tyler salary 100\n  • cabinet get person tyler salary\n  • cabinet remove person tyler\n  • cabinet log \"backup finished\" --level info"
)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (default: ~/.config/cabinet/config.json)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimize output
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Print the value stored at a path
    Get {
        /// Keys leading to the value
        #[arg(value_name = "KEY", required = true, num_args = 1.., allow_negative_numbers = true)]
        path: Vec<String>,

        /// Warn when a key is missing
        #[arg(short, long)]
        warn_missing: bool,

        /// Convert the value (integer, float, boolean, string, list, map)
        #[arg(short = 't', long = "type", value_name = "TYPE")]
        return_type: Option<ReturnType>,
    },

    /// Store a value; without --value the last key is the value
    Put {
        /// Keys leading to the value, optionally followed by the value
        #[arg(value_name = "KEY", required = true, num_args = 1.., allow_negative_numbers = true)]
        path: Vec<String>,

        /// Value as JSON, stored under the full path
        #[arg(long, value_name = "JSON")]
        value: Option<String>,
    },

    /// Remove the value at a path
    Remove {
        /// Keys leading to the value
        #[arg(value_name = "KEY", required = true, num_args = 1.., allow_negative_numbers = true)]
        path: Vec<String>,
    },

    /// Append a message to the daily log
    Log {
        /// Message to log
        #[arg(value_name = "MESSAGE")]
        message: String,

        /// debug, info, warning, error or critical
        #[arg(short, long, default_value = "info")]
        level: LogLevel,

        /// Log file name instead of LOG_DAILY_<date>
        #[arg(short, long)]
        name: Option<String>,

        /// Log directory (default: path_dir_log)
        #[arg(short, long, value_name = "DIR")]
        dir: Option<PathBuf>,
    },

    /// Write the whole store to a JSON file
    Export {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigSubcommand>,
    },

    /// Inspect or clear the remote cache
    Cache {
        #[command(subcommand)]
        action: Option<CacheSubcommand>,
    },

    /// Print a file line by line
    ReadFile {
        #[arg(value_name = "NAME")]
        name: String,

        /// Directory holding the file (default: path_dir_log)
        #[arg(short, long, value_name = "DIR")]
        dir: Option<PathBuf>,

        /// Keep surrounding whitespace
        #[arg(long)]
        no_strip: bool,
    },

    /// Write text to a file
    WriteFile {
        #[arg(value_name = "NAME")]
        name: String,

        /// Directory holding the file (default: path_dir_log)
        #[arg(short, long, value_name = "DIR")]
        dir: Option<PathBuf>,

        /// Text to write
        #[arg(short, long, default_value = "")]
        content: String,

        /// Append instead of overwriting
        #[arg(short, long)]
        append: bool,
    },
}

#[derive(Subcommand, Debug, Clone, Copy)]
pub enum ConfigSubcommand {
    /// Show the effective configuration
    Show,
    /// Print the configuration file path
    Path,
}

#[derive(Subcommand, Debug, Clone, Copy)]
pub enum CacheSubcommand {
    /// Show the snapshot state
    Status,
    /// Delete the snapshot
    Clear,
}

/// Route and execute commands
pub struct CommandRouter;

impl CommandRouter {
    /// Parse CLI arguments and route to appropriate handler
    pub fn route() -> CliResult<()> {
        let cli = Cli::parse();

        crate::logging::init_logging(cli.verbose, cli.quiet);

        Self::execute(&cli)
    }

    /// Load configuration for `cli`
    pub fn context(cli: &Cli) -> CliResult<CommandContext> {
        let store = match &cli.config {
            Some(path) => ConfigStore::new(path.clone()),
            None => ConfigStore::default_location()?,
        };
        let config = store.load()?;

        Ok(CommandContext {
            config,
            config_path: store.path().to_path_buf(),
            quiet: cli.quiet,
            style: OutputStyle::default(),
        })
    }

    /// Execute a command
    pub fn execute(cli: &Cli) -> CliResult<()> {
        let ctx = Self::context(cli)?;

        match &cli.command {
            Commands::Get {
                path,
                warn_missing,
                return_type,
            } => GetCommand::new(path.clone(), *warn_missing, *return_type).execute(&ctx),
            Commands::Put { path, value } => {
                PutCommand::new(path.clone(), value.clone()).execute(&ctx)
            }
            Commands::Remove { path } => RemoveCommand::new(path.clone()).execute(&ctx),
            Commands::Log {
                message,
                level,
                name,
                dir,
            } => LogCommand::new(message.clone(), *level, name.clone(), dir.clone()).execute(&ctx),
            Commands::Export { file } => ExportCommand::new(file.clone()).execute(&ctx),
            Commands::Config { action } => {
                let config_action = match action {
                    Some(ConfigSubcommand::Show) | None => ConfigAction::Show,
                    Some(ConfigSubcommand::Path) => ConfigAction::Path,
                };
                ConfigCommand::new(config_action).execute(&ctx)
            }
            Commands::Cache { action } => {
                let cache_action = match action {
                    Some(CacheSubcommand::Status) | None => CacheAction::Status,
                    Some(CacheSubcommand::Clear) => CacheAction::Clear,
                };
                CacheCommand::new(cache_action).execute(&ctx)
            }
            Commands::ReadFile {
                name,
                dir,
                no_strip,
            } => ReadFileCommand {
                name: name.clone(),
                dir: dir.clone(),
                strip: !no_strip,
            }
            .execute(&ctx),
            Commands::WriteFile {
                name,
                dir,
                content,
                append,
            } => WriteFileCommand {
                name: name.clone(),
                dir: dir.clone(),
                content: content.clone(),
                append: *append,
            }
            .execute(&ctx),
        }
    }
}
