// Configuration inspection

use super::{Command, CommandContext};
use crate::error::{CliError, CliResult};
use cabinet_store::CabinetConfig;

/// Inspect the effective configuration
pub struct ConfigCommand {
    pub action: ConfigAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigAction {
    Show,
    Path,
}

impl ConfigCommand {
    pub fn new(action: ConfigAction) -> Self {
        Self { action }
    }

    /// The configuration as indented JSON, with the password masked
    pub fn masked_json(config: &CabinetConfig) -> CliResult<String> {
        let mut masked = config.clone();
        if masked.remote_password.is_some() {
            masked.remote_password = Some("********".to_string());
        }
        serde_json::to_string_pretty(&masked)
            .map_err(|e| CliError::Internal(format!("Failed to serialize configuration: {}", e)))
    }

    fn show(&self, ctx: &CommandContext) -> CliResult<()> {
        let style = &ctx.style;
        println!("{}", style.header("Cabinet Configuration"));
        println!("{}", Self::masked_json(&ctx.config)?);
        println!();
        println!("{}", style.key_value("config file", &ctx.config_path.display().to_string()));
        println!(
            "{}",
            style.key_value("backend", if ctx.config.remote_enabled { "remote" } else { "local" })
        );
        println!("{}", style.key_value("data file", &ctx.config.data_path()?.display().to_string()));
        println!("{}", style.key_value("cache file", &ctx.config.cache_path()?.display().to_string()));
        println!("{}", style.key_value("log directory", &ctx.config.log_dir()?.display().to_string()));

        let missing = ctx.config.missing_remote_fields();
        if !missing.is_empty() {
            println!();
            println!(
                "{}",
                style.warning(&format!("Missing remote settings: {}", missing.join(", ")))
            );
        }
        Ok(())
    }
}

impl Command for ConfigCommand {
    fn execute(&self, ctx: &CommandContext) -> CliResult<()> {
        match self.action {
            ConfigAction::Show => self.show(ctx),
            ConfigAction::Path => {
                println!("{}", ctx.config_path.display());
                Ok(())
            }
        }
    }
}
