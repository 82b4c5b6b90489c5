// Remote cache inspection and reset

use super::{Command, CommandContext};
use crate::error::CliResult;
use cabinet_store::CacheLayer;

/// Inspect or clear the remote cache snapshot without connecting
pub struct CacheCommand {
    pub action: CacheAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheAction {
    Status,
    Clear,
}

impl CacheCommand {
    pub fn new(action: CacheAction) -> Self {
        Self { action }
    }

    fn open(ctx: &CommandContext) -> CliResult<CacheLayer> {
        Ok(CacheLayer::open(ctx.config.cache_path()?, ctx.config.cache_ttl()))
    }

    fn status(&self, ctx: &CommandContext) -> CliResult<()> {
        let style = &ctx.style;
        let cache = Self::open(ctx)?;

        if !ctx.config.remote_enabled {
            println!("{}", style.info("Local backend in use; reads are not cached"));
        }
        println!("{}", style.key_value("snapshot", &cache.path().display().to_string()));
        println!("{}", style.key_value("state", &cache.state().to_string()));
        println!(
            "{}",
            style.key_value("window", &format!("{}s", cache.freshness().as_secs()))
        );
        if let Some(fetched_at) = cache.fetched_at() {
            println!("{}", style.key_value("fetched at", &fetched_at.to_rfc3339()));
        }
        Ok(())
    }

    fn clear(&self, ctx: &CommandContext) -> CliResult<()> {
        let mut cache = Self::open(ctx)?;
        if cache.invalidate()? {
            ctx.confirm(&format!("Deleted {}", cache.path().display()));
        } else if !ctx.quiet {
            println!("{}", ctx.style.info("No cache snapshot to delete"));
        }
        Ok(())
    }
}

impl Command for CacheCommand {
    fn execute(&self, ctx: &CommandContext) -> CliResult<()> {
        match self.action {
            CacheAction::Status => self.status(ctx),
            CacheAction::Clear => self.clear(ctx),
        }
    }
}
