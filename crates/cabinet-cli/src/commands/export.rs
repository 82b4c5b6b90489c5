// Export the whole Document to a file

use super::{Command, CommandContext};
use crate::error::CliResult;
use std::path::PathBuf;

pub struct ExportCommand {
    pub file: PathBuf,
}

impl ExportCommand {
    pub fn new(file: PathBuf) -> Self {
        Self { file }
    }
}

impl Command for ExportCommand {
    fn execute(&self, ctx: &CommandContext) -> CliResult<()> {
        let store = ctx.open_store()?;
        cabinet_store::export(store.backend(), &self.file)?;
        ctx.confirm(&format!("Exported to {}", self.file.display()));
        Ok(())
    }
}
