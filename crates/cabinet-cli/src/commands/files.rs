// Plain file helpers exposed on the command line

use super::{Command, CommandContext};
use crate::error::CliResult;
use cabinet_store::files::{read_lines, write_file};
use std::path::PathBuf;

fn resolve_dir(dir: &Option<PathBuf>, ctx: &CommandContext) -> CliResult<PathBuf> {
    match dir {
        Some(dir) => Ok(dir.clone()),
        None => Ok(ctx.config.log_dir()?),
    }
}

/// Print a file line by line
pub struct ReadFileCommand {
    pub name: String,
    pub dir: Option<PathBuf>,
    pub strip: bool,
}

impl Command for ReadFileCommand {
    fn execute(&self, ctx: &CommandContext) -> CliResult<()> {
        let dir = resolve_dir(&self.dir, ctx)?;
        for line in read_lines(&dir, &self.name, self.strip)? {
            println!("{}", line);
        }
        Ok(())
    }
}

/// Write or append text to a file
pub struct WriteFileCommand {
    pub name: String,
    pub dir: Option<PathBuf>,
    pub content: String,
    pub append: bool,
}

impl Command for WriteFileCommand {
    fn execute(&self, ctx: &CommandContext) -> CliResult<()> {
        let dir = resolve_dir(&self.dir, ctx)?;
        let path = write_file(&dir, &self.name, &self.content, self.append)?;
        ctx.confirm(&format!("Wrote {}", path.display()));
        Ok(())
    }
}
