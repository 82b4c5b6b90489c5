// Read a value from the store

use super::{Command, CommandContext};
use crate::error::CliResult;
use crate::output::render_value;
use cabinet_store::{GetOptions, ReturnType};

/// Print the value at a path, or `None`
pub struct GetCommand {
    pub path: Vec<String>,
    pub warn_missing: bool,
    pub return_type: Option<ReturnType>,
}

impl GetCommand {
    pub fn new(path: Vec<String>, warn_missing: bool, return_type: Option<ReturnType>) -> Self {
        Self {
            path,
            warn_missing,
            return_type,
        }
    }

    fn options(&self) -> GetOptions {
        GetOptions {
            warn_missing: self.warn_missing,
            return_type: self.return_type,
        }
    }
}

impl Command for GetCommand {
    fn execute(&self, ctx: &CommandContext) -> CliResult<()> {
        let mut store = ctx.open_store()?;
        match store.get(self.path.iter().cloned(), self.options())? {
            Some(value) => println!("{}", render_value(&value)),
            None => println!("None"),
        }
        Ok(())
    }
}
