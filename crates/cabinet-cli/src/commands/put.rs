// Store a value

use super::{Command, CommandContext};
use crate::error::{CliError, CliResult};
use crate::output::render_value;
use serde_json::Value;

/// Store a value at a path
///
/// Without `--value` the last path segment is the value and its type is
/// inferred (`2` is a number, `true` a boolean, `[1, 2]` a list).
pub struct PutCommand {
    pub path: Vec<String>,
    pub value: Option<String>,
}

impl PutCommand {
    pub fn new(path: Vec<String>, value: Option<String>) -> Self {
        Self { path, value }
    }

    /// Parse `--value` as JSON
    pub fn explicit_value(&self) -> CliResult<Option<Value>> {
        self.value
            .as_deref()
            .map(|raw| {
                serde_json::from_str(raw).map_err(|e| {
                    CliError::invalid_argument(format!("--value is not valid JSON: {}", e))
                })
            })
            .transpose()
    }

    /// Key segments the value ends up under
    pub fn key_path(&self) -> &[String] {
        if self.value.is_some() || self.path.is_empty() {
            &self.path
        } else {
            &self.path[..self.path.len() - 1]
        }
    }
}

impl Command for PutCommand {
    fn execute(&self, ctx: &CommandContext) -> CliResult<()> {
        let value = self.explicit_value()?;
        let mut store = ctx.open_store()?;

        if let Some(stored) = store.put(self.path.iter().cloned(), value)? {
            ctx.confirm(&format!(
                "{} set to {}",
                self.key_path().join(" -> "),
                render_value(&stored)
            ));
        }
        Ok(())
    }
}
