// Remove a value

use super::{Command, CommandContext};
use crate::error::CliResult;
use cabinet_store::{KeyValueStore, LogLevel, LogSink};

/// Delete the leaf at a path
pub struct RemoveCommand {
    pub path: Vec<String>,
}

impl RemoveCommand {
    pub fn new(path: Vec<String>) -> Self {
        Self { path }
    }

    /// Remove the leaf, reporting recoverable failures to `sink`
    ///
    /// Returns whether the backend accepted the removal.
    pub fn apply(&self, store: &mut KeyValueStore, sink: &dyn LogSink) -> CliResult<bool> {
        match store.try_remove(self.path.iter().cloned()) {
            Ok(()) => Ok(true),
            Err(e) if e.is_recoverable() => {
                sink.log(&format!("Could not remove value: {}", e), LogLevel::Error)?;
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl Command for RemoveCommand {
    fn execute(&self, ctx: &CommandContext) -> CliResult<()> {
        let mut store = ctx.open_store()?;
        if self.apply(&mut store, &ctx.sink())? {
            ctx.confirm(&format!("Removed {}", self.path.join(" -> ")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CliError;
    use cabinet_store::{InMemoryBackend, MemorySink, StoreError};
    use serde_json::json;

    fn command(segments: &[&str]) -> RemoveCommand {
        RemoveCommand::new(segments.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_apply_removes_leaf() {
        let backend = InMemoryBackend::local();
        let mut store = KeyValueStore::new(Box::new(backend.clone()));
        store.put(["a", "b", "1"], None).unwrap();
        let sink = MemorySink::new();

        assert!(command(&["a", "b"]).apply(&mut store, &sink).unwrap());
        assert_eq!(backend.snapshot().get("a"), Some(&json!({})));
        assert!(sink.records().is_empty());
    }

    #[test]
    fn test_apply_reports_unavailable_backend() {
        let backend = InMemoryBackend::local();
        let mut store = KeyValueStore::new(Box::new(backend.clone()));
        backend.set_available(false);
        let sink = MemorySink::new();

        assert!(!command(&["a", "b"]).apply(&mut store, &sink).unwrap());
        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].0, LogLevel::Error);
        assert!(records[0].1.starts_with("Could not remove value"));
    }

    #[test]
    fn test_apply_empty_path_is_an_error() {
        let mut store = KeyValueStore::new(Box::new(InMemoryBackend::local()));
        let sink = MemorySink::new();

        assert!(matches!(
            command(&[]).apply(&mut store, &sink),
            Err(CliError::Store(StoreError::InvalidArgument { .. }))
        ));
    }
}
