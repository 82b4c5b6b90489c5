//! Storage backends
//!
//! A backend holds exactly one Document. The store only needs three
//! primitives from it: read the whole Document, replace one top-level field,
//! and delete one leaf.

mod local;
mod memory;
#[cfg(feature = "surrealdb-backend")]
mod surreal;

pub use local::LocalFileBackend;
pub use memory::InMemoryBackend;
#[cfg(feature = "surrealdb-backend")]
pub use surreal::{RemoteSettings, SurrealDocumentBackend};

use crate::document::{to_pretty_json, AttributePath, Document};
use crate::error::{IoOperation, StoreError, StoreResult};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::info;

/// Storage medium behind a [`KeyValueStore`](crate::KeyValueStore)
pub trait Backend: Send + Sync {
    /// Identity of the store, used as context in missing-attribute messages
    fn describe(&self) -> String;

    /// Whether reads should go through the cache
    fn is_remote(&self) -> bool;

    /// Fetch the whole Document
    fn read(&self) -> StoreResult<Document>;

    /// Replace the top-level field `key` with `value`
    fn write(&self, key: &str, value: Value) -> StoreResult<()>;

    /// Delete the leaf named by `path`; parents are left in place
    fn unset(&self, path: &AttributePath) -> StoreResult<()>;
}

/// Write the backend's Document to `path` as pretty-printed JSON
pub fn export(backend: &dyn Backend, path: &Path) -> StoreResult<()> {
    let document = backend.read()?;
    let json = to_pretty_json(&document)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)
                .map_err(|e| StoreError::directory_creation_failed(parent.to_path_buf(), e))?;
        }
    }

    fs::write(path, json)
        .map_err(|e| StoreError::io_error(path.to_path_buf(), IoOperation::Write, e))?;
    info!("Exported {} to {}", backend.describe(), path.display());
    Ok(())
}
