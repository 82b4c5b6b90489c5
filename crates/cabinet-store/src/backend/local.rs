//! Single JSON file on disk

use super::Backend;
use crate::document::{parse_document, remove_leaf, to_pretty_json, AttributePath, Document};
use crate::error::{IoOperation, StoreError, StoreResult};
use crate::files::write_atomic;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Document stored as the entire contents of one JSON file
#[derive(Debug, Clone)]
pub struct LocalFileBackend {
    path: PathBuf,
}

impl LocalFileBackend {
    /// Open the data file at `path`, creating it as `{}` when missing
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();

        if !path.exists() {
            warn!(
                "Data file {} does not exist; creating an empty store there",
                path.display()
            );
            write_atomic(&path, "{}")?;
        }

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, document: &Document) -> StoreResult<()> {
        let json = to_pretty_json(document)?;
        write_atomic(&self.path, &json)?;
        debug!("Saved {}", self.path.display());
        Ok(())
    }
}

impl Backend for LocalFileBackend {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn is_remote(&self) -> bool {
        false
    }

    fn read(&self) -> StoreResult<Document> {
        let text = fs::read_to_string(&self.path)
            .map_err(|e| StoreError::io_error(self.path.clone(), IoOperation::Read, e))?;
        parse_document(&text).map_err(|message| StoreError::malformed(self.path.clone(), message))
    }

    fn write(&self, key: &str, value: Value) -> StoreResult<()> {
        let mut document = self.read()?;
        document.insert(key.to_string(), value);
        self.persist(&document)
    }

    fn unset(&self, path: &AttributePath) -> StoreResult<()> {
        let mut document = self.read()?;
        if remove_leaf(&mut document, path) {
            self.persist(&document)
        } else {
            debug!("Nothing to remove at {}", path);
            Ok(())
        }
    }
}
