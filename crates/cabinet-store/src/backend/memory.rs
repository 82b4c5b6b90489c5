//! In-memory backend
//!
//! Memory backend for tests and embedding

use super::Backend;
use crate::document::{remove_leaf, AttributePath, Document};
use crate::error::{StoreError, StoreResult};
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
struct Shared {
    document: RwLock<Document>,
    reads: AtomicUsize,
    writes: AtomicUsize,
    offline: AtomicBool,
}

/// Thread-safe in-memory Document
///
/// Clones share the same Document and counters, so a test can keep one
/// handle for inspection while the store owns another.
///
/// # Example
///
/// ```ignore
/// use cabinet_store::{InMemoryBackend, KeyValueStore};
///
/// let backend = InMemoryBackend::remote();
/// let store = KeyValueStore::new(Box::new(backend.clone()));
/// assert_eq!(backend.read_count(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct InMemoryBackend {
    shared: Arc<Shared>,
    remote: bool,
    name: String,
}

impl InMemoryBackend {
    /// Backend that presents itself as a local file
    pub fn local() -> Self {
        Self::with_document(Document::new(), false)
    }

    /// Backend that presents itself as a remote database, so reads are cached
    pub fn remote() -> Self {
        Self::with_document(Document::new(), true)
    }

    /// Create with an initial Document (useful for testing)
    pub fn with_document(document: Document, remote: bool) -> Self {
        let name = if remote { "memory://remote" } else { "memory://local" };
        Self {
            shared: Arc::new(Shared {
                document: RwLock::new(document),
                ..Shared::default()
            }),
            remote,
            name: name.to_string(),
        }
    }

    /// Simulate losing (or regaining) the connection
    pub fn set_available(&self, available: bool) {
        self.shared.offline.store(!available, Ordering::SeqCst);
    }

    /// Number of successful `read` calls so far
    pub fn read_count(&self) -> usize {
        self.shared.reads.load(Ordering::SeqCst)
    }

    /// Number of successful `write` and `unset` calls so far
    pub fn write_count(&self) -> usize {
        self.shared.writes.load(Ordering::SeqCst)
    }

    /// Copy of the current Document, without counting as a read
    pub fn snapshot(&self) -> Document {
        self.shared.document.read().clone()
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.shared.offline.load(Ordering::SeqCst) {
            return Err(StoreError::backend_unavailable(
                self.name.clone(),
                "backend is offline",
            ));
        }
        Ok(())
    }
}

impl Backend for InMemoryBackend {
    fn describe(&self) -> String {
        self.name.clone()
    }

    fn is_remote(&self) -> bool {
        self.remote
    }

    fn read(&self) -> StoreResult<Document> {
        self.check_available()?;
        self.shared.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.shared.document.read().clone())
    }

    fn write(&self, key: &str, value: Value) -> StoreResult<()> {
        self.check_available()?;
        self.shared.document.write().insert(key.to_string(), value);
        self.shared.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn unset(&self, path: &AttributePath) -> StoreResult<()> {
        self.check_available()?;
        remove_leaf(&mut self.shared.document.write(), path);
        self.shared.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
