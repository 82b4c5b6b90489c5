//! Local snapshot of a remote Document
//!
//! The snapshot file holds the Document and nothing else. Its age comes from
//! the file's modification time (or the moment it was fetched in this
//! process), and the Document may carry its own `expiresAt` deadline.
//!
//! State machine: Empty -> Fresh -> Stale -> Fresh (after refresh) -> ...

use crate::backend::Backend;
use crate::document::{parse_document, to_pretty_json, Document};
use crate::error::{IoOperation, StoreError, StoreResult};
use crate::files::write_atomic;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Default freshness window: one hour
pub const DEFAULT_FRESHNESS: Duration = Duration::from_secs(3600);

/// Root fields recognised as an explicit expiry deadline
const EXPIRY_FIELDS: [&str; 2] = ["expiresAt", "expires_at"];

/// Where the cache is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheState {
    /// No snapshot loaded
    Empty,
    /// Snapshot within the freshness window and not past `expiresAt`
    Fresh,
    /// Snapshot must be refetched before it is served
    Stale,
}

impl fmt::Display for CacheState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheState::Empty => write!(f, "empty"),
            CacheState::Fresh => write!(f, "fresh"),
            CacheState::Stale => write!(f, "stale"),
        }
    }
}

#[derive(Debug, Clone)]
struct Snapshot {
    document: Document,
    fetched_at: DateTime<Utc>,
}

/// File-backed cache of the remote Document
#[derive(Debug)]
pub struct CacheLayer {
    path: PathBuf,
    freshness: Duration,
    snapshot: Option<Snapshot>,
}

impl CacheLayer {
    /// Open the cache at `path`, loading any snapshot already on disk
    ///
    /// A snapshot file that does not hold a JSON object is ignored (the
    /// cache starts Empty) and will be overwritten on the next refresh.
    pub fn open(path: impl Into<PathBuf>, freshness: Duration) -> Self {
        let path = path.into();
        let snapshot = Self::load(&path);
        Self {
            path,
            freshness,
            snapshot,
        }
    }

    fn load(path: &Path) -> Option<Snapshot> {
        if !path.exists() {
            debug!("No cache snapshot at {}", path.display());
            return None;
        }

        let loaded = fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|text| parse_document(&text))
            .and_then(|document| {
                let modified = fs::metadata(path)
                    .and_then(|m| m.modified())
                    .map_err(|e| e.to_string())?;
                Ok(Snapshot {
                    document,
                    fetched_at: DateTime::<Utc>::from(modified),
                })
            });

        match loaded {
            Ok(snapshot) => Some(snapshot),
            Err(message) => {
                warn!(
                    "Ignoring unreadable cache snapshot {}: {}",
                    path.display(),
                    message
                );
                None
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn freshness(&self) -> Duration {
        self.freshness
    }

    /// When the current snapshot was fetched
    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.snapshot.as_ref().map(|s| s.fetched_at)
    }

    /// The cached Document, whatever its state
    pub fn document(&self) -> Option<&Document> {
        self.snapshot.as_ref().map(|s| &s.document)
    }

    pub fn state(&self) -> CacheState {
        self.state_at(Utc::now())
    }

    /// State as seen at instant `now`
    pub fn state_at(&self, now: DateTime<Utc>) -> CacheState {
        let Some(snapshot) = &self.snapshot else {
            return CacheState::Empty;
        };

        let age = (now - snapshot.fetched_at).to_std().unwrap_or_default();
        if age >= self.freshness {
            return CacheState::Stale;
        }

        match expires_at(&snapshot.document) {
            Some(deadline) if deadline <= now => CacheState::Stale,
            _ => CacheState::Fresh,
        }
    }

    /// Serve the snapshot, refetching it first unless it is Fresh
    pub fn ensure_fresh(&mut self, backend: &dyn Backend) -> StoreResult<&Document> {
        let state = self.state();
        if state != CacheState::Fresh {
            debug!("Cache is {}; refreshing from {}", state, backend.describe());
            return self.refresh(backend);
        }
        self.document()
            .ok_or_else(|| StoreError::internal("fresh cache without a snapshot"))
    }

    /// Refetch the whole Document and overwrite the snapshot, whatever the state
    ///
    /// Failing to persist the snapshot file is logged, not returned: the
    /// in-memory copy is still valid for this process.
    pub fn refresh(&mut self, backend: &dyn Backend) -> StoreResult<&Document> {
        let document = backend.read()?;

        match to_pretty_json(&document).and_then(|json| write_atomic(&self.path, &json)) {
            Ok(()) => debug!("Cache snapshot written to {}", self.path.display()),
            Err(e) => warn!("Could not write cache snapshot: {}", e),
        }

        let snapshot = self.snapshot.insert(Snapshot {
            document,
            fetched_at: Utc::now(),
        });
        Ok(&snapshot.document)
    }

    /// Drop the snapshot and delete its file
    ///
    /// Returns whether a snapshot file existed.
    pub fn invalidate(&mut self) -> StoreResult<bool> {
        self.snapshot = None;

        if !self.path.exists() {
            return Ok(false);
        }
        fs::remove_file(&self.path)
            .map_err(|e| StoreError::io_error(self.path.clone(), IoOperation::Delete, e))?;
        debug!("Invalidated cache snapshot {}", self.path.display());
        Ok(true)
    }
}

/// Deadline carried by the Document itself, if any
pub fn expires_at(document: &Document) -> Option<DateTime<Utc>> {
    EXPIRY_FIELDS
        .iter()
        .find_map(|field| match document.get(*field) {
            Some(Value::String(text)) => parse_timestamp(text),
            _ => None,
        })
}

/// RFC 3339, then `YYYY-MM-DD HH:MM:SS`, then `YYYY-MM-DD`; naive forms are UTC
fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InMemoryBackend;
    use chrono::Duration as ChronoDuration;
    use serde_json::json;
    use tempfile::TempDir;

    fn remote_with(value: Value) -> InMemoryBackend {
        match value {
            Value::Object(document) => InMemoryBackend::with_document(document, true),
            _ => panic!("fixture must be an object"),
        }
    }

    #[test]
    fn test_new_cache_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let cache = CacheLayer::open(temp_dir.path().join("remote.json"), DEFAULT_FRESHNESS);
        assert_eq!(cache.state(), CacheState::Empty);
        assert!(cache.document().is_none());
    }

    #[test]
    fn test_refresh_writes_snapshot_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cache").join("remote.json");
        let backend = remote_with(json!({"a": 1}));
        let mut cache = CacheLayer::open(&path, DEFAULT_FRESHNESS);

        cache.refresh(&backend).unwrap();

        assert_eq!(cache.state(), CacheState::Fresh);
        let on_disk: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk, json!({"a": 1}));
    }

    #[test]
    fn test_fresh_snapshot_is_served_without_backend_call() {
        let temp_dir = TempDir::new().unwrap();
        let backend = remote_with(json!({"a": 1}));
        let mut cache = CacheLayer::open(temp_dir.path().join("remote.json"), DEFAULT_FRESHNESS);

        cache.ensure_fresh(&backend).unwrap();
        cache.ensure_fresh(&backend).unwrap();

        assert_eq!(backend.read_count(), 1);
    }

    #[test]
    fn test_snapshot_on_disk_is_reused_by_new_process() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("remote.json");
        let backend = remote_with(json!({"a": 1}));
        CacheLayer::open(&path, DEFAULT_FRESHNESS)
            .refresh(&backend)
            .unwrap();

        let mut reopened = CacheLayer::open(&path, DEFAULT_FRESHNESS);
        assert_eq!(reopened.state(), CacheState::Fresh);
        let document = reopened.ensure_fresh(&backend).unwrap();
        assert_eq!(document.get("a"), Some(&json!(1)));
        assert_eq!(backend.read_count(), 1);
    }

    #[test]
    fn test_zero_window_is_always_stale() {
        let temp_dir = TempDir::new().unwrap();
        let backend = remote_with(json!({}));
        let mut cache = CacheLayer::open(temp_dir.path().join("remote.json"), Duration::ZERO);

        cache.ensure_fresh(&backend).unwrap();
        assert_eq!(cache.state(), CacheState::Stale);
        cache.ensure_fresh(&backend).unwrap();

        assert_eq!(backend.read_count(), 2);
    }

    #[test]
    fn test_snapshot_goes_stale_after_window() {
        let temp_dir = TempDir::new().unwrap();
        let backend = remote_with(json!({}));
        let mut cache = CacheLayer::open(temp_dir.path().join("remote.json"), DEFAULT_FRESHNESS);
        cache.refresh(&backend).unwrap();

        let later = Utc::now() + ChronoDuration::seconds(3601);
        assert_eq!(cache.state_at(later), CacheState::Stale);
    }

    #[test]
    fn test_expires_at_in_the_past_forces_stale() {
        let temp_dir = TempDir::new().unwrap();
        let backend = remote_with(json!({"expiresAt": "2000-01-01T00:00:00Z"}));
        let mut cache = CacheLayer::open(temp_dir.path().join("remote.json"), DEFAULT_FRESHNESS);

        cache.refresh(&backend).unwrap();

        assert_eq!(cache.state(), CacheState::Stale);
    }

    #[test]
    fn test_expires_at_in_the_future_keeps_fresh() {
        let temp_dir = TempDir::new().unwrap();
        let backend = remote_with(json!({"expires_at": "2999-01-01 00:00:00"}));
        let mut cache = CacheLayer::open(temp_dir.path().join("remote.json"), DEFAULT_FRESHNESS);

        cache.refresh(&backend).unwrap();

        assert_eq!(cache.state(), CacheState::Fresh);
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert!(parse_timestamp("2024-05-01T10:00:00+02:00").is_some());
        assert!(parse_timestamp("2024-05-01 10:00:00").is_some());
        assert_eq!(
            parse_timestamp("2024-05-01").unwrap().to_rfc3339(),
            "2024-05-01T00:00:00+00:00"
        );
        assert!(parse_timestamp("next tuesday").is_none());
    }

    #[test]
    fn test_malformed_snapshot_starts_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("remote.json");
        fs::write(&path, "not json").unwrap();

        let mut cache = CacheLayer::open(&path, DEFAULT_FRESHNESS);
        assert_eq!(cache.state(), CacheState::Empty);

        let backend = remote_with(json!({"a": 2}));
        cache.ensure_fresh(&backend).unwrap();
        assert_eq!(backend.read_count(), 1);
        assert!(fs::read_to_string(&path).unwrap().contains("\"a\": 2"));
    }

    #[test]
    fn test_failed_refresh_keeps_previous_snapshot() {
        let temp_dir = TempDir::new().unwrap();
        let backend = remote_with(json!({"a": 1}));
        let mut cache = CacheLayer::open(temp_dir.path().join("remote.json"), DEFAULT_FRESHNESS);
        cache.refresh(&backend).unwrap();

        backend.set_available(false);
        assert!(cache.refresh(&backend).is_err());
        assert_eq!(cache.document().unwrap().get("a"), Some(&json!(1)));
    }

    #[test]
    fn test_invalidate_deletes_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("remote.json");
        let backend = remote_with(json!({}));
        let mut cache = CacheLayer::open(&path, DEFAULT_FRESHNESS);
        cache.refresh(&backend).unwrap();

        assert!(cache.invalidate().unwrap());
        assert!(!path.exists());
        assert_eq!(cache.state(), CacheState::Empty);
        assert!(!cache.invalidate().unwrap());
    }
}
