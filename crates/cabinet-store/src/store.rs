//! The key-value facade over a backend and its cache
//!
//! Every operation comes in two flavours. The `try_*` methods return the
//! typed failure so callers can tell "absent" from "broken". The plain
//! methods report recoverable failures through the [`LogSink`] and degrade
//! to `None` or a no-op; only `InvalidArgument` still reaches the caller.

use crate::backend::Backend;
use crate::cache::CacheLayer;
use crate::coerce::{coerce, ReturnType};
use crate::document::{deep_merge, nest, resolve, AttributePath, Document};
use crate::error::{StoreError, StoreResult};
use crate::infer::infer_value;
use crate::logging::{LogLevel, LogSink, TracingSink};
use crate::paths::PathResolver;
use serde_json::Value;
use std::borrow::Cow;
use tracing::{debug, warn};

/// Paths at least this long (value segment included) merge into the
/// existing top-level value; shorter ones replace it.
const MERGE_MIN_SEGMENTS: usize = 3;

/// Options for [`KeyValueStore::get`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GetOptions {
    /// Log a warning naming the missing segment
    pub warn_missing: bool,
    /// Coerce the value before returning it
    pub return_type: Option<ReturnType>,
}

impl GetOptions {
    pub fn warn_missing(mut self, warn_missing: bool) -> Self {
        self.warn_missing = warn_missing;
        self
    }

    pub fn return_type(mut self, return_type: ReturnType) -> Self {
        self.return_type = Some(return_type);
        self
    }
}

/// Nested key-value access to the single Document of a backend
pub struct KeyValueStore {
    backend: Box<dyn Backend>,
    cache: Option<CacheLayer>,
    sink: Box<dyn LogSink>,
}

impl KeyValueStore {
    /// Store without a cache, logging through `tracing`
    pub fn new(backend: Box<dyn Backend>) -> Self {
        Self {
            backend,
            cache: None,
            sink: Box::new(TracingSink),
        }
    }

    /// Serve reads from `cache` when the backend is remote
    pub fn with_cache(mut self, cache: CacheLayer) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Send warnings and recovered errors to `sink`
    pub fn with_sink(mut self, sink: Box<dyn LogSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    /// The cache, if one is attached and the backend is remote
    pub fn cache(&self) -> Option<&CacheLayer> {
        self.cache.as_ref().filter(|_| self.backend.is_remote())
    }

    pub fn cache_mut(&mut self) -> Option<&mut CacheLayer> {
        if self.backend.is_remote() {
            self.cache.as_mut()
        } else {
            None
        }
    }

    /// The Document reads are served from
    pub fn document(&mut self) -> StoreResult<Cow<'_, Document>> {
        match (&mut self.cache, self.backend.is_remote()) {
            (Some(cache), true) => cache.ensure_fresh(self.backend.as_ref()).map(Cow::Borrowed),
            _ => self.backend.read().map(Cow::Owned),
        }
    }

    /// Resolve `path`, expand string results and apply `return_type`
    pub fn try_get<I, S>(&mut self, path: I, return_type: Option<ReturnType>) -> StoreResult<Value>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let path = AttributePath::new(path)?;
        let context = self.backend.describe();
        let document = self.document()?;

        let value = match resolve(&document, &path, &context)? {
            Value::String(s) => Value::String(PathResolver::expand_str(s)),
            other => other.clone(),
        };

        match return_type {
            Some(target) => coerce(&value, target),
            None => Ok(value),
        }
    }

    /// Like [`try_get`](Self::try_get), with failures logged and turned into `None`
    pub fn get<I, S>(&mut self, path: I, options: GetOptions) -> StoreResult<Option<Value>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        match self.try_get(path, options.return_type) {
            Ok(value) => Ok(Some(value)),
            Err(e @ StoreError::AttributeMissing { .. }) => {
                if options.warn_missing {
                    self.report(&e.to_string(), LogLevel::Warning);
                }
                Ok(None)
            }
            Err(e) if e.is_recoverable() => {
                self.report(&e.to_string(), LogLevel::Error);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Store `value` at `path`
    ///
    /// Without a value the last segment is the value, run through
    /// [`infer_value`]. Paths of three or more segments (counting that value
    /// segment) are deep-merged into the existing top-level entry; shorter
    /// paths replace it outright. Returns the value that was stored.
    pub fn try_put<I, S>(&mut self, path: I, value: Option<Value>) -> StoreResult<Value>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut segments: Vec<String> = path.into_iter().map(Into::into).collect();
        let merge = segments.len() >= MERGE_MIN_SEGMENTS;

        let value = match value {
            Some(value) => value,
            None => {
                let raw = segments
                    .pop()
                    .ok_or_else(|| StoreError::invalid_argument("put needs a path"))?;
                infer_value(&raw)
            }
        };
        if segments.is_empty() {
            return Err(StoreError::invalid_argument(
                "put needs at least one key before the value",
            ));
        }
        let path = AttributePath::new(segments)?;

        let partial = nest(path.tail(), value.clone());
        let top = if merge {
            let existing = self.backend.read()?;
            match (existing.get(path.head()), &partial) {
                (Some(Value::Object(old)), Value::Object(new)) => Value::Object(deep_merge(old, new)),
                _ => partial,
            }
        } else {
            partial
        };

        debug!("Writing {} (merge: {})", path, merge);
        self.backend.write(path.head(), top)?;
        self.refresh_after_write();
        Ok(value)
    }

    /// Like [`try_put`](Self::try_put), with failures logged and turned into `None`
    pub fn put<I, S>(&mut self, path: I, value: Option<Value>) -> StoreResult<Option<Value>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        match self.try_put(path, value) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.is_recoverable() => {
                self.report(&format!("Could not store value: {}", e), LogLevel::Error);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Delete the leaf at `path`; empty parents are kept
    pub fn try_remove<I, S>(&mut self, path: I) -> StoreResult<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let path = AttributePath::new(path)?;
        debug!("Removing {}", path);
        self.backend.unset(&path)?;
        self.refresh_after_write();
        Ok(())
    }

    /// Like [`try_remove`](Self::try_remove), with backend failures logged
    ///
    /// An empty path is still an `InvalidArgument` error.
    pub fn remove<I, S>(&mut self, path: I) -> StoreResult<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        match self.try_remove(path) {
            Err(e) if e.is_recoverable() => {
                self.report(&format!("Could not remove value: {}", e), LogLevel::Error);
                Ok(())
            }
            other => other,
        }
    }

    /// Forced refresh: the write already succeeded, so a failure here only
    /// leaves the snapshot stale
    fn refresh_after_write(&mut self) {
        if !self.backend.is_remote() {
            return;
        }
        if let Some(cache) = self.cache.as_mut() {
            if let Err(e) = cache.refresh(self.backend.as_ref()) {
                let _ = cache.invalidate();
                self.report(
                    &format!("Cache refresh after write failed: {}", e),
                    LogLevel::Warning,
                );
            }
        }
    }

    fn report(&self, message: &str, level: LogLevel) {
        if let Err(e) = self.sink.log(message, level) {
            warn!("Log sink rejected message: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{InMemoryBackend, LocalFileBackend};
    use crate::cache::DEFAULT_FRESHNESS;
    use crate::logging::MemorySink;
    use serde_json::json;
    use std::time::Duration;
    use tempfile::TempDir;

    fn local_store() -> (KeyValueStore, InMemoryBackend, MemorySink) {
        let backend = InMemoryBackend::local();
        let sink = MemorySink::new();
        let store = KeyValueStore::new(Box::new(backend.clone())).with_sink(Box::new(sink.clone()));
        (store, backend, sink)
    }

    fn remote_store(
        temp_dir: &TempDir,
        freshness: Duration,
    ) -> (KeyValueStore, InMemoryBackend, MemorySink) {
        let backend = InMemoryBackend::remote();
        let sink = MemorySink::new();
        let cache = CacheLayer::open(temp_dir.path().join("remote.json"), freshness);
        let store = KeyValueStore::new(Box::new(backend.clone()))
            .with_cache(cache)
            .with_sink(Box::new(sink.clone()));
        (store, backend, sink)
    }

    fn get(store: &mut KeyValueStore, path: &[&str]) -> Option<Value> {
        store.get(path.iter().copied(), GetOptions::default()).unwrap()
    }

    #[test]
    fn test_put_then_get_round_trip() {
        let (mut store, _, _) = local_store();

        let stored = store
            .put(["person", "tyler", "salary"], Some(json!(100)))
            .unwrap();

        assert_eq!(stored, Some(json!(100)));
        assert_eq!(get(&mut store, &["person", "tyler", "salary"]), Some(json!(100)));
    }

    #[test]
    fn test_put_infers_value_from_last_segment() {
        let (mut store, backend, _) = local_store();

        let stored = store.put(["a", "b", "2.5"], None).unwrap();

        assert_eq!(stored, Some(json!(2.5)));
        assert_eq!(Value::Object(backend.snapshot()), json!({"a": {"b": 2.5}}));
    }

    #[test]
    fn test_merge_preserves_untouched_siblings() {
        let (mut store, _, _) = local_store();

        store.put(["a", "b", "c"], Some(json!(1))).unwrap();
        store.put(["a", "b", "d"], Some(json!(2))).unwrap();

        assert_eq!(get(&mut store, &["a", "b", "c"]), Some(json!(1)));
        assert_eq!(get(&mut store, &["a", "b", "d"]), Some(json!(2)));
    }

    #[test]
    fn test_implicit_value_of_length_three_merges() {
        let (mut store, backend, _) = local_store();

        store.put(["a", "x", "1"], None).unwrap();
        store.put(["a", "y", "2"], None).unwrap();

        assert_eq!(Value::Object(backend.snapshot()), json!({"a": {"x": 1, "y": 2}}));
    }

    #[test]
    fn test_two_segment_put_replaces_top_level_value() {
        let (mut store, _, _) = local_store();
        store.put(["a", "y"], Some(json!(2))).unwrap();

        store.put(["a", "x"], Some(json!(1))).unwrap();

        assert_eq!(get(&mut store, &["a", "y"]), None);
        assert_eq!(get(&mut store, &["a", "x"]), Some(json!(1)));
    }

    #[test]
    fn test_merge_replaces_scalar_top_level_value() {
        let (mut store, backend, _) = local_store();
        store.put(["a"], Some(json!(5))).unwrap();

        store.put(["a", "b", "c"], Some(json!(1))).unwrap();

        assert_eq!(Value::Object(backend.snapshot()), json!({"a": {"b": {"c": 1}}}));
    }

    #[test]
    fn test_put_needs_a_key() {
        let (mut store, _, _) = local_store();
        assert!(matches!(
            store.put(["only-a-value"], None),
            Err(StoreError::InvalidArgument { .. })
        ));
        assert!(matches!(
            store.put(Vec::<String>::new(), Some(json!(1))),
            Err(StoreError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_missing_path_returns_none_and_warns_once() {
        let (mut store, _, sink) = local_store();

        let value = store
            .get(["nonexistent"], GetOptions::default().warn_missing(true))
            .unwrap();

        assert_eq!(value, None);
        assert_eq!(sink.records().len(), 1);
        let (level, message) = &sink.records()[0];
        assert_eq!(*level, LogLevel::Warning);
        assert_eq!(message, "nonexistent not found in memory://local");
    }

    #[test]
    fn test_missing_path_is_silent_without_warn_missing() {
        let (mut store, _, sink) = local_store();
        assert_eq!(get(&mut store, &["nonexistent"]), None);
        assert!(sink.records().is_empty());
    }

    #[test]
    fn test_missing_nested_segment_names_parent() {
        let (mut store, _, sink) = local_store();
        store.put(["a", "b"], Some(json!(1))).unwrap();

        store
            .get(["a", "c"], GetOptions::default().warn_missing(true))
            .unwrap();

        assert_eq!(sink.records()[0].1, "c not found in {\"b\":1}");
    }

    #[test]
    fn test_try_get_distinguishes_missing() {
        let (mut store, _, _) = local_store();
        assert!(matches!(
            store.try_get(["x"], None),
            Err(StoreError::AttributeMissing { .. })
        ));
    }

    #[test]
    fn test_get_expands_string_paths() {
        let (mut store, _, _) = local_store();
        store.put(["dir"], Some(json!("~/notes"))).unwrap();

        let value = get(&mut store, &["dir"]).unwrap();

        let home = dirs::home_dir().unwrap();
        assert_eq!(value, json!(format!("{}/notes", home.to_string_lossy().trim_end_matches('/'))));
    }

    #[test]
    fn test_return_type_coercion() {
        let (mut store, _, sink) = local_store();
        store.put(["n"], Some(json!("42"))).unwrap();

        let value = store
            .get(["n"], GetOptions::default().return_type(ReturnType::Integer))
            .unwrap();
        assert_eq!(value, Some(json!(42)));

        let value = store
            .get(["n"], GetOptions::default().return_type(ReturnType::Map))
            .unwrap();
        assert_eq!(value, None);
        assert_eq!(sink.count(LogLevel::Error), 1);
    }

    #[test]
    fn test_remove_then_get() {
        let (mut store, backend, _) = local_store();
        store.put(["a", "b"], Some(json!(1))).unwrap();

        store.remove(["a", "b"]).unwrap();

        assert_eq!(get(&mut store, &["a", "b"]), None);
        assert_eq!(Value::Object(backend.snapshot()), json!({"a": {}}));
    }

    #[test]
    fn test_remove_top_level_key() {
        let (mut store, backend, _) = local_store();
        store.put(["a"], Some(json!(1))).unwrap();
        store.put(["b"], Some(json!(2))).unwrap();

        store.remove(["a"]).unwrap();

        assert_eq!(Value::Object(backend.snapshot()), json!({"b": 2}));
    }

    #[test]
    fn test_remove_empty_path_rejected() {
        let (mut store, _, _) = local_store();
        assert!(matches!(
            store.remove(Vec::<String>::new()),
            Err(StoreError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_backend_failures_are_logged_not_raised() {
        let (mut store, backend, sink) = local_store();
        backend.set_available(false);

        assert_eq!(store.put(["a", "b", "c"], Some(json!(1))).unwrap(), None);
        assert_eq!(store.put(["a", "b"], None).unwrap(), None);
        store.remove(["a"]).unwrap();
        assert_eq!(get(&mut store, &["a"]), None);

        assert_eq!(sink.count(LogLevel::Error), 4);
        assert!(matches!(
            store.try_remove(["a"]),
            Err(StoreError::BackendUnavailable { .. })
        ));
    }

    #[test]
    fn test_remote_reads_hit_cache_within_window() {
        let temp_dir = TempDir::new().unwrap();
        let (mut store, backend, _) = remote_store(&temp_dir, DEFAULT_FRESHNESS);
        store.put(["a"], Some(json!(1))).unwrap();
        let reads = backend.read_count();

        assert_eq!(get(&mut store, &["a"]), Some(json!(1)));
        assert_eq!(get(&mut store, &["a"]), Some(json!(1)));

        assert_eq!(backend.read_count(), reads);
    }

    #[test]
    fn test_stale_snapshot_is_refetched() {
        let temp_dir = TempDir::new().unwrap();
        let (mut store, backend, _) = remote_store(&temp_dir, Duration::ZERO);
        store.put(["a"], Some(json!(1))).unwrap();
        let reads = backend.read_count();

        get(&mut store, &["a"]);
        get(&mut store, &["a"]);

        assert_eq!(backend.read_count(), reads + 2);
    }

    #[test]
    fn test_put_forces_cache_refresh() {
        let temp_dir = TempDir::new().unwrap();
        let (mut store, backend, _) = remote_store(&temp_dir, DEFAULT_FRESHNESS);
        assert_eq!(get(&mut store, &["a"]), None);

        backend.write("a", json!("changed elsewhere")).unwrap();
        assert_eq!(get(&mut store, &["a"]), None);

        store.put(["b"], Some(json!(2))).unwrap();
        assert_eq!(get(&mut store, &["a"]), Some(json!("changed elsewhere")));
        assert_eq!(store.cache().unwrap().state(), crate::CacheState::Fresh);
    }

    #[test]
    fn test_remote_get_fails_soft_when_offline() {
        let temp_dir = TempDir::new().unwrap();
        let (mut store, backend, sink) = remote_store(&temp_dir, DEFAULT_FRESHNESS);
        backend.set_available(false);

        assert_eq!(get(&mut store, &["a"]), None);
        assert_eq!(sink.count(LogLevel::Error), 1);
    }

    #[test]
    fn test_local_store_has_no_cache() {
        let temp_dir = TempDir::new().unwrap();
        let backend = LocalFileBackend::open(temp_dir.path().join("data.json")).unwrap();
        let cache = CacheLayer::open(temp_dir.path().join("remote.json"), DEFAULT_FRESHNESS);
        let mut store = KeyValueStore::new(Box::new(backend)).with_cache(cache);

        store.put(["a"], Some(json!(1))).unwrap();

        assert!(store.cache().is_none());
        assert!(!temp_dir.path().join("remote.json").exists());
        assert_eq!(get(&mut store, &["a"]), Some(json!(1)));
    }
}
