//! Cabinet settings: which backend to use and where files live
//!
//! Settings are one JSON file (default `~/.config/cabinet/config.json`).
//! Environment variables with the `CABINET_` prefix override individual
//! fields after the file is loaded, e.g. `CABINET_REMOTE_URL` sets
//! `remote_url`.

use crate::backend::{Backend, LocalFileBackend};
use crate::cache::CacheLayer;
use crate::document::to_pretty_json;
use crate::error::{IoOperation, StoreError, StoreResult};
use crate::logging::LogSink;
use crate::paths::PathResolver;
use crate::store::KeyValueStore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

const DEFAULT_COLLECTION: &str = "cabinet";
const DEFAULT_TIMEOUT_SECS: u64 = 5;
const DEFAULT_CACHE_TTL_SECS: u64 = 3600;

/// Persisted settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CabinetConfig {
    /// Use the remote document database instead of the local file
    pub remote_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_namespace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_database: Option<String>,
    pub remote_collection: String,
    /// Bound on establishing the remote connection
    pub remote_timeout_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path_cache: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path_dir_log: Option<String>,
    /// Freshness window of the remote cache
    pub cache_ttl_secs: u64,
}

impl Default for CabinetConfig {
    fn default() -> Self {
        Self {
            remote_enabled: false,
            remote_url: None,
            remote_username: None,
            remote_password: None,
            remote_namespace: None,
            remote_database: None,
            remote_collection: DEFAULT_COLLECTION.to_string(),
            remote_timeout_secs: DEFAULT_TIMEOUT_SECS,
            path_data: None,
            path_cache: None,
            path_dir_log: None,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
        }
    }
}

impl CabinetConfig {
    /// Local data file, expanded
    pub fn data_path(&self) -> StoreResult<PathBuf> {
        Self::resolve(&self.path_data, PathResolver::default_data_file)
    }

    /// Remote cache snapshot, expanded
    pub fn cache_path(&self) -> StoreResult<PathBuf> {
        Self::resolve(&self.path_cache, PathResolver::default_cache_file)
    }

    /// Log directory, expanded
    pub fn log_dir(&self) -> StoreResult<PathBuf> {
        Self::resolve(&self.path_dir_log, PathResolver::default_log_dir)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    fn resolve(
        configured: &Option<String>,
        fallback: fn() -> StoreResult<PathBuf>,
    ) -> StoreResult<PathBuf> {
        match configured {
            Some(raw) if !raw.trim().is_empty() => Ok(PathBuf::from(PathResolver::expand_str(raw))),
            _ => fallback(),
        }
    }

    /// Remote settings that are required but unset, in declaration order
    pub fn missing_remote_fields(&self) -> Vec<&'static str> {
        if !self.remote_enabled {
            return Vec::new();
        }

        [
            ("remote_url", &self.remote_url),
            ("remote_username", &self.remote_username),
            ("remote_password", &self.remote_password),
            ("remote_namespace", &self.remote_namespace),
            ("remote_database", &self.remote_database),
        ]
        .into_iter()
        .filter(|(_, value)| value.as_deref().map_or(true, |v| v.trim().is_empty()))
        .map(|(field, _)| field)
        .collect()
    }

    /// Check that every remote credential is present when remote is enabled
    pub fn validate(&self) -> StoreResult<()> {
        let missing = self.missing_remote_fields();
        if !missing.is_empty() {
            return Err(StoreError::validation_error(
                missing.join(", "),
                "required when remote_enabled is true",
            ));
        }
        if self.remote_collection.trim().is_empty() {
            return Err(StoreError::validation_error(
                "remote_collection",
                "must not be empty",
            ));
        }
        Ok(())
    }

    /// Build the store these settings describe
    ///
    /// The remote backend connects eagerly; a failure here is
    /// `BackendUnavailable` and callers are expected to treat it as fatal.
    pub fn open_store(&self, sink: Box<dyn LogSink>) -> StoreResult<KeyValueStore> {
        let backend = self.open_backend()?;
        let mut store = KeyValueStore::new(backend).with_sink(sink);
        if self.remote_enabled {
            store = store.with_cache(CacheLayer::open(self.cache_path()?, self.cache_ttl()));
        }
        Ok(store)
    }

    fn open_backend(&self) -> StoreResult<Box<dyn Backend>> {
        if !self.remote_enabled {
            return Ok(Box::new(LocalFileBackend::open(self.data_path()?)?));
        }
        self.validate()?;
        self.open_remote()
    }

    #[cfg(feature = "surrealdb-backend")]
    fn open_remote(&self) -> StoreResult<Box<dyn Backend>> {
        use crate::backend::{RemoteSettings, SurrealDocumentBackend};

        let settings = RemoteSettings {
            url: self.remote_url.clone().unwrap_or_default(),
            username: self.remote_username.clone().unwrap_or_default(),
            password: self.remote_password.clone().unwrap_or_default(),
            namespace: self.remote_namespace.clone().unwrap_or_default(),
            database: self.remote_database.clone().unwrap_or_default(),
            collection: self.remote_collection.clone(),
            timeout: Duration::from_secs(self.remote_timeout_secs),
        };
        Ok(Box::new(SurrealDocumentBackend::connect(settings)?))
    }

    #[cfg(not(feature = "surrealdb-backend"))]
    fn open_remote(&self) -> StoreResult<Box<dyn Backend>> {
        Err(StoreError::backend_unavailable(
            self.remote_url.clone().unwrap_or_default(),
            "this build has no remote backend (enable the surrealdb-backend feature)",
        ))
    }
}

/// Environment variable override support
pub struct EnvOverrides;

impl EnvOverrides {
    /// Collect `CABINET_*` variables, keyed by lowercased field name
    pub fn parse() -> HashMap<String, String> {
        std::env::vars()
            .filter_map(|(key, value)| {
                key.strip_prefix("CABINET_")
                    .map(|field| (field.to_lowercase(), value))
            })
            .collect()
    }

    /// Apply the process environment to `config`
    pub fn apply(config: &mut CabinetConfig) {
        Self::apply_overrides(config, &Self::parse());
    }

    /// Apply specific overrides; unknown keys and unparsable numbers are ignored
    pub fn apply_overrides(config: &mut CabinetConfig, overrides: &HashMap<String, String>) {
        for (field, value) in overrides {
            Self::set_field(config, field, value);
        }
    }

    fn set_field(config: &mut CabinetConfig, field: &str, value: &str) {
        match field {
            "remote_enabled" => {
                if let Some(flag) = parse_flag(value) {
                    config.remote_enabled = flag;
                }
            }
            "remote_url" => config.remote_url = Some(value.to_string()),
            "remote_username" => config.remote_username = Some(value.to_string()),
            "remote_password" => config.remote_password = Some(value.to_string()),
            "remote_namespace" => config.remote_namespace = Some(value.to_string()),
            "remote_database" => config.remote_database = Some(value.to_string()),
            "remote_collection" => config.remote_collection = value.to_string(),
            "remote_timeout_secs" => {
                if let Ok(secs) = value.trim().parse() {
                    config.remote_timeout_secs = secs;
                }
            }
            "path_data" => config.path_data = Some(value.to_string()),
            "path_cache" => config.path_cache = Some(value.to_string()),
            "path_dir_log" => config.path_dir_log = Some(value.to_string()),
            "cache_ttl_secs" => {
                if let Ok(secs) = value.trim().parse() {
                    config.cache_ttl_secs = secs;
                }
            }
            _ => {}
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Reads and writes the settings file
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Settings file at `CABINET_CONFIG` or the default location
    pub fn default_location() -> StoreResult<Self> {
        Ok(Self::new(PathResolver::resolve_config_file()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the file (defaults when missing), then apply environment overrides
    pub fn load(&self) -> StoreResult<CabinetConfig> {
        let mut config = self.load_file()?;
        EnvOverrides::apply(&mut config);
        Ok(config)
    }

    /// Load the file alone, without environment overrides
    pub fn load_file(&self) -> StoreResult<CabinetConfig> {
        if !self.path.exists() {
            debug!("No config at {}; using defaults", self.path.display());
            return Ok(CabinetConfig::default());
        }

        let content = fs::read_to_string(&self.path)
            .map_err(|e| StoreError::io_error(self.path.clone(), IoOperation::Read, e))?;
        serde_json::from_str(&content)
            .map_err(|e| StoreError::malformed(self.path.clone(), e.to_string()))
    }

    /// Write `config` as indented JSON, creating parent directories
    pub fn save(&self, config: &CabinetConfig) -> StoreResult<()> {
        let value = serde_json::to_value(config)
            .map_err(|e| StoreError::internal(format!("Failed to serialize config: {}", e)))?;
        let document = match value {
            serde_json::Value::Object(map) => map,
            _ => return Err(StoreError::internal("config did not serialize to an object")),
        };
        let json = to_pretty_json(&document)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)
                    .map_err(|e| StoreError::directory_creation_failed(parent.to_path_buf(), e))?;
            }
        }
        fs::write(&self.path, json)
            .map_err(|e| StoreError::io_error(self.path.clone(), IoOperation::Write, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::MemorySink;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let store = ConfigStore::new(temp_dir.path().join("config.json"));

        let config = store.load_file().unwrap();

        assert_eq!(config, CabinetConfig::default());
        assert_eq!(config.remote_collection, "cabinet");
        assert_eq!(config.cache_ttl(), Duration::from_secs(3600));
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let store = ConfigStore::new(temp_dir.path().join("nested").join("config.json"));
        let config = CabinetConfig {
            path_data: Some("/tmp/data.json".to_string()),
            cache_ttl_secs: 60,
            ..CabinetConfig::default()
        };

        store.save(&config).unwrap();

        assert_eq!(store.load_file().unwrap(), config);
        let text = fs::read_to_string(store.path()).unwrap();
        assert!(text.contains("\n    \"path_data\": \"/tmp/data.json\""));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(&path, r#"{"remote_enabled": true, "remote_url": "ws://db:8000"}"#).unwrap();

        let config = ConfigStore::new(&path).load_file().unwrap();

        assert!(config.remote_enabled);
        assert_eq!(config.remote_url.as_deref(), Some("ws://db:8000"));
        assert_eq!(config.remote_timeout_secs, 5);
    }

    #[test]
    fn test_malformed_file_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(&path, "{nope").unwrap();

        assert!(matches!(
            ConfigStore::new(&path).load_file(),
            Err(StoreError::MalformedDocument { .. })
        ));
    }

    #[test]
    fn test_apply_overrides() {
        let mut config = CabinetConfig::default();
        let overrides: HashMap<String, String> = [
            ("remote_enabled", "yes"),
            ("remote_url", "ws://db:8000"),
            ("cache_ttl_secs", "10"),
            ("remote_timeout_secs", "not-a-number"),
            ("home", "/ignored"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        EnvOverrides::apply_overrides(&mut config, &overrides);

        assert!(config.remote_enabled);
        assert_eq!(config.remote_url.as_deref(), Some("ws://db:8000"));
        assert_eq!(config.cache_ttl_secs, 10);
        assert_eq!(config.remote_timeout_secs, 5);
    }

    #[test]
    fn test_validate_lists_missing_remote_fields() {
        let config = CabinetConfig {
            remote_enabled: true,
            remote_url: Some("ws://db:8000".to_string()),
            remote_password: Some("  ".to_string()),
            ..CabinetConfig::default()
        };

        assert_eq!(
            config.missing_remote_fields(),
            vec![
                "remote_username",
                "remote_password",
                "remote_namespace",
                "remote_database"
            ]
        );
        match config.validate().unwrap_err() {
            StoreError::ValidationError { field, .. } => {
                assert_eq!(
                    field,
                    "remote_username, remote_password, remote_namespace, remote_database"
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_local_config_needs_no_credentials() {
        assert!(CabinetConfig::default().validate().is_ok());
    }

    #[test]
    fn test_configured_paths_are_expanded() {
        std::env::set_var("CABINET_CONFIG_TEST_ROOT", "/srv/cabinet");
        let config = CabinetConfig {
            path_data: Some("$CABINET_CONFIG_TEST_ROOT/data.json".to_string()),
            path_dir_log: Some("~/logs".to_string()),
            ..CabinetConfig::default()
        };

        assert_eq!(config.data_path().unwrap(), PathBuf::from("/srv/cabinet/data.json"));
        assert!(config.log_dir().unwrap().ends_with("logs"));
        assert!(!config.log_dir().unwrap().to_string_lossy().contains('~'));
        std::env::remove_var("CABINET_CONFIG_TEST_ROOT");
    }

    #[test]
    fn test_open_store_local() {
        let temp_dir = TempDir::new().unwrap();
        let config = CabinetConfig {
            path_data: Some(temp_dir.path().join("data.json").display().to_string()),
            ..CabinetConfig::default()
        };

        let mut store = config.open_store(Box::new(MemorySink::new())).unwrap();
        store.put(["k"], Some(json!("v"))).unwrap();

        assert!(!store.backend().is_remote());
        assert!(temp_dir.path().join("data.json").exists());
    }

    #[test]
    fn test_open_store_remote_without_credentials_fails() {
        let config = CabinetConfig {
            remote_enabled: true,
            ..CabinetConfig::default()
        };
        assert!(matches!(
            config.open_store(Box::new(MemorySink::new())),
            Err(StoreError::ValidationError { .. })
        ));
    }
}
