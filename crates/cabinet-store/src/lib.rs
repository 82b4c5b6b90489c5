//! Cabinet Storage Module
//!
//! A personal key-value store over a single JSON Document, kept either in a
//! local file or as the one record of a remote document database, with a
//! time-bound local cache in front of the remote case.
//!
//! # Modules
//!
//! - [`store`]: [`KeyValueStore`], `get` / `put` / `remove` over attribute paths
//! - [`backend`]: the [`Backend`] trait and its implementations
//! - [`cache`]: [`CacheLayer`], the freshness-windowed snapshot of a remote Document
//! - [`document`]: navigation, deep merge and leaf removal on the Document
//! - [`infer`] and [`coerce`]: typed values from command-line text, and back
//! - [`config`]: [`CabinetConfig`] and the settings file
//! - [`logging`]: the [`LogSink`] call-out and the daily file log
//! - [`files`]: small read / write helpers
//!
//! **Example Usage**:
//!
//! ```ignore
//! use cabinet_store::{ConfigStore, GetOptions, TracingSink};
//! use serde_json::json;
//!
//! let config = ConfigStore::default_location()?.load()?;
//! let mut store = config.open_store(Box::new(TracingSink))?;
//!
//! store.put(["person", "tyler", "salary"], Some(json!(100)))?;
//! let salary = store.get(["person", "tyler", "salary"], GetOptions::default())?;
//! ```
//!
//! # Features
//!
//! - `surrealdb-backend`: the remote document database backend on SurrealDB

pub mod backend;
pub mod cache;
pub mod coerce;
pub mod config;
pub mod document;
pub mod error;
pub mod files;
pub mod infer;
pub mod logging;
pub mod paths;
pub mod store;

pub use backend::{export, Backend, InMemoryBackend, LocalFileBackend};
#[cfg(feature = "surrealdb-backend")]
pub use backend::{RemoteSettings, SurrealDocumentBackend};
pub use cache::{CacheLayer, CacheState, DEFAULT_FRESHNESS};
pub use coerce::{coerce, ReturnType};
pub use config::{CabinetConfig, ConfigStore, EnvOverrides};
pub use document::{deep_merge, AttributePath, Document};
pub use error::{IoOperation, StoreError, StoreResult};
pub use infer::infer_value;
pub use logging::{DailyFileSink, LogLevel, LogSink, MemorySink, TracingSink};
pub use paths::PathResolver;
pub use store::{GetOptions, KeyValueStore};
