//! Remote document database backend on SurrealDB
//!
//! The Document is the `doc` field of the one record of a table (the
//! "collection"), so user keys never collide with record fields such as `id`.
//! Writes and unsets target every record of the table, and construction
//! guarantees that there is exactly one.
//!
//! ## Modes
//!
//! - **Embedded (Memory)**: `mem://` - In-memory, no persistence (testing)
//! - **Client (WebSocket)**: `ws://host:port` or `wss://host:port` - Remote server
//!
//! The async client is driven from the blocking [`Backend`] interface on a
//! private current-thread tokio runtime.

use std::future::Future;
use std::time::Duration;

use serde_json::Value;
use surrealdb::engine::local::{Db as LocalDb, Mem};
use surrealdb::engine::remote::ws::{Client as WsClient, Ws, Wss};
use surrealdb::opt::auth::Root;
use surrealdb::{Connection, Surreal};
use tokio::runtime::Runtime;
use tracing::{debug, info};

use super::Backend;
use crate::document::{AttributePath, Document};
use crate::error::{StoreError, StoreResult};

/// Record field holding the Document
const DOCUMENT_FIELD: &str = "doc";

/// Connection settings for the remote document database
#[derive(Debug, Clone)]
pub struct RemoteSettings {
    /// `ws://host:port`, `wss://host:port` or `mem://`
    pub url: String,
    pub username: String,
    pub password: String,
    pub namespace: String,
    pub database: String,
    /// Table holding the single Document record
    pub collection: String,
    /// Bound on connecting, signing in and selecting the database
    pub timeout: Duration,
}

impl RemoteSettings {
    /// Settings for an embedded in-memory database
    pub fn in_memory(collection: impl Into<String>) -> Self {
        Self {
            url: "mem://".to_string(),
            username: String::new(),
            password: String::new(),
            namespace: "cabinet".to_string(),
            database: "main".to_string(),
            collection: collection.into(),
            timeout: Duration::from_secs(5),
        }
    }
}

/// Embedded or remote client
enum DatabaseClient {
    Local(Surreal<LocalDb>),
    Remote(Surreal<WsClient>),
}

/// Document stored as the single record of a SurrealDB table
pub struct SurrealDocumentBackend {
    runtime: Runtime,
    client: DatabaseClient,
    settings: RemoteSettings,
}

impl SurrealDocumentBackend {
    /// Connect, authenticate and make sure the collection holds one record
    ///
    /// Fails with `BackendUnavailable` when any step errors or the whole
    /// sequence exceeds `settings.timeout`.
    pub fn connect(settings: RemoteSettings) -> StoreResult<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| StoreError::internal(format!("Failed to start runtime: {}", e)))?;

        let unavailable = |message: String| StoreError::backend_unavailable(&settings.url, message);

        let client = runtime
            .block_on(async {
                tokio::time::timeout(settings.timeout, open_client(&settings)).await
            })
            .map_err(|_| {
                unavailable(format!(
                    "no response within {}s",
                    settings.timeout.as_secs_f32()
                ))
            })?
            .map_err(unavailable)?;

        let backend = Self {
            runtime,
            client,
            settings,
        };
        backend.ensure_single_record()?;
        Ok(backend)
    }

    pub fn settings(&self) -> &RemoteSettings {
        &self.settings
    }

    fn unavailable(&self, error: surrealdb::Error) -> StoreError {
        StoreError::backend_unavailable(self.describe(), error.to_string())
    }

    fn run<T, F>(&self, future: F) -> StoreResult<T>
    where
        F: Future<Output = Result<T, surrealdb::Error>>,
    {
        self.runtime.block_on(future).map_err(|e| self.unavailable(e))
    }

    fn fetch_all(&self) -> StoreResult<Vec<Value>> {
        let table = self.settings.collection.clone();
        match &self.client {
            DatabaseClient::Local(db) => self.run(select_records(db, table)),
            DatabaseClient::Remote(db) => self.run(select_records(db, table)),
        }
    }

    fn execute(&self, statement: String, value: Option<Value>) -> StoreResult<()> {
        let table = self.settings.collection.clone();
        match &self.client {
            DatabaseClient::Local(db) => self.run(execute(db, statement, table, value)),
            DatabaseClient::Remote(db) => self.run(execute(db, statement, table, value)),
        }
    }

    fn ensure_single_record(&self) -> StoreResult<()> {
        match self.fetch_all()?.first() {
            None => {
                info!(
                    "Collection {} is empty; creating its document",
                    self.settings.collection
                );
                self.execute(
                    format!("CREATE type::table($tb) CONTENT {{ {}: {{}} }}", DOCUMENT_FIELD),
                    None,
                )?;
            }
            Some(Value::Null) => {
                info!(
                    "Record in {} has no {} field; initialising it",
                    self.settings.collection, DOCUMENT_FIELD
                );
                self.execute(
                    format!("UPDATE type::table($tb) SET {} = {{}}", DOCUMENT_FIELD),
                    None,
                )?;
            }
            Some(_) => {}
        }
        Ok(())
    }
}

async fn open_client(settings: &RemoteSettings) -> Result<DatabaseClient, String> {
    let client = if settings.url.starts_with("mem://") {
        info!("Connecting to SurrealDB in-memory mode");
        let db = Surreal::new::<Mem>(())
            .await
            .map_err(|e| format!("Failed to connect: {}", e))?;
        DatabaseClient::Local(db)
    } else {
        info!("Connecting to SurrealDB remote at {}", settings.url);
        let db = if let Some(address) = settings.url.strip_prefix("wss://") {
            Surreal::new::<Wss>(address).await
        } else {
            let address = settings.url.strip_prefix("ws://").unwrap_or(&settings.url);
            Surreal::new::<Ws>(address).await
        }
        .map_err(|e| format!("Failed to connect: {}", e))?;

        db.signin(Root {
            username: settings.username.as_str(),
            password: settings.password.as_str(),
        })
        .await
        .map_err(|e| format!("Authentication failed: {}", e))?;

        DatabaseClient::Remote(db)
    };

    let selected = match &client {
        DatabaseClient::Local(db) => db.use_ns(&settings.namespace).use_db(&settings.database).await,
        DatabaseClient::Remote(db) => db.use_ns(&settings.namespace).use_db(&settings.database).await,
    };
    selected.map_err(|e| format!("Database selection failed: {}", e))?;

    debug!(
        "Connected to SurrealDB namespace={} database={}",
        settings.namespace, settings.database
    );
    Ok(client)
}

async fn select_records<C: Connection>(
    db: &Surreal<C>,
    table: String,
) -> Result<Vec<Value>, surrealdb::Error> {
    let mut response = db
        .query(format!(
            "SELECT VALUE {} FROM type::table($tb) LIMIT 1",
            DOCUMENT_FIELD
        ))
        .bind(("tb", table))
        .await?;
    response.take(0)
}

async fn execute<C: Connection>(
    db: &Surreal<C>,
    statement: String,
    table: String,
    value: Option<Value>,
) -> Result<(), surrealdb::Error> {
    let query = db.query(statement).bind(("tb", table));
    let query = match value {
        Some(value) => query.bind(("value", value)),
        None => query,
    };
    query.await?.check()?;
    Ok(())
}

/// Quote a field name so any key is a valid identifier
fn quote_ident(name: &str) -> String {
    format!("⟨{}⟩", name.replace('⟩', "\\⟩"))
}

/// Dotted path to a field inside the Document
fn field_path(segments: &[String]) -> String {
    std::iter::once(DOCUMENT_FIELD.to_string())
        .chain(segments.iter().map(|s| quote_ident(s)))
        .collect::<Vec<_>>()
        .join(".")
}

/// Find an integer the database cannot hold
///
/// SurrealDB integers are signed 64-bit; larger unsigned values would wrap.
fn find_unrepresentable(value: &Value) -> Option<&serde_json::Number> {
    match value {
        Value::Number(n) if n.is_u64() && !n.is_i64() => Some(n),
        Value::Array(items) => items.iter().find_map(find_unrepresentable),
        Value::Object(map) => map.values().find_map(find_unrepresentable),
        _ => None,
    }
}

impl Backend for SurrealDocumentBackend {
    fn describe(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            self.settings.url.trim_end_matches('/'),
            self.settings.namespace,
            self.settings.database,
            self.settings.collection
        )
    }

    fn is_remote(&self) -> bool {
        true
    }

    fn read(&self) -> StoreResult<Document> {
        let records = self.fetch_all()?;
        match records.into_iter().next() {
            Some(Value::Object(document)) => Ok(document),
            Some(Value::Null) | None => Ok(Document::new()),
            Some(other) => Err(StoreError::backend_unavailable(
                self.describe(),
                format!("{} field is not an object: {}", DOCUMENT_FIELD, other),
            )),
        }
    }

    fn write(&self, key: &str, value: Value) -> StoreResult<()> {
        if let Some(n) = find_unrepresentable(&value) {
            return Err(StoreError::type_coercion(
                n.to_string(),
                "integer",
                format!("{} only stores integers up to {}", self.describe(), i64::MAX),
            ));
        }
        debug!("SET {} on {}", key, self.settings.collection);
        let statement = format!(
            "UPDATE type::table($tb) SET {} = $value",
            field_path(&[key.to_string()])
        );
        self.execute(statement, Some(value))
    }

    fn unset(&self, path: &AttributePath) -> StoreResult<()> {
        debug!("UNSET {} on {}", path, self.settings.collection);
        let statement = format!(
            "UPDATE type::table($tb) UNSET {}",
            field_path(path.segments())
        );
        self.execute(statement, None)
    }
}
