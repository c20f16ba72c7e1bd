//! SQLite driver.
//!
//! Every namespace shares the `cellar_items` table of one database file,
//! with rows keyed by `(namespace, key)`. The namespace column holds the
//! namespace's storage id and is compared case-sensitively. Rows keep the
//! position of their first insertion (`rowid`); re-setting a key is an
//! upsert that leaves the position alone.
//!
//! # Example
//!
//! ```ignore
//! use cellar_drivers::SqliteOpener;
//!
//! let opener = SqliteOpener::new("/var/lib/cellar/cellar.db")?;
//! let store = VersionedStore::open(options, &opener).await?;
//! ```

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;

use cellar_core::error::{CellarError, CellarResult, ErrorCode};
use cellar_core::traits::{DriverOpener, Namespace, StoreDriver};

type SharedConnection = Arc<Mutex<Connection>>;

fn sqlite_error(message: &str, e: rusqlite::Error) -> CellarError {
    CellarError::driver_with_source(format!("{}: {}", message, e), e)
}

fn lock(conn: &SharedConnection) -> CellarResult<std::sync::MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|e| CellarError::driver(format!("Failed to acquire lock: {}", e)))
}

/// Driver over one namespace's rows in the shared table.
pub struct SqliteDriver {
    conn: SharedConnection,
    namespace: String,
}

impl SqliteDriver {
    fn new(conn: SharedConnection, namespace: &Namespace) -> Self {
        tracing::debug!("Opened sqlite namespace {}", namespace);
        Self {
            conn,
            namespace: namespace.storage_id(),
        }
    }
}

#[async_trait]
impl StoreDriver for SqliteDriver {
    async fn set_item(&self, key: &str, value: Value) -> CellarResult<Value> {
        let text = serde_json::to_string(&value)?;
        let conn = lock(&self.conn)?;
        conn.execute(
            "INSERT INTO cellar_items (namespace, key, value) VALUES (?1, ?2, ?3) \
             ON CONFLICT(namespace, key) DO UPDATE SET value = excluded.value",
            params![self.namespace, key, text],
        )
        .map_err(|e| sqlite_error("Failed to write row", e))?;
        tracing::debug!("Wrote '{}' to {}", key, self.namespace);
        Ok(value)
    }

    async fn get_item(&self, key: &str) -> CellarResult<Option<Value>> {
        let text: Option<String> = {
            let conn = lock(&self.conn)?;
            conn.query_row(
                "SELECT value FROM cellar_items WHERE namespace = ?1 AND key = ?2",
                params![self.namespace, key],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| sqlite_error("Failed to read row", e))?
        };
        match text {
            Some(text) => Ok(Some(
                serde_json::from_str(&text).map_err(|e| CellarError::corrupt_value(key, e))?,
            )),
            None => Ok(None),
        }
    }

    async fn get_items(&self) -> CellarResult<Vec<Value>> {
        let rows: Vec<(String, String)> = {
            let conn = lock(&self.conn)?;
            let mut stmt = conn
                .prepare(
                    "SELECT key, value FROM cellar_items WHERE namespace = ?1 ORDER BY rowid",
                )
                .map_err(|e| sqlite_error("Failed to prepare query", e))?;
            let rows = stmt
                .query_map(params![self.namespace], |row| Ok((row.get(0)?, row.get(1)?)))
                .map_err(|e| sqlite_error("Failed to list rows", e))?
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| sqlite_error("Failed to read row", e))?;
            rows
        };
        rows.into_iter()
            .map(|(key, text)| {
                serde_json::from_str(&text).map_err(|e| CellarError::corrupt_value(&key, e))
            })
            .collect()
    }

    async fn remove_item(&self, key: &str) -> CellarResult<()> {
        let conn = lock(&self.conn)?;
        conn.execute(
            "DELETE FROM cellar_items WHERE namespace = ?1 AND key = ?2",
            params![self.namespace, key],
        )
        .map_err(|e| sqlite_error("Failed to delete row", e))?;
        Ok(())
    }

    async fn clear(&self) -> CellarResult<()> {
        let conn = lock(&self.conn)?;
        conn.execute(
            "DELETE FROM cellar_items WHERE namespace = ?1",
            params![self.namespace],
        )
        .map_err(|e| sqlite_error("Failed to clear namespace", e))?;
        Ok(())
    }
}

/// Opens [`SqliteDriver`]s that share one database connection.
pub struct SqliteOpener {
    conn: SharedConnection,
}

impl SqliteOpener {
    /// Open the database at `path`, creating parent directories as needed.
    pub fn new(path: impl AsRef<Path>) -> CellarResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path).map_err(|e| CellarError::Driver {
            message: format!("Failed to open SQLite database: {}", e),
            code: ErrorCode::DrvConnectionFailed,
            source: Some(Box::new(e)),
        })?;
        tracing::debug!("Opened sqlite database {}", path.display());
        Self::from_connection(conn)
    }

    /// In-memory database; contents vanish with the opener.
    pub fn in_memory() -> CellarResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| CellarError::Driver {
            message: format!("Failed to open SQLite database: {}", e),
            code: ErrorCode::DrvConnectionFailed,
            source: Some(Box::new(e)),
        })?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> CellarResult<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS cellar_items (
                namespace TEXT NOT NULL,
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                PRIMARY KEY (namespace, key)
            )",
            [],
        )
        .map_err(|e| sqlite_error("Failed to create table", e))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

#[async_trait]
impl DriverOpener for SqliteOpener {
    async fn open(&self, namespace: &Namespace) -> CellarResult<Arc<dyn StoreDriver>> {
        Ok(Arc::new(SqliteDriver::new(self.conn.clone(), namespace)))
    }
}
