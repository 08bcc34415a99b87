//! SQLite-backed offset store
//!
//! One table keyed by product id replaces a file per product.

use super::{OffsetError, OffsetStore, NO_OFFSET};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Offsets persisted in a single SQLite table
#[derive(Clone)]
pub struct SqliteOffsetStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteOffsetStore {
    /// Open (or create) the offset database at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self, OffsetError> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        tracing::debug!(path = %path.display(), "Opened offset store");
        Self::from_connection(conn)
    }

    /// Open a store that lives only as long as this process
    pub fn open_in_memory() -> Result<Self, OffsetError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, OffsetError> {
        ensure_table(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T, OffsetError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let conn = self.conn.clone();
        let result = tokio::task::spawn_blocking(move || {
            // Poisoned lock is still usable: statements commit atomically
            let guard = conn.lock().unwrap_or_else(|e| e.into_inner());
            f(&guard)
        })
        .await??;
        Ok(result)
    }
}

fn ensure_table(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS offsets (
             prod_id       TEXT    PRIMARY KEY,
             last_trade_id INTEGER NOT NULL
         );",
    )
}

#[async_trait]
impl OffsetStore for SqliteOffsetStore {
    async fn get_offset(&self, product_id: &str) -> Result<i64, OffsetError> {
        let product = product_id.to_string();
        let stored = self
            .with_conn(move |conn| {
                conn.query_row(
                    "SELECT last_trade_id FROM offsets WHERE prod_id = ?1",
                    params![product],
                    |row| row.get::<_, i64>(0),
                )
                .optional()
            })
            .await?;

        Ok(stored.unwrap_or(NO_OFFSET))
    }

    async fn set_offset(&self, product_id: &str, value: i64) -> Result<(), OffsetError> {
        let product = product_id.to_string();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO offsets (prod_id, last_trade_id) VALUES (?1, ?2)
                 ON CONFLICT(prod_id) DO UPDATE SET last_trade_id = excluded.last_trade_id",
                params![product, value],
            )
        })
        .await?;

        tracing::debug!(prod_id = %product_id, offset = value, "Stored offset");
        Ok(())
    }
}
