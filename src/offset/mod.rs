//! Offset tracking module
//!
//! Remembers, per product, the highest trade id already delivered to a feed
//! consumer. A product that was never tracked reads back as [`NO_OFFSET`].

mod memory;
mod sqlite;

pub use memory::MemoryOffsetStore;
pub use sqlite::SqliteOffsetStore;

use async_trait::async_trait;
use thiserror::Error;

/// Offset of a product no trade has been delivered for yet
pub const NO_OFFSET: i64 = -1;

/// Offset store errors
#[derive(Debug, Error)]
pub enum OffsetError {
    /// Underlying SQLite failure
    #[error("Offset database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Blocking storage task did not complete
    #[error("Offset storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Trait for per-product offset persistence
///
/// Writes overwrite the previous value; concurrent writers for the same
/// product resolve last-write-wins.
#[async_trait]
pub trait OffsetStore: Send + Sync {
    /// Read the stored offset, or [`NO_OFFSET`] when the product has none
    async fn get_offset(&self, product_id: &str) -> Result<i64, OffsetError>;

    /// Persist `value` as the product's offset, durable before returning
    async fn set_offset(&self, product_id: &str, value: i64) -> Result<(), OffsetError>;
}
