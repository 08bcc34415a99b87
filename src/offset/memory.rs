//! In-memory offset store

use super::{OffsetError, OffsetStore, NO_OFFSET};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Offsets held in process memory, lost on restart
#[derive(Debug, Default)]
pub struct MemoryOffsetStore {
    offsets: RwLock<HashMap<String, i64>>,
}

impl MemoryOffsetStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OffsetStore for MemoryOffsetStore {
    async fn get_offset(&self, product_id: &str) -> Result<i64, OffsetError> {
        let offsets = self.offsets.read().await;
        Ok(offsets.get(product_id).copied().unwrap_or(NO_OFFSET))
    }

    async fn set_offset(&self, product_id: &str, value: i64) -> Result<(), OffsetError> {
        let mut offsets = self.offsets.write().await;
        offsets.insert(product_id.to_string(), value);
        Ok(())
    }
}
