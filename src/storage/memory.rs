//! In-memory storage backend (no persistence)
//!
//! Used for `storage: none` and in tests. All rows are lost on restart.

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use super::backend::UsageStore;
use super::error::StorageResult;
use super::schema::UsageRow;

#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<UsageRow>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored row in insertion order
    pub async fn rows(&self) -> Vec<UsageRow> {
        self.rows.lock().await.clone()
    }
}

#[async_trait]
impl UsageStore for MemoryStore {
    async fn record(&self, row: UsageRow) -> StorageResult<()> {
        debug!("in-memory store: recording {}-{}", row.table_name, row.feature);
        self.rows.lock().await.push(row);
        Ok(())
    }

    async fn latest(
        &self,
        table_name: &str,
        feature: &str,
        limit: usize,
    ) -> StorageResult<Vec<UsageRow>> {
        let rows = self.rows.lock().await;
        Ok(rows
            .iter()
            .rev()
            .filter(|row| row.table_name == table_name && row.feature == feature)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn count(&self) -> StorageResult<u64> {
        Ok(self.rows.lock().await.len() as u64)
    }

    async fn close(&self) -> StorageResult<()> {
        debug!("closing in-memory store (no-op)");
        Ok(())
    }
}
