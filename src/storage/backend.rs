//! Storage backend trait definition

use async_trait::async_trait;

use super::error::StorageResult;
use super::schema::UsageRow;

/// Trait for the table receiving TCAM usage rows
///
/// Implementations must be `Send + Sync` as they are shared with the
/// monitor task.
#[async_trait]
pub trait UsageStore: Send + Sync {
    /// Insert one row. Either the whole row is stored or nothing is.
    async fn record(&self, row: UsageRow) -> StorageResult<()>;

    /// The `limit` most recent rows for a table/feature pair, newest first.
    async fn latest(
        &self,
        table_name: &str,
        feature: &str,
        limit: usize,
    ) -> StorageResult<Vec<UsageRow>>;

    /// Total number of stored rows
    async fn count(&self) -> StorageResult<u64>;

    /// Release connections and flush pending writes
    async fn close(&self) -> StorageResult<()>;
}
