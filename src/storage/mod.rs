//! Storage for TCAM usage rows
//!
//! - **SQLite** (default): embedded database file
//! - **In-Memory**: no persistence, for `storage: none` and tests

pub mod backend;
pub mod error;
pub mod memory;
pub mod schema;
#[cfg(feature = "storage-sqlite")]
pub mod sqlite;

use std::sync::Arc;

pub use backend::UsageStore;
pub use error::{StorageError, StorageResult};
pub use memory::MemoryStore;
pub use schema::UsageRow;

use crate::config::StorageConfig;

/// Build the store selected in the configuration.
pub async fn open(config: &StorageConfig) -> StorageResult<Arc<dyn UsageStore>> {
    match config {
        StorageConfig::None => Ok(Arc::new(MemoryStore::new())),
        #[cfg(feature = "storage-sqlite")]
        StorageConfig::Sqlite { path } => Ok(Arc::new(sqlite::SqliteStore::new(path).await?)),
        #[cfg(not(feature = "storage-sqlite"))]
        StorageConfig::Sqlite { .. } => Err(StorageError::ConnectionFailed(
            "built without the storage-sqlite feature".to_string(),
        )),
    }
}
