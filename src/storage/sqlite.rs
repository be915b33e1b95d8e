//! SQLite storage backend implementation
//!
//! Stores TCAM usage rows in a local database file. WAL journaling keeps
//! reads cheap while the monitor writes.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};
use tracing::{debug, info, instrument};

use super::backend::UsageStore;
use super::error::{StorageError, StorageResult};
use super::schema::UsageRow;

pub struct SqliteStore {
    pool: Pool<Sqlite>,
    db_path: String,
}

impl SqliteStore {
    /// Open (creating if needed) the database and run migrations.
    #[instrument(skip_all)]
    pub async fn new(db_path: impl AsRef<Path>) -> StorageResult<Self> {
        let db_path_str = db_path.as_ref().to_string_lossy().to_string();

        info!("initializing SQLite store at: {}", db_path_str);

        let options = SqliteConnectOptions::new()
            .filename(&db_path_str)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(30));

        let pool = SqlitePoolOptions::new()
            .max_connections(2)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::ConnectionFailed(e.to_string()))?;

        debug!("running database migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self {
            pool,
            db_path: db_path_str,
        })
    }

    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    fn to_column(name: &str, value: u64) -> StorageResult<i64> {
        i64::try_from(value).map_err(|_| StorageError::OutOfRange(format!("{name} = {value}")))
    }

    fn from_column(row: &SqliteRow, name: &str) -> StorageResult<u64> {
        let value: i64 = row.try_get(name)?;
        u64::try_from(value).map_err(|_| StorageError::OutOfRange(format!("{name} = {value}")))
    }

    fn millis_to_timestamp(millis: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(millis).unwrap_or_else(Utc::now)
    }

    fn decode_row(row: &SqliteRow) -> StorageResult<UsageRow> {
        Ok(UsageRow {
            recorded_at: Self::millis_to_timestamp(row.try_get("recorded_at")?),
            table_name: row.try_get("table_name")?,
            feature: row.try_get("feature")?,
            free_entries: Self::from_column(row, "free_entries")?,
            used_entries: Self::from_column(row, "used_entries")?,
            committed_entries: Self::from_column(row, "committed_entries")?,
            max_entries: Self::from_column(row, "max_entries")?,
        })
    }
}

#[async_trait]
impl UsageStore for SqliteStore {
    #[instrument(skip(self, row), fields(table = %row.table_name, feature = %row.feature))]
    async fn record(&self, row: UsageRow) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO tcam_usage (
                recorded_at, table_name, feature,
                free_entries, used_entries, committed_entries, max_entries
            )
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(row.recorded_at.timestamp_millis())
        .bind(&row.table_name)
        .bind(&row.feature)
        .bind(Self::to_column("free_entries", row.free_entries)?)
        .bind(Self::to_column("used_entries", row.used_entries)?)
        .bind(Self::to_column("committed_entries", row.committed_entries)?)
        .bind(Self::to_column("max_entries", row.max_entries)?)
        .execute(&self.pool)
        .await?;

        debug!("recorded usage row");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn latest(
        &self,
        table_name: &str,
        feature: &str,
        limit: usize,
    ) -> StorageResult<Vec<UsageRow>> {
        let rows = sqlx::query(
            r#"
            SELECT recorded_at, table_name, feature,
                   free_entries, used_entries, committed_entries, max_entries
            FROM tcam_usage
            WHERE table_name = ? AND feature = ?
            ORDER BY recorded_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(table_name)
        .bind(feature)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::decode_row).collect()
    }

    async fn count(&self) -> StorageResult<u64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tcam_usage")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }

    async fn close(&self) -> StorageResult<()> {
        info!("closing SQLite store");
        self.pool.close().await;
        Ok(())
    }
}
