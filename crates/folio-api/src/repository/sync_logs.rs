//! 동기화 로그 Repository (PostgreSQL).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use folio_core::{SourceId, StoreError, StoreResult, SyncLogEntry, SyncLogStore, SyncStatus, UserId};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

#[derive(Debug, FromRow)]
struct SyncLogRow {
    id: Uuid,
    user_id: Option<String>,
    source: String,
    status: String,
    holdings_count: i32,
    error_message: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<SyncLogRow> for SyncLogEntry {
    type Error = StoreError;

    fn try_from(row: SyncLogRow) -> Result<Self, Self::Error> {
        Ok(SyncLogEntry {
            id: row.id,
            user_id: row.user_id.map(UserId::new),
            source: SourceId::parse(&row.source).map_err(|e| StoreError::Corrupt(e.to_string()))?,
            status: row.status.parse::<SyncStatus>().map_err(StoreError::Corrupt)?,
            holdings_count: row.holdings_count,
            error_message: row.error_message,
            created_at: row.created_at,
        })
    }
}

/// 동기화 로그 Repository
pub struct PgSyncLogStore {
    pool: PgPool,
}

impl PgSyncLogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SyncLogStore for PgSyncLogStore {
    async fn append(&self, entry: &SyncLogEntry) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO sync_logs (id, user_id, source, status, holdings_count, error_message, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(entry.id)
        .bind(entry.user_id.as_ref().map(UserId::as_str))
        .bind(entry.source.as_str())
        .bind(entry.status.as_str())
        .bind(entry.holdings_count)
        .bind(&entry.error_message)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn recent(&self, user_id: &UserId, limit: i64) -> StoreResult<Vec<SyncLogEntry>> {
        let rows = sqlx::query_as::<_, SyncLogRow>(
            r#"
            SELECT id, user_id, source, status, holdings_count, error_message, created_at
            FROM sync_logs
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id.as_str())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(SyncLogEntry::try_from).collect()
    }
}
