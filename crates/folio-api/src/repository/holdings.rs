//! 보유 종목 Repository (PostgreSQL).
//!
//! 버전 교체 방식으로 동작합니다:
//! 새 배치의 행을 먼저 저장한 뒤, 하나의 트랜잭션에서 `holdings_batches`
//! 포인터를 새 배치로 옮기고 이전 배치 행을 삭제합니다.
//! 조회는 포인터가 가리키는 배치의 행만 반환하므로 빈 구간이 없습니다.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use folio_core::{
    AssetType, CanonicalHolding, HoldingRecord, HoldingsStore, SourceId, StoreError, StoreResult,
    UserId,
};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use tracing::debug;
use uuid::Uuid;

/// DB에서 조회한 보유 종목 row
#[derive(Debug, FromRow)]
struct HoldingRow {
    id: Uuid,
    user_id: String,
    source: String,
    batch_id: Uuid,
    symbol: String,
    display_name: String,
    asset_type: String,
    sector: String,
    quantity: Decimal,
    avg_price: Decimal,
    last_price: Decimal,
    exchange: String,
    isin: Option<String>,
    broker_account: String,
    xirr: Option<Decimal>,
    created_at: DateTime<Utc>,
}

impl TryFrom<HoldingRow> for HoldingRecord {
    type Error = StoreError;

    fn try_from(row: HoldingRow) -> Result<Self, Self::Error> {
        let asset_type = AssetType::from_code(&row.asset_type)
            .ok_or_else(|| StoreError::Corrupt(format!("unknown asset type '{}'", row.asset_type)))?;
        let source = SourceId::parse(&row.source).map_err(|e| StoreError::Corrupt(e.to_string()))?;

        Ok(HoldingRecord {
            id: row.id,
            user_id: UserId::new(row.user_id),
            source,
            batch_id: row.batch_id,
            holding: CanonicalHolding {
                symbol: row.symbol,
                display_name: row.display_name,
                asset_type,
                sector: row.sector,
                quantity: row.quantity,
                avg_price: row.avg_price,
                last_price: row.last_price,
                exchange: row.exchange,
                isin: row.isin,
                broker_account: row.broker_account,
                xirr: row.xirr,
            },
            created_at: row.created_at,
        })
    }
}

/// 보유 종목 Repository
pub struct PgHoldingsStore {
    pool: PgPool,
}

impl PgHoldingsStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HoldingsStore for PgHoldingsStore {
    async fn insert_batch_rows(&self, rows: &[HoldingRecord]) -> StoreResult<()> {
        if rows.is_empty() {
            return Ok(());
        }

        let mut query_builder: QueryBuilder<Postgres> = QueryBuilder::new(
            r#"
            INSERT INTO holdings
                (id, user_id, source, batch_id, symbol, display_name, asset_type, sector,
                 quantity, avg_price, last_price, exchange, isin, broker_account, xirr, created_at)
            "#,
        );

        query_builder.push_values(rows, |mut b, row| {
            let h = &row.holding;
            b.push_bind(row.id)
                .push_bind(row.user_id.as_str())
                .push_bind(row.source.as_str())
                .push_bind(row.batch_id)
                .push_bind(&h.symbol)
                .push_bind(&h.display_name)
                .push_bind(h.asset_type.code())
                .push_bind(&h.sector)
                .push_bind(h.quantity)
                .push_bind(h.avg_price)
                .push_bind(h.last_price)
                .push_bind(&h.exchange)
                .push_bind(&h.isin)
                .push_bind(&h.broker_account)
                .push_bind(h.xirr)
                .push_bind(row.created_at);
        });

        query_builder.build().execute(&self.pool).await?;
        Ok(())
    }

    async fn swap_current_batch(
        &self,
        user_id: &UserId,
        source: &SourceId,
        batch_id: Uuid,
    ) -> StoreResult<Option<Uuid>> {
        let mut tx = self.pool.begin().await?;

        let previous: Option<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT current_batch_id FROM holdings_batches
            WHERE user_id = $1 AND source = $2
            FOR UPDATE
            "#,
        )
        .bind(user_id.as_str())
        .bind(source.as_str())
        .fetch_optional(&mut *tx)
        .await?;
        let previous = previous.map(|(id,)| id);

        sqlx::query(
            r#"
            INSERT INTO holdings_batches (user_id, source, current_batch_id, updated_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (user_id, source)
            DO UPDATE SET current_batch_id = EXCLUDED.current_batch_id, updated_at = NOW()
            "#,
        )
        .bind(user_id.as_str())
        .bind(source.as_str())
        .bind(batch_id)
        .execute(&mut *tx)
        .await?;

        if let Some(previous) = previous.filter(|p| *p != batch_id) {
            let deleted = sqlx::query(
                "DELETE FROM holdings WHERE user_id = $1 AND source = $2 AND batch_id = $3",
            )
            .bind(user_id.as_str())
            .bind(source.as_str())
            .bind(previous)
            .execute(&mut *tx)
            .await?;
            debug!(%previous, rows = deleted.rows_affected(), "Previous holdings batch deleted");
        }

        tx.commit().await?;
        Ok(previous)
    }

    async fn discard_batch(
        &self,
        user_id: &UserId,
        source: &SourceId,
        batch_id: Uuid,
    ) -> StoreResult<u64> {
        // 현재 배치는 절대 삭제하지 않음
        let result = sqlx::query(
            r#"
            DELETE FROM holdings
            WHERE user_id = $1 AND source = $2 AND batch_id = $3
              AND NOT EXISTS (
                SELECT 1 FROM holdings_batches b
                WHERE b.user_id = $1 AND b.source = $2 AND b.current_batch_id = $3
              )
            "#,
        )
        .bind(user_id.as_str())
        .bind(source.as_str())
        .bind(batch_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn current_holdings(
        &self,
        user_id: &UserId,
        source: Option<&SourceId>,
    ) -> StoreResult<Vec<HoldingRecord>> {
        let rows = sqlx::query_as::<_, HoldingRow>(
            r#"
            SELECT h.id, h.user_id, h.source, h.batch_id, h.symbol, h.display_name, h.asset_type,
                   h.sector, h.quantity, h.avg_price, h.last_price, h.exchange, h.isin,
                   h.broker_account, h.xirr, h.created_at
            FROM holdings h
            INNER JOIN holdings_batches b
                ON b.user_id = h.user_id AND b.source = h.source AND b.current_batch_id = h.batch_id
            WHERE h.user_id = $1 AND ($2::TEXT IS NULL OR h.source = $2)
            ORDER BY h.source, h.symbol
            "#,
        )
        .bind(user_id.as_str())
        .bind(source.map(SourceId::as_str))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(HoldingRecord::try_from).collect()
    }
}
