//! 보유 종목 조정(reconciliation).
//!
//! (사용자, 출처)의 저장된 보유 종목을 새 목록과 같게 만듭니다.
//!
//! 1. 새 배치 ID로 행을 `batch_size` 단위로 저장
//! 2. 하나의 트랜잭션에서 현재 배치 포인터 교체 + 이전 배치 삭제
//! 3. 교체 전 실패 시 새 배치 행을 삭제(best effort)하고 이전 보유 종목은 유지
//!
//! 결과와 상관없이 동기화 로그를 항상 한 건 남깁니다.

use folio_core::{
    CanonicalHolding, HoldingRecord, HoldingsStore, SourceId, StoreError, SyncLogEntry,
    SyncLogStore, UserId,
};
use serde::Serialize;
use tracing::{error, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

/// 조정 결과.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReconcileReport {
    /// 새 현재 배치 ID
    pub batch_id: Uuid,
    /// 대체된 이전 배치 ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replaced_batch_id: Option<Uuid>,
    /// 출처
    #[schema(value_type = String)]
    pub source: SourceId,
    /// 저장된 보유 종목 수
    pub holdings_count: usize,
}

/// 보유 종목 조정기.
pub struct Reconciler<'a> {
    holdings: &'a dyn HoldingsStore,
    sync_logs: &'a dyn SyncLogStore,
    batch_size: usize,
}

impl<'a> Reconciler<'a> {
    pub fn new(holdings: &'a dyn HoldingsStore, sync_logs: &'a dyn SyncLogStore, batch_size: usize) -> Self {
        Self {
            holdings,
            sync_logs,
            batch_size: batch_size.max(1),
        }
    }

    /// (사용자, 출처)의 보유 종목 전체를 교체합니다.
    pub async fn replace(
        &self,
        user_id: &UserId,
        source: &SourceId,
        holdings: Vec<CanonicalHolding>,
    ) -> Result<ReconcileReport, StoreError> {
        let batch_id = Uuid::new_v4();
        let rows: Vec<HoldingRecord> = holdings
            .into_iter()
            .map(|h| HoldingRecord::new(user_id.clone(), source.clone(), batch_id, h))
            .collect();

        match self.write_batch(user_id, source, batch_id, &rows).await {
            Ok(replaced_batch_id) => {
                info!(
                    user_id = %user_id,
                    source = %source,
                    %batch_id,
                    count = rows.len(),
                    "Holdings replaced"
                );
                self.log(SyncLogEntry::success(user_id.clone(), source.clone(), rows.len()))
                    .await;
                Ok(ReconcileReport {
                    batch_id,
                    replaced_batch_id,
                    source: source.clone(),
                    holdings_count: rows.len(),
                })
            }
            Err(e) => {
                error!(user_id = %user_id, source = %source, %batch_id, error = %e, "Holdings replace failed");
                if let Err(discard_err) = self.holdings.discard_batch(user_id, source, batch_id).await {
                    warn!(%batch_id, error = %discard_err, "Failed to discard partial holdings batch");
                }
                self.log(SyncLogEntry::error(
                    Some(user_id.clone()),
                    source.clone(),
                    format!("Failed to save holdings: {}", e.category()),
                ))
                .await;
                Err(e)
            }
        }
    }

    async fn write_batch(
        &self,
        user_id: &UserId,
        source: &SourceId,
        batch_id: Uuid,
        rows: &[HoldingRecord],
    ) -> Result<Option<Uuid>, StoreError> {
        for chunk in rows.chunks(self.batch_size) {
            self.holdings.insert_batch_rows(chunk).await?;
        }
        self.holdings.swap_current_batch(user_id, source, batch_id).await
    }

    /// 동기화 로그 기록. 실패는 경고만 남깁니다.
    pub async fn log(&self, entry: SyncLogEntry) {
        if let Err(e) = self.sync_logs.append(&entry).await {
            warn!(status = %entry.status, error = %e, "Failed to write sync log");
        }
    }
}
