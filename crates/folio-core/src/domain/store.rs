//! 저장소 추상화.
//!
//! 서비스 계층은 이 트레이트를 통해서만 영속 계층에 접근합니다.
//! PostgreSQL 구현과 인메모리 구현이 동일한 의미를 가져야 합니다.

use super::{BrokerSession, HoldingRecord, SourceId, SyncLogEntry, UserId};
use crate::crypto::CryptoError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

/// 저장소 에러.
#[derive(Debug, Error)]
pub enum StoreError {
    /// 데이터베이스 에러
    #[error("Database error: {0}")]
    Database(String),

    /// 저장된 값을 해석할 수 없음
    #[error("Corrupt row: {0}")]
    Corrupt(String),

    /// 자격증명 암호화/복호화 실패
    #[error("Credential encryption error: {0}")]
    Crypto(#[from] CryptoError),
}

impl StoreError {
    /// 사용자 로그에 남길 수 있는 실패 분류. 원인 메시지는 포함하지 않습니다.
    pub fn category(&self) -> &'static str {
        match self {
            StoreError::Database(_) => "database unavailable",
            StoreError::Corrupt(_) => "stored data could not be read",
            StoreError::Crypto(_) => "credential encryption failed",
        }
    }
}

#[cfg(feature = "sqlx-support")]
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}

/// 저장소 Result 타입.
pub type StoreResult<T> = Result<T, StoreError>;

/// 브로커 세션 저장소.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// 새 세션 저장.
    async fn insert_session(&self, session: &BrokerSession) -> StoreResult<()>;

    /// 사용자의 모든 세션 삭제. 삭제된 수를 반환합니다.
    async fn delete_sessions_for_user(&self, user_id: &UserId) -> StoreResult<u64>;

    /// 기준 시각 이전에 생성된 Pending 세션 삭제.
    async fn delete_pending_older_than(&self, cutoff: DateTime<Utc>) -> StoreResult<u64>;

    /// 만료된 세션 삭제.
    async fn delete_expired(&self, now: DateTime<Utc>) -> StoreResult<u64>;

    /// 사용자가 소유한 가장 최근의 유효 세션.
    async fn latest_owned_valid(
        &self,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<BrokerSession>>;

    /// 가장 최근의 유효한 Pending 세션.
    async fn latest_pending_valid(&self, now: DateTime<Utc>) -> StoreResult<Option<BrokerSession>>;

    /// Pending 세션의 소유권을 원자적으로 획득합니다.
    ///
    /// 세션이 여전히 소유자가 없고 버전이 `expected_version`과 같을 때만
    /// 성공하며, 성공 시 버전이 1 증가합니다. 경쟁에서 지면 `false`.
    async fn try_claim(
        &self,
        session_id: Uuid,
        expected_version: i64,
        user_id: &UserId,
    ) -> StoreResult<bool>;

    /// 유효한 소유 세션을 가진 사용자 목록.
    async fn users_with_valid_sessions(&self, now: DateTime<Utc>) -> StoreResult<Vec<UserId>>;
}

/// 보유 종목 저장소 (버전 교체 방식).
#[async_trait]
pub trait HoldingsStore: Send + Sync {
    /// 새 배치의 행을 저장합니다. 아직 현재 배치가 아니므로 조회되지 않습니다.
    async fn insert_batch_rows(&self, rows: &[HoldingRecord]) -> StoreResult<()>;

    /// (사용자, 출처)의 현재 배치를 교체하고 이전 배치 행을 삭제합니다.
    ///
    /// 하나의 트랜잭션으로 수행되며 이전 배치 ID를 반환합니다.
    async fn swap_current_batch(
        &self,
        user_id: &UserId,
        source: &SourceId,
        batch_id: Uuid,
    ) -> StoreResult<Option<Uuid>>;

    /// 교체되지 않은 배치의 행을 삭제합니다.
    async fn discard_batch(
        &self,
        user_id: &UserId,
        source: &SourceId,
        batch_id: Uuid,
    ) -> StoreResult<u64>;

    /// 현재 보유 종목. `source`가 없으면 모든 출처.
    async fn current_holdings(
        &self,
        user_id: &UserId,
        source: Option<&SourceId>,
    ) -> StoreResult<Vec<HoldingRecord>>;
}

/// 동기화 로그 저장소.
#[async_trait]
pub trait SyncLogStore: Send + Sync {
    /// 로그 추가.
    async fn append(&self, entry: &SyncLogEntry) -> StoreResult<()>;

    /// 사용자의 최근 로그 (최신순).
    async fn recent(&self, user_id: &UserId, limit: i64) -> StoreResult<Vec<SyncLogEntry>>;
}
