//! 인메모리 저장소.
//!
//! 데이터베이스 URL이 없을 때(개발 모드)와 테스트에서 사용합니다.
//! PostgreSQL 구현과 같은 의미를 가지며, 각 연산은 단일 쓰기 잠금 안에서
//! 수행되므로 CAS와 배치 교체가 원자적입니다.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use folio_core::{
    BrokerSession, HoldingRecord, HoldingsStore, SessionOwner, SessionStore, SourceId, StoreResult,
    SyncLogEntry, SyncLogStore, UserId,
};
use tokio::sync::RwLock;
use uuid::Uuid;

/// 인메모리 저장소.
#[derive(Default)]
pub struct MemoryStore {
    sessions: RwLock<Vec<BrokerSession>>,
    holdings: RwLock<Vec<HoldingRecord>>,
    batches: RwLock<HashMap<(UserId, SourceId), Uuid>>,
    sync_logs: RwLock<Vec<SyncLogEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 저장된 모든 세션 (테스트 검사용).
    pub async fn all_sessions(&self) -> Vec<BrokerSession> {
        self.sessions.read().await.clone()
    }

    /// 저장된 모든 보유 종목 행 (현재 배치가 아닌 행 포함).
    pub async fn all_holding_rows(&self) -> Vec<HoldingRecord> {
        self.holdings.read().await.clone()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn insert_session(&self, session: &BrokerSession) -> StoreResult<()> {
        self.sessions.write().await.push(session.clone());
        Ok(())
    }

    async fn delete_sessions_for_user(&self, user_id: &UserId) -> StoreResult<u64> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|s| s.owner.user_id() != Some(user_id));
        Ok((before - sessions.len()) as u64)
    }

    async fn delete_pending_older_than(&self, cutoff: DateTime<Utc>) -> StoreResult<u64> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|s| !(s.owner.is_pending() && s.created_at < cutoff));
        Ok((before - sessions.len()) as u64)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|s| s.is_valid_at(now));
        Ok((before - sessions.len()) as u64)
    }

    async fn latest_owned_valid(
        &self,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<BrokerSession>> {
        let sessions = self.sessions.read().await;
        Ok(sessions
            .iter()
            .filter(|s| s.owner.user_id() == Some(user_id) && s.is_valid_at(now))
            .max_by_key(|s| s.created_at)
            .cloned())
    }

    async fn latest_pending_valid(&self, now: DateTime<Utc>) -> StoreResult<Option<BrokerSession>> {
        let sessions = self.sessions.read().await;
        Ok(sessions
            .iter()
            .filter(|s| s.owner.is_pending() && s.is_valid_at(now))
            .max_by_key(|s| s.created_at)
            .cloned())
    }

    async fn try_claim(
        &self,
        session_id: Uuid,
        expected_version: i64,
        user_id: &UserId,
    ) -> StoreResult<bool> {
        let mut sessions = self.sessions.write().await;
        match sessions
            .iter_mut()
            .find(|s| s.id == session_id && s.owner.is_pending() && s.version == expected_version)
        {
            Some(session) => {
                session.owner = SessionOwner::Claimed(user_id.clone());
                session.version += 1;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn users_with_valid_sessions(&self, now: DateTime<Utc>) -> StoreResult<Vec<UserId>> {
        let sessions = self.sessions.read().await;
        let mut users: Vec<UserId> = sessions
            .iter()
            .filter(|s| s.is_valid_at(now))
            .filter_map(|s| s.owner.user_id().cloned())
            .collect();
        users.sort();
        users.dedup();
        Ok(users)
    }
}

#[async_trait]
impl HoldingsStore for MemoryStore {
    async fn insert_batch_rows(&self, rows: &[HoldingRecord]) -> StoreResult<()> {
        self.holdings.write().await.extend_from_slice(rows);
        Ok(())
    }

    async fn swap_current_batch(
        &self,
        user_id: &UserId,
        source: &SourceId,
        batch_id: Uuid,
    ) -> StoreResult<Option<Uuid>> {
        // 잠금 순서: batches → holdings
        let mut batches = self.batches.write().await;
        let mut holdings = self.holdings.write().await;

        let previous = batches.insert((user_id.clone(), source.clone()), batch_id);
        if let Some(previous) = previous.filter(|p| *p != batch_id) {
            holdings.retain(|h| {
                !(h.user_id == *user_id && h.source == *source && h.batch_id == previous)
            });
        }
        Ok(previous)
    }

    async fn discard_batch(
        &self,
        user_id: &UserId,
        source: &SourceId,
        batch_id: Uuid,
    ) -> StoreResult<u64> {
        let batches = self.batches.read().await;
        if batches.get(&(user_id.clone(), source.clone())) == Some(&batch_id) {
            return Ok(0);
        }
        let mut holdings = self.holdings.write().await;
        let before = holdings.len();
        holdings.retain(|h| !(h.user_id == *user_id && h.source == *source && h.batch_id == batch_id));
        Ok((before - holdings.len()) as u64)
    }

    async fn current_holdings(
        &self,
        user_id: &UserId,
        source: Option<&SourceId>,
    ) -> StoreResult<Vec<HoldingRecord>> {
        let batches = self.batches.read().await;
        let holdings = self.holdings.read().await;

        let mut rows: Vec<HoldingRecord> = holdings
            .iter()
            .filter(|h| h.user_id == *user_id)
            .filter(|h| source.map_or(true, |s| h.source == *s))
            .filter(|h| batches.get(&(h.user_id.clone(), h.source.clone())) == Some(&h.batch_id))
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            (a.source.as_str(), &a.holding.symbol).cmp(&(b.source.as_str(), &b.holding.symbol))
        });
        Ok(rows)
    }
}

#[async_trait]
impl SyncLogStore for MemoryStore {
    async fn append(&self, entry: &SyncLogEntry) -> StoreResult<()> {
        self.sync_logs.write().await.push(entry.clone());
        Ok(())
    }

    async fn recent(&self, user_id: &UserId, limit: i64) -> StoreResult<Vec<SyncLogEntry>> {
        let logs = self.sync_logs.read().await;
        Ok(logs
            .iter()
            .rev()
            .filter(|e| e.user_id.as_ref() == Some(user_id))
            .take(usize::try_from(limit).unwrap_or(0))
            .cloned()
            .collect())
    }
}
