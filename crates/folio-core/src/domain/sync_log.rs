//! 동기화 결과 로그.

use super::{SourceId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 동기화 결과 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Success,
    Error,
    Connected,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Success => "success",
            SyncStatus::Error => "error",
            SyncStatus::Connected => "connected",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SyncStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "success" => Ok(SyncStatus::Success),
            "error" => Ok(SyncStatus::Error),
            "connected" => Ok(SyncStatus::Connected),
            _ => Err(format!("Unknown sync status: {}", s)),
        }
    }
}

/// 동기화 로그 항목 (추가 전용).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub struct SyncLogEntry {
    pub id: Uuid,
    /// 사용자 (Pending 세션 연결 시 없음)
    #[serde(skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "utoipa-support", schema(value_type = Option<String>))]
    pub user_id: Option<UserId>,
    #[cfg_attr(feature = "utoipa-support", schema(value_type = String))]
    pub source: SourceId,
    pub status: SyncStatus,
    pub holdings_count: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl SyncLogEntry {
    fn new(user_id: Option<UserId>, source: SourceId, status: SyncStatus) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            source,
            status,
            holdings_count: 0,
            error_message: None,
            created_at: Utc::now(),
        }
    }

    /// 성공 로그.
    pub fn success(user_id: UserId, source: SourceId, holdings_count: usize) -> Self {
        let mut entry = Self::new(Some(user_id), source, SyncStatus::Success);
        entry.holdings_count = i32::try_from(holdings_count).unwrap_or(i32::MAX);
        entry
    }

    /// 실패 로그.
    pub fn error(user_id: Option<UserId>, source: SourceId, message: impl Into<String>) -> Self {
        let mut entry = Self::new(user_id, source, SyncStatus::Error);
        entry.error_message = Some(message.into());
        entry
    }

    /// 브로커 연결 로그.
    pub fn connected(user_id: Option<UserId>, source: SourceId) -> Self {
        Self::new(user_id, source, SyncStatus::Connected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [SyncStatus::Success, SyncStatus::Error, SyncStatus::Connected] {
            assert_eq!(status.as_str().parse::<SyncStatus>().unwrap(), status);
        }
        assert!("pending".parse::<SyncStatus>().is_err());
    }

    #[test]
    fn test_constructors() {
        let ok = SyncLogEntry::success(UserId::new("u"), SourceId::upload(), 12);
        assert_eq!(ok.status, SyncStatus::Success);
        assert_eq!(ok.holdings_count, 12);

        let failed = SyncLogEntry::error(None, SourceId::zerodha(), "session expired");
        assert_eq!(failed.error_message.as_deref(), Some("session expired"));
        assert_eq!(failed.holdings_count, 0);

        let connected = SyncLogEntry::connected(None, SourceId::zerodha());
        assert!(connected.user_id.is_none());
    }
}
