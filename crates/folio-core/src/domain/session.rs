//! 브로커 세션.
//!
//! OAuth 콜백 시점에는 사용자를 알 수 없는 경우가 있어 세션은
//! `Pending` 상태로 저장될 수 있으며, 이후 첫 인증된 동기화가
//! 버전 기반 CAS로 소유권을 획득(claim)합니다.

use super::UserId;
use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use uuid::Uuid;

/// 소유자 없는 세션이 정리되기까지의 시간 (시간).
pub const PENDING_SESSION_MAX_AGE_HOURS: i64 = 1;

/// 세션 소유 상태.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOwner {
    /// 아직 소유자가 없음 (state 해독 실패 등)
    Pending,
    /// 사용자에게 귀속됨
    Claimed(UserId),
}

impl SessionOwner {
    /// 소유자 ID.
    pub fn user_id(&self) -> Option<&UserId> {
        match self {
            SessionOwner::Pending => None,
            SessionOwner::Claimed(user_id) => Some(user_id),
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, SessionOwner::Pending)
    }
}

impl From<Option<UserId>> for SessionOwner {
    fn from(user_id: Option<UserId>) -> Self {
        match user_id {
            Some(user_id) => SessionOwner::Claimed(user_id),
            None => SessionOwner::Pending,
        }
    }
}

/// 브로커 접근 세션.
#[derive(Debug, Clone)]
pub struct BrokerSession {
    /// 세션 ID
    pub id: Uuid,
    /// 소유 상태
    pub owner: SessionOwner,
    /// 브로커 접근 토큰 (저장 시 암호화)
    pub access_credential: SecretString,
    /// 만료 시각
    pub expires_at: DateTime<Utc>,
    /// 생성 시각
    pub created_at: DateTime<Utc>,
    /// 낙관적 동시성 버전
    pub version: i64,
}

impl BrokerSession {
    /// 현재 시각 기준으로 고정 유효 기간을 가진 새 세션을 생성합니다.
    pub fn new(owner: SessionOwner, access_credential: SecretString, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner,
            access_credential,
            expires_at: now + ttl,
            created_at: now,
            version: 0,
        }
    }

    /// 주어진 시각에 유효한지 확인.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }

    /// 소유권을 획득한 사본.
    pub fn claimed_by(mut self, user_id: UserId) -> Self {
        self.owner = SessionOwner::Claimed(user_id);
        self.version += 1;
        self
    }

    /// 로그용으로 마스킹된 접근 토큰.
    pub fn masked_credential(&self) -> String {
        mask_secret(self.access_credential.expose_secret())
    }
}

/// 비밀값의 앞 4자만 남기고 마스킹합니다.
pub fn mask_secret(secret: &str) -> String {
    let prefix: String = secret.chars().take(4).collect();
    if secret.chars().count() <= 4 {
        "****".to_string()
    } else {
        format!("{}****", prefix)
    }
}

/// 오래된 Pending 세션 판정 기준 시각.
pub fn pending_cutoff(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::hours(PENDING_SESSION_MAX_AGE_HOURS)
}
