//! 브로커 세션 조회 및 소유권 획득.
//!
//! 사용자 요청이 사용할 세션을 다음 순서로 결정합니다:
//!
//! 1. 사용자가 소유한 가장 최근의 유효 세션
//! 2. 없으면 가장 최근의 유효 Pending 세션을 CAS로 획득
//!    (`owner IS NULL AND version = expected`). 경쟁에서 지면 다시 조회
//! 3. 그래도 없으면 [`ServiceError::NoValidSession`]
//!
//! 운영자 호출은 Pending 세션을 획득하지 않고 소유 세션만 조회합니다.

use chrono::Utc;
use folio_core::{BrokerSession, SessionStore, UserId};
use tracing::{debug, info};

use crate::error::ServiceError;

/// CAS 경쟁에서 진 뒤 다시 조회하는 최대 횟수.
const MAX_CLAIM_ATTEMPTS: usize = 3;

/// 사용자 요청에 사용할 세션을 결정합니다. 필요하면 Pending 세션을 획득합니다.
pub async fn resolve_session(
    store: &dyn SessionStore,
    user_id: &UserId,
) -> Result<BrokerSession, ServiceError> {
    for attempt in 1..=MAX_CLAIM_ATTEMPTS {
        let now = Utc::now();

        if let Some(session) = store.latest_owned_valid(user_id, now).await? {
            return Ok(session);
        }

        let Some(pending) = store.latest_pending_valid(now).await? else {
            return Err(ServiceError::NoValidSession);
        };

        if store.try_claim(pending.id, pending.version, user_id).await? {
            info!(
                user_id = %user_id,
                session_id = %pending.id,
                "Pending broker session claimed"
            );
            return Ok(pending.claimed_by(user_id.clone()));
        }

        debug!(user_id = %user_id, session_id = %pending.id, attempt, "Lost session claim race, re-reading");
    }

    Err(ServiceError::NoValidSession)
}

/// 소유 세션만 조회합니다 (운영자 호출용).
pub async fn resolve_owned_session(
    store: &dyn SessionStore,
    user_id: &UserId,
) -> Result<BrokerSession, ServiceError> {
    store
        .latest_owned_valid(user_id, Utc::now())
        .await?
        .ok_or(ServiceError::NoValidSession)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryStore;
    use chrono::Duration;
    use folio_core::SessionOwner;
    use secrecy::{ExposeSecret, SecretString};
    use std::sync::Arc;

    fn session(owner: SessionOwner, token: &str) -> BrokerSession {
        BrokerSession::new(owner, SecretString::new(token.into()), Duration::hours(8))
    }

    #[tokio::test]
    async fn test_owned_session_preferred() {
        let store = MemoryStore::new();
        let alice = UserId::new("alice");
        store
            .insert_session(&session(SessionOwner::Claimed(alice.clone()), "owned"))
            .await
            .unwrap();
        store
            .insert_session(&session(SessionOwner::Pending, "pending"))
            .await
            .unwrap();

        let resolved = resolve_session(&store, &alice).await.unwrap();
        assert_eq!(resolved.access_credential.expose_secret(), "owned");
        // Pending 세션은 건드리지 않음
        assert!(store.latest_pending_valid(Utc::now()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_pending_session_claimed() {
        let store = MemoryStore::new();
        let alice = UserId::new("alice");
        store
            .insert_session(&session(SessionOwner::Pending, "pending"))
            .await
            .unwrap();

        let resolved = resolve_session(&store, &alice).await.unwrap();
        assert_eq!(resolved.owner, SessionOwner::Claimed(alice.clone()));
        assert_eq!(resolved.version, 1);

        // 다른 사용자는 더 이상 획득할 수 없음
        let bob = UserId::new("bob");
        assert!(matches!(
            resolve_session(&store, &bob).await,
            Err(ServiceError::NoValidSession)
        ));
    }

    #[tokio::test]
    async fn test_no_session() {
        let store = MemoryStore::new();
        assert!(matches!(
            resolve_session(&store, &UserId::new("alice")).await,
            Err(ServiceError::NoValidSession)
        ));
    }

    #[tokio::test]
    async fn test_operator_never_claims() {
        let store = MemoryStore::new();
        store
            .insert_session(&session(SessionOwner::Pending, "pending"))
            .await
            .unwrap();

        assert!(matches!(
            resolve_owned_session(&store, &UserId::new("alice")).await,
            Err(ServiceError::NoValidSession)
        ));
        assert!(store.latest_pending_valid(Utc::now()).await.unwrap().is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_claim_exclusive_under_concurrency() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_session(&session(SessionOwner::Pending, "pending"))
            .await
            .unwrap();

        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let user = UserId::new(format!("user-{}", i));
                resolve_session(store.as_ref(), &user).await.ok().map(|_| user)
            }));
        }

        let mut winners = Vec::new();
        for handle in handles {
            if let Some(user) = handle.await.unwrap() {
                winners.push(user);
            }
        }

        assert_eq!(winners.len(), 1);
        let sessions = store.all_sessions().await;
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].owner, SessionOwner::Claimed(winners[0].clone()));
    }
}
