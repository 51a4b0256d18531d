//! 브로커 보유 종목 동기화.
//!
//! 세션의 접근 토큰으로 브로커에서 보유 종목을 가져와 조정기로 교체합니다.
//! 조회 실패도 동기화 로그에 남깁니다.

use folio_core::{sync_span, BrokerSession, SyncLogEntry, UserId};
use serde::{Deserialize, Serialize};
use tracing::{info, warn, Instrument};
use utoipa::ToSchema;

use super::reconciler::{ReconcileReport, Reconciler};
use super::session_claim::{resolve_owned_session, resolve_session};
use crate::error::ServiceError;
use crate::state::AppState;

/// 운영자 일괄 동기화의 사용자별 결과.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserSyncResult {
    pub user_id: String,
    pub success: bool,
    pub holdings_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UserSyncResult {
    pub fn succeeded(user_id: &UserId, holdings_count: usize) -> Self {
        Self {
            user_id: user_id.to_string(),
            success: true,
            holdings_count,
            error: None,
        }
    }

    pub fn failed(user_id: &UserId, error: String) -> Self {
        Self {
            user_id: user_id.to_string(),
            success: false,
            holdings_count: 0,
            error: Some(error),
        }
    }
}

/// 주어진 세션으로 사용자의 브로커 보유 종목을 동기화합니다.
pub async fn sync_with_session(
    state: &AppState,
    user_id: &UserId,
    session: &BrokerSession,
) -> Result<ReconcileReport, ServiceError> {
    let connector = state.connector()?;
    let source = connector.source();
    let reconciler = Reconciler::new(
        state.holdings.as_ref(),
        state.sync_logs.as_ref(),
        state.config.import.batch_size,
    );

    async {
        let holdings = match connector.fetch_holdings(&session.access_credential).await {
            Ok(holdings) => holdings,
            Err(e) => {
                warn!(
                    session_id = %session.id,
                    credential = %session.masked_credential(),
                    error = %e,
                    "Broker holdings fetch failed"
                );
                reconciler
                    .log(SyncLogEntry::error(Some(user_id.clone()), source.clone(), e.user_message()))
                    .await;

                if e.is_auth_error() {
                    // 만료된 토큰은 재사용할 수 없으므로 세션을 정리
                    match state.sessions.delete_sessions_for_user(user_id).await {
                        Ok(deleted) => info!(deleted, "Expired broker sessions removed"),
                        Err(store_err) => warn!(error = %store_err, "Failed to remove expired sessions"),
                    }
                }
                return Err(ServiceError::Broker(e));
            }
        };

        info!(count = holdings.len(), "Broker holdings fetched");
        reconciler
            .replace(user_id, &source, holdings)
            .await
            .map_err(ServiceError::from)
    }
    .instrument(sync_span!("broker_sync", user_id, source))
    .await
}

/// 사용자 요청에 의한 동기화. 필요하면 Pending 세션을 획득합니다.
pub async fn sync_for_user(state: &AppState, user_id: &UserId) -> Result<ReconcileReport, ServiceError> {
    state.connector()?;
    let session = resolve_session(state.sessions.as_ref(), user_id).await?;
    sync_with_session(state, user_id, &session).await
}

/// 운영자 요청에 의한 특정 사용자 동기화. 소유 세션만 사용합니다.
pub async fn sync_owned(state: &AppState, user_id: &UserId) -> Result<ReconcileReport, ServiceError> {
    state.connector()?;
    let session = resolve_owned_session(state.sessions.as_ref(), user_id).await?;
    sync_with_session(state, user_id, &session).await
}

/// 유효한 소유 세션을 가진 모든 사용자를 순차적으로 동기화합니다.
///
/// 한 사용자의 실패가 다른 사용자의 동기화를 막지 않습니다.
pub async fn sync_all_users(state: &AppState) -> Result<Vec<UserSyncResult>, ServiceError> {
    state.connector()?;
    let users = state
        .sessions
        .users_with_valid_sessions(chrono::Utc::now())
        .await?;
    info!(users = users.len(), "Starting scheduled broker sync");

    let mut results = Vec::with_capacity(users.len());
    for user_id in users {
        let result = match sync_owned(state, &user_id).await {
            Ok(report) => UserSyncResult::succeeded(&user_id, report.holdings_count),
            Err(e) => UserSyncResult::failed(&user_id, e.user_message()),
        };
        results.push(result);
    }

    let failed = results.iter().filter(|r| !r.success).count();
    info!(total = results.len(), failed, "Scheduled broker sync finished");
    Ok(results)
}
