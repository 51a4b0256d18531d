//! 브로커 로그인 콜백 처리.
//!
//! 브로커가 `request_token`, `status`, `state`와 함께 리다이렉트하면
//! 일회용 인증 코드를 당일 접근 토큰으로 교환하고 세션을 저장합니다.
//!
//! state를 해독할 수 없으면 중단하지 않고 소유자 없는(Pending) 세션을
//! 저장합니다. 이후 첫 인증된 동기화가 이 세션을 획득합니다.

use chrono::Utc;
use folio_core::{pending_cutoff, BrokerSession, SessionOwner, SyncLogEntry, UserId};
use serde::Deserialize;
use tracing::{info, warn};
use utoipa::IntoParams;

use super::holdings_sync::sync_with_session;
use crate::error::ServiceError;
use crate::state::AppState;

/// 브로커 리다이렉트 쿼리 파라미터.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct CallbackParams {
    /// 일회용 인증 코드
    pub request_token: Option<String>,
    /// 로그인 결과 ("success")
    pub status: Option<String>,
    /// 로그인 시 전달한 서명된 state
    pub state: Option<String>,
}

/// 콜백 처리 결과.
#[derive(Debug, Clone)]
pub struct ExchangeOutcome {
    /// 세션 소유자 (state 해독 실패 시 없음)
    pub user_id: Option<UserId>,
    /// 직후 동기화된 보유 종목 수 (동기화하지 않았거나 실패하면 없음)
    pub holdings_synced: Option<usize>,
}

/// 로그인 콜백을 처리합니다.
///
/// # Errors
///
/// - 브로커 로그인 실패/취소, 인증 코드 누락 → `InvalidInput`
/// - API 키 미설정 → `Config`
/// - 인증 코드 교환 거부 → `Broker`
/// - 세션 저장 실패 → `Store`
///
/// 직후 보유 종목 동기화 실패는 로그만 남기고 에러로 취급하지 않습니다.
pub async fn complete_login(
    state: &AppState,
    params: &CallbackParams,
) -> Result<ExchangeOutcome, ServiceError> {
    let status = params.status.as_deref().unwrap_or_default();
    if status != "success" {
        warn!(status, "Broker login did not succeed");
        return Err(ServiceError::InvalidInput(
            "Broker login was cancelled or failed".to_string(),
        ));
    }

    let request_token = params
        .request_token
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ServiceError::InvalidInput("Missing request token from broker".to_string()))?;

    let user_id = resolve_state_user(state, params.state.as_deref())?;
    let connector = state.connector()?;

    let access_token = connector.exchange_token(request_token).await?;
    let session = BrokerSession::new(
        SessionOwner::from(user_id.clone()),
        access_token,
        state.session_ttl(),
    );

    if let Some(user_id) = &user_id {
        let deleted = state.sessions.delete_sessions_for_user(user_id).await?;
        if deleted > 0 {
            info!(user_id = %user_id, deleted, "Previous broker sessions replaced");
        }
    }
    let stale = state
        .sessions
        .delete_pending_older_than(pending_cutoff(Utc::now()))
        .await?;
    if stale > 0 {
        info!(deleted = stale, "Stale pending sessions removed");
    }

    state.sessions.insert_session(&session).await?;
    info!(
        session_id = %session.id,
        user_id = ?user_id.as_ref().map(UserId::as_str),
        credential = %session.masked_credential(),
        expires_at = %session.expires_at,
        "Broker session created"
    );

    if let Err(e) = state
        .sync_logs
        .append(&SyncLogEntry::connected(user_id.clone(), connector.source()))
        .await
    {
        warn!(error = %e, "Failed to write connected sync log");
    }

    let holdings_synced = match &user_id {
        Some(user_id) => match sync_with_session(state, user_id, &session).await {
            Ok(report) => Some(report.holdings_count),
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Initial holdings sync failed");
                None
            }
        },
        None => None,
    };

    Ok(ExchangeOutcome {
        user_id,
        holdings_synced,
    })
}

/// state에서 사용자 ID를 얻습니다. 해독 실패는 Pending 흐름으로 이어집니다.
fn resolve_state_user(state: &AppState, token: Option<&str>) -> Result<Option<UserId>, ServiceError> {
    let Some(token) = token.filter(|t| !t.trim().is_empty()) else {
        warn!("Broker callback without state, session will be pending");
        return Ok(None);
    };

    let decoded = match state.state_codec.decode(token) {
        Ok(decoded) => decoded,
        Err(e) => {
            warn!(error = %e, "Could not verify OAuth state, session will be pending");
            return Ok(None);
        }
    };

    if decoded.is_stale(Utc::now(), state.state_codec.max_age()) {
        if state.state_codec.rejects_stale() {
            return Err(ServiceError::InvalidInput(
                "Login link has expired, please try again".to_string(),
            ));
        }
        warn!(user_id = %decoded.user_id, "OAuth state is stale, continuing");
    }

    Ok(Some(decoded.user_id))
}

/// 콜백 결과를 프론트엔드 리다이렉트 URL로 변환합니다.
pub fn redirect_url(frontend_url: &str, result: &Result<ExchangeOutcome, ServiceError>) -> String {
    let separator = if frontend_url.contains('?') { '&' } else { '?' };
    match result {
        Ok(_) => format!("{}{}broker=connected", frontend_url, separator),
        Err(e) => format!(
            "{}{}broker_error={}",
            frontend_url,
            separator,
            urlencoding::encode(&e.user_message())
        ),
    }
}
