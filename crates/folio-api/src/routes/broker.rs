//! 브로커 연동 endpoint.
//!
//! # 엔드포인트
//!
//! - `GET /api/v1/broker/zerodha/login` - 서명된 state가 포함된 로그인 URL
//! - `GET /api/v1/broker/zerodha/callback` - 브로커 리다이렉트 처리 (인증 없음)
//! - `GET /api/v1/broker/zerodha/status` - 연결 상태
//! - `POST /api/v1/broker/zerodha/sync` - 보유 종목 동기화
//! - `DELETE /api/v1/broker/zerodha/session` - 연결 해제
//! - `POST /api/v1/broker/sessions/cleanup` - 만료 세션 정리 (운영자)

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header::LOCATION, StatusCode},
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use folio_core::{pending_cutoff, UserId};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use crate::auth::Caller;
use crate::error::{ApiErrorResponse, ApiResult, ServiceError};
use crate::services::{
    complete_login, redirect_url, sync_all_users, sync_for_user, sync_owned, CallbackParams,
    UserSyncResult,
};
use crate::state::AppState;

// ==================== 응답 타입 ====================

/// 로그인 URL 응답.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginUrlResponse {
    pub login_url: String,
}

/// 연결 상태 응답.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BrokerStatusResponse {
    /// 서버에 API 키가 설정되었는지 여부
    pub configured: bool,
    /// 호출자가 유효한 세션을 소유하는지 여부
    pub connected: bool,
    /// 세션 만료 시각
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

/// 동기화 요청 쿼리 (운영자 전용 대상 지정).
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct SyncQuery {
    /// 동기화할 사용자. 운영자 호출에서 생략하면 전체 사용자
    pub user_id: Option<String>,
}

/// 동기화 응답.
#[derive(Debug, Serialize, ToSchema)]
pub struct SyncResponse {
    pub results: Vec<UserSyncResult>,
}

/// 연결 해제 응답.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DisconnectResponse {
    pub deleted: u64,
}

/// 세션 정리 응답.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CleanupResponse {
    pub expired_deleted: u64,
    pub pending_deleted: u64,
}

// ==================== 핸들러 ====================

/// 브로커 로그인 URL 생성.
///
/// state에는 호출자 ID가 서명되어 담기며, 콜백에서 세션 소유자를 결정합니다.
#[utoipa::path(
    get,
    path = "/api/v1/broker/zerodha/login",
    responses(
        (status = 200, description = "로그인 URL", body = LoginUrlResponse),
        (status = 401, description = "인증 실패", body = ApiErrorResponse),
        (status = 503, description = "브로커 미설정", body = ApiErrorResponse)
    ),
    tag = "broker"
)]
pub async fn zerodha_login(
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> ApiResult<Json<LoginUrlResponse>> {
    let user_id = caller.require_user()?;
    let connector = state.connector()?;
    let token = state.state_codec.encode(user_id);

    Ok(Json(LoginUrlResponse {
        login_url: connector.login_url(&token),
    }))
}

/// 브로커 로그인 콜백.
///
/// 결과와 관계없이 프론트엔드로 302 리다이렉트합니다.
#[utoipa::path(
    get,
    path = "/api/v1/broker/zerodha/callback",
    params(CallbackParams),
    responses((status = 302, description = "프론트엔드로 리다이렉트")),
    tag = "broker"
)]
pub async fn zerodha_callback(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CallbackParams>,
) -> impl IntoResponse {
    let result = complete_login(&state, &params).await;
    if let Err(e) = &result {
        info!(code = e.code(), error = %e, "Broker callback failed");
    }
    let location = redirect_url(&state.config.frontend.redirect_url, &result);
    (StatusCode::FOUND, [(LOCATION, location)])
}

/// 브로커 연결 상태 조회.
#[utoipa::path(
    get,
    path = "/api/v1/broker/zerodha/status",
    responses(
        (status = 200, description = "연결 상태", body = BrokerStatusResponse),
        (status = 401, description = "인증 실패", body = ApiErrorResponse)
    ),
    tag = "broker"
)]
pub async fn zerodha_status(
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> ApiResult<Json<BrokerStatusResponse>> {
    let user_id = caller.require_user()?;
    let session = state
        .sessions
        .latest_owned_valid(user_id, Utc::now())
        .await
        .map_err(ServiceError::from)?;

    Ok(Json(BrokerStatusResponse {
        configured: state.broker.is_some(),
        connected: session.is_some(),
        expires_at: session.map(|s| s.expires_at),
    }))
}

/// 보유 종목 동기화.
///
/// - 사용자: 자신의 세션으로 동기화 (필요하면 Pending 세션 획득)
/// - 운영자 + `user_id`: 해당 사용자의 소유 세션으로 동기화
/// - 운영자: 유효 세션을 가진 모든 사용자 동기화
#[utoipa::path(
    post,
    path = "/api/v1/broker/zerodha/sync",
    params(SyncQuery),
    responses(
        (status = 200, description = "동기화 결과", body = SyncResponse),
        (status = 404, description = "유효한 세션 없음", body = ApiErrorResponse),
        (status = 409, description = "브로커 세션 만료", body = ApiErrorResponse),
        (status = 503, description = "브로커 미설정", body = ApiErrorResponse)
    ),
    tag = "broker"
)]
pub async fn zerodha_sync(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Query(query): Query<SyncQuery>,
) -> ApiResult<Json<SyncResponse>> {
    let results = match (&caller, query.user_id.as_deref().map(str::trim)) {
        (Caller::User(user_id), _) => {
            let report = sync_for_user(&state, user_id).await?;
            vec![UserSyncResult::succeeded(user_id, report.holdings_count)]
        }
        (Caller::Operator, Some(target)) if !target.is_empty() => {
            let target = UserId::new(target);
            let report = sync_owned(&state, &target).await?;
            vec![UserSyncResult::succeeded(&target, report.holdings_count)]
        }
        (Caller::Operator, _) => sync_all_users(&state).await?,
    };

    Ok(Json(SyncResponse { results }))
}

/// 브로커 연결 해제 (호출자의 모든 세션 삭제).
#[utoipa::path(
    delete,
    path = "/api/v1/broker/zerodha/session",
    responses(
        (status = 200, description = "삭제된 세션 수", body = DisconnectResponse),
        (status = 401, description = "인증 실패", body = ApiErrorResponse)
    ),
    tag = "broker"
)]
pub async fn zerodha_disconnect(
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> ApiResult<Json<DisconnectResponse>> {
    let user_id = caller.require_user()?;
    let deleted = state
        .sessions
        .delete_sessions_for_user(user_id)
        .await
        .map_err(ServiceError::from)?;
    info!(user_id = %user_id, deleted, "Broker disconnected");

    Ok(Json(DisconnectResponse { deleted }))
}

/// 만료 세션과 오래된 Pending 세션 정리 (운영자 전용).
#[utoipa::path(
    post,
    path = "/api/v1/broker/sessions/cleanup",
    responses(
        (status = 200, description = "정리 결과", body = CleanupResponse),
        (status = 403, description = "운영자 자격증명 필요", body = ApiErrorResponse)
    ),
    tag = "broker"
)]
pub async fn cleanup_sessions(
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> ApiResult<Json<CleanupResponse>> {
    caller.require_operator()?;
    let now = Utc::now();

    let expired_deleted = state
        .sessions
        .delete_expired(now)
        .await
        .map_err(ServiceError::from)?;
    let pending_deleted = state
        .sessions
        .delete_pending_older_than(pending_cutoff(now))
        .await
        .map_err(ServiceError::from)?;
    info!(expired_deleted, pending_deleted, "Broker sessions cleaned up");

    Ok(Json(CleanupResponse {
        expired_deleted,
        pending_deleted,
    }))
}

/// 브로커 라우터 생성.
pub fn broker_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/zerodha/login", get(zerodha_login))
        .route("/zerodha/callback", get(zerodha_callback))
        .route("/zerodha/status", get(zerodha_status))
        .route("/zerodha/sync", post(zerodha_sync))
        .route("/zerodha/session", delete(zerodha_disconnect))
        .route("/sessions/cleanup", post(cleanup_sessions))
}
