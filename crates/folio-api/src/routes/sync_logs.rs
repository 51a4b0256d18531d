//! 동기화 로그 조회 endpoint.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use folio_core::SyncLogEntry;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::auth::Caller;
use crate::error::{ApiErrorResponse, ApiResult, ServiceError};
use crate::state::AppState;

const DEFAULT_LIMIT: i64 = 20;
const MAX_LIMIT: i64 = 100;

/// 로그 조회 쿼리.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct SyncLogQuery {
    /// 최대 개수 (기본 20, 최대 100)
    pub limit: Option<i64>,
}

impl SyncLogQuery {
    fn effective_limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }
}

/// 로그 목록 응답.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SyncLogResponse {
    pub logs: Vec<SyncLogEntry>,
    pub count: usize,
}

/// 호출자의 최근 동기화 로그 (최신순).
#[utoipa::path(
    get,
    path = "/api/v1/sync-logs",
    params(SyncLogQuery),
    responses(
        (status = 200, description = "동기화 로그", body = SyncLogResponse),
        (status = 401, description = "인증 실패", body = ApiErrorResponse)
    ),
    tag = "sync-logs"
)]
pub async fn list_sync_logs(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Query(query): Query<SyncLogQuery>,
) -> ApiResult<Json<SyncLogResponse>> {
    let user_id = caller.require_user()?;
    let logs = state
        .sync_logs
        .recent(user_id, query.effective_limit())
        .await
        .map_err(ServiceError::from)?;

    Ok(Json(SyncLogResponse {
        count: logs.len(),
        logs,
    }))
}

/// 동기화 로그 라우터 생성.
pub fn sync_logs_router() -> Router<Arc<AppState>> {
    Router::new().route("/", get(list_sync_logs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_clamped() {
        assert_eq!(SyncLogQuery { limit: None }.effective_limit(), 20);
        assert_eq!(SyncLogQuery { limit: Some(0) }.effective_limit(), 1);
        assert_eq!(SyncLogQuery { limit: Some(500) }.effective_limit(), 100);
        assert_eq!(SyncLogQuery { limit: Some(5) }.effective_limit(), 5);
    }
}
