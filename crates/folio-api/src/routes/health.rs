//! 헬스 체크 endpoint. 인증 없이 접근 가능합니다.

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::state::AppState;

/// 전체 서비스 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ServiceHealth {
    Healthy,
    Degraded,
}

/// 의존 컴포넌트 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ComponentState {
    Up,
    Down,
    /// 설정되지 않음 (인메모리 저장소, 브로커 키 없음 등)
    NotConfigured,
}

/// 컴포넌트 상태와 부가 설명.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ComponentStatus {
    pub state: ComponentState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ComponentStatus {
    fn new(state: ComponentState, detail: Option<&str>) -> Self {
        Self {
            state,
            detail: detail.map(str::to_string),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ComponentHealth {
    /// 세션/보유 종목 저장소
    pub database: ComponentStatus,
    /// Zerodha 커넥터
    pub broker: ComponentStatus,
}

/// readiness 응답.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: ServiceHealth,
    pub version: String,
    pub uptime_secs: i64,
    pub checked_at: DateTime<Utc>,
    pub components: ComponentHealth,
}

/// liveness 체크.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "서버 응답 가능")),
    tag = "health"
)]
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// readiness 체크.
///
/// 데이터베이스가 설정되어 있는데 응답하지 않으면 503입니다.
/// 브로커 미설정은 업로드 경로가 여전히 동작하므로 503 사유가 아닙니다.
#[utoipa::path(
    get,
    path = "/health/ready",
    responses(
        (status = 200, description = "요청 처리 가능", body = HealthResponse),
        (status = 503, description = "데이터베이스 연결 실패", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_ready(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let database = match state.db_pool {
        None => ComponentStatus::new(ComponentState::NotConfigured, Some("in-memory store")),
        Some(_) if state.is_db_healthy().await => ComponentStatus::new(ComponentState::Up, None),
        Some(_) => ComponentStatus::new(ComponentState::Down, Some("database did not answer")),
    };

    let broker = if state.broker.is_some() {
        ComponentStatus::new(ComponentState::Up, None)
    } else {
        ComponentStatus::new(
            ComponentState::NotConfigured,
            Some("Zerodha API key/secret not set"),
        )
    };

    let (status, code) = if database.state == ComponentState::Down {
        (ServiceHealth::Degraded, StatusCode::SERVICE_UNAVAILABLE)
    } else {
        (ServiceHealth::Healthy, StatusCode::OK)
    };

    let response = HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.uptime_secs(),
        checked_at: Utc::now(),
        components: ComponentHealth { database, broker },
    };

    (code, Json(response))
}

pub fn health_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(health_check))
        .route("/ready", get(health_ready))
}
