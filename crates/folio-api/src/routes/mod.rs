//! API 라우트.
//!
//! # 라우트 구조
//!
//! - `/health` - 헬스 체크 (liveness)
//! - `/health/ready` - 상세 헬스 체크 (readiness)
//! - `/api/v1/broker` - 브로커 로그인, 세션, 동기화
//! - `/api/v1/holdings` - 보유 종목 조회 및 파일 업로드
//! - `/api/v1/sync-logs` - 동기화 로그

pub mod broker;
pub mod health;
pub mod holdings;
pub mod sync_logs;

pub use broker::{
    broker_router, BrokerStatusResponse, CleanupResponse, DisconnectResponse, LoginUrlResponse,
    SyncQuery, SyncResponse,
};
pub use health::{
    health_router, ComponentHealth, ComponentState, ComponentStatus, HealthResponse, ServiceHealth,
};
pub use holdings::{holdings_router, HoldingsQuery, HoldingsResponse};
pub use sync_logs::{sync_logs_router, SyncLogQuery, SyncLogResponse};

use axum::Router;
use folio_core::ImportConfig;
use std::sync::Arc;

use crate::state::AppState;

/// 전체 API 라우터 생성.
pub fn create_api_router(import: &ImportConfig) -> Router<Arc<AppState>> {
    Router::new()
        .nest("/health", health_router())
        .nest("/api/v1/broker", broker_router())
        .nest("/api/v1/holdings", holdings_router(import))
        .nest("/api/v1/sync-logs", sync_logs_router())
}
