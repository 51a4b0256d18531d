//! OpenAPI 문서화 설정.
//!
//! utoipa를 사용하여 REST API의 OpenAPI 3.0 문서를 생성합니다.
//! Swagger UI는 `/swagger-ui` 경로에서 사용 가능합니다.
//!
//! 새로운 엔드포인트를 추가할 때:
//!
//! 1. 응답/요청 타입에 `#[derive(ToSchema)]` 추가
//! 2. 핸들러에 `#[utoipa::path(...)]` 어노테이션 추가
//! 3. 이 파일의 `components(schemas(...))` 및 `paths(...)` 섹션에 추가

use axum::Router;
use folio_core::{AssetType, CanonicalHolding, HoldingRecord, SyncLogEntry, SyncStatus};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::error::ApiErrorResponse;
use crate::routes::{
    BrokerStatusResponse, CleanupResponse, ComponentHealth, ComponentState, ComponentStatus,
    DisconnectResponse, HealthResponse, HoldingsResponse, LoginUrlResponse, ServiceHealth,
    SyncLogResponse, SyncResponse,
};
use crate::services::{ReconcileReport, UploadReport, UserSyncResult};

/// Folio API 문서.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Folio Holdings API",
        version = "0.1.0",
        description = r#"
# Folio 보유 종목 수집 API

브로커(Zerodha Kite) 로그인 세션과 보유 종목 수집 파이프라인을 위한 REST API입니다.

## 주요 기능

- **브로커 연동**: OAuth 로그인, 세션 관리, 보유 종목 동기화
- **파일 업로드**: CSV/XLSX/XLS 보유 종목 스프레드시트 수집
- **동기화 로그**: 수집 결과 이력

## 인증

콜백과 헬스 체크를 제외한 모든 엔드포인트는 인증이 필요합니다.

- 사용자: `Authorization: Bearer <JWT>`
- 내부 서비스: `Authorization: Bearer <service key>`
- 스케줄러: `x-operator-secret: <secret>`
"#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:3000", description = "로컬 개발 서버"),
    ),
    tags(
        (name = "health", description = "헬스 체크 - 서버 상태 확인"),
        (name = "broker", description = "브로커 - 로그인, 세션, 동기화"),
        (name = "holdings", description = "보유 종목 - 조회 및 파일 업로드"),
        (name = "sync-logs", description = "동기화 로그 - 수집 이력")
    ),
    components(
        schemas(
            HealthResponse,
            ServiceHealth,
            ComponentHealth,
            ComponentStatus,
            ComponentState,

            ApiErrorResponse,

            LoginUrlResponse,
            BrokerStatusResponse,
            SyncResponse,
            UserSyncResult,
            DisconnectResponse,
            CleanupResponse,

            HoldingsResponse,
            HoldingRecord,
            CanonicalHolding,
            AssetType,
            UploadReport,
            ReconcileReport,

            SyncLogResponse,
            SyncLogEntry,
            SyncStatus,
        )
    ),
    paths(
        crate::routes::health::health_check,
        crate::routes::health::health_ready,

        crate::routes::broker::zerodha_login,
        crate::routes::broker::zerodha_callback,
        crate::routes::broker::zerodha_status,
        crate::routes::broker::zerodha_sync,
        crate::routes::broker::zerodha_disconnect,
        crate::routes::broker::cleanup_sessions,

        crate::routes::holdings::upload_holdings,
        crate::routes::holdings::list_holdings,

        crate::routes::sync_logs::list_sync_logs,
    )
)]
pub struct ApiDoc;

/// Swagger UI 라우터 생성.
pub fn swagger_ui_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .into()
}
