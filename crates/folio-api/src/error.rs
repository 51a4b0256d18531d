//! 통합 API 에러 응답 타입.
//!
//! 모든 API 엔드포인트에서 일관된 에러 형식을 제공합니다.
//! 서비스 계층 에러([`ServiceError`])는 핸들러 경계에서 상태 코드와
//! 에러 코드가 붙은 [`ApiErrorResponse`]로 변환됩니다.

use axum::http::StatusCode;
use axum::Json;
use folio_broker::BrokerError;
use folio_core::StoreError;
use folio_import::{ImportError, SkippedRow};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::error;
use utoipa::ToSchema;

/// 통합 API 에러 응답.
///
/// # 예시
///
/// ```json
/// {
///   "code": "MISSING_COLUMN",
///   "message": "Missing required column: Broker",
///   "timestamp": 1738300800
/// }
/// ```
///
/// 업로드 실패 시 `details.skipped`에 건너뛴 행 목록이 담깁니다.
///
/// ```json
/// {
///   "code": "NO_VALID_ROWS",
///   "message": "No valid holdings found (2 rows skipped)",
///   "details": { "skipped": [{ "row": 2, "reason": "Missing broker" }] }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiErrorResponse {
    /// 에러 코드 (예: "NO_VALID_SESSION", "FILE_TOO_LARGE")
    pub code: String,
    /// 사람이 읽을 수 있는 에러 메시지
    pub message: String,
    /// 추가 에러 상세 정보 (선택적)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    /// 에러 발생 타임스탬프 (Unix timestamp)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl ApiErrorResponse {
    /// 기본 에러 생성 (타임스탬프 포함).
    ///
    /// ```
    /// use folio_api::error::ApiErrorResponse;
    ///
    /// let error = ApiErrorResponse::new("NO_VALID_SESSION", "No active broker session");
    /// assert_eq!(error.code(), "NO_VALID_SESSION");
    /// ```
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            timestamp: Some(chrono::Utc::now().timestamp()),
        }
    }

    /// 상세 정보 포함 에러 생성.
    pub fn with_details(code: impl Into<String>, message: impl Into<String>, details: Value) -> Self {
        Self {
            details: Some(details),
            ..Self::new(code, message)
        }
    }

    /// 에러 코드 반환.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// 에러 메시지 반환.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ApiErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiErrorResponse {}

/// API 핸들러 Result 타입 별칭.
pub type ApiResult<T> = Result<T, (StatusCode, Json<ApiErrorResponse>)>;

/// 서비스 계층 에러.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// 운영자 설정 문제 (메시지를 그대로 노출)
    #[error("{0}")]
    Config(String),

    /// 사용 가능한 브로커 세션이 없음
    #[error("No active broker session")]
    NoValidSession,

    /// 잘못된 요청
    #[error("{0}")]
    InvalidInput(String),

    /// 호출자 유형이 허용되지 않음
    #[error("{0}")]
    Forbidden(String),

    /// 브로커 에러
    #[error(transparent)]
    Broker(#[from] BrokerError),

    /// 파일 수집 에러
    #[error(transparent)]
    Import(#[from] ImportError),

    /// 저장소 에러
    #[error(transparent)]
    Store(#[from] StoreError),

    /// 파싱은 끝났지만 저장에 실패한 업로드
    #[error("{source}")]
    UploadStore {
        source: StoreError,
        skipped: Vec<SkippedRow>,
    },

    /// 내부 에러 (태스크 실패 등)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// HTTP 상태 코드.
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::Config(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServiceError::NoValidSession => StatusCode::NOT_FOUND,
            ServiceError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
            ServiceError::Broker(e) => match e {
                BrokerError::Config(_) => StatusCode::SERVICE_UNAVAILABLE,
                BrokerError::SessionInvalid(_) => StatusCode::CONFLICT,
                BrokerError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
                BrokerError::Rejected(_) => StatusCode::BAD_REQUEST,
                BrokerError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
                _ => StatusCode::BAD_GATEWAY,
            },
            ServiceError::Import(e) => match e {
                ImportError::FileTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
                ImportError::UnsupportedExtension(_) | ImportError::UnsupportedMime(_) => {
                    StatusCode::UNSUPPORTED_MEDIA_TYPE
                }
                ImportError::ProcessingTimeout { .. } => StatusCode::REQUEST_TIMEOUT,
                _ => StatusCode::UNPROCESSABLE_ENTITY,
            },
            ServiceError::Store(_) | ServiceError::UploadStore { .. } | ServiceError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// API 에러 코드.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Config(_) => "CONFIGURATION_ERROR",
            ServiceError::NoValidSession => "NO_VALID_SESSION",
            ServiceError::InvalidInput(_) => "INVALID_INPUT",
            ServiceError::Forbidden(_) => "FORBIDDEN",
            ServiceError::Broker(e) => match e {
                BrokerError::Config(_) => "CONFIGURATION_ERROR",
                BrokerError::SessionInvalid(_) => "BROKER_SESSION_EXPIRED",
                BrokerError::RateLimited => "BROKER_RATE_LIMITED",
                BrokerError::Rejected(_) => "BROKER_REJECTED",
                _ => "BROKER_ERROR",
            },
            ServiceError::Import(e) => e.code(),
            ServiceError::Store(_) | ServiceError::UploadStore { .. } => "DATABASE_ERROR",
            ServiceError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// 사용자에게 보여줄 메시지. 내부 에러의 세부 내용은 노출하지 않습니다.
    pub fn user_message(&self) -> String {
        match self {
            ServiceError::NoValidSession => {
                "No active Zerodha session, please connect your account".to_string()
            }
            ServiceError::Broker(e) => e.user_message(),
            ServiceError::Store(_) | ServiceError::UploadStore { .. } => {
                "Failed to access holdings storage".to_string()
            }
            ServiceError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }

    /// 응답 `details`. 업로드 실패에는 건너뛴 행 목록을 담습니다.
    pub fn details(&self) -> Option<Value> {
        let skipped = match self {
            ServiceError::Import(e @ ImportError::NoValidRows { .. }) => e.skipped_rows(),
            ServiceError::UploadStore { skipped, .. } => skipped.as_slice(),
            _ => return None,
        };
        Some(json!({ "skipped": skipped }))
    }
}

impl From<ServiceError> for (StatusCode, Json<ApiErrorResponse>) {
    fn from(err: ServiceError) -> Self {
        let status = err.status();
        if status.is_server_error() {
            error!(code = err.code(), error = %err, "Request failed");
        }
        let body = match err.details() {
            Some(details) => ApiErrorResponse::with_details(err.code(), err.user_message(), details),
            None => ApiErrorResponse::new(err.code(), err.user_message()),
        };
        (status, Json(body))
    }
}
