//! 보유 종목 endpoint.
//!
//! # 엔드포인트
//!
//! - `POST /api/v1/holdings/upload` - 스프레드시트 업로드 (multipart)
//! - `GET /api/v1/holdings` - 현재 보유 종목 조회

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use folio_core::{HoldingRecord, ImportConfig, SourceId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::auth::Caller;
use crate::error::{ApiErrorResponse, ApiResult, ServiceError};
use crate::services::{import_holdings_file, upload_source, UploadReport};
use crate::state::AppState;

/// multipart 경계와 부가 필드를 위한 여유분.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// 보유 종목 조회 쿼리.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct HoldingsQuery {
    /// 출처 필터 (예: "zerodha", "upload")
    pub source: Option<String>,
}

/// 보유 종목 목록 응답.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HoldingsResponse {
    pub holdings: Vec<HoldingRecord>,
    pub count: usize,
    /// 투자 원금 합계
    pub total_invested: Decimal,
    /// 평가 금액 합계
    pub total_market_value: Decimal,
}

impl HoldingsResponse {
    fn from_records(holdings: Vec<HoldingRecord>) -> Self {
        let total_invested = holdings.iter().map(|h| h.holding.invested_value()).sum();
        let total_market_value = holdings.iter().map(|h| h.holding.market_value()).sum();
        Self {
            count: holdings.len(),
            holdings,
            total_invested,
            total_market_value,
        }
    }
}

/// 업로드된 파일.
struct UploadedFile {
    name: String,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> (StatusCode, Json<ApiErrorResponse>) {
    (
        e.status(),
        Json(ApiErrorResponse::new("INVALID_MULTIPART", e.body_text())),
    )
}

/// 보유 종목 파일 업로드.
///
/// `file` 필드에 CSV/XLSX/XLS 파일, 선택적으로 `source` 필드에 출처 이름을 담습니다.
/// 성공 시 해당 출처의 기존 보유 종목을 모두 교체합니다.
#[utoipa::path(
    post,
    path = "/api/v1/holdings/upload",
    request_body(content_type = "multipart/form-data", description = "file: 스프레드시트, source: 출처 (선택)"),
    responses(
        (status = 200, description = "업로드 결과", body = UploadReport),
        (status = 400, description = "잘못된 요청", body = ApiErrorResponse),
        (status = 413, description = "파일 크기 초과", body = ApiErrorResponse),
        (status = 415, description = "지원하지 않는 형식", body = ApiErrorResponse),
        (status = 422, description = "파일 내용 오류", body = ApiErrorResponse)
    ),
    tag = "holdings"
)]
pub async fn upload_holdings(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadReport>> {
    let user_id = caller.require_user()?.clone();

    let mut file: Option<UploadedFile> = None;
    let mut requested_source: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        match field.name() {
            Some("file") => {
                let name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(multipart_error)?;
                file = Some(UploadedFile {
                    name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            Some("source") => {
                requested_source = Some(field.text().await.map_err(multipart_error)?);
            }
            _ => {}
        }
    }

    let file = file.ok_or_else(|| ServiceError::InvalidInput("Missing 'file' field".to_string()))?;
    let source = upload_source(requested_source.as_deref())?;

    let report = import_holdings_file(
        &state,
        &user_id,
        source,
        file.name,
        file.content_type,
        file.bytes,
    )
    .await?;

    Ok(Json(report))
}

/// 현재 보유 종목 조회.
#[utoipa::path(
    get,
    path = "/api/v1/holdings",
    params(HoldingsQuery),
    responses(
        (status = 200, description = "보유 종목 목록", body = HoldingsResponse),
        (status = 400, description = "잘못된 출처", body = ApiErrorResponse)
    ),
    tag = "holdings"
)]
pub async fn list_holdings(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Query(query): Query<HoldingsQuery>,
) -> ApiResult<Json<HoldingsResponse>> {
    let user_id = caller.require_user()?;
    let source = query
        .source
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(SourceId::parse)
        .transpose()
        .map_err(|e| ServiceError::InvalidInput(e.to_string()))?;

    let holdings = state
        .holdings
        .current_holdings(user_id, source.as_ref())
        .await
        .map_err(ServiceError::from)?;

    Ok(Json(HoldingsResponse::from_records(holdings)))
}

/// 보유 종목 라우터 생성.
pub fn holdings_router(import: &ImportConfig) -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_holdings))
        .route(
            "/upload",
            post(upload_holdings)
                .layer(DefaultBodyLimit::max(import.max_file_bytes + MULTIPART_OVERHEAD)),
        )
}
