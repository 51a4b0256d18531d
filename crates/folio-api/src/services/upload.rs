//! 업로드 파일 수집.
//!
//! 파일을 파싱한 뒤 (사용자, 출처)의 보유 종목을 교체합니다.
//! 입력 에러는 저장 전에 거부됩니다.

use folio_core::{sync_span, SourceId, UserId};
use folio_import::{parse_holdings_file, ParseSummary, SkippedRow};
use serde::Serialize;
use std::time::Instant;
use tracing::{info, Instrument};
use utoipa::ToSchema;

use super::reconciler::{ReconcileReport, Reconciler};
use crate::error::ServiceError;
use crate::state::AppState;

/// 업로드 결과.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UploadReport {
    pub reconcile: ReconcileReport,
    #[schema(value_type = Object)]
    pub summary: ParseSummary,
    #[schema(value_type = Vec<Object>)]
    pub skipped: Vec<SkippedRow>,
    pub warnings: Vec<String>,
    /// 파싱부터 저장까지 걸린 시간 (밀리초)
    pub processing_ms: u64,
}

/// 업로드 출처를 결정합니다. 브로커 출처는 업로드로 덮어쓸 수 없습니다.
pub fn upload_source(requested: Option<&str>) -> Result<SourceId, ServiceError> {
    let source = match requested.map(str::trim).filter(|s| !s.is_empty()) {
        Some(name) => SourceId::parse(name).map_err(|e| ServiceError::InvalidInput(e.to_string()))?,
        None => SourceId::upload(),
    };
    if source.as_str() == SourceId::ZERODHA {
        return Err(ServiceError::InvalidInput(format!(
            "Source '{}' is reserved for broker sync",
            source
        )));
    }
    Ok(source)
}

/// 업로드 파일을 파싱하여 보유 종목을 교체합니다.
pub async fn import_holdings_file(
    state: &AppState,
    user_id: &UserId,
    source: SourceId,
    file_name: String,
    content_type: Option<String>,
    bytes: Vec<u8>,
) -> Result<UploadReport, ServiceError> {
    let options = state.parse_options();
    let size = bytes.len();
    let started = Instant::now();

    async {
        // 파싱은 CPU 작업이므로 blocking thread pool에서 실행
        let outcome = tokio::task::spawn_blocking(move || {
            parse_holdings_file(&bytes, &file_name, content_type.as_deref(), &options, None)
        })
        .await
        .map_err(|e| ServiceError::Internal(format!("parse task failed: {}", e)))??;

        info!(
            size,
            parsed = outcome.summary.holdings_parsed,
            skipped = outcome.summary.rows_skipped,
            "Upload parsed"
        );

        let reconciler = Reconciler::new(
            state.holdings.as_ref(),
            state.sync_logs.as_ref(),
            state.config.import.batch_size,
        );
        let reconcile = match reconciler.replace(user_id, &source, outcome.holdings).await {
            Ok(reconcile) => reconcile,
            Err(e) => {
                return Err(ServiceError::UploadStore {
                    source: e,
                    skipped: outcome.skipped,
                })
            }
        };

        let processing_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        info!(processing_ms, "Upload stored");

        Ok(UploadReport {
            reconcile,
            summary: outcome.summary,
            skipped: outcome.skipped,
            warnings: outcome.warnings,
            processing_ms,
        })
    }
    .instrument(sync_span!("holdings_upload", user_id, source))
    .await
}
