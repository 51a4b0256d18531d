//! 공용 에러 타입.
//!
//! 파이프라인 전반에서 공유되는 에러 타입을 정의합니다.
//! 저장소 계층 에러는 [`crate::domain::StoreError`]를 사용합니다.

use thiserror::Error;

/// 핵심 도메인 에러.
#[derive(Debug, Error)]
pub enum CoreError {
    /// 설정 에러 (API 키 누락 등, 재시도 불가)
    #[error("설정 에러: {0}")]
    Config(String),

    /// 입력 검증 에러
    #[error("검증 에러: {0}")]
    Validation(String),

    /// 암호화 에러
    #[error("암호화 에러: {0}")]
    Crypto(#[from] crate::crypto::CryptoError),

    /// 직렬화 에러
    #[error("직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CoreError {
    /// 운영자 설정 문제인지 확인.
    pub fn is_config_error(&self) -> bool {
        matches!(self, CoreError::Config(_))
    }
}

/// Result 타입 별칭.
pub type CoreResult<T> = Result<T, CoreError>;
