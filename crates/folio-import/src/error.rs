//! 파일 수집 에러 타입.
//!
//! 모든 에러는 저장 전에 발생하며, 사용자에게 그대로 보여줄 수 있는 이유를 담습니다.

use crate::parser::SkippedRow;
use thiserror::Error;

/// 파일 수집 에러.
#[derive(Debug, Error)]
pub enum ImportError {
    /// 파일 크기 초과
    #[error("File is too large: {size} bytes (maximum {max} bytes)")]
    FileTooLarge { size: usize, max: usize },

    /// 빈 파일
    #[error("File is empty")]
    EmptyFile,

    /// 지원하지 않는 확장자
    #[error("Unsupported file type '{0}': expected .xlsx, .xls or .csv")]
    UnsupportedExtension(String),

    /// 지원하지 않는 MIME 타입
    #[error("Unsupported content type '{0}'")]
    UnsupportedMime(String),

    /// 파일을 읽을 수 없음
    #[error("Could not read file: {0}")]
    Unreadable(String),

    /// 헤더 행을 찾을 수 없음
    #[error("Could not find a header row in the first {0} rows")]
    NoHeaderRow(usize),

    /// 필수 열 누락
    #[error("Missing required column: {0}")]
    MissingColumn(&'static str),

    /// 유효한 행이 없음. 건너뛴 행 목록을 그대로 담습니다.
    #[error("No valid holdings found ({} rows skipped)", .skipped.len())]
    NoValidRows { skipped: Vec<SkippedRow> },

    /// 처리 시간 초과
    #[error("Processing timed out at row {row}")]
    ProcessingTimeout { row: usize },
}

impl ImportError {
    /// API 에러 코드.
    pub fn code(&self) -> &'static str {
        match self {
            ImportError::FileTooLarge { .. } => "FILE_TOO_LARGE",
            ImportError::EmptyFile => "EMPTY_FILE",
            ImportError::UnsupportedExtension(_) => "UNSUPPORTED_FILE_TYPE",
            ImportError::UnsupportedMime(_) => "UNSUPPORTED_CONTENT_TYPE",
            ImportError::Unreadable(_) => "UNREADABLE_FILE",
            ImportError::NoHeaderRow(_) => "NO_HEADER_ROW",
            ImportError::MissingColumn(_) => "MISSING_COLUMN",
            ImportError::NoValidRows { .. } => "NO_VALID_ROWS",
            ImportError::ProcessingTimeout { .. } => "PROCESSING_TIMEOUT",
        }
    }

    /// 에러와 함께 보고할 건너뛴 행 목록.
    pub fn skipped_rows(&self) -> &[SkippedRow] {
        match self {
            ImportError::NoValidRows { skipped } => skipped,
            _ => &[],
        }
    }

    /// 시간 초과 에러인지 확인.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ImportError::ProcessingTimeout { .. })
    }
}

/// Result 타입 별칭.
pub type ImportResult<T> = Result<T, ImportError>;
