//! 업로드 파일 사전 검사.

use crate::{ImportError, ImportResult};

/// 지원하는 파일 형식.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Xlsx,
    Xls,
    Csv,
}

impl FileKind {
    /// 파일명 확장자로 판별.
    pub fn from_file_name(file_name: &str) -> ImportResult<Self> {
        let extension = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.trim().to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "xlsx" => Ok(FileKind::Xlsx),
            "xls" => Ok(FileKind::Xls),
            "csv" => Ok(FileKind::Csv),
            _ => Err(ImportError::UnsupportedExtension(extension)),
        }
    }
}

const ACCEPTED_MIME_TYPES: &[&str] = &[
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.ms-excel",
    "application/excel",
    "application/x-excel",
    "text/csv",
    "application/csv",
    "text/comma-separated-values",
    "text/plain",
];

// 브라우저나 클라이언트가 형식을 모를 때 보내는 값
const GENERIC_MIME_TYPES: &[&str] = &["application/octet-stream", "binary/octet-stream"];

/// 크기, 확장자, 선언된 MIME 타입을 검사합니다.
pub fn check_upload(
    file_name: &str,
    content_type: Option<&str>,
    size: usize,
    max_bytes: usize,
) -> ImportResult<FileKind> {
    if size == 0 {
        return Err(ImportError::EmptyFile);
    }
    if size > max_bytes {
        return Err(ImportError::FileTooLarge {
            size,
            max: max_bytes,
        });
    }

    let kind = FileKind::from_file_name(file_name)?;

    if let Some(content_type) = content_type {
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_lowercase();
        let generic = mime.is_empty() || GENERIC_MIME_TYPES.contains(&mime.as_str());
        if !generic && !ACCEPTED_MIME_TYPES.contains(&mime.as_str()) {
            return Err(ImportError::UnsupportedMime(mime));
        }
    }

    Ok(kind)
}
