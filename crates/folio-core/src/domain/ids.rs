//! 식별자 타입.

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 사용자 ID (ID 공급자의 `sub`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// 새 사용자 ID를 생성합니다.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// 보유 종목 출처 식별자.
///
/// 소문자 영숫자와 `_`, `-`만 허용하며 최대 32자입니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SourceId(String);

impl SourceId {
    /// Zerodha 실시간 동기화
    pub const ZERODHA: &'static str = "zerodha";
    /// 파일 업로드 기본 출처
    pub const UPLOAD: &'static str = "upload";

    const MAX_LEN: usize = 32;

    /// 문자열을 검증하여 출처 ID를 생성합니다. 대소문자는 무시됩니다.
    pub fn parse(value: &str) -> Result<Self, CoreError> {
        let normalized = value.trim().to_lowercase();
        let valid = !normalized.is_empty()
            && normalized.len() <= Self::MAX_LEN
            && normalized
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-');

        if valid {
            Ok(Self(normalized))
        } else {
            Err(CoreError::Validation(format!("Invalid source: {}", value)))
        }
    }

    pub fn zerodha() -> Self {
        Self(Self::ZERODHA.to_string())
    }

    pub fn upload() -> Self {
        Self(Self::UPLOAD.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for SourceId {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SourceId> for String {
    fn from(source: SourceId) -> Self {
        source.0
    }
}
