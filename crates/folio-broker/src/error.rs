//! 브로커 에러 타입.

use thiserror::Error;

/// 브로커 연동 에러.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// 설정 에러 (API 키 누락 등)
    #[error("Configuration error: {0}")]
    Config(String),

    /// 세션 만료/무효 (401, 403)
    #[error("Session invalid: {0}")]
    SessionInvalid(String),

    /// 요청 한도 초과 (429)
    #[error("Rate limit exceeded")]
    RateLimited,

    /// 기타 비정상 응답
    #[error("Broker request failed ({status}): {message}")]
    FetchFailed { status: u16, message: String },

    /// 인증 코드 교환 거부
    #[error("Token exchange rejected: {0}")]
    Rejected(String),

    /// 파싱/역직렬화 에러
    #[error("Parse error: {0}")]
    Parse(String),

    /// 네트워크/연결 에러
    #[error("Network error: {0}")]
    Network(String),

    /// 타임아웃
    #[error("Request timeout: {0}")]
    Timeout(String),
}

impl BrokerError {
    /// HTTP 상태 코드와 응답 본문으로 에러를 분류합니다.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = error_message(body);
        match status {
            401 | 403 => BrokerError::SessionInvalid(message),
            429 => BrokerError::RateLimited,
            _ => BrokerError::FetchFailed { status, message },
        }
    }

    /// 인증 에러인지 확인 (재연결 필요).
    pub fn is_auth_error(&self) -> bool {
        matches!(self, BrokerError::SessionInvalid(_))
    }

    /// 재시도 가능한 에러인지 확인.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BrokerError::RateLimited | BrokerError::Network(_) | BrokerError::Timeout(_)
        )
    }

    /// 운영자 설정 문제인지 확인.
    pub fn is_config_error(&self) -> bool {
        matches!(self, BrokerError::Config(_))
    }

    /// 사용자에게 보여줄 메시지.
    pub fn user_message(&self) -> String {
        match self {
            BrokerError::Config(msg) => msg.clone(),
            BrokerError::SessionInvalid(_) => {
                "Broker session expired, please reconnect your account".to_string()
            }
            BrokerError::RateLimited => {
                "Broker rate limit reached, please try again in a minute".to_string()
            }
            BrokerError::FetchFailed { status, .. } => {
                format!("Broker request failed (status {})", status)
            }
            BrokerError::Rejected(msg) => format!("Broker rejected the login: {}", msg),
            BrokerError::Parse(_) => "Unexpected response from broker".to_string(),
            BrokerError::Network(_) | BrokerError::Timeout(_) => {
                "Could not reach the broker, please try again".to_string()
            }
        }
    }
}

/// Kite 에러 응답(`{"status":"error","message":...}`)에서 메시지를 추출합니다.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.chars().take(200).collect())
}

impl From<reqwest::Error> for BrokerError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            BrokerError::Timeout(err.to_string())
        } else {
            BrokerError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for BrokerError {
    fn from(err: serde_json::Error) -> Self {
        BrokerError::Parse(err.to_string())
    }
}

/// Result 타입 별칭.
pub type BrokerResult<T> = Result<T, BrokerError>;
