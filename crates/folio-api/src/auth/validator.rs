//! 호출자 인증.
//!
//! 요청 헤더에서 호출자를 식별합니다. 지원하는 자격증명:
//!
//! 1. `x-operator-secret` 헤더의 운영자 시크릿 (스케줄 작업)
//! 2. `Authorization: Bearer <service key>` 서비스 마스터 키 (내부 호출)
//! 3. `Authorization: Bearer <JWT>` 사용자 토큰 (`sub` = 사용자 ID)
//!
//! 시크릿 비교는 상수 시간으로 수행하며, 검증 자체는 부작용이 없습니다.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use folio_core::{non_empty, AuthConfig, UserId};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;
use tracing::debug;

use super::jwt::{decode_token, JwtError};
use crate::error::{ApiErrorResponse, ServiceError};
use crate::state::AppState;

/// 운영자 시크릿 헤더 이름.
pub const OPERATOR_SECRET_HEADER: &str = "x-operator-secret";

/// 인증된 호출자.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    /// 최종 사용자
    User(UserId),
    /// 스케줄러 또는 내부 서비스
    Operator,
}

impl Caller {
    pub fn user_id(&self) -> Option<&UserId> {
        match self {
            Caller::User(user_id) => Some(user_id),
            Caller::Operator => None,
        }
    }

    pub fn is_operator(&self) -> bool {
        matches!(self, Caller::Operator)
    }

    /// 사용자 자격증명을 요구합니다.
    pub fn require_user(&self) -> Result<&UserId, ServiceError> {
        self.user_id().ok_or_else(|| {
            ServiceError::Forbidden("This endpoint requires a user credential".to_string())
        })
    }

    /// 운영자 자격증명을 요구합니다.
    pub fn require_operator(&self) -> Result<(), ServiceError> {
        if self.is_operator() {
            Ok(())
        } else {
            Err(ServiceError::Forbidden(
                "This endpoint requires an operator credential".to_string(),
            ))
        }
    }
}

/// 인증 에러.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Authentication credential is required")]
    MissingCredential,
    #[error("Authorization header must use the Bearer scheme")]
    InvalidAuthHeader,
    #[error("Invalid operator secret")]
    InvalidOperatorSecret,
    #[error("Token has expired")]
    TokenExpired,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token audience is not accepted")]
    InvalidAudience,
    #[error("User authentication is not configured")]
    NotConfigured,
}

impl AuthError {
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingCredential => "MISSING_CREDENTIAL",
            AuthError::InvalidAuthHeader => "INVALID_AUTH_HEADER",
            AuthError::InvalidOperatorSecret => "INVALID_OPERATOR_SECRET",
            AuthError::TokenExpired => "TOKEN_EXPIRED",
            AuthError::InvalidToken => "INVALID_TOKEN",
            AuthError::InvalidAudience => "INVALID_AUDIENCE",
            AuthError::NotConfigured => "AUTH_NOT_CONFIGURED",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = Json(ApiErrorResponse::new(self.code(), self.to_string()));
        (StatusCode::UNAUTHORIZED, body).into_response()
    }
}

/// 자격증명 검증기.
#[derive(Clone, Default)]
pub struct AuthValidator {
    jwt_secret: Option<String>,
    jwt_audience: Option<String>,
    service_key: Option<String>,
    operator_secret: Option<String>,
}

impl AuthValidator {
    pub fn from_config(config: &AuthConfig) -> Self {
        Self {
            jwt_secret: Some(config.jwt_secret.trim().to_string()).filter(|s| !s.is_empty()),
            jwt_audience: non_empty(&config.jwt_audience).map(str::to_string),
            service_key: non_empty(&config.service_key).map(str::to_string),
            operator_secret: non_empty(&config.operator_secret).map(str::to_string),
        }
    }

    /// 헤더에서 호출자를 식별합니다.
    pub fn validate(&self, headers: &HeaderMap) -> Result<Caller, AuthError> {
        if let Some(presented) = headers.get(OPERATOR_SECRET_HEADER) {
            let presented = presented.to_str().map_err(|_| AuthError::InvalidOperatorSecret)?;
            return match &self.operator_secret {
                Some(expected) if secrets_match(presented, expected) => Ok(Caller::Operator),
                _ => Err(AuthError::InvalidOperatorSecret),
            };
        }

        let header = headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingCredential)?
            .to_str()
            .map_err(|_| AuthError::InvalidAuthHeader)?;
        let token = header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::InvalidAuthHeader)?;

        if let Some(service_key) = &self.service_key {
            if secrets_match(token, service_key) {
                return Ok(Caller::Operator);
            }
        }

        let secret = self.jwt_secret.as_deref().ok_or(AuthError::NotConfigured)?;
        let data = decode_token(token, secret, self.jwt_audience.as_deref()).map_err(|e| {
            debug!(error = %e, "JWT rejected");
            match e {
                JwtError::TokenExpired => AuthError::TokenExpired,
                JwtError::InvalidAudience => AuthError::InvalidAudience,
                _ => AuthError::InvalidToken,
            }
        })?;

        let sub = data.claims.sub.trim();
        if sub.is_empty() {
            return Err(AuthError::InvalidToken);
        }
        Ok(Caller::User(UserId::new(sub)))
    }
}

/// 상수 시간 비교.
///
/// 두 값의 HMAC을 계산한 뒤 `verify_slice`로 비교하므로 길이나 내용에 따라
/// 비교 시간이 달라지지 않습니다.
fn secrets_match(presented: &str, expected: &str) -> bool {
    let Ok(mut expected_mac) = Hmac::<Sha256>::new_from_slice(b"folio-secret-compare") else {
        return false;
    };
    let mut presented_mac = expected_mac.clone();
    expected_mac.update(expected.as_bytes());
    presented_mac.update(presented.as_bytes());
    presented_mac
        .verify_slice(&expected_mac.finalize().into_bytes())
        .is_ok()
}

impl FromRequestParts<Arc<AppState>> for Caller {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        state.auth.validate(&parts.headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{create_token, Claims};
    use axum::http::HeaderValue;

    const SECRET: &str = "test-secret-key-for-jwt-testing-minimum-32-chars";

    fn validator() -> AuthValidator {
        AuthValidator::from_config(&AuthConfig {
            jwt_secret: SECRET.to_string(),
            jwt_audience: None,
            service_key: Some("service-master-key".to_string()),
            operator_secret: Some("cron-secret".to_string()),
        })
    }

    fn headers(name: &'static str, value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(name, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_user_token() {
        let token = create_token(&Claims::new("user-1", 60), SECRET).unwrap();
        let caller = validator()
            .validate(&headers("authorization", &format!("Bearer {}", token)))
            .unwrap();
        assert_eq!(caller, Caller::User(UserId::new("user-1")));
    }

    #[test]
    fn test_operator_secret() {
        let v = validator();
        assert_eq!(
            v.validate(&headers(OPERATOR_SECRET_HEADER, "cron-secret")),
            Ok(Caller::Operator)
        );
        assert_eq!(
            v.validate(&headers(OPERATOR_SECRET_HEADER, "cron-secreT")),
            Err(AuthError::InvalidOperatorSecret)
        );
    }

    #[test]
    fn test_service_key_bearer() {
        assert_eq!(
            validator().validate(&headers("authorization", "Bearer service-master-key")),
            Ok(Caller::Operator)
        );
    }

    #[test]
    fn test_missing_and_malformed() {
        let v = validator();
        assert_eq!(v.validate(&HeaderMap::new()), Err(AuthError::MissingCredential));
        assert_eq!(
            v.validate(&headers("authorization", "Basic abc")),
            Err(AuthError::InvalidAuthHeader)
        );
        assert_eq!(
            v.validate(&headers("authorization", "Bearer garbage")),
            Err(AuthError::InvalidToken)
        );
    }

    #[test]
    fn test_expired_token() {
        let token = create_token(&Claims::new("user-1", -10), SECRET).unwrap();
        assert_eq!(
            validator().validate(&headers("authorization", &format!("Bearer {}", token))),
            Err(AuthError::TokenExpired)
        );
    }

    #[test]
    fn test_operator_secret_unset_rejects() {
        let v = AuthValidator::from_config(&AuthConfig {
            jwt_secret: SECRET.to_string(),
            ..AuthConfig::default()
        });
        assert_eq!(
            v.validate(&headers(OPERATOR_SECRET_HEADER, "")),
            Err(AuthError::InvalidOperatorSecret)
        );
    }

    #[test]
    fn test_secrets_match() {
        assert!(secrets_match("abc", "abc"));
        assert!(!secrets_match("abc", "abd"));
        assert!(!secrets_match("abc", "abcd"));
    }

    #[test]
    fn test_caller_requirements() {
        assert!(Caller::Operator.require_user().is_err());
        assert!(Caller::User(UserId::new("u")).require_operator().is_err());
        assert!(Caller::Operator.require_operator().is_ok());
    }
}
