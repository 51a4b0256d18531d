//! JWT 토큰 처리.
//!
//! ID 공급자가 발급한 HS256 사용자 토큰을 검증합니다.
//! 토큰 생성은 테스트와 로컬 개발용입니다.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};

/// JWT 페이로드.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - 사용자 ID
    pub sub: String,
    /// Expiration - 토큰 만료 시간 (Unix timestamp)
    pub exp: i64,
    /// Issued At - 토큰 발급 시간 (Unix timestamp)
    #[serde(default)]
    pub iat: i64,
    /// Audience
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    /// 이메일 (로그용, 선택)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Claims {
    /// 새로운 Claims 생성.
    ///
    /// # Arguments
    ///
    /// * `user_id` - 사용자 ID
    /// * `expires_in_minutes` - 만료 시간 (분)
    pub fn new(user_id: impl Into<String>, expires_in_minutes: i64) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id.into(),
            exp: (now + Duration::minutes(expires_in_minutes)).timestamp(),
            iat: now.timestamp(),
            aud: None,
            email: None,
        }
    }

    /// audience 지정.
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.aud = Some(audience.into());
        self
    }
}

/// JWT 에러.
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("토큰 생성 실패")]
    EncodingError(#[from] jsonwebtoken::errors::Error),
    #[error("토큰 디코딩 실패")]
    DecodingError,
    #[error("토큰이 만료되었습니다")]
    TokenExpired,
    #[error("유효하지 않은 토큰")]
    InvalidToken,
    #[error("허용되지 않은 audience")]
    InvalidAudience,
}

/// JWT 토큰 생성.
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(JwtError::from)
}

/// JWT 토큰 디코딩 및 검증.
///
/// `exp`는 항상 검증하며, `audience`가 주어지면 `aud` 클레임도 검증합니다.
pub fn decode_token(
    token: &str,
    secret: &str,
    audience: Option<&str>,
) -> Result<TokenData<Claims>, JwtError> {
    let mut validation = Validation::default();
    validation.validate_exp = true;
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp", "sub"]);
    match audience {
        Some(aud) => validation.set_audience(&[aud]),
        None => validation.validate_aud = false,
    }

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::TokenExpired,
        jsonwebtoken::errors::ErrorKind::InvalidAudience => JwtError::InvalidAudience,
        jsonwebtoken::errors::ErrorKind::InvalidToken
        | jsonwebtoken::errors::ErrorKind::InvalidSignature => JwtError::InvalidToken,
        _ => JwtError::DecodingError,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &str = "test-secret-key-for-jwt-testing-minimum-32-chars";

    #[test]
    fn test_create_and_decode_token() {
        let claims = Claims::new("user-123", 60);
        let token = create_token(&claims, TEST_SECRET).unwrap();

        let decoded = decode_token(&token, TEST_SECRET, None).unwrap();
        assert_eq!(decoded.claims.sub, "user-123");
    }

    #[test]
    fn test_expired_token() {
        let claims = Claims::new("user-123", -5);
        let token = create_token(&claims, TEST_SECRET).unwrap();

        let result = decode_token(&token, TEST_SECRET, None);
        assert!(matches!(result, Err(JwtError::TokenExpired)));
    }

    #[test]
    fn test_wrong_secret() {
        let token = create_token(&Claims::new("user-123", 60), TEST_SECRET).unwrap();
        let result = decode_token(&token, "another-secret-key-that-is-long-enough", None);
        assert!(matches!(result, Err(JwtError::InvalidToken)));
    }

    #[test]
    fn test_audience_checked_when_configured() {
        let token = create_token(
            &Claims::new("user-123", 60).with_audience("authenticated"),
            TEST_SECRET,
        )
        .unwrap();

        assert!(decode_token(&token, TEST_SECRET, Some("authenticated")).is_ok());
        assert!(matches!(
            decode_token(&token, TEST_SECRET, Some("service")),
            Err(JwtError::InvalidAudience)
        ));
    }

    #[test]
    fn test_garbage_token() {
        assert!(decode_token("not.a.jwt", TEST_SECRET, None).is_err());
    }
}
