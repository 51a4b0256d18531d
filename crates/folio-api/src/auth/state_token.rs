//! OAuth state 토큰.
//!
//! 브로커 로그인 시도를 사용자 ID에 묶는 서명된 state 값입니다.
//!
//! 형식: `base64url(json{user_id, nonce, issued_at}) "." base64url(HMAC-SHA256(key, payload))`
//!
//! 토큰은 저장되지 않으며 일회성도 강제하지 않습니다.
//! 유효 시간이 지난 토큰은 기본적으로 경고만 남기고 허용됩니다
//! (`oauth_state.reject_stale`로 거부 가능).

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, TimeZone, Utc};
use folio_core::{OAuthStateConfig, UserId};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use tracing::warn;

type HmacSha256 = Hmac<Sha256>;

/// state 디코딩 에러.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
    #[error("Malformed state token")]
    Malformed,
    #[error("State signature mismatch")]
    BadSignature,
    #[error("Invalid state payload")]
    BadPayload,
    #[error("Invalid state signing key")]
    InvalidKey,
}

/// state 페이로드.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthState {
    pub user_id: UserId,
    pub nonce: String,
    /// 발급 시각 (Unix epoch 밀리초)
    pub issued_at: i64,
}

impl OAuthState {
    /// 발급 시각.
    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.issued_at).single()
    }

    /// 발급 후 `max_age`가 지났는지 확인합니다. 발급 시각을 해석할 수 없으면 stale.
    pub fn is_stale(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        self.issued_at()
            .map(|issued| now - issued > max_age)
            .unwrap_or(true)
    }
}

/// state 토큰 인코더/디코더.
#[derive(Clone)]
pub struct StateCodec {
    mac: HmacSha256,
    max_age: Duration,
    reject_stale: bool,
}

impl StateCodec {
    /// 서명 키로 생성.
    pub fn new(signing_key: &[u8], max_age: Duration) -> Result<Self, StateError> {
        let mac = HmacSha256::new_from_slice(signing_key).map_err(|_| StateError::InvalidKey)?;
        Ok(Self {
            mac,
            max_age,
            reject_stale: false,
        })
    }

    /// 설정에서 생성. 서명 키가 없으면 프로세스 임시 키를 사용합니다.
    pub fn from_config(config: &OAuthStateConfig) -> Result<Self, StateError> {
        let max_age = Duration::minutes(config.max_age_minutes);
        let codec = match folio_core::non_empty(&config.signing_key) {
            Some(key) => Self::new(key.as_bytes(), max_age)?,
            None => {
                warn!("OAuth state signing key not set, using an ephemeral key");
                let key: [u8; 32] = rand::random();
                Self::new(&key, max_age)?
            }
        };
        Ok(codec.with_reject_stale(config.reject_stale))
    }

    /// 만료된 state 거부 여부 설정.
    pub fn with_reject_stale(mut self, reject: bool) -> Self {
        self.reject_stale = reject;
        self
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    pub fn rejects_stale(&self) -> bool {
        self.reject_stale
    }

    /// 사용자 ID를 담은 state 토큰 생성.
    pub fn encode(&self, user_id: &UserId) -> String {
        self.encode_at(user_id, Utc::now())
    }

    /// 발급 시각을 지정하여 생성.
    pub fn encode_at(&self, user_id: &UserId, issued_at: DateTime<Utc>) -> String {
        let nonce: [u8; 16] = rand::random();
        let state = OAuthState {
            user_id: user_id.clone(),
            nonce: hex::encode(nonce),
            issued_at: issued_at.timestamp_millis(),
        };
        // 직렬화 대상이 문자열/정수뿐이라 실패하지 않음
        let json = serde_json::to_vec(&state).unwrap_or_default();
        let payload = URL_SAFE_NO_PAD.encode(json);
        let signature = URL_SAFE_NO_PAD.encode(self.sign(&payload));
        format!("{}.{}", payload, signature)
    }

    /// state 토큰 검증 및 디코딩.
    pub fn decode(&self, token: &str) -> Result<OAuthState, StateError> {
        let (payload, signature) = token.trim().split_once('.').ok_or(StateError::Malformed)?;
        if payload.is_empty() || signature.is_empty() {
            return Err(StateError::Malformed);
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| StateError::Malformed)?;

        let mut mac = self.mac.clone();
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| StateError::BadSignature)?;

        let json = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| StateError::BadPayload)?;
        let state: OAuthState = serde_json::from_slice(&json).map_err(|_| StateError::BadPayload)?;
        if state.user_id.as_str().is_empty() {
            return Err(StateError::BadPayload);
        }
        Ok(state)
    }

    fn sign(&self, payload: &str) -> Vec<u8> {
        let mut mac = self.mac.clone();
        mac.update(payload.as_bytes());
        mac.finalize().into_bytes().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> StateCodec {
        StateCodec::new(b"state-signing-key", Duration::minutes(10)).unwrap()
    }

    #[test]
    fn test_encode_decode() {
        let codec = codec();
        let token = codec.encode(&UserId::new("user-42"));
        let state = codec.decode(&token).unwrap();
        assert_eq!(state.user_id.as_str(), "user-42");
        assert_eq!(state.nonce.len(), 32);
        assert!(!state.is_stale(Utc::now(), codec.max_age()));
    }

    #[test]
    fn test_tokens_are_url_safe_and_unique() {
        let codec = codec();
        let a = codec.encode(&UserId::new("u"));
        let b = codec.encode(&UserId::new("u"));
        assert_ne!(a, b);
        assert!(a
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')));
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let codec = codec();
        let token = codec.encode(&UserId::new("victim"));
        let (_, signature) = token.split_once('.').unwrap();

        let forged = URL_SAFE_NO_PAD.encode(br#"{"user_id":"attacker","nonce":"00","issued_at":0}"#);
        assert_eq!(
            codec.decode(&format!("{}.{}", forged, signature)),
            Err(StateError::BadSignature)
        );
    }

    #[test]
    fn test_other_key_rejected() {
        let token = codec().encode(&UserId::new("u"));
        let other = StateCodec::new(b"different-key", Duration::minutes(10)).unwrap();
        assert_eq!(other.decode(&token), Err(StateError::BadSignature));
    }

    #[test]
    fn test_malformed() {
        let codec = codec();
        assert_eq!(codec.decode(""), Err(StateError::Malformed));
        assert_eq!(codec.decode("no-dot"), Err(StateError::Malformed));
        assert_eq!(codec.decode("abc.!!!"), Err(StateError::Malformed));
    }

    #[test]
    fn test_signed_garbage_payload() {
        let codec = codec();
        let payload = URL_SAFE_NO_PAD.encode(b"not json");
        let signature = URL_SAFE_NO_PAD.encode(codec.sign(&payload));
        assert_eq!(
            codec.decode(&format!("{}.{}", payload, signature)),
            Err(StateError::BadPayload)
        );
    }

    #[test]
    fn test_staleness() {
        let codec = codec();
        let issued = Utc::now() - Duration::minutes(11);
        let state = codec.decode(&codec.encode_at(&UserId::new("u"), issued)).unwrap();
        assert!(state.is_stale(Utc::now(), Duration::minutes(10)));
        assert!(!state.is_stale(issued + Duration::minutes(9), Duration::minutes(10)));
    }
}
