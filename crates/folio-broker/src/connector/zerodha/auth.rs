//! Kite Connect 인증 모듈.
//!
//! 처리 기능:
//! - 로그인 URL 생성
//! - request_token 교환 (POST /session/token)

use super::config::{ZerodhaConfig, KITE_VERSION};
use super::models::{KiteEnvelope, SessionData};
use crate::{BrokerError, BrokerResult};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use tracing::{error, info};

/// 토큰 교환 체크섬: `hex(SHA256(api_key + request_token + api_secret))`.
///
/// # 예제
///
/// ```
/// use folio_broker::connector::zerodha::checksum;
///
/// assert_eq!(checksum("K", "C", "S").len(), 64);
/// ```
pub fn checksum(api_key: &str, request_token: &str, api_secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(api_key.as_bytes());
    hasher.update(request_token.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Kite 인증 관리자.
pub struct KiteAuth {
    config: ZerodhaConfig,
    client: Client,
}

impl KiteAuth {
    /// 새 인증 관리자 생성.
    ///
    /// # Errors
    /// HTTP 클라이언트 생성에 실패하면 `BrokerError::Network`를 반환합니다.
    pub fn new(config: ZerodhaConfig) -> BrokerResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| BrokerError::Network(format!("HTTP client 생성 실패: {}", e)))?;

        Ok(Self { config, client })
    }

    /// 로그인 URL.
    ///
    /// state는 `redirect_params`로 전달되어 콜백에 그대로 돌아옵니다.
    pub fn login_url(&self, state: &str) -> String {
        let redirect_params = format!("state={}", urlencoding::encode(state));
        format!(
            "{}?v={}&api_key={}&redirect_params={}",
            self.config.login_url,
            KITE_VERSION,
            urlencoding::encode(&self.config.api_key),
            urlencoding::encode(&redirect_params)
        )
    }

    /// request_token을 access_token으로 교환합니다.
    ///
    /// 비정상 응답은 재시도 없이 `BrokerError::Rejected`로 반환됩니다.
    pub async fn exchange_token(&self, request_token: &str) -> BrokerResult<SecretString> {
        let request_token = request_token.trim();
        if request_token.is_empty() {
            return Err(BrokerError::Rejected("missing request_token".to_string()));
        }

        let checksum = checksum(
            &self.config.api_key,
            request_token,
            self.config.api_secret.expose_secret(),
        );

        info!(
            "Exchanging Kite request token (api_key: {}...)",
            self.config.api_key.chars().take(4).collect::<String>()
        );

        let url = format!("{}/session/token", self.config.api_base_url);
        let response = self
            .client
            .post(&url)
            .header("X-Kite-Version", KITE_VERSION)
            .form(&[
                ("api_key", self.config.api_key.as_str()),
                ("request_token", request_token),
                ("checksum", checksum.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            error!("Kite token exchange failed: {}", status);
            let message = match BrokerError::from_status(status.as_u16(), &body) {
                BrokerError::SessionInvalid(msg) | BrokerError::FetchFailed { message: msg, .. } => msg,
                other => other.to_string(),
            };
            return Err(BrokerError::Rejected(message));
        }

        let envelope: KiteEnvelope<SessionData> = serde_json::from_str(&body)
            .map_err(|e| BrokerError::Parse(format!("Failed to parse session response: {}", e)))?;

        let access_token = envelope
            .data
            .and_then(|data| data.access_token)
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| BrokerError::Rejected("response did not contain an access token".to_string()))?;

        info!("Kite access token obtained");
        Ok(SecretString::new(access_token.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_concatenation_order() {
        let expected = hex::encode(Sha256::digest(b"KCS"));
        assert_eq!(checksum("K", "C", "S"), expected);
        assert_ne!(checksum("C", "K", "S"), expected);
    }

    #[test]
    fn test_login_url_carries_state() {
        let auth = KiteAuth::new(ZerodhaConfig::new("my_key", "my_secret")).unwrap();
        let url = auth.login_url("abc.def");
        assert!(url.starts_with("https://kite.zerodha.com/connect/login?v=3&api_key=my_key"));
        assert!(url.ends_with("redirect_params=state%3Dabc.def"));
    }
}
