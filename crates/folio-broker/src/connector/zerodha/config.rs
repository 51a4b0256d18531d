//! Zerodha Kite Connect 설정.

use crate::BrokerError;
use folio_core::{non_empty, ZerodhaSettings};
use secrecy::SecretString;

/// Kite API 버전 헤더 값.
pub const KITE_VERSION: &str = "3";

/// 보유 종목 행에 기록되는 브로커 이름.
pub const BROKER_LABEL: &str = "Zerodha";

/// 시세 조회 1회당 최대 종목 수.
pub const QUOTE_BATCH_LIMIT: usize = 500;

/// Kite API 설정.
#[derive(Debug, Clone)]
pub struct ZerodhaConfig {
    /// API 키
    pub api_key: String,
    /// API 시크릿
    pub api_secret: SecretString,
    /// REST API 기본 URL
    pub api_base_url: String,
    /// 로그인 페이지 URL
    pub login_url: String,
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
}

impl ZerodhaConfig {
    /// 새 설정 생성.
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        let defaults = ZerodhaSettings::default();
        Self {
            api_key: api_key.into(),
            api_secret: SecretString::new(api_secret.into().into()),
            api_base_url: defaults.api_base_url,
            login_url: defaults.login_url,
            timeout_secs: defaults.timeout_secs,
        }
    }

    /// 애플리케이션 설정에서 생성.
    ///
    /// # Errors
    /// API 키나 시크릿이 없으면 `BrokerError::Config`를 반환합니다.
    pub fn from_settings(settings: &ZerodhaSettings) -> Result<Self, BrokerError> {
        let api_key = non_empty(&settings.api_key).ok_or_else(|| {
            BrokerError::Config("Zerodha API key is not configured (FOLIO__ZERODHA__API_KEY)".to_string())
        })?;
        let api_secret = non_empty(&settings.api_secret).ok_or_else(|| {
            BrokerError::Config(
                "Zerodha API secret is not configured (FOLIO__ZERODHA__API_SECRET)".to_string(),
            )
        })?;

        Ok(Self {
            api_key: api_key.to_string(),
            api_secret: SecretString::new(api_secret.into()),
            api_base_url: settings.api_base_url.trim_end_matches('/').to_string(),
            login_url: settings.login_url.clone(),
            timeout_secs: settings.timeout_secs,
        })
    }

    /// 기본 URL 변경 (테스트용 목 서버 등).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_from_settings_requires_keys() {
        let settings = ZerodhaSettings::default();
        let err = ZerodhaConfig::from_settings(&settings).unwrap_err();
        assert!(err.is_config_error());
        assert!(err.user_message().contains("API key"));
    }

    #[test]
    fn test_from_settings() {
        let settings = ZerodhaSettings {
            api_key: Some("kite_key".to_string()),
            api_secret: Some("kite_secret".to_string()),
            api_base_url: "https://api.kite.trade/".to_string(),
            ..Default::default()
        };
        let config = ZerodhaConfig::from_settings(&settings).unwrap();
        assert_eq!(config.api_key, "kite_key");
        assert_eq!(config.api_secret.expose_secret(), "kite_secret");
        assert_eq!(config.api_base_url, "https://api.kite.trade");
    }
}
