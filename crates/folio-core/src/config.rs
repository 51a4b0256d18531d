//! 설정 관리.
//!
//! 이 모듈은 애플리케이션 설정을 정의하고 관리합니다.
//! 설정 파일(선택)과 `FOLIO__SECTION__KEY` 형식의 환경 변수를 계층적으로 병합합니다.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// 애플리케이션 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// 서버 설정
    pub server: ServerConfig,
    /// 데이터베이스 설정
    pub database: DatabaseConfig,
    /// 로깅 설정
    pub logging: LoggingConfig,
    /// 인증 설정
    pub auth: AuthConfig,
    /// Zerodha (Kite Connect) 설정
    pub zerodha: ZerodhaSettings,
    /// OAuth state 토큰 설정
    pub oauth_state: OAuthStateConfig,
    /// 프론트엔드 리다이렉트 설정
    pub frontend: FrontendConfig,
    /// 파일 업로드 수집 설정
    pub import: ImportConfig,
    /// 자격증명 암호화 설정
    pub encryption: EncryptionConfig,
}

/// 서버 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 바인딩할 호스트
    pub host: String,
    /// 리스닝할 포트
    pub port: u16,
    /// 요청 전체 타임아웃 (초)
    pub request_timeout_secs: u64,
    /// 쉼표로 구분된 CORS 허용 origin (비어 있으면 전체 허용)
    pub cors_origins: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            request_timeout_secs: 60,
            cors_origins: String::new(),
        }
    }
}

/// 데이터베이스 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// PostgreSQL 연결 URL (없으면 인메모리 저장소 사용)
    pub url: Option<String>,
    /// 최대 연결 수
    pub max_connections: u32,
    /// 연결 타임아웃 (초)
    pub connection_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
            connection_timeout_secs: 10,
        }
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// 인증 설정.
///
/// 세 가지 자격증명 형식을 지원합니다:
/// 사용자 JWT, 내부 서비스 마스터 키, 스케줄러용 운영자 시크릿.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// ID 공급자가 발급한 JWT 검증용 HS256 시크릿
    pub jwt_secret: String,
    /// 허용할 JWT audience (설정 시 검증)
    pub jwt_audience: Option<String>,
    /// 내부 함수 간 호출용 서비스 마스터 키
    pub service_key: Option<String>,
    /// 스케줄 작업용 운영자 시크릿 (`x-operator-secret` 헤더)
    pub operator_secret: Option<String>,
}

/// Zerodha Kite Connect 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ZerodhaSettings {
    /// Kite API 키
    pub api_key: Option<String>,
    /// Kite API 시크릿
    pub api_secret: Option<String>,
    /// REST API 기본 URL
    pub api_base_url: String,
    /// 로그인 페이지 URL
    pub login_url: String,
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
    /// 세션 만료까지의 고정 시간 (시간)
    pub session_ttl_hours: i64,
}

impl Default for ZerodhaSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            api_secret: None,
            api_base_url: "https://api.kite.trade".to_string(),
            login_url: "https://kite.zerodha.com/connect/login".to_string(),
            timeout_secs: 15,
            session_ttl_hours: 8,
        }
    }
}

impl ZerodhaSettings {
    /// API 키와 시크릿이 모두 설정되었는지 확인.
    pub fn is_configured(&self) -> bool {
        non_empty(&self.api_key).is_some() && non_empty(&self.api_secret).is_some()
    }
}

/// OAuth state 토큰 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OAuthStateConfig {
    /// HMAC 서명 키 (없으면 프로세스 임시 키 사용)
    pub signing_key: Option<String>,
    /// state 유효 시간 (분)
    pub max_age_minutes: i64,
    /// 만료된 state를 거부할지 여부 (기본: 경고만 남기고 진행)
    pub reject_stale: bool,
}

impl Default for OAuthStateConfig {
    fn default() -> Self {
        Self {
            signing_key: None,
            max_age_minutes: 10,
            reject_stale: false,
        }
    }
}

/// 프론트엔드 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FrontendConfig {
    /// OAuth 콜백 후 리다이렉트할 URL
    pub redirect_url: String,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            redirect_url: "http://localhost:5173/holdings".to_string(),
        }
    }
}

/// 파일 업로드 수집 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ImportConfig {
    /// 최대 파일 크기 (바이트)
    pub max_file_bytes: usize,
    /// 처리할 최대 행 수
    pub max_rows: usize,
    /// 파싱 시간 예산 (초)
    pub timeout_secs: u64,
    /// 저장 시 배치 크기
    pub batch_size: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: 10 * 1024 * 1024,
            max_rows: 10_000,
            timeout_secs: 30,
            batch_size: 100,
        }
    }
}

/// 자격증명 암호화 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct EncryptionConfig {
    /// Base64 인코딩된 32바이트 AES-256 마스터 키
    pub master_key: Option<String>,
}

impl AppConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    ///
    /// 파일이 없어도 기본값과 환경 변수만으로 로드됩니다.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::from(path.as_ref()).required(false))
            .add_source(
                config::Environment::with_prefix("FOLIO")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// 기본 경로에서 설정을 로드합니다.
    pub fn load_default() -> Result<Self, config::ConfigError> {
        Self::load("config/default.toml")
    }

    /// 쉼표로 구분된 CORS origin 목록.
    pub fn cors_origins(&self) -> Vec<String> {
        self.server
            .cors_origins
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// 빈 문자열을 None으로 취급합니다.
pub fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.import.max_file_bytes, 10 * 1024 * 1024);
        assert_eq!(config.import.max_rows, 10_000);
        assert_eq!(config.import.batch_size, 100);
        assert_eq!(config.oauth_state.max_age_minutes, 10);
        assert!(!config.oauth_state.reject_stale);
        assert!(config.database.url.is_none());
    }

    #[test]
    fn test_zerodha_configured_requires_both_keys() {
        let mut settings = ZerodhaSettings::default();
        assert!(!settings.is_configured());

        settings.api_key = Some("kite_key".to_string());
        assert!(!settings.is_configured());

        settings.api_secret = Some("   ".to_string());
        assert!(!settings.is_configured());

        settings.api_secret = Some("kite_secret".to_string());
        assert!(settings.is_configured());
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let config = AppConfig::load("does/not/exist.toml").unwrap();
        assert_eq!(config.zerodha.api_base_url, "https://api.kite.trade");
        assert_eq!(config.zerodha.session_ttl_hours, 8);
    }

    #[test]
    fn test_cors_origins_split() {
        let mut config = AppConfig::default();
        config.server.cors_origins = "https://a.example.com, ,https://b.example.com".to_string();
        assert_eq!(
            config.cors_origins(),
            vec!["https://a.example.com", "https://b.example.com"]
        );
    }
}
