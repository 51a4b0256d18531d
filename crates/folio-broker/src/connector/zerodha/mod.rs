//! Zerodha Kite Connect 연동 모듈.
//!
//! # 기능
//!
//! - 로그인 URL 생성 (redirect_params로 state 전달)
//! - request_token → access_token 교환 (SHA-256 체크섬)
//! - 보유 종목 조회 (GET /portfolio/holdings)
//! - 시세 갱신 (GET /quote, best effort)
//!
//! # API 문서
//!
//! 공식 API 문서: <https://kite.trade/docs/connect/v3/>
//!
//! # 사용 예제
//!
//! ```rust,ignore
//! use folio_broker::{BrokerConnector, ZerodhaConfig, ZerodhaConnector};
//!
//! let config = ZerodhaConfig::from_settings(&app_config.zerodha)?;
//! let connector = ZerodhaConnector::new(config)?;
//!
//! let access_token = connector.exchange_token(&request_token).await?;
//! let holdings = connector.fetch_holdings(&access_token).await?;
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod models;

pub use auth::{checksum, KiteAuth};
pub use client::KiteClient;
pub use config::ZerodhaConfig;
pub use models::{KiteHolding, KiteQuote};

use crate::{BrokerConnector, BrokerResult};
use async_trait::async_trait;
use folio_core::{CanonicalHolding, SourceId};
use secrecy::SecretString;

/// Kite 인증과 조회 클라이언트를 묶은 커넥터.
pub struct ZerodhaConnector {
    auth: KiteAuth,
    client: KiteClient,
}

impl ZerodhaConnector {
    /// 새 커넥터 생성.
    pub fn new(config: ZerodhaConfig) -> BrokerResult<Self> {
        Ok(Self {
            auth: KiteAuth::new(config.clone())?,
            client: KiteClient::new(config)?,
        })
    }
}

#[async_trait]
impl BrokerConnector for ZerodhaConnector {
    fn source(&self) -> SourceId {
        SourceId::zerodha()
    }

    fn login_url(&self, state: &str) -> String {
        self.auth.login_url(state)
    }

    async fn exchange_token(&self, request_token: &str) -> BrokerResult<SecretString> {
        self.auth.exchange_token(request_token).await
    }

    async fn fetch_holdings(&self, access_token: &SecretString) -> BrokerResult<Vec<CanonicalHolding>> {
        self.client.fetch_holdings(access_token).await
    }
}
