//! Kite Connect 포트폴리오 클라이언트.
//!
//! 처리 기능:
//! - 보유 종목 조회 (GET /portfolio/holdings)
//! - 시세 조회 (GET /quote, 최대 500종목씩)

use super::config::{ZerodhaConfig, KITE_VERSION, QUOTE_BATCH_LIMIT};
use super::models::{KiteEnvelope, KiteHolding, QuoteMap};
use crate::{BrokerError, BrokerResult};
use folio_core::CanonicalHolding;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, error, info, warn};

/// Kite 포트폴리오 클라이언트.
pub struct KiteClient {
    config: ZerodhaConfig,
    client: Client,
}

impl KiteClient {
    /// 새 클라이언트 생성.
    pub fn new(config: ZerodhaConfig) -> BrokerResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| BrokerError::Network(format!("HTTP client 생성 실패: {}", e)))?;

        Ok(Self { config, client })
    }

    fn build_headers(&self, access_token: &SecretString) -> BrokerResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert("X-Kite-Version", HeaderValue::from_static(KITE_VERSION));

        let auth = format!("token {}:{}", self.config.api_key, access_token.expose_secret());
        let mut auth_value = HeaderValue::from_str(&auth)
            .map_err(|_| BrokerError::SessionInvalid("malformed access token".to_string()))?;
        auth_value.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_value);

        Ok(headers)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        access_token: &SecretString,
    ) -> BrokerResult<T> {
        let url = format!("{}{}", self.config.api_base_url, path);
        let response = self
            .client
            .get(&url)
            .headers(self.build_headers(access_token)?)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            error!("Kite request {} failed: {}", path, status);
            return Err(BrokerError::from_status(status.as_u16(), &body));
        }

        let envelope: KiteEnvelope<T> = serde_json::from_str(&body)
            .map_err(|e| BrokerError::Parse(format!("Failed to parse {} response: {}", path, e)))?;

        envelope.data.ok_or_else(|| {
            BrokerError::Parse(format!(
                "{} response has no data (status: {})",
                path, envelope.status
            ))
        })
    }

    /// 원본 보유 종목 조회.
    pub async fn get_holdings(&self, access_token: &SecretString) -> BrokerResult<Vec<KiteHolding>> {
        let holdings: Vec<KiteHolding> = self
            .get_json("/portfolio/holdings", &[], access_token)
            .await?;
        debug!("Kite returned {} holdings", holdings.len());
        Ok(holdings)
    }

    /// 시세 조회. `instruments`는 `EXCHANGE:SYMBOL` 형식입니다.
    pub async fn get_quotes(
        &self,
        instruments: &[String],
        access_token: &SecretString,
    ) -> BrokerResult<QuoteMap> {
        let mut quotes = QuoteMap::new();
        for chunk in instruments.chunks(QUOTE_BATCH_LIMIT) {
            let query: Vec<(&str, String)> = chunk.iter().map(|i| ("i", i.clone())).collect();
            let batch: QuoteMap = self.get_json("/quote", &query, access_token).await?;
            quotes.extend(batch);
        }
        Ok(quotes)
    }

    /// 보유 종목을 조회하고 시세를 갱신한 뒤 정규 형식으로 변환합니다.
    ///
    /// 시세 조회 실패는 경고만 남기고 보유 종목 응답의 가격을 사용합니다.
    /// 수량이 0 이하인 종목은 제외됩니다.
    pub async fn fetch_holdings(
        &self,
        access_token: &SecretString,
    ) -> BrokerResult<Vec<CanonicalHolding>> {
        let mut raw = self.get_holdings(access_token).await?;
        raw.retain(|h| h.total_quantity() > Decimal::ZERO && !h.tradingsymbol.trim().is_empty());

        if !raw.is_empty() {
            let instruments: Vec<String> = raw.iter().map(KiteHolding::instrument_key).collect();
            match self.get_quotes(&instruments, access_token).await {
                Ok(quotes) => {
                    for holding in raw.iter_mut() {
                        if let Some(quote) = quotes.get(&holding.instrument_key()) {
                            if quote.last_price > Decimal::ZERO {
                                holding.last_price = quote.last_price;
                            }
                        }
                    }
                }
                Err(e) => warn!("Quote refresh failed, using holdings prices: {}", e),
            }
        }

        let holdings: Vec<CanonicalHolding> = raw.iter().map(KiteHolding::to_canonical).collect();
        info!(count = holdings.len(), "Fetched Zerodha holdings");
        Ok(holdings)
    }
}
