//! Kite Connect 응답 모델.
//!
//! 외부 응답 형식은 신뢰하지 않습니다. 숫자 필드는 숫자/문자열/null 모두
//! 허용하고, 해석할 수 없거나 유한하지 않은 값은 0으로 처리합니다.

use super::config::BROKER_LABEL;
use folio_core::coerce::{number_from_f64, parse_number};
use folio_core::taxonomy::{classify_listed, classify_listed_sector};
use folio_core::CanonicalHolding;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;

/// Kite 공통 응답 봉투.
#[derive(Debug, Clone, Deserialize)]
pub struct KiteEnvelope<T> {
    /// "success" 또는 "error"
    #[serde(default)]
    pub status: String,
    pub data: Option<T>,
    pub message: Option<String>,
    pub error_type: Option<String>,
}

/// POST /session/token 응답 데이터.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionData {
    pub access_token: Option<String>,
    pub user_id: Option<String>,
}

/// GET /portfolio/holdings 응답 항목.
#[derive(Debug, Clone, Deserialize)]
pub struct KiteHolding {
    pub tradingsymbol: String,
    #[serde(default)]
    pub exchange: String,
    #[serde(default)]
    pub isin: Option<String>,
    /// 결제 완료 수량
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub quantity: Decimal,
    /// T+1 결제 대기 수량
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub t1_quantity: Decimal,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub average_price: Decimal,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub last_price: Decimal,
}

impl KiteHolding {
    /// `EXCHANGE:SYMBOL` 형식의 시세 조회 키.
    pub fn instrument_key(&self) -> String {
        format!("{}:{}", self.exchange, self.tradingsymbol)
    }

    /// 결제 대기분을 포함한 총 수량.
    pub fn total_quantity(&self) -> Decimal {
        self.quantity + self.t1_quantity
    }

    /// 정규 보유 종목으로 변환합니다.
    ///
    /// 심볼/거래소 패턴으로 자산 유형과 섹터를 분류합니다.
    pub fn to_canonical(&self) -> CanonicalHolding {
        let symbol = self.tradingsymbol.trim().to_uppercase();
        let exchange = self.exchange.trim().to_uppercase();
        let asset_type = classify_listed(&symbol, &exchange);
        let sector = classify_listed_sector(asset_type, &symbol, &exchange);

        CanonicalHolding {
            display_name: symbol.clone(),
            symbol,
            asset_type,
            sector: sector.to_string(),
            quantity: self.total_quantity(),
            avg_price: self.average_price.max(Decimal::ZERO),
            last_price: self.last_price.max(Decimal::ZERO),
            exchange,
            isin: self
                .isin
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            broker_account: BROKER_LABEL.to_string(),
            xirr: None,
        }
    }
}

/// GET /quote 응답 항목 (필요한 필드만).
#[derive(Debug, Clone, Deserialize)]
pub struct KiteQuote {
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub last_price: Decimal,
}

/// GET /quote 응답 데이터 (`"NSE:INFY"` → 시세).
pub type QuoteMap = HashMap<String, KiteQuote>;

/// 숫자, 숫자 문자열, null을 모두 Decimal로 받아들입니다.
fn lenient_decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_f64().map(number_from_f64).unwrap_or_default(),
        Some(serde_json::Value::String(s)) => parse_number(&s),
        _ => Decimal::ZERO,
    })
}
