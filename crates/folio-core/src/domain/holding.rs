//! 정규화된 보유 종목.

use super::{SourceId, UserId};
use crate::taxonomy::AssetType;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 출처와 무관한 정규 보유 종목.
///
/// 브로커 응답과 업로드 파일 모두 이 형태로 변환된 뒤 저장됩니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub struct CanonicalHolding {
    /// 심볼 (투자 코드 또는 정규화된 종목명)
    pub symbol: String,
    /// 표시용 종목명
    pub display_name: String,
    /// 자산 유형
    pub asset_type: AssetType,
    /// 섹터
    pub sector: String,
    /// 보유 수량
    pub quantity: Decimal,
    /// 평균 매입가
    pub avg_price: Decimal,
    /// 최근 가격
    pub last_price: Decimal,
    /// 거래소 (없으면 빈 문자열)
    pub exchange: String,
    /// ISIN
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isin: Option<String>,
    /// 브로커/계좌 이름
    pub broker_account: String,
    /// XIRR (%)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xirr: Option<Decimal>,
}

impl CanonicalHolding {
    /// 투자 원금.
    pub fn invested_value(&self) -> Decimal {
        self.quantity * self.avg_price
    }

    /// 평가 금액.
    pub fn market_value(&self) -> Decimal {
        self.quantity * self.last_price
    }
}

/// 저장된 보유 종목 행.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub struct HoldingRecord {
    pub id: Uuid,
    #[cfg_attr(feature = "utoipa-support", schema(value_type = String))]
    pub user_id: UserId,
    #[cfg_attr(feature = "utoipa-support", schema(value_type = String))]
    pub source: SourceId,
    /// 수집 배치 ID (현재 배치의 행만 유효)
    pub batch_id: Uuid,
    #[serde(flatten)]
    pub holding: CanonicalHolding,
    pub created_at: DateTime<Utc>,
}

impl HoldingRecord {
    /// 정규 보유 종목을 배치 행으로 변환합니다.
    pub fn new(user_id: UserId, source: SourceId, batch_id: Uuid, holding: CanonicalHolding) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            source,
            batch_id,
            holding,
            created_at: Utc::now(),
        }
    }
}
