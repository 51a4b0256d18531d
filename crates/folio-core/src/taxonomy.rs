//! 자산 분류 체계.
//!
//! 업로드된 스프레드시트와 브로커 응답의 자유 형식 텍스트를
//! 정규 자산 유형([`AssetType`])과 섹터 문자열로 분류합니다.
//! 모든 분류는 [`crate::rules`]의 순서 있는 규칙 테이블로 정의됩니다.

use crate::coerce::normalize_key;
use crate::rules::{first_match, Predicate, Rule};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 어떤 규칙에도 해당하지 않을 때의 섹터.
pub const SECTOR_DEFAULT: &str = "Diversified";

/// 정규 자산 유형.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetType {
    Equity,
    Etf,
    Reit,
    Sgb,
    #[serde(rename = "MF")]
    MutualFund,
    #[serde(rename = "DEBT_MF")]
    DebtMutualFund,
    #[serde(rename = "COMMODITY_MF")]
    CommodityMutualFund,
    UsStock,
    Nps,
    Epf,
    Ppf,
    Other,
}

impl AssetType {
    /// 모든 유형.
    pub const ALL: [AssetType; 12] = [
        AssetType::Equity,
        AssetType::Etf,
        AssetType::Reit,
        AssetType::Sgb,
        AssetType::MutualFund,
        AssetType::DebtMutualFund,
        AssetType::CommodityMutualFund,
        AssetType::UsStock,
        AssetType::Nps,
        AssetType::Epf,
        AssetType::Ppf,
        AssetType::Other,
    ];

    /// 저장/응답에 쓰이는 유형 코드.
    pub fn code(&self) -> &'static str {
        match self {
            AssetType::Equity => "EQUITY",
            AssetType::Etf => "ETF",
            AssetType::Reit => "REIT",
            AssetType::Sgb => "SGB",
            AssetType::MutualFund => "MF",
            AssetType::DebtMutualFund => "DEBT_MF",
            AssetType::CommodityMutualFund => "COMMODITY_MF",
            AssetType::UsStock => "US_STOCK",
            AssetType::Nps => "NPS",
            AssetType::Epf => "EPF",
            AssetType::Ppf => "PPF",
            AssetType::Other => "OTHER",
        }
    }

    /// 유형 코드에서 변환.
    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.code().eq_ignore_ascii_case(code))
    }

    /// 은퇴 계좌(EPF/PPF/NPS) 여부.
    ///
    /// 은퇴 계좌 행은 브로커 열이 비어 있어도 허용됩니다.
    pub fn is_retirement(&self) -> bool {
        matches!(self, AssetType::Epf | AssetType::Ppf | AssetType::Nps)
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ==================== 선언된 유형 ====================

const DECLARED_TYPE_RULES: &[Rule<AssetType>] = &[
    Rule::new(
        Predicate::Any(&[
            Predicate::Word(&["ppf"]),
            Predicate::Contains(&["public provident"]),
        ]),
        AssetType::Ppf,
    ),
    Rule::new(
        Predicate::Any(&[
            Predicate::Word(&["epf", "vpf", "pf"]),
            Predicate::Contains(&["employee provident", "provident fund"]),
        ]),
        AssetType::Epf,
    ),
    Rule::new(
        Predicate::Any(&[
            Predicate::Word(&["nps"]),
            Predicate::Contains(&["national pension", "pension scheme"]),
        ]),
        AssetType::Nps,
    ),
    Rule::new(
        Predicate::Any(&[
            Predicate::Word(&["sgb", "sgbs"]),
            Predicate::Contains(&["sovereign gold"]),
        ]),
        AssetType::Sgb,
    ),
    Rule::new(
        Predicate::Word(&["reit", "reits", "invit", "invits"]),
        AssetType::Reit,
    ),
    Rule::new(
        Predicate::Any(&[
            Predicate::Word(&["etf", "etfs"]),
            Predicate::Contains(&["exchange traded"]),
        ]),
        AssetType::Etf,
    ),
    Rule::new(
        Predicate::Any(&[
            Predicate::StartsWith(&["us stock", "us equit", "us share"]),
            Predicate::Contains(&[
                " us stock",
                " us equit",
                " us share",
                "international stock",
                "international equit",
                "foreign stock",
                "foreign equit",
                "global stock",
            ]),
        ]),
        AssetType::UsStock,
    ),
    Rule::new(
        Predicate::Contains(&["debt fund", "debt mutual", "debt mf"]),
        AssetType::DebtMutualFund,
    ),
    Rule::new(
        Predicate::Contains(&["gold fund", "commodity fund", "commodity mf", "commodity mutual"]),
        AssetType::CommodityMutualFund,
    ),
    Rule::new(
        Predicate::Any(&[
            Predicate::Contains(&["mutual fund"]),
            Predicate::Word(&["mf", "mfs", "fund", "funds"]),
        ]),
        AssetType::MutualFund,
    ),
    Rule::new(
        Predicate::Word(&["equity", "equities", "stock", "stocks", "share", "shares"]),
        AssetType::Equity,
    ),
];

// 뮤추얼 펀드 세분화 (종목명/카테고리 기준)
const FUND_REFINEMENT_RULES: &[Rule<AssetType>] = &[
    Rule::new(
        Predicate::Contains(&["gold", "silver", "commodit", "precious metal"]),
        AssetType::CommodityMutualFund,
    ),
    Rule::new(
        Predicate::Any(&[
            Predicate::Word(&["debt", "liquid", "gilt", "bond", "overnight", "treasury", "floater"]),
            Predicate::Contains(&[
                "money market",
                "credit risk",
                "short duration",
                "ultra short",
                "low duration",
                "medium duration",
                "corporate bond",
                "banking and psu",
                "fixed maturity",
            ]),
        ]),
        AssetType::DebtMutualFund,
    ),
];

// 상장 종목 세분화 (종목명/카테고리 기준)
const LISTED_REFINEMENT_RULES: &[Rule<AssetType>] = &[
    Rule::new(
        Predicate::Any(&[
            Predicate::Word(&["sgb"]),
            Predicate::Contains(&["sovereign gold"]),
        ]),
        AssetType::Sgb,
    ),
    Rule::new(
        Predicate::Any(&[Predicate::Word(&["etf"]), Predicate::Contains(&["bees"])]),
        AssetType::Etf,
    ),
    Rule::new(Predicate::Word(&["reit", "invit"]), AssetType::Reit),
];

/// 선언된 자산 유형 텍스트와 종목명/카테고리로 자산 유형을 분류합니다.
///
/// 선언된 값이 어떤 규칙에도 맞지 않으면 종목명과 카테고리로 재시도하고,
/// 그래도 없으면 [`AssetType::Other`]입니다.
///
/// # 예제
///
/// ```
/// use folio_core::taxonomy::{classify_declared, AssetType};
///
/// assert_eq!(classify_declared("Mutual Fund", "HDFC Liquid Fund", ""), AssetType::DebtMutualFund);
/// assert_eq!(classify_declared("Stocks", "GOLDBEES", ""), AssetType::Etf);
/// ```
pub fn classify_declared(declared: &str, name: &str, category: &str) -> AssetType {
    let declared_key = normalize_key(declared);
    let cues = normalize_key(&format!("{} {}", name, category));

    let base = first_match(DECLARED_TYPE_RULES, &declared_key)
        .or_else(|| first_match(DECLARED_TYPE_RULES, &cues))
        .unwrap_or(AssetType::Other);

    match base {
        AssetType::MutualFund => first_match(FUND_REFINEMENT_RULES, &cues).unwrap_or(base),
        AssetType::Equity => first_match(LISTED_REFINEMENT_RULES, &cues).unwrap_or(base),
        _ => base,
    }
}

// ==================== 섹터 ====================

const SECTOR_RULES: &[Rule<&str>] = &[
    Rule::new(
        Predicate::Contains(&["gold", "silver", "commodit", "precious metal"]),
        "Commodity",
    ),
    Rule::new(
        Predicate::Any(&[
            Predicate::Word(&["debt", "liquid", "gilt", "bond", "bonds", "overnight", "treasury"]),
            Predicate::Contains(&["money market"]),
        ]),
        "Debt",
    ),
    Rule::new(
        Predicate::Any(&[
            Predicate::Word(&["nbfc"]),
            Predicate::Contains(&["bank", "financ", "insurance"]),
        ]),
        "Banking",
    ),
    Rule::new(
        Predicate::Any(&[
            Predicate::Word(&["it", "tech"]),
            Predicate::Contains(&["technolog", "software", "infotech", "digital"]),
        ]),
        "Technology",
    ),
    Rule::new(
        Predicate::Contains(&["pharma", "health", "hospital", "lifescience"]),
        "Healthcare",
    ),
    Rule::new(
        Predicate::Any(&[
            Predicate::Word(&["auto", "automobile", "automobiles"]),
            Predicate::Contains(&["motor", "automotive"]),
        ]),
        "Automobile",
    ),
    Rule::new(
        Predicate::Any(&[
            Predicate::Word(&["oil", "gas", "power"]),
            Predicate::Contains(&["energy", "petroleum"]),
        ]),
        "Energy",
    ),
    Rule::new(
        Predicate::Any(&[
            Predicate::Word(&["fmcg"]),
            Predicate::Contains(&["consumer", "consumption"]),
        ]),
        "Consumer",
    ),
    Rule::new(
        Predicate::Contains(&["infra", "construction", "cement"]),
        "Infrastructure",
    ),
    Rule::new(
        Predicate::Any(&[
            Predicate::Word(&["reit", "invit", "realty"]),
            Predicate::Contains(&["real estate", "property"]),
        ]),
        "Real Estate",
    ),
    Rule::new(Predicate::Word(&["nifty", "sensex", "index"]), "Index"),
];

/// 자산 유형이 섹터를 결정하는 경우.
fn sector_for_asset(asset_type: AssetType) -> Option<&'static str> {
    match asset_type {
        AssetType::Epf | AssetType::Ppf | AssetType::Nps => Some("Retirement"),
        AssetType::DebtMutualFund => Some("Debt"),
        AssetType::CommodityMutualFund | AssetType::Sgb => Some("Commodity"),
        AssetType::Reit => Some("Real Estate"),
        _ => None,
    }
}

/// 자산 유형과 자유 텍스트(종목명, 카테고리 등)로 섹터를 분류합니다.
pub fn classify_sector(asset_type: AssetType, text: &str) -> &'static str {
    if let Some(sector) = sector_for_asset(asset_type) {
        return sector;
    }
    first_match(SECTOR_RULES, &normalize_key(text)).unwrap_or(SECTOR_DEFAULT)
}

// ==================== 브로커 심볼 휴리스틱 ====================

const LISTED_EXCHANGE_RULES: &[Rule<AssetType>] = &[
    Rule::new(Predicate::Equals(&["nasdaq", "nyse", "amex"]), AssetType::UsStock),
    Rule::new(Predicate::Equals(&["mcx", "ncdex"]), AssetType::Other),
];

// 거래소 심볼 원문(소문자)에 적용. `-rr`/`-iv` 같은 접미사를 보존하기 위해 정규화하지 않음.
const LISTED_SYMBOL_RULES: &[Rule<AssetType>] = &[
    Rule::new(Predicate::StartsWith(&["sgb"]), AssetType::Sgb),
    Rule::new(
        Predicate::Any(&[
            Predicate::EndsWith(&["-rr", "-iv"]),
            Predicate::Contains(&["reit", "invit"]),
        ]),
        AssetType::Reit,
    ),
    Rule::new(
        Predicate::Contains(&["bees", "etf", "iett", "nifty", "sensex"]),
        AssetType::Etf,
    ),
];

const LISTED_SECTOR_RULES: &[Rule<&str>] = &[
    Rule::new(Predicate::Contains(&["gold", "silver"]), "Commodity"),
    Rule::new(Predicate::Contains(&["liquid", "gilt", "bond"]), "Debt"),
    Rule::new(Predicate::Contains(&["bank", "psu"]), "Banking"),
    Rule::new(Predicate::Contains(&["itbees", "tech"]), "Technology"),
    Rule::new(Predicate::Contains(&["pharma", "health"]), "Healthcare"),
    Rule::new(
        Predicate::Contains(&["nifty", "sensex", "junior", "midcap", "smallcap", "next50"]),
        "Index",
    ),
];

/// 브로커가 보고한 거래소 심볼로 자산 유형을 분류합니다.
pub fn classify_listed(symbol: &str, exchange: &str) -> AssetType {
    if let Some(asset_type) = first_match(LISTED_EXCHANGE_RULES, &exchange.trim().to_lowercase()) {
        return asset_type;
    }
    first_match(LISTED_SYMBOL_RULES, &symbol.trim().to_lowercase()).unwrap_or(AssetType::Equity)
}

/// 브로커 심볼의 섹터.
///
/// 심볼만으로는 개별 주식의 업종을 알 수 없으므로, 패턴에 맞지 않으면
/// 자산 유형 기본값 또는 [`SECTOR_DEFAULT`]를 사용합니다.
pub fn classify_listed_sector(asset_type: AssetType, symbol: &str, exchange: &str) -> &'static str {
    if let Some(sector) = sector_for_asset(asset_type) {
        return sector;
    }
    if exchange.trim().eq_ignore_ascii_case("mcx") {
        return "Commodity";
    }
    if !matches!(asset_type, AssetType::Etf | AssetType::Other) {
        return SECTOR_DEFAULT;
    }
    first_match(LISTED_SECTOR_RULES, &symbol.trim().to_lowercase()).unwrap_or(SECTOR_DEFAULT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_round_trip() {
        for asset_type in AssetType::ALL {
            assert_eq!(AssetType::from_code(asset_type.code()), Some(asset_type));
        }
        assert_eq!(AssetType::from_code("debt_mf"), Some(AssetType::DebtMutualFund));
        assert_eq!(AssetType::from_code("crypto"), None);
    }

    #[test]
    fn test_serde_uses_codes() {
        let json = serde_json::to_string(&AssetType::CommodityMutualFund).unwrap();
        assert_eq!(json, "\"COMMODITY_MF\"");
        let parsed: AssetType = serde_json::from_str("\"US_STOCK\"").unwrap();
        assert_eq!(parsed, AssetType::UsStock);
    }

    #[test]
    fn test_retirement_types() {
        assert!(AssetType::Epf.is_retirement());
        assert!(AssetType::Ppf.is_retirement());
        assert!(AssetType::Nps.is_retirement());
        assert!(!AssetType::MutualFund.is_retirement());
    }

    #[test]
    fn test_declared_types() {
        assert_eq!(classify_declared("PPF", "", ""), AssetType::Ppf);
        assert_eq!(classify_declared("EPF", "", ""), AssetType::Epf);
        assert_eq!(classify_declared("NPS Tier 1", "", ""), AssetType::Nps);
        assert_eq!(classify_declared("Sovereign Gold Bond", "", ""), AssetType::Sgb);
        assert_eq!(classify_declared("REIT", "Embassy Office Parks", ""), AssetType::Reit);
        assert_eq!(classify_declared("ETF", "Nifty BeES", ""), AssetType::Etf);
        assert_eq!(classify_declared("US Stocks", "Apple Inc", ""), AssetType::UsStock);
        assert_eq!(classify_declared("Debt Fund", "", ""), AssetType::DebtMutualFund);
        assert_eq!(classify_declared("Equity", "Reliance Industries", ""), AssetType::Equity);
    }

    #[test]
    fn test_fund_refinement() {
        assert_eq!(
            classify_declared("Mutual Fund", "Parag Parikh Flexi Cap", "Equity"),
            AssetType::MutualFund
        );
        assert_eq!(
            classify_declared("MF", "SBI Gold Fund", ""),
            AssetType::CommodityMutualFund
        );
        assert_eq!(
            classify_declared("Mutual Funds", "ICICI Pru Corporate Bond Fund", "Debt"),
            AssetType::DebtMutualFund
        );
    }

    #[test]
    fn test_listed_refinement() {
        assert_eq!(classify_declared("Stock", "SGB Aug 2028", ""), AssetType::Sgb);
        assert_eq!(classify_declared("Shares", "GOLDBEES", ""), AssetType::Etf);
    }

    #[test]
    fn test_name_fallback_and_other() {
        assert_eq!(classify_declared("", "Axis Liquid Fund", ""), AssetType::DebtMutualFund);
        assert_eq!(classify_declared("Crypto", "Bitcoin", ""), AssetType::Other);
    }

    #[test]
    fn test_sector_cascade() {
        assert_eq!(classify_sector(AssetType::Epf, "anything"), "Retirement");
        assert_eq!(classify_sector(AssetType::Reit, "Embassy"), "Real Estate");
        assert_eq!(classify_sector(AssetType::Equity, "HDFC Bank Ltd"), "Banking");
        assert_eq!(classify_sector(AssetType::Equity, "Infosys IT services"), "Technology");
        assert_eq!(classify_sector(AssetType::Equity, "Sun Pharma"), "Healthcare");
        assert_eq!(classify_sector(AssetType::Equity, "Tata Motors"), "Automobile");
        assert_eq!(classify_sector(AssetType::MutualFund, "UTI Nifty 50 Index Fund"), "Index");
        assert_eq!(classify_sector(AssetType::Equity, "Some Unknown Co"), SECTOR_DEFAULT);
    }

    #[test]
    fn test_listed_symbol_heuristics() {
        assert_eq!(classify_listed("SGBAUG28V", "NSE"), AssetType::Sgb);
        assert_eq!(classify_listed("GOLDBEES", "NSE"), AssetType::Etf);
        assert_eq!(classify_listed("NIFTYBEES", "NSE"), AssetType::Etf);
        assert_eq!(classify_listed("EMBASSY-RR", "NSE"), AssetType::Reit);
        assert_eq!(classify_listed("INFY", "NSE"), AssetType::Equity);
        assert_eq!(classify_listed("AAPL", "NASDAQ"), AssetType::UsStock);
    }

    #[test]
    fn test_listed_sectors() {
        assert_eq!(classify_listed_sector(AssetType::Etf, "GOLDBEES", "NSE"), "Commodity");
        assert_eq!(classify_listed_sector(AssetType::Etf, "BANKBEES", "NSE"), "Banking");
        assert_eq!(classify_listed_sector(AssetType::Etf, "NIFTYBEES", "NSE"), "Index");
        assert_eq!(classify_listed_sector(AssetType::Sgb, "SGBAUG28V", "NSE"), "Commodity");
        assert_eq!(classify_listed_sector(AssetType::Equity, "HDFCBANK", "NSE"), SECTOR_DEFAULT);
    }
}
