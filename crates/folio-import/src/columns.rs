//! 헤더 동의어 기반 열 매핑.

use crate::workbook::Cell;
use crate::{ImportError, ImportResult};
use folio_core::coerce::normalize_key;
use folio_core::{first_match, Predicate, Rule};
use std::collections::HashMap;

/// 정규 열.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    AssetType,
    Investment,
    InvestmentCode,
    Category,
    Broker,
    Units,
    InvestedAmount,
    MarketValue,
    Xirr,
    Sector,
    Exchange,
    Isin,
}

impl Column {
    /// 사용자에게 보여줄 열 이름.
    pub fn display_name(&self) -> &'static str {
        match self {
            Column::AssetType => "Asset Type",
            Column::Investment => "Investment",
            Column::InvestmentCode => "Investment Code",
            Column::Category => "Category",
            Column::Broker => "Broker",
            Column::Units => "Units",
            Column::InvestedAmount => "Invested Amount",
            Column::MarketValue => "Market Value",
            Column::Xirr => "XIRR",
            Column::Sector => "Sector",
            Column::Exchange => "Exchange",
            Column::Isin => "ISIN",
        }
    }
}

/// 필수 열.
pub const REQUIRED_COLUMNS: &[Column] = &[Column::AssetType, Column::Investment, Column::Broker];

// 순서가 중요: "investment code"는 Investment보다, "invested amount"는 MarketValue보다 먼저 검사
const COLUMN_RULES: &[Rule<Column>] = &[
    Rule::new(
        Predicate::Any(&[
            Predicate::Contains(&[
                "asset type",
                "asset class",
                "security type",
                "instrument type",
                "holding type",
            ]),
            Predicate::Equals(&["type", "asset", "class"]),
        ]),
        Column::AssetType,
    ),
    Rule::new(Predicate::Word(&["isin"]), Column::Isin),
    Rule::new(Predicate::Word(&["xirr", "cagr", "irr"]), Column::Xirr),
    Rule::new(Predicate::Word(&["sector", "industry"]), Column::Sector),
    Rule::new(Predicate::Word(&["exchange"]), Column::Exchange),
    Rule::new(
        Predicate::Any(&[
            Predicate::Contains(&[
                "investment code",
                "scheme code",
                "stock code",
                "scrip code",
                "symbol",
                "ticker",
                "tradingsymbol",
            ]),
            Predicate::Equals(&["code"]),
        ]),
        Column::InvestmentCode,
    ),
    Rule::new(
        Predicate::All(&[
            Predicate::Any(&[
                Predicate::Contains(&[
                    "invested",
                    "investment amount",
                    "amount invested",
                    "cost",
                    "buy value",
                    "purchase value",
                    "principal",
                ]),
                Predicate::Equals(&["amount"]),
            ]),
            Predicate::Not(&Predicate::Contains(&["avg", "average", "per unit"])),
        ]),
        Column::InvestedAmount,
    ),
    Rule::new(
        Predicate::Contains(&["units", "quantity", "qty", "shares", "no of"]),
        Column::Units,
    ),
    Rule::new(
        Predicate::Contains(&["market value", "current value", "present value", "valuation", "value"]),
        Column::MarketValue,
    ),
    Rule::new(
        Predicate::Any(&[
            Predicate::Contains(&["category", "sub type", "subtype"]),
            Predicate::Equals(&["segment"]),
        ]),
        Column::Category,
    ),
    Rule::new(
        Predicate::Contains(&["broker", "platform", "account", "held with", "demat"]),
        Column::Broker,
    ),
    Rule::new(
        Predicate::Any(&[
            Predicate::Contains(&[
                "investment",
                "stock name",
                "fund name",
                "scheme name",
                "security",
                "instrument",
                "holding name",
                "company",
            ]),
            Predicate::Equals(&["name", "stock", "fund", "scheme", "scrip"]),
        ]),
        Column::Investment,
    ),
];

/// 정규 열 → 열 인덱스.
#[derive(Debug, Clone, Default)]
pub struct ColumnMap {
    indices: HashMap<Column, usize>,
}

impl ColumnMap {
    /// 헤더 행에서 매핑을 만듭니다. 같은 열에 여러 헤더가 맞으면 첫 번째를 사용합니다.
    pub fn from_header(header: &[Cell]) -> Self {
        let mut indices = HashMap::new();
        for (idx, cell) in header.iter().enumerate() {
            let key = normalize_key(&cell.as_text());
            if key.is_empty() {
                continue;
            }
            if let Some(column) = first_match(COLUMN_RULES, &key) {
                indices.entry(column).or_insert(idx);
            }
        }
        Self { indices }
    }

    pub fn get(&self, column: Column) -> Option<usize> {
        self.indices.get(&column).copied()
    }

    /// 필수 열이 모두 매핑되었는지 확인합니다.
    pub fn require(&self, columns: &[Column]) -> ImportResult<()> {
        match columns.iter().find(|c| self.get(**c).is_none()) {
            Some(missing) => Err(ImportError::MissingColumn(missing.display_name())),
            None => Ok(()),
        }
    }

    /// 행에서 열의 셀을 가져옵니다.
    pub fn cell<'a>(&self, row: &'a [Cell], column: Column) -> Option<&'a Cell> {
        self.get(column).and_then(|idx| row.get(idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Sheet;

    fn map(headers: &[&str]) -> ColumnMap {
        let sheet = Sheet::from_rows("s", vec![headers.to_vec()]);
        ColumnMap::from_header(&sheet.rows[0])
    }

    #[test]
    fn test_canonical_headers() {
        let columns = map(&[
            "Asset Type",
            "Investment",
            "Investment Code",
            "Category",
            "Broker",
            "Units",
            "Invested Amount",
            "Market Value",
            "XIRR %",
            "Sector",
        ]);
        assert_eq!(columns.get(Column::AssetType), Some(0));
        assert_eq!(columns.get(Column::Investment), Some(1));
        assert_eq!(columns.get(Column::InvestmentCode), Some(2));
        assert_eq!(columns.get(Column::Category), Some(3));
        assert_eq!(columns.get(Column::Broker), Some(4));
        assert_eq!(columns.get(Column::Units), Some(5));
        assert_eq!(columns.get(Column::InvestedAmount), Some(6));
        assert_eq!(columns.get(Column::MarketValue), Some(7));
        assert_eq!(columns.get(Column::Xirr), Some(8));
        assert_eq!(columns.get(Column::Sector), Some(9));
        assert!(columns.require(REQUIRED_COLUMNS).is_ok());
    }

    #[test]
    fn test_synonyms() {
        let columns = map(&["Fund Name", "Qty", "Current Value (₹)", "Cost", "Platform", "Type"]);
        assert_eq!(columns.get(Column::Investment), Some(0));
        assert_eq!(columns.get(Column::Units), Some(1));
        assert_eq!(columns.get(Column::MarketValue), Some(2));
        assert_eq!(columns.get(Column::InvestedAmount), Some(3));
        assert_eq!(columns.get(Column::Broker), Some(4));
        assert_eq!(columns.get(Column::AssetType), Some(5));
    }

    #[test]
    fn test_average_cost_is_not_invested_amount() {
        let columns = map(&["Avg Cost", "Investment"]);
        assert_eq!(columns.get(Column::InvestedAmount), None);
    }

    #[test]
    fn test_missing_required_column_is_named() {
        let columns = map(&["Asset Type", "Investment", "Units"]);
        match columns.require(REQUIRED_COLUMNS) {
            Err(ImportError::MissingColumn(name)) => assert_eq!(name, "Broker"),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
