//! 보유 종목 파일 파서.
//!
//! 헤더 아래의 각 행을 정규 보유 종목으로 변환합니다.
//! 행 단위 문제는 파일 전체를 실패시키지 않고 1 기반 행 번호와 이유와 함께
//! 건너뛴 행으로 보고됩니다.

use crate::columns::{Column, ColumnMap, REQUIRED_COLUMNS};
use crate::gate::check_upload;
use crate::header::{find_header_row, HEADER_SCAN_ROWS};
use crate::workbook::{load_sheet, Cell, Sheet};
use crate::{Deadline, ImportError, ImportResult};
use folio_core::coerce::{clean_text, finite_decimal, normalize_key, parse_percent};
use folio_core::taxonomy::{classify_declared, classify_sector};
use folio_core::{CanonicalHolding, ImportConfig};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// 정규화된 종목명에서 만든 심볼의 최대 길이.
const MAX_DERIVED_SYMBOL_LEN: usize = 40;

/// 투자 코드로 인정하는 최대 길이.
const MAX_CODE_LEN: usize = 20;

/// 저장 가능한 XIRR 절대값 상한 (퍼센트).
const MAX_XIRR_PERCENT: i64 = 1_000_000;

/// 파서 옵션.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    pub max_file_bytes: usize,
    pub max_rows: usize,
    pub timeout: Duration,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self::from(&ImportConfig::default())
    }
}

impl From<&ImportConfig> for ParseOptions {
    fn from(config: &ImportConfig) -> Self {
        Self {
            max_file_bytes: config.max_file_bytes,
            max_rows: config.max_rows,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

/// 건너뛴 행.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRow {
    /// 시트 기준 1 기반 행 번호
    pub row: usize,
    pub reason: String,
}

/// 파싱 요약.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ParseSummary {
    pub sheet_name: String,
    /// 헤더 행 번호 (1 기반)
    pub header_row: usize,
    /// 처리한 데이터 행 수 (빈 행 제외)
    pub rows_processed: usize,
    pub holdings_parsed: usize,
    pub rows_skipped: usize,
    pub total_invested: Decimal,
    pub total_market_value: Decimal,
    /// 파싱 소요 시간 (밀리초)
    pub processing_ms: u64,
}

/// 파싱 결과.
#[derive(Debug, Clone, Serialize)]
pub struct ParseOutcome {
    pub holdings: Vec<CanonicalHolding>,
    pub skipped: Vec<SkippedRow>,
    pub warnings: Vec<String>,
    pub summary: ParseSummary,
}

/// 업로드된 파일 바이트를 파싱합니다.
///
/// `deadline`이 주어지면 옵션의 시간 예산과 합성하여 더 이른 쪽을 사용합니다.
pub fn parse_holdings_file(
    bytes: &[u8],
    file_name: &str,
    content_type: Option<&str>,
    options: &ParseOptions,
    deadline: Option<Deadline>,
) -> ImportResult<ParseOutcome> {
    let started = Instant::now();
    let deadline = Deadline::after(options.timeout).min_opt(deadline);
    let kind = check_upload(file_name, content_type, bytes.len(), options.max_file_bytes)?;
    let sheet = load_sheet(bytes, kind)?;

    info!(
        file_name,
        sheet = %sheet.name,
        rows = sheet.rows.len(),
        "Parsing holdings file"
    );
    let mut outcome = parse_sheet(&sheet, options, deadline)?;
    outcome.summary.processing_ms = elapsed_ms(started);
    Ok(outcome)
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// 로드된 시트를 파싱합니다.
pub fn parse_sheet(sheet: &Sheet, options: &ParseOptions, deadline: Deadline) -> ImportResult<ParseOutcome> {
    let started = Instant::now();
    let header_idx = find_header_row(&sheet.rows).ok_or(ImportError::NoHeaderRow(HEADER_SCAN_ROWS))?;
    let columns = ColumnMap::from_header(&sheet.rows[header_idx]);
    columns.require(REQUIRED_COLUMNS)?;

    let mut holdings = Vec::new();
    let mut skipped = Vec::new();
    let mut warnings = Vec::new();
    let mut rows_processed = 0usize;

    let data_rows = &sheet.rows[header_idx + 1..];
    if data_rows.len() > options.max_rows {
        warnings.push(format!(
            "File has {} data rows; only the first {} were processed",
            data_rows.len(),
            options.max_rows
        ));
    }

    for (offset, row) in data_rows.iter().take(options.max_rows).enumerate() {
        // 헤더 행 번호(1 기반) + 오프셋 + 1
        let row_number = header_idx + offset + 2;
        deadline.check(row_number)?;

        if row.iter().all(Cell::is_blank) {
            continue;
        }
        rows_processed += 1;

        match parse_row(row, &columns) {
            Ok(mut parsed) => {
                if let Some(xirr) = parsed.xirr.filter(|x| x.abs() > Decimal::from(MAX_XIRR_PERCENT)) {
                    warnings.push(format!(
                        "Row {}: XIRR {}% is out of range and was ignored",
                        row_number, xirr
                    ));
                    parsed.xirr = None;
                }
                if parsed.avg_price.is_zero() && parsed.last_price.is_zero() {
                    warnings.push(format!(
                        "Row {}: '{}' has no purchase or current price",
                        row_number, parsed.symbol
                    ));
                }
                holdings.push(parsed);
            }
            Err(reason) => {
                debug!(row = row_number, %reason, "Skipping row");
                skipped.push(SkippedRow {
                    row: row_number,
                    reason,
                });
            }
        }
    }

    if holdings.is_empty() {
        warn!(skipped = skipped.len(), "No valid holdings in file");
        return Err(ImportError::NoValidRows { skipped });
    }

    dedupe_symbols(&mut holdings, &mut warnings);

    let total_invested: Decimal = holdings.iter().map(CanonicalHolding::invested_value).sum();
    let total_market_value: Decimal = holdings.iter().map(CanonicalHolding::market_value).sum();
    if total_invested.is_zero() {
        warnings.push("Total invested amount is zero; check the Invested Amount column".to_string());
    }

    let summary = ParseSummary {
        sheet_name: sheet.name.clone(),
        header_row: header_idx + 1,
        rows_processed,
        holdings_parsed: holdings.len(),
        rows_skipped: skipped.len(),
        total_invested,
        total_market_value,
        processing_ms: elapsed_ms(started),
    };

    info!(
        parsed = summary.holdings_parsed,
        skipped = summary.rows_skipped,
        warnings = warnings.len(),
        "Holdings file parsed"
    );

    Ok(ParseOutcome {
        holdings,
        skipped,
        warnings,
        summary,
    })
}

fn text(row: &[Cell], columns: &ColumnMap, column: Column) -> String {
    columns
        .cell(row, column)
        .map(|cell| clean_text(&cell.as_text()))
        .unwrap_or_default()
}

fn number(row: &[Cell], columns: &ColumnMap, column: Column) -> Option<Decimal> {
    columns.cell(row, column).and_then(Cell::as_decimal)
}

/// 퍼센트 값. 단위는 항상 퍼센트(14.2 = 14.2%)입니다.
///
/// 퍼센트 서식의 숫자 셀은 분수(0.142)로 저장되므로 절대값 1 이하는 100배합니다.
fn percent(row: &[Cell], columns: &ColumnMap, column: Column) -> Option<Decimal> {
    match columns.cell(row, column)? {
        Cell::Number(n) => finite_decimal(*n).map(|value| {
            if value.abs() <= Decimal::ONE {
                (value * Decimal::ONE_HUNDRED).normalize()
            } else {
                value
            }
        }),
        Cell::Text(s) => parse_percent(s),
        _ => None,
    }
}

/// 한 행을 파싱합니다. 실패 시 건너뛸 이유를 반환합니다.
fn parse_row(row: &[Cell], columns: &ColumnMap) -> Result<CanonicalHolding, String> {
    let declared_type = text(row, columns, Column::AssetType);
    let name = text(row, columns, Column::Investment);
    if declared_type.is_empty() || name.is_empty() {
        return Err("Missing asset type or investment name".to_string());
    }

    let units = number(row, columns, Column::Units);
    let invested = number(row, columns, Column::InvestedAmount).unwrap_or_default();
    let market = number(row, columns, Column::MarketValue).unwrap_or_default();
    if units.unwrap_or_default().is_zero() && invested.is_zero() && market.is_zero() {
        return Err("Units, invested amount and market value are all zero".to_string());
    }

    let category = text(row, columns, Column::Category);
    let asset_type = classify_declared(&declared_type, &name, &category);

    let mut broker = text(row, columns, Column::Broker);
    if broker.is_empty() {
        if asset_type.is_retirement() {
            broker = asset_type.code().to_string();
        } else {
            return Err("Missing broker".to_string());
        }
    }

    // 수량이 없으면 일시금 보유로 간주: 수량 1, 금액이 곧 가격
    let (quantity, avg_price, last_price) = match units.filter(|u| !u.is_zero()) {
        Some(units) => (units, per_unit(invested, units), per_unit(market, units)),
        None => (Decimal::ONE, invested, market),
    };

    let symbol = symbol_for(&text(row, columns, Column::InvestmentCode), &name);

    let explicit_sector = text(row, columns, Column::Sector);
    let sector = if explicit_sector.is_empty() {
        classify_sector(asset_type, &format!("{} {}", name, category)).to_string()
    } else {
        explicit_sector
    };

    let isin = Some(text(row, columns, Column::Isin)).filter(|s| !s.is_empty());

    let holding = CanonicalHolding {
        symbol,
        display_name: name,
        asset_type,
        sector,
        quantity,
        avg_price,
        last_price,
        exchange: text(row, columns, Column::Exchange).to_uppercase(),
        isin,
        broker_account: broker,
        xirr: percent(row, columns, Column::Xirr),
    };

    validate(&holding)?;
    Ok(holding)
}

fn per_unit(amount: Decimal, units: Decimal) -> Decimal {
    amount.checked_div(units).unwrap_or_default().round_dp(4)
}

/// 투자 코드가 올바른 형식이면 그대로, 아니면 종목명에서 심볼을 만듭니다.
fn symbol_for(code: &str, name: &str) -> String {
    let well_formed = (2..=MAX_CODE_LEN).contains(&code.chars().count())
        && code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '&' | ':'));

    if well_formed {
        return code.to_uppercase();
    }

    normalize_key(name)
        .to_uppercase()
        .replace(' ', "_")
        .chars()
        .take(MAX_DERIVED_SYMBOL_LEN)
        .collect::<String>()
        .trim_end_matches('_')
        .to_string()
}

fn validate(holding: &CanonicalHolding) -> Result<(), String> {
    if holding.symbol.chars().count() < 2 || holding.display_name.chars().count() < 2 {
        return Err("Symbol and name must be at least 2 characters".to_string());
    }
    if holding.quantity <= Decimal::ZERO {
        return Err("Quantity must be positive".to_string());
    }
    if holding.avg_price < Decimal::ZERO || holding.last_price < Decimal::ZERO {
        return Err("Prices must not be negative".to_string());
    }
    Ok(())
}

/// 같은 (심볼, 브로커) 쌍이 반복되면 뒤의 항목에 `_2`, `_3`... 접미사를 붙입니다.
fn dedupe_symbols(holdings: &mut [CanonicalHolding], warnings: &mut Vec<String>) {
    let mut seen: HashSet<(String, String)> = HashSet::new();

    for holding in holdings.iter_mut() {
        let key = (holding.symbol.clone(), holding.broker_account.clone());
        if seen.insert(key) {
            continue;
        }

        let mut suffix = 2;
        let renamed = loop {
            let candidate = format!("{}_{}", holding.symbol, suffix);
            if seen.insert((candidate.clone(), holding.broker_account.clone())) {
                break candidate;
            }
            suffix += 1;
        };

        warnings.push(format!(
            "Duplicate holding '{}' at {} renamed to '{}'",
            holding.symbol, holding.broker_account, renamed
        ));
        holding.symbol = renamed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::AssetType;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn sheet(rows: Vec<Vec<&str>>) -> Sheet {
        Sheet::from_rows("Holdings", rows)
    }

    fn far() -> Deadline {
        Deadline::after(Duration::from_secs(60))
    }

    const HEADER: [&str; 7] = [
        "Asset Type",
        "Investment",
        "Investment Code",
        "Broker",
        "Units",
        "Invested Amount",
        "Market Value",
    ];

    #[test]
    fn test_derived_prices() {
        let outcome = parse_sheet(
            &sheet(vec![
                HEADER.to_vec(),
                vec!["Equity", "Infosys Ltd", "INFY", "Zerodha", "10", "14,000", "15,500"],
            ]),
            &ParseOptions::default(),
            far(),
        )
        .unwrap();

        let infy = &outcome.holdings[0];
        assert_eq!(infy.symbol, "INFY");
        assert_eq!(infy.quantity, dec!(10));
        assert_eq!(infy.avg_price, dec!(1400));
        assert_eq!(infy.last_price, dec!(1550));
        assert_eq!(outcome.summary.total_invested, dec!(14000));
        assert_eq!(outcome.summary.header_row, 1);
    }

    #[test]
    fn test_lump_sum_and_retirement_broker() {
        let outcome = parse_sheet(
            &sheet(vec![
                HEADER.to_vec(),
                vec!["EPF", "Employee Provident Fund", "", "", "", "3,50,000", "4,10,000"],
            ]),
            &ParseOptions::default(),
            far(),
        )
        .unwrap();

        let epf = &outcome.holdings[0];
        assert_eq!(epf.asset_type, AssetType::Epf);
        assert_eq!(epf.broker_account, "EPF");
        assert_eq!(epf.quantity, Decimal::ONE);
        assert_eq!(epf.avg_price, dec!(350000));
        assert_eq!(epf.last_price, dec!(410000));
        assert_eq!(epf.symbol, "EMPLOYEE_PROVIDENT_FUND");
        assert_eq!(epf.sector, "Retirement");
    }

    #[test]
    fn test_duplicates_get_suffix() {
        let outcome = parse_sheet(
            &sheet(vec![
                HEADER.to_vec(),
                vec!["Equity", "Infosys", "INFY", "Zerodha", "10", "14000", "15000"],
                vec!["Equity", "Infosys", "INFY", "Zerodha", "5", "7000", "7500"],
                vec!["Equity", "Infosys", "INFY", "Groww", "5", "7000", "7500"],
            ]),
            &ParseOptions::default(),
            far(),
        )
        .unwrap();

        let symbols: Vec<&str> = outcome.holdings.iter().map(|h| h.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["INFY", "INFY_2", "INFY"]);
        assert!(outcome.warnings.iter().any(|w| w.contains("INFY_2")));
    }

    #[test]
    fn test_zero_prices_warn_and_zero_total_warns() {
        let outcome = parse_sheet(
            &sheet(vec![
                HEADER.to_vec(),
                vec!["Equity", "Some Stock", "SOME", "Zerodha", "10", "", ""],
            ]),
            &ParseOptions::default(),
            far(),
        )
        .unwrap();

        assert_eq!(outcome.holdings.len(), 1);
        assert!(outcome.warnings.iter().any(|w| w.contains("no purchase or current price")));
        assert!(outcome.warnings.iter().any(|w| w.contains("Total invested amount is zero")));
    }

    #[test]
    fn test_short_name_and_negative_quantity_skipped() {
        let outcome = parse_sheet(
            &sheet(vec![
                HEADER.to_vec(),
                vec!["Equity", "X", "", "Zerodha", "10", "100", "100"],
                vec!["Equity", "Valid Co", "VALID", "Zerodha", "-5", "100", "100"],
                vec!["Equity", "Good Co", "GOOD", "Zerodha", "1", "100", "100"],
            ]),
            &ParseOptions::default(),
            far(),
        )
        .unwrap();

        assert_eq!(outcome.holdings.len(), 1);
        assert_eq!(outcome.skipped.len(), 2);
        assert_eq!(outcome.skipped[0].row, 2);
        assert_eq!(outcome.skipped[1].reason, "Quantity must be positive");
    }

    #[test]
    fn test_row_limit_warns() {
        let mut rows = vec![HEADER.to_vec()];
        for _ in 0..5 {
            rows.push(vec!["Equity", "Infosys", "INFY", "Zerodha", "1", "10", "10"]);
        }
        let options = ParseOptions {
            max_rows: 3,
            ..ParseOptions::default()
        };
        let outcome = parse_sheet(&sheet(rows), &options, far()).unwrap();
        assert_eq!(outcome.summary.rows_processed, 3);
        assert!(outcome.warnings.iter().any(|w| w.contains("only the first 3")));
    }

    #[test]
    fn test_xirr_percent() {
        let mut header = HEADER.to_vec();
        header.push("XIRR");
        let outcome = parse_sheet(
            &sheet(vec![
                header,
                vec!["Mutual Fund", "Parag Parikh Flexi Cap", "", "Kuvera", "100", "5000", "6500", "14.2%"],
            ]),
            &ParseOptions::default(),
            far(),
        )
        .unwrap();
        let fund = &outcome.holdings[0];
        assert_eq!(fund.xirr, Some(dec!(14.2)));
        assert_eq!(fund.asset_type, AssetType::MutualFund);
        assert_eq!(fund.symbol, "PARAG_PARIKH_FLEXI_CAP");
    }

    #[test]
    fn test_symbol_for() {
        assert_eq!(symbol_for("m&m", "Mahindra"), "M&M");
        assert_eq!(symbol_for("", "HDFC  Bank Ltd."), "HDFC_BANK_LTD");
        assert_eq!(symbol_for("not a code", "Axis Bluechip"), "AXIS_BLUECHIP");
        assert_eq!(symbol_for("", &"long name ".repeat(10)).len(), MAX_DERIVED_SYMBOL_LEN - 1);
    }

    #[test]
    fn test_summary_records_processing_time() {
        let csv = "Asset Type,Investment,Broker,Units,Invested Amount,Market Value\n\
                   Equity,Infosys Ltd,Zerodha,10,14000,15500\n";
        let outcome =
            parse_holdings_file(csv.as_bytes(), "h.csv", None, &ParseOptions::default(), None).unwrap();
        let json = serde_json::to_value(&outcome.summary).unwrap();
        assert!(json["processing_ms"].is_u64());
        assert!(outcome.summary.processing_ms < 60_000);
    }

    proptest! {
        #[test]
        fn prop_symbol_for_is_bounded(code in ".{0,30}", name in ".{0,80}") {
            let symbol = symbol_for(&code, &name);
            prop_assert!(symbol.chars().count() <= MAX_DERIVED_SYMBOL_LEN.max(MAX_CODE_LEN));
            prop_assert!(!symbol.contains(' '));
        }

        #[test]
        fn prop_arbitrary_cells_never_panic(
            cells in proptest::collection::vec(proptest::collection::vec(".{0,12}", 7), 0..12)
        ) {
            let mut rows = vec![HEADER.iter().map(|h| h.to_string()).collect::<Vec<_>>()];
            rows.extend(cells);
            let result = parse_sheet(&Sheet::from_rows("Holdings", rows), &ParseOptions::default(), far());
            if let Ok(outcome) = result {
                prop_assert_eq!(
                    outcome.summary.rows_processed,
                    outcome.holdings.len() + outcome.skipped.len()
                );
                prop_assert!(outcome.holdings.iter().all(|h| h.quantity > Decimal::ZERO));
            }
        }
    }
}
