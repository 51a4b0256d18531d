//! 파일 단위 파싱 통합 테스트.

use folio_core::AssetType;
use folio_import::{
    parse_holdings_file, parse_sheet, Cell, Deadline, ImportError, ParseOptions, Sheet,
};
use rust_decimal_macros::dec;
use std::time::{Duration, Instant};

const TEN_ROW_CSV: &str = "\
Asset Type,Investment,Investment Code,Broker,Units,Invested Amount,Market Value
Equity,Infosys Ltd,INFY,Zerodha,10,\"14,000\",\"15,500\"
Equity,HDFC Bank,HDFCBANK,Zerodha,20,\"30,000\",\"32,000\"
Mutual Fund,Axis Liquid Fund,,Kuvera,50,\"1,20,000\",\"1,22,500\"
ETF,Nippon Nifty BeES,NIFTYBEES,Zerodha,100,\"21,050\",\"24,000\"
Equity,Dead Co,DEAD,Zerodha,0,0,0
Equity,Zero Co,ZERO,Groww,,,
Equity,Tata Motors,TATAMOTORS,,5,\"4,000\",\"4,800\"
PPF,Public Provident Fund,,,,\"5,00,000\",\"6,10,000\"
SGB,SGB Aug 2028,SGBAUG28,Zerodha,8,\"40,000\",\"56,000\"
US Stocks,Apple Inc,AAPL,Vested,3,\"40,000\",\"48,000\"
";

#[test]
fn test_row_skip_accounting() {
    let outcome = parse_holdings_file(
        TEN_ROW_CSV.as_bytes(),
        "holdings.csv",
        Some("text/csv"),
        &ParseOptions::default(),
        None,
    )
    .unwrap();

    assert_eq!(outcome.holdings.len(), 7);
    assert_eq!(outcome.skipped.len(), 3);
    assert_eq!(outcome.summary.rows_processed, 10);

    let skipped_rows: Vec<usize> = outcome.skipped.iter().map(|s| s.row).collect();
    assert_eq!(skipped_rows, vec![6, 7, 8]);
    assert_eq!(outcome.skipped[2].reason, "Missing broker");
    assert_eq!(outcome.summary.rows_skipped, 3);

    let types: Vec<AssetType> = outcome.holdings.iter().map(|h| h.asset_type).collect();
    assert!(types.contains(&AssetType::DebtMutualFund));
    assert!(types.contains(&AssetType::Ppf));
    assert!(types.contains(&AssetType::Sgb));
    assert!(types.contains(&AssetType::UsStock));

    let ppf = outcome
        .holdings
        .iter()
        .find(|h| h.asset_type == AssetType::Ppf)
        .unwrap();
    assert_eq!(ppf.broker_account, "PPF");
    assert_eq!(ppf.quantity, dec!(1));
}

#[test]
fn test_header_after_blank_and_title_rows_any_column_order() {
    let csv = "\
,,,,,
,,,,,
,,,,,
Family Portfolio Statement,,,,,
Market Value,Broker,Total Units,Investment,Asset Type,Invested Amount
\"15,500\",Zerodha,10,Infosys Ltd,Equity,\"14,000\"
";
    let outcome = parse_holdings_file(
        csv.as_bytes(),
        "statement.csv",
        None,
        &ParseOptions::default(),
        None,
    )
    .unwrap();

    assert_eq!(outcome.summary.header_row, 5);
    assert_eq!(outcome.holdings.len(), 1);
    let infy = &outcome.holdings[0];
    assert_eq!(infy.quantity, dec!(10));
    assert_eq!(infy.display_name, "Infosys Ltd");
    assert_eq!(infy.avg_price, dec!(1400));
    assert_eq!(infy.last_price, dec!(1550));
}

#[test]
fn test_elapsed_deadline_times_out() {
    let result = parse_holdings_file(
        TEN_ROW_CSV.as_bytes(),
        "holdings.csv",
        None,
        &ParseOptions::default(),
        Some(Deadline::at(Instant::now())),
    );
    assert!(matches!(result, Err(ImportError::ProcessingTimeout { row: 2 })));
}

#[test]
fn test_deadline_expiring_mid_file_stops_between_rows() {
    let header = [
        "Asset Type",
        "Investment",
        "Investment Code",
        "Broker",
        "Units",
        "Invested Amount",
        "Market Value",
    ];
    let mut rows: Vec<Vec<String>> = vec![header.iter().map(|h| h.to_string()).collect()];
    rows.extend((0..200_000).map(|i| {
        vec![
            "Equity".to_string(),
            format!("Company {i}"),
            format!("C{i}"),
            "Zerodha".to_string(),
            "10".to_string(),
            "14000".to_string(),
            "15500".to_string(),
        ]
    }));
    let sheet = Sheet::from_rows("Holdings", rows);
    let options = ParseOptions {
        max_rows: 200_000,
        ..ParseOptions::default()
    };

    let result = parse_sheet(&sheet, &options, Deadline::after(Duration::from_millis(50)));
    match result {
        Err(ImportError::ProcessingTimeout { row }) => {
            assert!(row > 2, "deadline should expire after some rows were parsed");
            assert!(row <= 200_001);
        }
        other => panic!("unexpected: {:?}", other.map(|o| o.summary)),
    }
}

#[test]
fn test_xirr_unit_is_consistent_across_cell_kinds() {
    let mut sheet = Sheet::from_rows(
        "Holdings",
        vec![
            vec!["Asset Type", "Investment", "Broker", "Units", "Invested Amount", "Market Value", "XIRR"],
            vec!["Mutual Fund", "Parag Parikh Flexi Cap", "Kuvera", "100", "5000", "6500", ""],
            vec!["Mutual Fund", "Parag Parikh Flexi Cap", "Groww", "100", "5000", "6500", "14.2%"],
            vec!["Mutual Fund", "Quant Small Cap", "Groww", "10", "5000", "9000", "38.5"],
            vec!["Mutual Fund", "HDFC Index Fund", "Groww", "10", "5000", "6000", "99999999"],
        ],
    );
    // 퍼센트 서식의 xlsx 셀은 분수로 읽힘
    sheet.rows[1][6] = Cell::Number(0.142);

    let outcome = parse_sheet(
        &sheet,
        &ParseOptions::default(),
        Deadline::after(Duration::from_secs(30)),
    )
    .unwrap();

    let xirr: Vec<_> = outcome.holdings.iter().map(|h| h.xirr).collect();
    assert_eq!(xirr, vec![Some(dec!(14.2)), Some(dec!(14.2)), Some(dec!(38.5)), None]);
    assert!(outcome
        .warnings
        .iter()
        .any(|w| w.starts_with("Row 5: XIRR") && w.contains("out of range")));
}

#[test]
fn test_missing_required_column() {
    let csv = "Asset Type,Investment,Units,Market Value\nEquity,INFY,10,1000\n";
    let result = parse_holdings_file(csv.as_bytes(), "a.csv", None, &ParseOptions::default(), None);
    match result {
        Err(ImportError::MissingColumn(name)) => assert_eq!(name, "Broker"),
        other => panic!("unexpected: {:?}", other),
    }
}

#[test]
fn test_no_header_row() {
    let csv = "a,b,c\n1,2,3\n";
    let result = parse_holdings_file(csv.as_bytes(), "a.csv", None, &ParseOptions::default(), None);
    assert!(matches!(result, Err(ImportError::NoHeaderRow(20))));
}

#[test]
fn test_all_rows_invalid() {
    let sheet = Sheet::from_rows(
        "Holdings",
        vec![
            vec!["Asset Type", "Investment", "Broker", "Units"],
            vec!["Equity", "", "Zerodha", "10"],
        ],
    );
    let result = parse_sheet(
        &sheet,
        &ParseOptions::default(),
        Deadline::after(Duration::from_secs(30)),
    );
    match result {
        Err(err @ ImportError::NoValidRows { .. }) => {
            assert_eq!(err.to_string(), "No valid holdings found (1 rows skipped)");
            let skipped = err.skipped_rows();
            assert_eq!(skipped.len(), 1);
            assert_eq!(skipped[0].row, 2);
            assert_eq!(skipped[0].reason, "Missing asset type or investment name");
        }
        other => panic!("unexpected: {:?}", other.map(|o| o.summary)),
    }
}

#[test]
fn test_gate_rejects_before_parsing() {
    let options = ParseOptions {
        max_file_bytes: 16,
        ..ParseOptions::default()
    };
    let result = parse_holdings_file(TEN_ROW_CSV.as_bytes(), "holdings.csv", None, &options, None);
    assert!(matches!(result, Err(ImportError::FileTooLarge { .. })));

    let result = parse_holdings_file(b"x", "holdings.pdf", None, &ParseOptions::default(), None);
    assert!(matches!(result, Err(ImportError::UnsupportedExtension(_))));
}
