//! 워크북 로드.
//!
//! xlsx/xls는 calamine으로, csv는 csv 크레이트로 읽어
//! 형식과 무관한 셀 그리드([`Sheet`])로 변환합니다.

use crate::{FileKind, ImportError, ImportResult};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use csv::{ReaderBuilder, Terminator};
use folio_core::coerce::{finite_decimal, try_parse_number};
use rust_decimal::Decimal;
use std::io::Cursor;
use tracing::debug;

/// 셀 값.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl Cell {
    /// 텍스트 표현. 빈 셀은 빈 문자열.
    pub fn as_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
            Cell::Bool(b) => b.to_string(),
        }
    }

    /// 숫자 값. 비어 있거나 해석할 수 없으면 `None`.
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Cell::Number(n) => finite_decimal(*n),
            Cell::Text(s) => try_parse_number(s),
            Cell::Empty | Cell::Bool(_) => None,
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s.to_string())
        }
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Int(i) => Cell::Number(*i as f64),
            Data::Float(f) => Cell::Number(*f),
            Data::String(s) => Cell::from(s.as_str()),
            Data::Bool(b) => Cell::Bool(*b),
            Data::DateTime(dt) => Cell::Number(dt.as_f64()),
            Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
            Data::Error(_) | Data::Empty => Cell::Empty,
        }
    }
}

/// 시트 (이름과 행 목록).
#[derive(Debug, Clone)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    /// 문자열 행으로 시트를 만듭니다.
    pub fn from_rows<R, C>(name: impl Into<String>, rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: AsRef<str>,
    {
        Self {
            name: name.into(),
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(|c| Cell::from(c.as_ref())).collect())
                .collect(),
        }
    }
}

/// 파일 바이트에서 대상 시트를 로드합니다.
pub fn load_sheet(bytes: &[u8], kind: FileKind) -> ImportResult<Sheet> {
    match kind {
        FileKind::Csv => load_csv(bytes),
        FileKind::Xlsx | FileKind::Xls => load_workbook(bytes),
    }
}

/// 보유 종목 시트를 고릅니다: holding/portfolio/investment가 포함된 첫 시트, 없으면 첫 시트.
pub fn pick_sheet(names: &[String]) -> Option<&str> {
    const SHEET_HINTS: &[&str] = &["holding", "portfolio", "investment"];

    names
        .iter()
        .find(|name| {
            let lower = name.to_lowercase();
            SHEET_HINTS.iter().any(|hint| lower.contains(hint))
        })
        .or_else(|| names.first())
        .map(String::as_str)
}

fn load_workbook(bytes: &[u8]) -> ImportResult<Sheet> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| ImportError::Unreadable(e.to_string()))?;

    let names = workbook.sheet_names();
    let name = pick_sheet(&names)
        .ok_or_else(|| ImportError::Unreadable("workbook has no sheets".to_string()))?
        .to_string();

    let range = workbook
        .worksheet_range(&name)
        .map_err(|e| ImportError::Unreadable(format!("sheet '{}': {}", name, e)))?;

    let rows: Vec<Vec<Cell>> = range
        .rows()
        .map(|row| row.iter().map(Cell::from).collect())
        .collect();

    debug!(sheet = %name, rows = rows.len(), "Loaded workbook sheet");
    Ok(Sheet { name, rows })
}

fn load_csv(bytes: &[u8]) -> ImportResult<Sheet> {
    let content = decode_content(bytes);
    let delimiter = detect_delimiter(&content);

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .terminator(Terminator::Any(b'\n'))
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record =
            record.map_err(|e| ImportError::Unreadable(format!("CSV row {}: {}", idx + 1, e)))?;
        rows.push(
            record
                .iter()
                .map(|field| Cell::from(field.trim_end_matches('\r')))
                .collect(),
        );
    }

    debug!(rows = rows.len(), delimiter = %(delimiter as char), "Loaded CSV");
    Ok(Sheet {
        name: "csv".to_string(),
        rows,
    })
}

/// UTF-8 BOM을 제거하고 문자열로 변환합니다. 잘못된 바이트는 대체 문자로 바뀝니다.
fn decode_content(bytes: &[u8]) -> String {
    let without_bom = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
    String::from_utf8_lossy(without_bom).into_owned()
}

/// 처음 10줄에서 열 수가 가장 일관된 구분자를 고릅니다.
fn detect_delimiter(content: &str) -> u8 {
    let lines: Vec<&str> = content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .take(10)
        .collect();

    let mut best = b',';
    let mut best_score = 0usize;
    for delimiter in [b',', b';', b'\t'] {
        let counts: Vec<usize> = lines
            .iter()
            .map(|line| line.bytes().filter(|b| *b == delimiter).count())
            .collect();
        let Some(&max_count) = counts.iter().max() else {
            continue;
        };
        let consistent = counts.iter().filter(|&&c| c == max_count).count();
        let score = max_count * consistent;
        if score > best_score {
            best_score = score;
            best = delimiter;
        }
    }
    best
}
