//! 헤더 행 탐지.
//!
//! 실제 파일은 제목 행, 빈 행, 안내 문구 등이 헤더 앞에 오는 경우가 많아
//! 처음 몇 행 중 헤더 조건을 가장 먼저 만족하는 행을 찾습니다.

use crate::workbook::Cell;

/// 헤더를 찾는 최대 행 수.
pub const HEADER_SCAN_ROWS: usize = 20;

/// 헤더로 인정하기 위한 최소 조건 수.
const MIN_CRITERIA: usize = 2;

// 각 조건은 후보 중 하나라도 행 텍스트에 포함되면 충족
const HEADER_CRITERIA: &[&[&str]] = &[
    &["asset type"],
    &["investment", "stock", "fund"],
    &["units", "quantity"],
    &["amount", "value"],
];

/// 헤더 행의 0 기반 인덱스를 반환합니다.
pub fn find_header_row(rows: &[Vec<Cell>]) -> Option<usize> {
    rows.iter()
        .take(HEADER_SCAN_ROWS)
        .position(|row| is_header_row(row))
}

fn is_header_row(row: &[Cell]) -> bool {
    let text = row
        .iter()
        .map(|cell| cell.as_text().to_lowercase())
        .collect::<Vec<_>>()
        .join(" ");

    let matched = HEADER_CRITERIA
        .iter()
        .filter(|candidates| candidates.iter().any(|c| text.contains(c)))
        .count();

    matched >= MIN_CRITERIA
}
