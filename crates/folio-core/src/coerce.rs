//! 숫자/텍스트 변환 유틸리티.
//!
//! 브로커 응답과 업로드된 스프레드시트는 형식이 제각각입니다.
//! 이 모듈은 다음을 허용하는 관대한 파서를 제공합니다:
//! - 천 단위 구분자 (서구식 `1,234,567`, 인도식 `12,34,567`)
//! - 통화 기호 및 접두사 (`₹`, `$`, `Rs.`, `INR` 등)
//! - 괄호 음수 표기 (`(500)` → -500)
//! - 퍼센트 접미사
//!
//! 해석할 수 없는 입력과 유한하지 않은 값은 모두 0으로 처리됩니다.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;

/// 텍스트 셀의 최대 길이 (문자 수).
pub const MAX_TEXT_CHARS: usize = 500;

const CURRENCY_SYMBOLS: &[char] = &['₹', '$', '€', '£', '¥'];
const CURRENCY_PREFIXES: &[&str] = &["rs.", "rs", "inr", "usd"];
const IGNORED_CHARS: &[char] = &[',', ' ', '\u{a0}', '_', '%', '\''];

/// 문자열을 Decimal로 변환합니다.
///
/// 실패 시 0을 반환합니다.
///
/// # 예제
///
/// ```
/// use folio_core::coerce::parse_number;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(parse_number("₹1,23,456.50"), dec!(123456.50));
/// assert_eq!(parse_number("(500)"), dec!(-500));
/// assert_eq!(parse_number("N/A"), dec!(0));
/// ```
pub fn parse_number(input: &str) -> Decimal {
    try_parse_number(input).unwrap_or(Decimal::ZERO)
}

/// 문자열을 Decimal로 변환합니다. 해석할 수 없으면 `None`.
pub fn try_parse_number(input: &str) -> Option<Decimal> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    let (negative, body) = match trimmed
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
    {
        Some(inner) => (true, inner.trim()),
        None => (false, trimmed),
    };

    let cleaned = strip_currency(body);
    let (sign_negative, digits) = match cleaned.strip_prefix('-') {
        Some(rest) => (true, rest.to_string()),
        None => (false, cleaned.trim_start_matches('+').to_string()),
    };

    if !digits.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let value = Decimal::from_str(&digits)
        .ok()
        .or_else(|| Decimal::from_scientific(&digits).ok())
        .or_else(|| digits.parse::<f64>().ok().and_then(finite_decimal))?;

    if negative ^ sign_negative {
        Some(-value)
    } else {
        Some(value)
    }
}

/// 스프레드시트의 숫자 셀 값을 Decimal로 변환합니다.
///
/// NaN, 무한대는 0으로 처리합니다.
pub fn number_from_f64(value: f64) -> Decimal {
    finite_decimal(value).unwrap_or(Decimal::ZERO)
}

/// 유한한 f64만 Decimal로 변환합니다.
pub fn finite_decimal(value: f64) -> Option<Decimal> {
    if value.is_finite() {
        Decimal::from_f64(value)
    } else {
        None
    }
}

/// 퍼센트 문자열을 파싱합니다 (`"12.5%"` → 12.5).
///
/// 값이 없거나 해석할 수 없으면 `None`을 반환합니다.
pub fn parse_percent(input: &str) -> Option<Decimal> {
    let trimmed = input.trim();
    if trimmed.is_empty() || trimmed == "-" {
        return None;
    }
    try_parse_number(trimmed.trim_end_matches('%'))
}

/// 텍스트 셀을 정리합니다: 앞뒤 공백 제거 후 최대 길이로 자름.
pub fn clean_text(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.chars().count() <= MAX_TEXT_CHARS {
        trimmed.to_string()
    } else {
        trimmed.chars().take(MAX_TEXT_CHARS).collect()
    }
}

/// 비교용 키 정규화: 소문자화, 영숫자 외 문자는 공백으로, 연속 공백 축약.
pub fn normalize_key(input: &str) -> String {
    input
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn strip_currency(input: &str) -> String {
    let mut text: String = input
        .chars()
        .filter(|c| !CURRENCY_SYMBOLS.contains(c) && !IGNORED_CHARS.contains(c))
        .collect();

    let lower = text.to_lowercase();
    for prefix in CURRENCY_PREFIXES {
        if lower.starts_with(prefix) {
            if let Some(rest) = text.get(prefix.len()..) {
                text = rest.to_string();
            }
            break;
        }
    }
    text
}
