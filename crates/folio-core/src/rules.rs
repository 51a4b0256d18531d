//! 선언적 규칙 테이블.
//!
//! 헤더 동의어 매핑, 자산 유형 분류, 섹터 분류 등은 모두
//! `(조건, 정규값)` 쌍의 순서 있는 목록으로 표현되며,
//! 단일 매처 [`first_match`]가 첫 번째로 일치하는 값을 반환합니다.
//!
//! 입력 텍스트는 [`crate::coerce::normalize_key`]로 정규화된 값을 기대합니다.

/// 정규화된 텍스트에 대한 조건.
#[derive(Debug, Clone, Copy)]
pub enum Predicate {
    /// 후보 중 하나와 정확히 일치
    Equals(&'static [&'static str]),
    /// 후보 중 하나를 부분 문자열로 포함
    Contains(&'static [&'static str]),
    /// 후보 중 하나로 시작
    StartsWith(&'static [&'static str]),
    /// 후보 중 하나로 끝남
    EndsWith(&'static [&'static str]),
    /// 후보 중 하나를 독립된 단어(공백 경계)로 포함
    Word(&'static [&'static str]),
    /// 하위 조건 중 하나라도 만족
    Any(&'static [Predicate]),
    /// 모든 하위 조건을 만족
    All(&'static [Predicate]),
    /// 하위 조건을 만족하지 않음
    Not(&'static Predicate),
}

impl Predicate {
    /// 조건 평가.
    pub fn matches(&self, text: &str) -> bool {
        match self {
            Predicate::Equals(candidates) => candidates.iter().any(|c| text == *c),
            Predicate::Contains(candidates) => candidates.iter().any(|c| text.contains(c)),
            Predicate::StartsWith(candidates) => candidates.iter().any(|c| text.starts_with(c)),
            Predicate::EndsWith(candidates) => candidates.iter().any(|c| text.ends_with(c)),
            Predicate::Word(candidates) => text
                .split(|ch: char| !ch.is_alphanumeric())
                .any(|word| candidates.contains(&word)),
            Predicate::Any(predicates) => predicates.iter().any(|p| p.matches(text)),
            Predicate::All(predicates) => predicates.iter().all(|p| p.matches(text)),
            Predicate::Not(predicate) => !predicate.matches(text),
        }
    }
}

/// 조건과 정규값의 쌍.
#[derive(Debug, Clone, Copy)]
pub struct Rule<T: 'static> {
    pub predicate: Predicate,
    pub value: T,
}

impl<T: 'static> Rule<T> {
    pub const fn new(predicate: Predicate, value: T) -> Self {
        Self { predicate, value }
    }
}

/// 순서대로 평가하여 첫 번째로 일치하는 규칙의 값을 반환합니다.
pub fn first_match<T: Copy>(rules: &[Rule<T>], text: &str) -> Option<T> {
    rules
        .iter()
        .find(|rule| rule.predicate.matches(text))
        .map(|rule| rule.value)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RULES: &[Rule<&str>] = &[
        Rule::new(Predicate::Equals(&["qty"]), "quantity"),
        Rule::new(
            Predicate::All(&[
                Predicate::Contains(&["fund"]),
                Predicate::Not(&Predicate::Contains(&["gold"])),
            ]),
            "fund",
        ),
        Rule::new(Predicate::Word(&["it"]), "technology"),
        Rule::new(Predicate::EndsWith(&["bees"]), "etf"),
    ];

    #[test]
    fn test_first_rule_wins() {
        assert_eq!(first_match(RULES, "qty"), Some("quantity"));
        assert_eq!(first_match(RULES, "equity fund"), Some("fund"));
    }

    #[test]
    fn test_negated_predicate() {
        assert_eq!(first_match(RULES, "gold fund"), None);
    }

    #[test]
    fn test_word_boundary() {
        assert_eq!(first_match(RULES, "nifty it index"), Some("technology"));
        assert_eq!(first_match(RULES, "italy"), None);
    }

    #[test]
    fn test_suffix() {
        assert_eq!(first_match(RULES, "goldbees"), Some("etf"));
        assert_eq!(first_match(RULES, "reliance"), None);
    }
}
