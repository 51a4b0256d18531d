//! 처리 시간 예산.

use crate::{ImportError, ImportResult};
use std::time::{Duration, Instant};

/// 절대 시각 기준의 처리 기한.
///
/// 호출자의 기한과 [`Deadline::min`]으로 합성할 수 있습니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    /// 지금부터 `budget` 후에 만료되는 기한.
    pub fn after(budget: Duration) -> Self {
        Self {
            at: Instant::now() + budget,
        }
    }

    /// 지정한 시각에 만료되는 기한.
    pub fn at(at: Instant) -> Self {
        Self { at }
    }

    /// 두 기한 중 더 이른 쪽.
    pub fn min(self, other: Deadline) -> Deadline {
        if other.at < self.at {
            other
        } else {
            self
        }
    }

    /// 선택적 기한과 합성.
    pub fn min_opt(self, other: Option<Deadline>) -> Deadline {
        match other {
            Some(other) => self.min(other),
            None => self,
        }
    }

    /// 남은 시간.
    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.at
    }

    /// 만료되었으면 `ProcessingTimeout`을 반환합니다.
    pub fn check(&self, row: usize) -> ImportResult<()> {
        if self.is_expired() {
            Err(ImportError::ProcessingTimeout { row })
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_picks_earlier() {
        let short = Deadline::after(Duration::from_secs(1));
        let long = Deadline::after(Duration::from_secs(60));
        assert_eq!(long.min(short), short);
        assert_eq!(short.min(long), short);
        assert_eq!(long.min_opt(None), long);
    }

    #[test]
    fn test_elapsed_deadline_fails_check() {
        let deadline = Deadline::at(Instant::now());
        assert!(deadline.is_expired());
        assert!(matches!(
            deadline.check(7),
            Err(ImportError::ProcessingTimeout { row: 7 })
        ));
        assert_eq!(deadline.remaining(), Duration::ZERO);
    }

    #[test]
    fn test_future_deadline_passes() {
        assert!(Deadline::after(Duration::from_secs(30)).check(1).is_ok());
    }
}
