//! 도메인 모델.
//!
//! 이 모듈은 수집 파이프라인의 핵심 엔티티를 정의합니다:
//! - `BrokerSession` - 브로커 접근 세션 (Pending/Claimed 소유권)
//! - `CanonicalHolding`, `HoldingRecord` - 정규화된 보유 종목
//! - `SyncLogEntry` - 동기화 결과 로그
//! - 저장소 추상화 트레이트

mod holding;
mod ids;
mod session;
mod store;
mod sync_log;

pub use holding::*;
pub use ids::*;
pub use session::*;
pub use store::*;
pub use sync_log::*;
