//! 저장소 구현.
//!
//! - PostgreSQL: [`PgSessionStore`], [`PgHoldingsStore`], [`PgSyncLogStore`]
//! - 인메모리: [`MemoryStore`] (개발 모드, 테스트)
//!
//! 트레이트 정의는 `folio_core::domain::store`에 있습니다.

pub mod holdings;
pub mod memory;
pub mod sessions;
pub mod sync_logs;

pub use holdings::PgHoldingsStore;
pub use memory::MemoryStore;
pub use sessions::PgSessionStore;
pub use sync_logs::PgSyncLogStore;
