//! # Folio Broker
//!
//! 브로커 연동 크레이트입니다.
//!
//! 현재 지원:
//! - Zerodha Kite Connect (세션 교환, 보유 종목 및 시세 조회)
//!
//! 모든 커넥터는 [`BrokerConnector`] 트레이트를 구현하며,
//! 응답은 [`folio_core::CanonicalHolding`]으로 정규화됩니다.

pub mod connector;
pub mod error;
pub mod traits;

pub use connector::zerodha::{KiteAuth, KiteClient, ZerodhaConfig, ZerodhaConnector};
pub use error::{BrokerError, BrokerResult};
pub use traits::BrokerConnector;
