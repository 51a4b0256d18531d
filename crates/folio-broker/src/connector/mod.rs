//! 브로커별 커넥터 구현.

pub mod zerodha;
