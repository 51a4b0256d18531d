//! # Folio Core
//!
//! 보유 종목(holdings) 수집 파이프라인의 핵심 도메인 모델 및 공용 인프라를 제공합니다.
//!
//! 이 크레이트는 시스템 전반에서 사용되는 기본 타입을 제공합니다:
//! - 브로커 세션, 정규화된 보유 종목, 동기화 로그 모델
//! - 저장소 추상화 (SessionStore, HoldingsStore, SyncLogStore)
//! - 자산 분류 체계 및 선언적 규칙 테이블
//! - 통화/퍼센트 문자열 파싱 유틸리티
//! - 설정 관리
//! - 로깅 인프라
//! - 자격증명 암호화

pub mod coerce;
pub mod config;
pub mod crypto;
pub mod domain;
pub mod error;
pub mod logging;
pub mod rules;
pub mod taxonomy;

pub use config::*;
pub use crypto::{CredentialEncryptor, CryptoError};
pub use domain::*;
pub use error::*;
pub use logging::*;
pub use rules::{first_match, Predicate, Rule};
pub use taxonomy::{AssetType, SECTOR_DEFAULT};
