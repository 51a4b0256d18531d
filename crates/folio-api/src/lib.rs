//! 브로커 세션 및 보유 종목 수집 REST API 서버.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - Axum 기반 REST API
//! - 사용자 JWT / 서비스 키 / 운영자 시크릿 인증
//! - 브로커 OAuth 콜백 처리와 세션 소유권 획득
//! - 브로커 동기화와 파일 업로드를 위한 버전 교체 방식의 보유 종목 저장
//!
//! # 모듈 구성
//!
//! - [`state`]: 애플리케이션 공유 상태 (AppState)
//! - [`routes`]: REST API 엔드포인트
//! - [`auth`]: 호출자 인증 및 OAuth state 서명
//! - [`services`]: 세션 교환, 세션 획득, 동기화, 조정
//! - [`repository`]: PostgreSQL 및 인메모리 저장소
//! - [`openapi`]: OpenAPI 문서 및 Swagger UI

pub mod auth;
pub mod error;
pub mod openapi;
pub mod repository;
pub mod routes;
pub mod services;
pub mod state;

pub use auth::{Caller, Claims};
pub use error::{ApiErrorResponse, ApiResult, ServiceError};
pub use routes::create_api_router;
pub use state::{AppState, Stores};
