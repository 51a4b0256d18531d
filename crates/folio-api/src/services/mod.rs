//! 서비스 계층.
//!
//! - [`session_exchange`]: 브로커 로그인 콜백 (인증 코드 → 세션)
//! - [`session_claim`]: 요청별 세션 결정 및 Pending 세션 획득
//! - [`holdings_sync`]: 브로커 보유 종목 조회 후 교체
//! - [`upload`]: 업로드 파일 파싱 후 교체
//! - [`reconciler`]: (사용자, 출처) 단위 버전 교체

pub mod holdings_sync;
pub mod reconciler;
pub mod session_claim;
pub mod session_exchange;
pub mod upload;

pub use holdings_sync::{sync_all_users, sync_for_user, sync_owned, UserSyncResult};
pub use reconciler::{ReconcileReport, Reconciler};
pub use session_claim::{resolve_owned_session, resolve_session};
pub use session_exchange::{complete_login, redirect_url, CallbackParams, ExchangeOutcome};
pub use upload::{import_holdings_file, upload_source, UploadReport};
