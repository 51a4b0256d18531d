//! 인증.
//!
//! # 구성 요소
//!
//! - [`Caller`]: 인증된 호출자 (사용자 또는 운영자). Axum 추출기로 사용됩니다.
//! - [`AuthValidator`]: 운영자 시크릿, 서비스 키, 사용자 JWT 검증
//! - [`StateCodec`]: 브로커 로그인용 서명된 OAuth state 토큰
//!
//! # 사용 예시
//!
//! ```rust,ignore
//! async fn handler(caller: Caller) -> impl IntoResponse {
//!     let user_id = caller.require_user()?;
//!     // ...
//! }
//! ```

pub mod jwt;
pub mod state_token;
pub mod validator;

pub use jwt::{create_token, decode_token, Claims, JwtError};
pub use state_token::{OAuthState, StateCodec, StateError};
pub use validator::{AuthError, AuthValidator, Caller, OPERATOR_SECRET_HEADER};
