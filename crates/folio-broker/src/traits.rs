//! 브로커 커넥터 트레이트.

use crate::BrokerResult;
use async_trait::async_trait;
use folio_core::{CanonicalHolding, SourceId};
use secrecy::SecretString;

/// OAuth 기반 브로커 연동.
///
/// 로그인 URL 생성, 일회용 인증 코드 교환, 보유 종목 조회를 제공합니다.
#[async_trait]
pub trait BrokerConnector: Send + Sync {
    /// 이 브로커에서 수집한 보유 종목의 출처.
    fn source(&self) -> SourceId;

    /// 주어진 state를 포함한 로그인 URL.
    fn login_url(&self, state: &str) -> String;

    /// 일회용 인증 코드를 당일 접근 토큰으로 교환합니다. 재시도하지 않습니다.
    async fn exchange_token(&self, request_token: &str) -> BrokerResult<SecretString>;

    /// 보유 종목을 조회하여 정규 형식으로 반환합니다.
    async fn fetch_holdings(&self, access_token: &SecretString) -> BrokerResult<Vec<CanonicalHolding>>;
}
