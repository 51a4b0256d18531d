//! Kite Connect 커넥터 통합 테스트 (mockito).

use folio_broker::connector::zerodha::checksum;
use folio_broker::{BrokerConnector, BrokerError, ZerodhaConfig, ZerodhaConnector};
use folio_core::AssetType;
use mockito::{Matcher, Server};
use rust_decimal_macros::dec;
use secrecy::{ExposeSecret, SecretString};

fn connector(server: &Server) -> ZerodhaConnector {
    let config = ZerodhaConfig::new("test_key", "test_secret").with_base_url(server.url());
    ZerodhaConnector::new(config).unwrap()
}

fn token() -> SecretString {
    SecretString::new("access123".into())
}

const HOLDINGS_BODY: &str = r#"{
    "status": "success",
    "data": [
        {"tradingsymbol": "INFY", "exchange": "NSE", "isin": "INE009A01021",
         "quantity": 10, "t1_quantity": 0, "average_price": 1400, "last_price": 1500},
        {"tradingsymbol": "NIFTYBEES", "exchange": "NSE", "isin": "INF204KB14I2",
         "quantity": 100, "t1_quantity": 0, "average_price": 210.5, "last_price": 240},
        {"tradingsymbol": "OLDSTOCK", "exchange": "BSE", "isin": "",
         "quantity": 0, "t1_quantity": 0, "average_price": 10, "last_price": 12}
    ]
}"#;

#[tokio::test]
async fn test_exchange_token_posts_checksum() {
    let mut server = Server::new_async().await;
    let expected_checksum = checksum("test_key", "req_tok", "test_secret");

    let mock = server
        .mock("POST", "/session/token")
        .match_header("x-kite-version", "3")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("api_key".into(), "test_key".into()),
            Matcher::UrlEncoded("request_token".into(), "req_tok".into()),
            Matcher::UrlEncoded("checksum".into(), expected_checksum),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"status":"success","data":{"user_id":"AB1234","access_token":"kite_access"}}"#)
        .create_async()
        .await;

    let access = connector(&server).exchange_token("req_tok").await.unwrap();
    assert_eq!(access.expose_secret(), "kite_access");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_exchange_token_rejected_without_retry() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/session/token")
        .with_status(403)
        .with_body(r#"{"status":"error","message":"Token is invalid or has expired.","error_type":"TokenException"}"#)
        .expect(1)
        .create_async()
        .await;

    let err = connector(&server).exchange_token("used_token").await.unwrap_err();
    match err {
        BrokerError::Rejected(msg) => assert_eq!(msg, "Token is invalid or has expired."),
        other => panic!("unexpected error: {:?}", other),
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn test_exchange_token_missing_access_token() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/session/token")
        .with_status(200)
        .with_body(r#"{"status":"success","data":{"user_id":"AB1234"}}"#)
        .create_async()
        .await;

    let err = connector(&server).exchange_token("req_tok").await.unwrap_err();
    assert!(matches!(err, BrokerError::Rejected(_)));
}

#[tokio::test]
async fn test_fetch_holdings_refreshes_quotes() {
    let mut server = Server::new_async().await;
    let holdings_mock = server
        .mock("GET", "/portfolio/holdings")
        .match_header("authorization", "token test_key:access123")
        .match_header("x-kite-version", "3")
        .with_status(200)
        .with_body(HOLDINGS_BODY)
        .create_async()
        .await;
    let quote_mock = server
        .mock("GET", "/quote")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("i".into(), "NSE:INFY".into()),
            Matcher::UrlEncoded("i".into(), "NSE:NIFTYBEES".into()),
        ]))
        .with_status(200)
        .with_body(r#"{"status":"success","data":{"NSE:INFY":{"last_price":1525.75}}}"#)
        .create_async()
        .await;

    let holdings = connector(&server).fetch_holdings(&token()).await.unwrap();

    assert_eq!(holdings.len(), 2);
    let infy = holdings.iter().find(|h| h.symbol == "INFY").unwrap();
    assert_eq!(infy.last_price, dec!(1525.75));
    assert_eq!(infy.asset_type, AssetType::Equity);

    let nifty = holdings.iter().find(|h| h.symbol == "NIFTYBEES").unwrap();
    assert_eq!(nifty.last_price, dec!(240));
    assert_eq!(nifty.asset_type, AssetType::Etf);
    assert_eq!(nifty.sector, "Index");

    holdings_mock.assert_async().await;
    quote_mock.assert_async().await;
}

#[tokio::test]
async fn test_quote_failure_is_ignored() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/portfolio/holdings")
        .with_status(200)
        .with_body(HOLDINGS_BODY)
        .create_async()
        .await;
    server
        .mock("GET", "/quote")
        .match_query(Matcher::Any)
        .with_status(500)
        .with_body("upstream down")
        .create_async()
        .await;

    let holdings = connector(&server).fetch_holdings(&token()).await.unwrap();
    let infy = holdings.iter().find(|h| h.symbol == "INFY").unwrap();
    assert_eq!(infy.last_price, dec!(1500));
}

#[tokio::test]
async fn test_expired_session_maps_to_session_invalid() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/portfolio/holdings")
        .with_status(403)
        .with_body(r#"{"status":"error","message":"Incorrect `api_key` or `access_token`.","error_type":"TokenException"}"#)
        .create_async()
        .await;

    let err = connector(&server).fetch_holdings(&token()).await.unwrap_err();
    assert!(err.is_auth_error());
    assert!(err.user_message().contains("reconnect"));
}

#[tokio::test]
async fn test_rate_limited_and_malformed() {
    let mut server = Server::new_async().await;
    let limited = server
        .mock("GET", "/portfolio/holdings")
        .with_status(429)
        .create_async()
        .await;

    let err = connector(&server).fetch_holdings(&token()).await.unwrap_err();
    assert!(matches!(err, BrokerError::RateLimited));
    limited.remove_async().await;

    server
        .mock("GET", "/portfolio/holdings")
        .with_status(200)
        .with_body("<html>maintenance</html>")
        .create_async()
        .await;

    let err = connector(&server).fetch_holdings(&token()).await.unwrap_err();
    assert!(matches!(err, BrokerError::Parse(_)));
}
