//! Folio API 서버.
//!
//! 설정을 로드하고 저장소를 구성한 뒤 Axum 서버를 시작합니다.
//! 데이터베이스 URL이 없으면 인메모리 저장소로 동작합니다 (개발 모드).

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{http::StatusCode, Router};
use folio_core::{init_logging, non_empty, AppConfig, CredentialEncryptor, LogConfig};
use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use folio_api::openapi::swagger_ui_router;
use folio_api::routes::create_api_router;
use folio_api::state::{AppState, Stores};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 파일은 선택 사항
    let _ = dotenvy::dotenv();

    let config = AppConfig::load_default().context("Failed to load configuration")?;
    init_logging(LogConfig::from(&config.logging)).context("Failed to initialize logging")?;

    info!("Starting Folio API server...");

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server host/port")?;

    let (stores, db_pool) = match non_empty(&config.database.url) {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .acquire_timeout(Duration::from_secs(config.database.connection_timeout_secs))
                .connect(url)
                .await
                .context("Failed to connect to database")?;

            sqlx::query("SELECT 1")
                .fetch_one(&pool)
                .await
                .context("Database health check failed")?;
            sqlx::migrate!("../../migrations")
                .run(&pool)
                .await
                .context("Failed to run database migrations")?;
            info!("Database connected and migrated");

            let encryptor = match non_empty(&config.encryption.master_key) {
                Some(key) => CredentialEncryptor::new(key).context("Invalid encryption master key")?,
                None => {
                    warn!("Encryption master key not set, stored broker sessions will not survive a restart");
                    CredentialEncryptor::ephemeral()
                }
            };

            (Stores::postgres(pool.clone(), Arc::new(encryptor)), Some(pool))
        }
        None => {
            warn!("Database URL not set, using in-memory store (development mode)");
            (Stores::memory(), None)
        }
    };

    let mut state = AppState::new(config.clone(), stores).context("Failed to build application state")?;
    if let Some(pool) = db_pool {
        state = state.with_db_pool(pool);
    }
    let state = Arc::new(state);

    let app = Router::new()
        .merge(create_api_router(&config.import).with_state(state))
        .merge(swagger_ui_router())
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.server.request_timeout_secs),
        ))
        .layer(cors_layer(&config));

    let shutdown_token = CancellationToken::new();

    info!(%addr, "API server listening");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind listener")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_token))
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

/// CORS 레이어 생성.
///
/// origin 목록이 비어 있으면 모든 origin을 허용합니다 (개발 모드).
fn cors_layer(config: &AppConfig) -> CorsLayer {
    let configured = config.cors_origins();
    let origins: Vec<_> = configured.iter().filter_map(|s| s.parse().ok()).collect();

    let allow_origin = if configured.is_empty() {
        warn!("CORS origins not set, allowing any origin (development mode)");
        AllowOrigin::any()
    } else if origins.is_empty() {
        warn!("CORS origins are set but contain no valid origin, allowing any");
        AllowOrigin::any()
    } else {
        info!("CORS configured with {} allowed origins", origins.len());
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
            axum::http::header::ACCEPT,
            axum::http::HeaderName::from_static(folio_api::auth::OPERATOR_SECRET_HEADER),
        ])
        .max_age(Duration::from_secs(3600))
}

/// Ctrl+C 또는 SIGTERM을 기다립니다.
async fn shutdown_signal(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }

    shutdown_token.cancel();
}
