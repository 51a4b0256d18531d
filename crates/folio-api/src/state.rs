//! 모든 핸들러에서 공유되는 애플리케이션 상태.
//!
//! AppState는 `Arc`로 래핑되어 Axum의 State extractor를 통해 주입됩니다.
//! 요청 처리는 상태를 갖지 않으며, 요청 간 조정은 저장소를 통해서만 이루어집니다.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use folio_broker::{BrokerConnector, ZerodhaConfig, ZerodhaConnector};
use folio_core::{AppConfig, CredentialEncryptor, HoldingsStore, SessionStore, SyncLogStore};
use folio_import::ParseOptions;
use sqlx::PgPool;
use tracing::{info, warn};

use crate::auth::{AuthValidator, StateCodec, StateError};
use crate::error::ServiceError;
use crate::repository::{MemoryStore, PgHoldingsStore, PgSessionStore, PgSyncLogStore};

/// 저장소 묶음.
#[derive(Clone)]
pub struct Stores {
    pub sessions: Arc<dyn SessionStore>,
    pub holdings: Arc<dyn HoldingsStore>,
    pub sync_logs: Arc<dyn SyncLogStore>,
}

impl Stores {
    /// 인메모리 저장소 (개발 모드, 테스트).
    pub fn memory() -> Self {
        Self::from_memory(Arc::new(MemoryStore::new()))
    }

    /// 주어진 인메모리 저장소를 공유합니다.
    pub fn from_memory(store: Arc<MemoryStore>) -> Self {
        Self {
            sessions: store.clone(),
            holdings: store.clone(),
            sync_logs: store,
        }
    }

    /// PostgreSQL 저장소.
    pub fn postgres(pool: PgPool, encryptor: Arc<CredentialEncryptor>) -> Self {
        Self {
            sessions: Arc::new(PgSessionStore::new(pool.clone(), encryptor)),
            holdings: Arc::new(PgHoldingsStore::new(pool.clone())),
            sync_logs: Arc::new(PgSyncLogStore::new(pool)),
        }
    }
}

/// 애플리케이션 공유 상태.
#[derive(Clone)]
pub struct AppState {
    /// 애플리케이션 설정
    pub config: Arc<AppConfig>,

    /// 호출자 인증
    pub auth: AuthValidator,

    /// OAuth state 서명
    pub state_codec: StateCodec,

    /// 브로커 세션 저장소
    pub sessions: Arc<dyn SessionStore>,

    /// 보유 종목 저장소
    pub holdings: Arc<dyn HoldingsStore>,

    /// 동기화 로그 저장소
    pub sync_logs: Arc<dyn SyncLogStore>,

    /// 데이터베이스 연결 풀 (PostgreSQL 사용 시)
    pub db_pool: Option<PgPool>,

    /// 브로커 커넥터 (API 키가 설정된 경우)
    pub broker: Option<Arc<dyn BrokerConnector>>,

    /// 서버 시작 시간
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// 설정과 저장소로 상태를 생성합니다.
    ///
    /// Zerodha API 키가 설정되어 있으면 커넥터도 함께 생성합니다.
    pub fn new(config: AppConfig, stores: Stores) -> Result<Self, StateError> {
        let state_codec = StateCodec::from_config(&config.oauth_state)?;
        let broker = create_zerodha_connector(&config);

        Ok(Self {
            auth: AuthValidator::from_config(&config.auth),
            state_codec,
            sessions: stores.sessions,
            holdings: stores.holdings,
            sync_logs: stores.sync_logs,
            db_pool: None,
            broker,
            started_at: Utc::now(),
            config: Arc::new(config),
        })
    }

    /// DB 연결 풀 설정.
    pub fn with_db_pool(mut self, pool: PgPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// 브로커 커넥터 교체.
    pub fn with_broker(mut self, broker: Arc<dyn BrokerConnector>) -> Self {
        self.broker = Some(broker);
        self
    }

    /// 브로커 커넥터. 설정되지 않았으면 운영자용 설정 에러를 반환합니다.
    pub fn connector(&self) -> Result<Arc<dyn BrokerConnector>, ServiceError> {
        if let Some(broker) = &self.broker {
            return Ok(broker.clone());
        }
        let message = match ZerodhaConfig::from_settings(&self.config.zerodha) {
            Err(e) => e.to_string(),
            Ok(_) => "Zerodha connector failed to initialise, check the server logs".to_string(),
        };
        Err(ServiceError::Config(message))
    }

    /// 브로커 세션 유효 기간.
    pub fn session_ttl(&self) -> Duration {
        Duration::hours(self.config.zerodha.session_ttl_hours)
    }

    /// 파일 파싱 옵션.
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions::from(&self.config.import)
    }

    /// 서버 업타임(초).
    pub fn uptime_secs(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }

    /// DB 연결 상태 확인.
    pub async fn is_db_healthy(&self) -> bool {
        match &self.db_pool {
            Some(pool) => sqlx::query("SELECT 1").fetch_one(pool).await.is_ok(),
            None => false,
        }
    }
}

fn create_zerodha_connector(config: &AppConfig) -> Option<Arc<dyn BrokerConnector>> {
    if !config.zerodha.is_configured() {
        warn!("Zerodha API key/secret not set, broker endpoints will report a configuration error");
        return None;
    }

    let connector = ZerodhaConfig::from_settings(&config.zerodha).and_then(ZerodhaConnector::new);
    match connector {
        Ok(connector) => {
            info!(base_url = %config.zerodha.api_base_url, "Zerodha connector initialised");
            Some(Arc::new(connector))
        }
        Err(e) => {
            warn!(error = %e, "Failed to create Zerodha connector");
            None
        }
    }
}
