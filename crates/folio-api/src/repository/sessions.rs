//! 브로커 세션 Repository (PostgreSQL).
//!
//! 접근 토큰은 AES-256-GCM으로 암호화하여 저장합니다.
//! `owner_user_id IS NULL`인 행이 Pending 세션입니다.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use folio_core::crypto::SealedSecret;
use folio_core::{
    BrokerSession, CredentialEncryptor, SessionOwner, SessionStore, StoreResult, UserId,
};
use sqlx::{FromRow, PgPool};
use tracing::debug;
use uuid::Uuid;

/// DB에서 조회한 세션 row
#[derive(Debug, FromRow)]
struct SessionRow {
    id: Uuid,
    owner_user_id: Option<String>,
    credential_ciphertext: Vec<u8>,
    credential_nonce: Vec<u8>,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    version: i64,
}

impl SessionRow {
    fn into_session(self, encryptor: &CredentialEncryptor) -> StoreResult<BrokerSession> {
        let access_credential = encryptor.open(&SealedSecret {
            ciphertext: self.credential_ciphertext,
            nonce: self.credential_nonce,
        })?;

        Ok(BrokerSession {
            id: self.id,
            owner: self.owner_user_id.map(UserId::new).into(),
            access_credential,
            expires_at: self.expires_at,
            created_at: self.created_at,
            version: self.version,
        })
    }
}

const SESSION_COLUMNS: &str = "id, owner_user_id, credential_ciphertext, credential_nonce, expires_at, created_at, version";

/// 브로커 세션 Repository
pub struct PgSessionStore {
    pool: PgPool,
    encryptor: Arc<CredentialEncryptor>,
}

impl PgSessionStore {
    pub fn new(pool: PgPool, encryptor: Arc<CredentialEncryptor>) -> Self {
        Self { pool, encryptor }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn insert_session(&self, session: &BrokerSession) -> StoreResult<()> {
        let sealed = self.encryptor.seal(&session.access_credential)?;
        let owner = match &session.owner {
            SessionOwner::Pending => None,
            SessionOwner::Claimed(user_id) => Some(user_id.as_str()),
        };

        sqlx::query(
            r#"
            INSERT INTO broker_sessions
                (id, owner_user_id, credential_ciphertext, credential_nonce, expires_at, created_at, version)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(session.id)
        .bind(owner)
        .bind(&sealed.ciphertext)
        .bind(&sealed.nonce)
        .bind(session.expires_at)
        .bind(session.created_at)
        .bind(session.version)
        .execute(&self.pool)
        .await?;

        debug!(session_id = %session.id, pending = session.owner.is_pending(), "Broker session stored");
        Ok(())
    }

    async fn delete_sessions_for_user(&self, user_id: &UserId) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM broker_sessions WHERE owner_user_id = $1")
            .bind(user_id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn delete_pending_older_than(&self, cutoff: DateTime<Utc>) -> StoreResult<u64> {
        let result = sqlx::query(
            "DELETE FROM broker_sessions WHERE owner_user_id IS NULL AND created_at < $1",
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM broker_sessions WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn latest_owned_valid(
        &self,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<BrokerSession>> {
        let row = sqlx::query_as::<_, SessionRow>(&format!(
            "SELECT {} FROM broker_sessions WHERE owner_user_id = $1 AND expires_at > $2 ORDER BY created_at DESC LIMIT 1",
            SESSION_COLUMNS
        ))
        .bind(user_id.as_str())
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_session(&self.encryptor)).transpose()
    }

    async fn latest_pending_valid(&self, now: DateTime<Utc>) -> StoreResult<Option<BrokerSession>> {
        let row = sqlx::query_as::<_, SessionRow>(&format!(
            "SELECT {} FROM broker_sessions WHERE owner_user_id IS NULL AND expires_at > $1 ORDER BY created_at DESC LIMIT 1",
            SESSION_COLUMNS
        ))
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_session(&self.encryptor)).transpose()
    }

    async fn try_claim(
        &self,
        session_id: Uuid,
        expected_version: i64,
        user_id: &UserId,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE broker_sessions
            SET owner_user_id = $1, version = version + 1
            WHERE id = $2 AND owner_user_id IS NULL AND version = $3
            "#,
        )
        .bind(user_id.as_str())
        .bind(session_id)
        .bind(expected_version)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn users_with_valid_sessions(&self, now: DateTime<Utc>) -> StoreResult<Vec<UserId>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT DISTINCT owner_user_id
            FROM broker_sessions
            WHERE owner_user_id IS NOT NULL AND expires_at > $1
            ORDER BY owner_user_id
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(id,)| UserId::new(id)).collect())
    }
}
