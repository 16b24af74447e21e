use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicI32, Ordering};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::auth::claims::UserId;
use crate::auth::token_hash::hash_token;

/// One issued session token. The raw credential is never stored, only its hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct TokenRecord {
    pub id: i32,
    pub user_id: UserId,
    #[serde(skip_serializing)]
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub last_used_at: DateTime<Utc>,
    pub revoked: bool,
    pub device_info: Option<String>,
    pub ip_address: Option<String>,
}

impl TokenRecord {
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now && !self.revoked
    }
}

#[derive(Debug, Error)]
pub enum TokenStoreError {
    #[error("token store unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Durable bookkeeping for issued session tokens: revocation, expiry and
/// last-use tracking. Every operation is a single atomic statement.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Record a newly issued token. A hash that already exists is left untouched.
    async fn store_token(
        &self,
        token: &str,
        user_id: UserId,
        expires_at: DateTime<Utc>,
        device_info: Option<&str>,
        ip_address: Option<&str>,
    ) -> Result<(), TokenStoreError>;

    /// True if the token has an unexpired, unrevoked row. Refreshes `last_used_at`.
    async fn is_active(&self, token: &str) -> Result<bool, TokenStoreError>;

    /// Revoke one token. Returns false when no unrevoked row matched.
    async fn revoke(&self, token: &str) -> Result<bool, TokenStoreError>;

    /// Revoke every unrevoked token of a user. Returns the number of rows revoked.
    async fn revoke_all_for_user(&self, user_id: UserId) -> Result<u64, TokenStoreError>;

    /// Active tokens of a user, most recently used first.
    async fn list_active_for_user(&self, user_id: UserId) -> Result<Vec<TokenRecord>, TokenStoreError>;

    /// Delete expired or revoked rows. Returns the number deleted.
    async fn purge_expired_or_revoked(&self) -> Result<u64, TokenStoreError>;
}

/// Keep only values the `inet` column accepts
fn normalize_ip(ip_address: Option<&str>) -> Option<String> {
    ip_address
        .map(str::trim)
        .and_then(|ip| ip.parse::<IpAddr>().ok())
        .map(|ip| ip.to_string())
}

/// PostgreSQL-backed store over the `tokens` table
#[derive(Clone)]
pub struct PgTokenStore {
    pool: PgPool,
}

impl PgTokenStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenStore for PgTokenStore {
    async fn store_token(
        &self,
        token: &str,
        user_id: UserId,
        expires_at: DateTime<Utc>,
        device_info: Option<&str>,
        ip_address: Option<&str>,
    ) -> Result<(), TokenStoreError> {
        sqlx::query(
            r#"
            INSERT INTO tokens (user_id, token_hash, expires_at, device_info, ip_address)
            VALUES ($1, $2, $3, $4, $5::inet)
            ON CONFLICT (token_hash) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(hash_token(token))
        .bind(expires_at)
        .bind(device_info)
        .bind(normalize_ip(ip_address))
        .execute(&self.pool)
        .await?;

        tracing::debug!("Token stored for user {}", user_id);
        Ok(())
    }

    async fn is_active(&self, token: &str) -> Result<bool, TokenStoreError> {
        let row: Option<(i32,)> = sqlx::query_as(
            r#"
            UPDATE tokens
            SET last_used_at = NOW()
            WHERE token_hash = $1 AND expires_at > NOW() AND revoked = FALSE
            RETURNING id
            "#,
        )
        .bind(hash_token(token))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.is_some())
    }

    async fn revoke(&self, token: &str) -> Result<bool, TokenStoreError> {
        let result = sqlx::query("UPDATE tokens SET revoked = TRUE WHERE token_hash = $1 AND revoked = FALSE")
            .bind(hash_token(token))
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn revoke_all_for_user(&self, user_id: UserId) -> Result<u64, TokenStoreError> {
        let result = sqlx::query("UPDATE tokens SET revoked = TRUE WHERE user_id = $1 AND revoked = FALSE")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn list_active_for_user(&self, user_id: UserId) -> Result<Vec<TokenRecord>, TokenStoreError> {
        let records = sqlx::query_as::<_, TokenRecord>(
            r#"
            SELECT id, user_id, token_hash, expires_at, created_at, last_used_at, revoked,
                   device_info, host(ip_address) AS ip_address
            FROM tokens
            WHERE user_id = $1 AND expires_at > NOW() AND revoked = FALSE
            ORDER BY last_used_at DESC, created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    async fn purge_expired_or_revoked(&self) -> Result<u64, TokenStoreError> {
        let result = sqlx::query("DELETE FROM tokens WHERE expires_at <= NOW() OR revoked = TRUE")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

/// In-process store with the same semantics as `PgTokenStore`.
/// Used by tests and when the server runs without a token table.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    rows: RwLock<HashMap<String, TokenRecord>>,
    next_id: AtomicI32,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }

    pub async fn find(&self, token: &str) -> Option<TokenRecord> {
        self.rows.read().await.get(&hash_token(token)).cloned()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn store_token(
        &self,
        token: &str,
        user_id: UserId,
        expires_at: DateTime<Utc>,
        device_info: Option<&str>,
        ip_address: Option<&str>,
    ) -> Result<(), TokenStoreError> {
        let token_hash = hash_token(token);
        let mut rows = self.rows.write().await;
        if rows.contains_key(&token_hash) {
            return Ok(());
        }

        let now = Utc::now();
        let record = TokenRecord {
            id: self.next_id.fetch_add(1, Ordering::Relaxed) + 1,
            user_id,
            token_hash: token_hash.clone(),
            expires_at,
            created_at: now,
            last_used_at: now,
            revoked: false,
            device_info: device_info.map(str::to_string),
            ip_address: normalize_ip(ip_address),
        };
        rows.insert(token_hash, record);
        Ok(())
    }

    async fn is_active(&self, token: &str) -> Result<bool, TokenStoreError> {
        let now = Utc::now();
        let mut rows = self.rows.write().await;
        match rows.get_mut(&hash_token(token)) {
            Some(record) if record.is_active_at(now) => {
                record.last_used_at = now;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn revoke(&self, token: &str) -> Result<bool, TokenStoreError> {
        let mut rows = self.rows.write().await;
        match rows.get_mut(&hash_token(token)) {
            Some(record) if !record.revoked => {
                record.revoked = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn revoke_all_for_user(&self, user_id: UserId) -> Result<u64, TokenStoreError> {
        let mut rows = self.rows.write().await;
        let mut revoked = 0;
        for record in rows.values_mut().filter(|r| r.user_id == user_id && !r.revoked) {
            record.revoked = true;
            revoked += 1;
        }
        Ok(revoked)
    }

    async fn list_active_for_user(&self, user_id: UserId) -> Result<Vec<TokenRecord>, TokenStoreError> {
        let now = Utc::now();
        let rows = self.rows.read().await;
        let mut records: Vec<TokenRecord> = rows
            .values()
            .filter(|r| r.user_id == user_id && r.is_active_at(now))
            .cloned()
            .collect();
        records.sort_by(|a, b| {
            b.last_used_at
                .cmp(&a.last_used_at)
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(records)
    }

    async fn purge_expired_or_revoked(&self) -> Result<u64, TokenStoreError> {
        let now = Utc::now();
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|_, r| r.is_active_at(now));
        Ok((before - rows.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn in_a_week() -> DateTime<Utc> {
        Utc::now() + Duration::days(7)
    }

    #[tokio::test]
    async fn stored_token_is_active_until_revoked() {
        let store = MemoryTokenStore::new();
        store.store_token("tok-1", 7, in_a_week(), Some("curl/8"), Some("10.0.0.1")).await.unwrap();

        assert!(store.is_active("tok-1").await.unwrap());
        assert!(!store.is_active("unknown").await.unwrap());

        assert!(store.revoke("tok-1").await.unwrap());
        assert!(!store.is_active("tok-1").await.unwrap());
    }

    #[tokio::test]
    async fn second_revoke_reports_no_change() {
        let store = MemoryTokenStore::new();
        store.store_token("tok-1", 7, in_a_week(), None, None).await.unwrap();

        assert!(store.revoke("tok-1").await.unwrap());
        assert!(!store.revoke("tok-1").await.unwrap());
        assert!(!store.revoke("never-issued").await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_hash_insert_is_a_no_op() {
        let store = MemoryTokenStore::new();
        store.store_token("tok-1", 7, in_a_week(), Some("first"), None).await.unwrap();
        store.store_token("tok-1", 8, in_a_week(), Some("second"), None).await.unwrap();

        assert_eq!(store.len().await, 1);
        let record = store.find("tok-1").await.unwrap();
        assert_eq!(record.user_id, 7);
        assert_eq!(record.device_info.as_deref(), Some("first"));
    }

    #[tokio::test]
    async fn expired_rows_are_inactive_and_purged() {
        let store = MemoryTokenStore::new();
        store.store_token("old", 7, Utc::now() - Duration::seconds(1), None, None).await.unwrap();
        store.store_token("live", 7, in_a_week(), None, None).await.unwrap();
        store.store_token("revoked", 7, in_a_week(), None, None).await.unwrap();
        store.revoke("revoked").await.unwrap();

        assert!(!store.is_active("old").await.unwrap());
        assert_eq!(store.purge_expired_or_revoked().await.unwrap(), 2);
        assert_eq!(store.len().await, 1);
        assert!(store.find("live").await.is_some());
    }

    #[tokio::test]
    async fn empty_until_first_token_and_after_full_purge() {
        let store = MemoryTokenStore::new();
        assert!(store.is_empty().await);

        store.store_token("tok-1", 7, in_a_week(), None, None).await.unwrap();
        assert!(!store.is_empty().await);

        store.revoke("tok-1").await.unwrap();
        store.purge_expired_or_revoked().await.unwrap();
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn revoke_all_only_touches_that_user() {
        let store = MemoryTokenStore::new();
        store.store_token("a1", 1, in_a_week(), None, None).await.unwrap();
        store.store_token("a2", 1, in_a_week(), None, None).await.unwrap();
        store.store_token("b1", 2, in_a_week(), None, None).await.unwrap();

        assert_eq!(store.revoke_all_for_user(1).await.unwrap(), 2);
        assert_eq!(store.revoke_all_for_user(1).await.unwrap(), 0);
        assert!(store.list_active_for_user(1).await.unwrap().is_empty());
        assert_eq!(store.list_active_for_user(2).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn lists_most_recently_used_first() {
        let store = MemoryTokenStore::new();
        store.store_token("first", 3, in_a_week(), None, None).await.unwrap();
        store.store_token("second", 3, in_a_week(), None, None).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        store.is_active("first").await.unwrap();

        let records = store.list_active_for_user(3).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].token_hash, hash_token("first"));
    }

    #[test]
    fn invalid_ip_addresses_are_dropped() {
        assert_eq!(normalize_ip(Some(" 192.168.1.10 ")), Some("192.168.1.10".to_string()));
        assert_eq!(normalize_ip(Some("::1")), Some("::1".to_string()));
        assert_eq!(normalize_ip(Some("unknown")), None);
        assert_eq!(normalize_ip(None), None);
    }
}
