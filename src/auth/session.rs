use axum::http::HeaderValue;
use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use super::claims::{Claims, Identity, UserId};
use super::cookie::SESSION_COOKIE;
use crate::config::{SecurityConfig, MAX_SESSION_TTL_HOURS};
use crate::database::tokens::{TokenRecord, TokenStore, TokenStoreError};

/// What `verify` does when the token store cannot be reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevocationCheckPolicy {
    /// Trust a valid signature. Revoked tokens stay usable during an outage.
    FailOpen,
    /// Reject the request. Every session fails during an outage.
    FailClosed,
}

impl Default for RevocationCheckPolicy {
    fn default() -> Self {
        Self::FailOpen
    }
}

impl fmt::Display for RevocationCheckPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FailOpen => write!(f, "fail_open"),
            Self::FailClosed => write!(f, "fail_closed"),
        }
    }
}

impl FromStr for RevocationCheckPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "fail_open" | "open" => Ok(Self::FailOpen),
            "fail_closed" | "closed" => Ok(Self::FailClosed),
            other => Err(format!("unknown revocation policy: {}", other)),
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("signing secret is empty")]
    MissingSecret,

    #[error("failed to sign session token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

/// A freshly signed session token and the instant it stops being valid
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues, verifies and revokes session tokens.
///
/// A token is accepted only if its signature and embedded expiry check out
/// and the token store still holds an active row for it.
pub struct SessionService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    secret_is_empty: bool,
    ttl: Duration,
    policy: RevocationCheckPolicy,
    secure_cookies: bool,
    store: Arc<dyn TokenStore>,
}

impl SessionService {
    pub fn new(
        secret: &str,
        ttl: Duration,
        policy: RevocationCheckPolicy,
        secure_cookies: bool,
        store: Arc<dyn TokenStore>,
    ) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            secret_is_empty: secret.is_empty(),
            ttl,
            policy,
            secure_cookies,
            store,
        }
    }

    pub fn from_config(security: &SecurityConfig, store: Arc<dyn TokenStore>) -> Self {
        let hours = security.session_ttl_hours.clamp(1, MAX_SESSION_TTL_HOURS);
        let ttl = i64::try_from(hours)
            .ok()
            .and_then(Duration::try_hours)
            .unwrap_or_else(|| Duration::days(7));

        Self::new(
            &security.jwt_secret,
            ttl,
            security.revocation_policy,
            security.secure_cookies,
            store,
        )
    }

    pub fn store(&self) -> &Arc<dyn TokenStore> {
        &self.store
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn policy(&self) -> RevocationCheckPolicy {
        self.policy
    }

    /// Sign a token for `identity` and record it in the token store.
    ///
    /// A store failure is logged and ignored; the token is still returned.
    pub async fn issue(
        &self,
        identity: &Identity,
        device_info: Option<&str>,
        ip_address: Option<&str>,
    ) -> Result<IssuedSession, SessionError> {
        let now = Utc::now();
        let expires_at = now + self.ttl;
        let claims = Claims {
            user_id: identity.user_id,
            email: identity.email.clone(),
            role: identity.role,
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token = self.sign(&claims)?;

        // Store the expiry the token itself carries, at second precision
        let expires_at = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .unwrap_or(expires_at);

        if let Err(e) = self
            .store
            .store_token(&token, identity.user_id, expires_at, device_info, ip_address)
            .await
        {
            tracing::warn!("Failed to persist session for user {}: {}", identity.user_id, e);
        }

        Ok(IssuedSession { token, expires_at })
    }

    pub(crate) fn sign(&self, claims: &Claims) -> Result<String, SessionError> {
        if self.secret_is_empty {
            return Err(SessionError::MissingSecret);
        }
        Ok(encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)?)
    }

    /// Decode signature and expiry only, without consulting the store
    pub fn decode_claims(&self, token: &str) -> Option<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .ok()
    }

    /// Resolve a token to the identity it carries, or `None` if it is
    /// malformed, expired, revoked or unknown to the store.
    pub async fn verify(&self, token: &str) -> Option<Identity> {
        let claims = self.decode_claims(token)?;

        match self.store.is_active(token).await {
            Ok(true) => Some(claims.into()),
            Ok(false) => {
                tracing::debug!("Session for user {} is revoked or unknown", claims.user_id);
                None
            }
            Err(e) => match self.policy {
                RevocationCheckPolicy::FailOpen => {
                    tracing::warn!("Token store check failed, trusting signature: {}", e);
                    Some(claims.into())
                }
                RevocationCheckPolicy::FailClosed => {
                    tracing::error!("Token store check failed, rejecting session: {}", e);
                    None
                }
            },
        }
    }

    /// Revoke a single token. Store errors are logged and reported as false.
    pub async fn revoke(&self, token: &str) -> bool {
        match self.store.revoke(token).await {
            Ok(revoked) => {
                if revoked {
                    tracing::info!("Session revoked");
                }
                revoked
            }
            Err(e) => {
                tracing::warn!("Failed to revoke session: {}", e);
                false
            }
        }
    }

    pub async fn revoke_all_for_user(&self, user_id: UserId) -> Result<u64, TokenStoreError> {
        let revoked = self.store.revoke_all_for_user(user_id).await?;
        tracing::info!("Revoked {} sessions for user {}", revoked, user_id);
        Ok(revoked)
    }

    pub async fn list_active_for_user(&self, user_id: UserId) -> Result<Vec<TokenRecord>, TokenStoreError> {
        self.store.list_active_for_user(user_id).await
    }

    pub async fn purge(&self) -> Result<u64, TokenStoreError> {
        let deleted = self.store.purge_expired_or_revoked().await?;
        tracing::info!("Purged {} expired or revoked sessions", deleted);
        Ok(deleted)
    }

    /// `Set-Cookie` value carrying a session token
    pub fn session_cookie(&self, token: &str) -> HeaderValue {
        let mut cookie = format!(
            "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
            SESSION_COOKIE,
            token,
            self.ttl.num_seconds()
        );
        if self.secure_cookies {
            cookie.push_str("; Secure");
        }
        HeaderValue::from_str(&cookie).unwrap_or_else(|_| self.clear_cookie())
    }

    /// `Set-Cookie` value that deletes the session cookie
    pub fn clear_cookie(&self) -> HeaderValue {
        if self.secure_cookies {
            HeaderValue::from_static("auth-token=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax; Secure")
        } else {
            HeaderValue::from_static("auth-token=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::role::Role;
    use crate::database::tokens::MemoryTokenStore;
    use async_trait::async_trait;

    const SECRET: &str = "test-secret";

    fn service_with(store: Arc<dyn TokenStore>, policy: RevocationCheckPolicy) -> SessionService {
        SessionService::new(SECRET, Duration::days(7), policy, false, store)
    }

    fn service() -> (SessionService, Arc<MemoryTokenStore>) {
        let store = Arc::new(MemoryTokenStore::new());
        (service_with(store.clone(), RevocationCheckPolicy::FailOpen), store)
    }

    /// Store whose every call fails, as during a database outage
    struct UnavailableStore;

    #[async_trait]
    impl TokenStore for UnavailableStore {
        async fn store_token(
            &self,
            _: &str,
            _: UserId,
            _: DateTime<Utc>,
            _: Option<&str>,
            _: Option<&str>,
        ) -> Result<(), TokenStoreError> {
            Err(TokenStoreError::Unavailable("down".into()))
        }
        async fn is_active(&self, _: &str) -> Result<bool, TokenStoreError> {
            Err(TokenStoreError::Unavailable("down".into()))
        }
        async fn revoke(&self, _: &str) -> Result<bool, TokenStoreError> {
            Err(TokenStoreError::Unavailable("down".into()))
        }
        async fn revoke_all_for_user(&self, _: UserId) -> Result<u64, TokenStoreError> {
            Err(TokenStoreError::Unavailable("down".into()))
        }
        async fn list_active_for_user(&self, _: UserId) -> Result<Vec<TokenRecord>, TokenStoreError> {
            Err(TokenStoreError::Unavailable("down".into()))
        }
        async fn purge_expired_or_revoked(&self) -> Result<u64, TokenStoreError> {
            Err(TokenStoreError::Unavailable("down".into()))
        }
    }

    #[tokio::test]
    async fn issued_token_round_trips_identity() {
        let (sessions, store) = service();
        let identity = Identity::new(7, "a@x.com", Role::User);

        let issued = sessions.issue(&identity, Some("curl/8"), Some("10.0.0.1")).await.unwrap();
        assert_eq!(sessions.verify(&issued.token).await, Some(identity));

        let record = store.find(&issued.token).await.unwrap();
        assert_eq!(record.expires_at, issued.expires_at);
        assert_eq!(record.ip_address.as_deref(), Some("10.0.0.1"));
    }

    #[tokio::test]
    async fn end_to_end_issue_revoke_purge() {
        let (sessions, _) = service();
        let identity = Identity::new(7, "a@x.com", Role::User);

        let issued = sessions.issue(&identity, None, None).await.unwrap();
        assert!(sessions.verify(&issued.token).await.is_some());
        assert!(sessions.revoke(&issued.token).await);
        assert!(sessions.verify(&issued.token).await.is_none());
        assert!(!sessions.revoke(&issued.token).await);

        assert_eq!(sessions.purge().await.unwrap(), 1);
        assert!(sessions.list_active_for_user(7).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn revoke_all_invalidates_every_session_of_the_user() {
        let (sessions, _) = service();
        let identity = Identity::new(7, "a@x.com", Role::User);
        let first = sessions.issue(&identity, None, None).await.unwrap();
        let second = sessions.issue(&identity, None, None).await.unwrap();
        assert_ne!(first.token, second.token);

        assert_eq!(sessions.revoke_all_for_user(7).await.unwrap(), 2);
        assert!(sessions.verify(&first.token).await.is_none());
        assert!(sessions.verify(&second.token).await.is_none());
    }

    #[tokio::test]
    async fn out_of_range_ttl_still_issues_usable_sessions() {
        for hours in [0, u64::MAX] {
            let mut security = crate::config::AppConfig::development().security;
            security.session_ttl_hours = hours;
            let store = Arc::new(MemoryTokenStore::new());
            let sessions = SessionService::from_config(&security, store);

            assert!(sessions.ttl() > Duration::zero());
            assert!(sessions.ttl() <= Duration::hours(MAX_SESSION_TTL_HOURS as i64));

            let issued = sessions.issue(&Identity::new(7, "a@x.com", Role::User), None, None).await.unwrap();
            assert!(sessions.verify(&issued.token).await.is_some());
            let cookie = sessions.session_cookie(&issued.token);
            assert!(!cookie.to_str().unwrap().contains("Max-Age=0;"));
        }
    }

    #[tokio::test]
    async fn expired_token_is_rejected_even_with_active_row() {
        let (sessions, store) = service();
        let now = Utc::now();
        let claims = Claims {
            user_id: 7,
            email: "a@x.com".into(),
            role: Role::User,
            jti: "expired".into(),
            iat: (now - Duration::days(8)).timestamp(),
            exp: (now - Duration::seconds(1)).timestamp(),
        };
        let token = sessions.sign(&claims).unwrap();
        store.store_token(&token, 7, now + Duration::days(1), None, None).await.unwrap();

        assert!(sessions.verify(&token).await.is_none());
    }

    #[tokio::test]
    async fn tampered_or_foreign_tokens_are_rejected() {
        let (sessions, _) = service();
        let issued = sessions.issue(&Identity::new(1, "a@x.com", Role::Admin), None, None).await.unwrap();

        let other = SessionService::new(
            "other-secret",
            Duration::days(7),
            RevocationCheckPolicy::FailOpen,
            false,
            Arc::new(MemoryTokenStore::new()),
        );
        assert!(other.verify(&issued.token).await.is_none());
        assert!(sessions.verify("not-a-jwt").await.is_none());
    }

    #[tokio::test]
    async fn unknown_to_store_is_rejected() {
        let (sessions, _) = service();
        let signer = SessionService::new(
            SECRET,
            Duration::days(7),
            RevocationCheckPolicy::FailOpen,
            false,
            Arc::new(MemoryTokenStore::new()),
        );
        let issued = signer.issue(&Identity::new(1, "a@x.com", Role::User), None, None).await.unwrap();

        assert!(sessions.verify(&issued.token).await.is_none());
    }

    #[tokio::test]
    async fn store_outage_follows_revocation_policy() {
        let open = service_with(Arc::new(UnavailableStore), RevocationCheckPolicy::FailOpen);
        let closed = service_with(Arc::new(UnavailableStore), RevocationCheckPolicy::FailClosed);
        let identity = Identity::new(3, "c@x.com", Role::User);

        // Issuance survives the outage
        let issued = open.issue(&identity, None, None).await.unwrap();

        assert_eq!(open.verify(&issued.token).await, Some(identity));
        assert!(closed.verify(&issued.token).await.is_none());
        assert!(!open.revoke(&issued.token).await);
    }

    #[tokio::test]
    async fn empty_secret_cannot_sign() {
        let sessions = SessionService::new(
            "",
            Duration::days(7),
            RevocationCheckPolicy::FailOpen,
            false,
            Arc::new(MemoryTokenStore::new()),
        );
        let result = sessions.issue(&Identity::new(1, "a@x.com", Role::User), None, None).await;
        assert!(matches!(result, Err(SessionError::MissingSecret)));
    }

    #[test]
    fn cookie_attributes() {
        let (sessions, _) = service();
        assert_eq!(
            sessions.session_cookie("abc"),
            "auth-token=abc; Path=/; Max-Age=604800; HttpOnly; SameSite=Lax"
        );
        assert_eq!(
            sessions.clear_cookie(),
            "auth-token=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax"
        );

        let secure = SessionService::new(
            SECRET,
            Duration::days(7),
            RevocationCheckPolicy::FailOpen,
            true,
            Arc::new(MemoryTokenStore::new()),
        );
        assert!(secure.session_cookie("abc").to_str().unwrap().ends_with("; Secure"));
    }

    #[test]
    fn parses_revocation_policy() {
        assert_eq!("fail_closed".parse(), Ok(RevocationCheckPolicy::FailClosed));
        assert_eq!("Fail-Open".parse(), Ok(RevocationCheckPolicy::FailOpen));
        assert!("sometimes".parse::<RevocationCheckPolicy>().is_err());
    }
}
