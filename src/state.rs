use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::{RateLimiter, SessionService};
use crate::config::{AppConfig, MAX_RATE_LIMIT_WINDOW_SECS};
use crate::database::{DatabaseError, DatabaseManager, PgTokenStore, TokenStore};

/// Shared application state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub pool: PgPool,
    pub sessions: Arc<SessionService>,
    pub rate_limiter: RateLimiter,
}

impl AppState {
    pub fn new(config: AppConfig, pool: PgPool, store: Arc<dyn TokenStore>) -> Self {
        let sessions = Arc::new(SessionService::from_config(&config.security, store));
        Self {
            config: Arc::new(config),
            pool,
            sessions,
            rate_limiter: RateLimiter::in_memory(),
        }
    }

    /// Connect to the configured database and back sessions with the `tokens` table
    pub async fn connect(config: AppConfig) -> Result<Self, DatabaseError> {
        let pool = DatabaseManager::connect(&config.database, config.environment).await?;
        let store = Arc::new(PgTokenStore::new(pool.clone()));
        Ok(Self::new(config, pool, store))
    }

    pub fn signin_window(&self) -> Duration {
        window(self.config.api.signin_window_secs)
    }

    pub fn signup_window(&self) -> Duration {
        window(self.config.api.signup_window_secs)
    }
}

fn window(secs: u64) -> Duration {
    Duration::from_secs(secs.clamp(1, MAX_RATE_LIMIT_WINDOW_SECS))
}
