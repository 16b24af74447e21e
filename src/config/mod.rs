use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

use crate::auth::session::RevocationCheckPolicy;

/// Signing secret accepted only in development. Any other environment must set JWT_SECRET.
pub const DEVELOPMENT_JWT_SECRET: &str = "insecure-development-secret-change-me";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub enable_query_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub enable_rate_limiting: bool,
    pub signin_max_attempts: u32,
    pub signin_window_secs: u64,
    pub signup_max_attempts: u32,
    pub signup_window_secs: u64,
    pub enable_request_logging: bool,
    /// Read client IPs from `x-forwarded-for` / `x-real-ip`. Only safe behind a proxy that sets them.
    pub trust_proxy_headers: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub session_ttl_hours: u64,
    pub revocation_policy: RevocationCheckPolicy,
    pub secure_cookies: bool,
    pub cors_origins: Vec<String>,
    pub admin_emails: Vec<String>,
    pub password_hash_cost: u32,
}

/// Longest accepted session lifetime (one year)
pub const MAX_SESSION_TTL_HOURS: u64 = 24 * 365;

/// Longest accepted rate-limit window (one day)
pub const MAX_RATE_LIMIT_WINDOW_SECS: u64 = 24 * 60 * 60;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("JWT_SECRET must be set to a non-default value in {0:?}")]
    InsecureJwtSecret(Environment),

    #[error("SESSION_TTL_HOURS must be between 1 and {max}, got {value}")]
    SessionTtlOutOfRange { value: u64, max: u64 },

    #[error("{name} must be between 1 and {max}, got {value}")]
    WindowOutOfRange { name: &'static str, value: u64, max: u64 },
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Some(port) = env::var("PORT").ok().and_then(|v| v.parse().ok()) {
            self.server.port = port;
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Ok(v) = env::var("DATABASE_ENABLE_QUERY_LOGGING") {
            self.database.enable_query_logging = v.parse().unwrap_or(self.database.enable_query_logging);
        }

        // API overrides
        if let Ok(v) = env::var("API_ENABLE_RATE_LIMITING") {
            self.api.enable_rate_limiting = v.parse().unwrap_or(self.api.enable_rate_limiting);
        }
        if let Ok(v) = env::var("API_SIGNIN_MAX_ATTEMPTS") {
            self.api.signin_max_attempts = v.parse().unwrap_or(self.api.signin_max_attempts);
        }
        if let Ok(v) = env::var("API_SIGNIN_WINDOW_SECS") {
            self.api.signin_window_secs = v.parse().unwrap_or(self.api.signin_window_secs);
        }
        if let Ok(v) = env::var("API_SIGNUP_MAX_ATTEMPTS") {
            self.api.signup_max_attempts = v.parse().unwrap_or(self.api.signup_max_attempts);
        }
        if let Ok(v) = env::var("API_SIGNUP_WINDOW_SECS") {
            self.api.signup_window_secs = v.parse().unwrap_or(self.api.signup_window_secs);
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("API_TRUST_PROXY_HEADERS") {
            self.api.trust_proxy_headers = v.parse().unwrap_or(self.api.trust_proxy_headers);
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SESSION_TTL_HOURS") {
            self.security.session_ttl_hours = v.parse().unwrap_or(self.security.session_ttl_hours);
        }
        if let Ok(v) = env::var("SESSION_REVOCATION_POLICY") {
            self.security.revocation_policy = v.parse().unwrap_or(self.security.revocation_policy);
        }
        if let Ok(v) = env::var("SECURITY_SECURE_COOKIES") {
            self.security.secure_cookies = v.parse().unwrap_or(self.security.secure_cookies);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = split_list(&v);
        }
        if let Ok(v) = env::var("ADMIN_EMAILS") {
            self.security.admin_emails = split_list(&v).into_iter().map(|e| e.to_lowercase()).collect();
        }
        if let Ok(v) = env::var("PASSWORD_HASH_COST") {
            self.security.password_hash_cost = v.parse().unwrap_or(self.security.password_hash_cost);
        }

        self
    }

    /// Refuse to start with durations that would break sessions or rate limiting,
    /// or outside development with a missing or default signing secret.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ttl = self.security.session_ttl_hours;
        if ttl == 0 || ttl > MAX_SESSION_TTL_HOURS {
            return Err(ConfigError::SessionTtlOutOfRange {
                value: ttl,
                max: MAX_SESSION_TTL_HOURS,
            });
        }
        check_window("API_SIGNIN_WINDOW_SECS", self.api.signin_window_secs)?;
        check_window("API_SIGNUP_WINDOW_SECS", self.api.signup_window_secs)?;

        if self.environment == Environment::Development {
            return Ok(());
        }
        let secret = self.security.jwt_secret.trim();
        if secret.is_empty() || secret == DEVELOPMENT_JWT_SECRET {
            return Err(ConfigError::InsecureJwtSecret(self.environment));
        }
        Ok(())
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig { port: 3000 },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
                enable_query_logging: true,
            },
            api: ApiConfig {
                enable_rate_limiting: true,
                signin_max_attempts: 5,
                signin_window_secs: 15 * 60,
                signup_max_attempts: 3,
                signup_window_secs: 60 * 60,
                enable_request_logging: true,
                trust_proxy_headers: false,
            },
            security: SecurityConfig {
                jwt_secret: DEVELOPMENT_JWT_SECRET.to_string(),
                session_ttl_hours: 24 * 7, // 1 week
                revocation_policy: RevocationCheckPolicy::FailOpen,
                secure_cookies: false,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
                admin_emails: vec![],
                password_hash_cost: 12,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig { port: 3000 },
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 10,
                enable_query_logging: true,
            },
            api: ApiConfig {
                enable_rate_limiting: true,
                signin_max_attempts: 5,
                signin_window_secs: 15 * 60,
                signup_max_attempts: 3,
                signup_window_secs: 60 * 60,
                enable_request_logging: true,
                trust_proxy_headers: false,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                session_ttl_hours: 24 * 7,
                revocation_policy: RevocationCheckPolicy::FailOpen,
                secure_cookies: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
                admin_emails: vec![],
                password_hash_cost: 12,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig { port: 3000 },
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                connection_timeout: 5,
                enable_query_logging: false,
            },
            api: ApiConfig {
                enable_rate_limiting: true,
                signin_max_attempts: 5,
                signin_window_secs: 15 * 60,
                signup_max_attempts: 3,
                signup_window_secs: 60 * 60,
                enable_request_logging: false,
                trust_proxy_headers: false,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                session_ttl_hours: 24 * 7,
                revocation_policy: RevocationCheckPolicy::FailOpen,
                secure_cookies: true,
                cors_origins: vec!["https://app.example.com".to_string()],
                admin_emails: vec![],
                password_hash_cost: 12,
            },
        }
    }
}

fn check_window(name: &'static str, value: u64) -> Result<(), ConfigError> {
    if value == 0 || value > MAX_RATE_LIMIT_WINDOW_SECS {
        return Err(ConfigError::WindowOutOfRange {
            name,
            value,
            max: MAX_RATE_LIMIT_WINDOW_SECS,
        });
    }
    Ok(())
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
