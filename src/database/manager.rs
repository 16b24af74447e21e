use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::PgPool;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::{DatabaseConfig, Environment};

/// Errors from DatabaseManager
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Builds the single application connection pool from configuration
pub struct DatabaseManager;

impl DatabaseManager {
    /// Connect eagerly, failing if the database is unreachable
    pub async fn connect(database: &DatabaseConfig, environment: Environment) -> Result<PgPool, DatabaseError> {
        let options = Self::connect_options(database, environment)?;
        let pool = Self::pool_options(database).connect_with(options).await?;
        info!("Connected database pool (max {} connections)", database.max_connections);
        Ok(pool)
    }

    /// Build a pool that opens connections on first use
    pub fn connect_lazy(database: &DatabaseConfig, environment: Environment) -> Result<PgPool, DatabaseError> {
        let options = Self::connect_options(database, environment)?;
        Ok(Self::pool_options(database).connect_lazy_with(options))
    }

    fn pool_options(database: &DatabaseConfig) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(database.max_connections)
            .acquire_timeout(Duration::from_secs(database.connection_timeout))
    }

    fn connect_options(database: &DatabaseConfig, environment: Environment) -> Result<PgConnectOptions, DatabaseError> {
        let url = database
            .url
            .as_deref()
            .ok_or(DatabaseError::ConfigMissing("DATABASE_URL"))?;

        let mut options = PgConnectOptions::from_str(url).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;

        // An explicit sslmode in the URL wins
        if !url.contains("sslmode=") {
            options = options.ssl_mode(Self::ssl_mode_for(url, environment)?);
        }
        if !database.enable_query_logging {
            options = sqlx::ConnectOptions::disable_statement_logging(options);
        }
        Ok(options)
    }

    /// Hosted Neon databases require TLS; production verifies the certificate.
    fn ssl_mode_for(url: &str, environment: Environment) -> Result<PgSslMode, DatabaseError> {
        let parsed = url::Url::parse(url).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        let host = parsed.host_str().unwrap_or_default();

        Ok(if host.ends_with("neon.tech") {
            PgSslMode::Require
        } else if environment == Environment::Production {
            PgSslMode::VerifyFull
        } else {
            PgSslMode::Disable
        })
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(pool: &PgPool) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: Option<&str>) -> DatabaseConfig {
        DatabaseConfig {
            url: url.map(str::to_string),
            max_connections: 2,
            connection_timeout: 1,
            enable_query_logging: false,
        }
    }

    #[test]
    fn picks_ssl_mode_from_host_and_environment() {
        let neon = "postgres://u:p@ep-cool-name.us-east-2.aws.neon.tech/app";
        let local = "postgres://u:p@localhost:5432/app";

        assert!(matches!(
            DatabaseManager::ssl_mode_for(neon, Environment::Development).unwrap(),
            PgSslMode::Require
        ));
        assert!(matches!(
            DatabaseManager::ssl_mode_for(local, Environment::Production).unwrap(),
            PgSslMode::VerifyFull
        ));
        assert!(matches!(
            DatabaseManager::ssl_mode_for(local, Environment::Development).unwrap(),
            PgSslMode::Disable
        ));
    }

    #[test]
    fn missing_url_is_a_config_error() {
        let result = DatabaseManager::connect_lazy(&config(None), Environment::Development);
        assert!(matches!(result, Err(DatabaseError::ConfigMissing("DATABASE_URL"))));
    }

    #[tokio::test]
    async fn lazy_pool_builds_without_a_server() {
        let pool = DatabaseManager::connect_lazy(
            &config(Some("postgres://nobody@127.0.0.1:1/none")),
            Environment::Development,
        );
        assert!(pool.is_ok());
    }
}
