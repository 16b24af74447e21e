use std::net::SocketAddr;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use course_platform_api::{app, config, AppState};

/// How often stale rate-limit windows are dropped
const RATE_LIMIT_PRUNE_INTERVAL: Duration = Duration::from_secs(5 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=info")),
        )
        .init();

    // Initialize configuration (this loads the config singleton)
    let config = config::config().clone();
    config.validate()?;
    tracing::info!(
        "Starting Course Platform API in {:?} mode (revocation policy {})",
        config.environment,
        config.security.revocation_policy
    );
    if config.api.trust_proxy_headers {
        tracing::info!("Client IPs are taken from proxy headers");
    }

    let port = config.server.port;
    let state = AppState::connect(config).await?;

    let limiter = state.rate_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(RATE_LIMIT_PRUNE_INTERVAL);
        loop {
            interval.tick().await;
            let pruned = limiter.prune().await;
            if pruned > 0 {
                tracing::debug!("Pruned {} rate limit windows", pruned);
            }
        }
    });

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Course Platform API listening on http://{}", bind_addr);

    // Peer addresses key the signin/signup rate limits
    axum::serve(listener, app(state).into_make_service_with_connect_info::<SocketAddr>()).await?;
    Ok(())
}
