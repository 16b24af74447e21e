#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::redirect::Policy;

use course_platform_api::auth::{Identity, Role};
use course_platform_api::config::AppConfig;
use course_platform_api::database::{DatabaseManager, MemoryTokenStore};
use course_platform_api::{app, AppState};

/// Nothing listens here; database-backed routes fail fast with 5xx
const UNREACHABLE_DATABASE: &str = "postgres://nobody@127.0.0.1:1/course_platform_test";

/// In-process server on a free port with an in-memory token store
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub state: AppState,
    pub store: Arc<MemoryTokenStore>,
    pub client: reqwest::Client,
}

impl TestServer {
    pub async fn start() -> Result<Self> {
        Self::start_with(AppConfig::development()).await
    }

    pub async fn start_with(mut config: AppConfig) -> Result<Self> {
        config.database.url = Some(UNREACHABLE_DATABASE.to_string());
        config.database.connection_timeout = 1;
        config.api.enable_request_logging = false;

        let pool = DatabaseManager::connect_lazy(&config.database, config.environment)?;
        let store = Arc::new(MemoryTokenStore::new());
        let state = AppState::new(config, pool, store.clone());

        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind test listener")?;

        let service = app(state.clone()).into_make_service_with_connect_info::<SocketAddr>();
        tokio::spawn(async move {
            let _ = axum::serve(listener, service).await;
        });

        // Redirects are assertions, not something to follow
        let client = reqwest::Client::builder().redirect(Policy::none()).build()?;

        Ok(Self {
            port,
            base_url: format!("http://127.0.0.1:{}", port),
            state,
            store,
            client,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Issue a session directly through the session service, as signin would
    pub async fn session_for(&self, user_id: i32, role: Role) -> Result<String> {
        let identity = Identity::new(user_id, format!("user{}@example.com", user_id), role);
        let issued = self.state.sessions.issue(&identity, Some("integration-test"), Some("127.0.0.1")).await?;
        Ok(issued.token)
    }

    pub fn get(&self, path: &str, token: Option<&str>) -> reqwest::RequestBuilder {
        with_cookie(self.client.get(self.url(path)), token)
    }

    pub fn post(&self, path: &str, token: Option<&str>) -> reqwest::RequestBuilder {
        with_cookie(self.client.post(self.url(path)), token)
    }

    pub fn delete(&self, path: &str, token: Option<&str>) -> reqwest::RequestBuilder {
        with_cookie(self.client.delete(self.url(path)), token)
    }
}

fn with_cookie(request: reqwest::RequestBuilder, token: Option<&str>) -> reqwest::RequestBuilder {
    match token {
        Some(token) => request.header(reqwest::header::COOKIE, format!("auth-token={}", token)),
        None => request,
    }
}

/// The `Set-Cookie` header of a response, if any
pub fn set_cookie(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get(reqwest::header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
