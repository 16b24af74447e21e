// handlers/client.rs - Request origin details used for rate limiting and session records

use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequestParts},
    http::{header, request::Parts, HeaderMap},
};
use std::convert::Infallible;
use std::net::SocketAddr;

use crate::state::AppState;

/// Where a request came from, as far as the server can tell.
///
/// The socket peer is authoritative. `x-forwarded-for` / `x-real-ip` are only
/// read when the deployment declares a trusted proxy in front of the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOrigin {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

impl ClientOrigin {
    pub fn resolve(headers: &HeaderMap, peer: Option<SocketAddr>, trust_proxy_headers: bool) -> Self {
        Self {
            ip: client_ip(headers, peer, trust_proxy_headers),
            user_agent: user_agent(headers),
        }
    }

    /// Rate-limit key for an operation, e.g. `signin:203.0.113.9`
    pub fn rate_limit_key(&self, operation: &str) -> String {
        format!("{}:{}", operation, self.ip.as_deref().unwrap_or("unknown"))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for ClientOrigin {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        Ok(Self::resolve(&parts.headers, peer, state.config.api.trust_proxy_headers))
    }
}

/// With a trusted proxy: first `x-forwarded-for` hop, else `x-real-ip`, else the peer.
/// Without one: the peer address only.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>, trust_proxy_headers: bool) -> Option<String> {
    let peer_ip = peer.map(|addr| addr.ip().to_string());
    if !trust_proxy_headers {
        return peer_ip;
    }

    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    forwarded
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        })
        .map(str::to_string)
        .or(peer_ip)
}

pub fn user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
