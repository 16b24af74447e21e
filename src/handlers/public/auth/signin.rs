// handlers/public/auth/signin.rs - POST /api/auth/signin handler

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{password, Identity};
use crate::database::models::User;
use crate::error::ApiError;
use crate::handlers::client::ClientOrigin;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SigninRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/**
 * POST /api/auth/signin - Exchange email and password for a session cookie
 *
 * Input: `{"email": "string", "password": "string"}`
 * Output: `{"success": true, "message": "...", "data": {"user": {...}}}` plus
 * an `auth-token` cookie. Unknown email and wrong password both answer 401
 * with the same message.
 */
pub async fn signin_post(
    State(state): State<AppState>,
    origin: ClientOrigin,
    payload: Result<Json<SigninRequest>, JsonRejection>,
) -> ApiResult<Value> {
    let api = &state.config.api;
    if api.enable_rate_limiting
        && !state
            .rate_limiter
            .check(&origin.rate_limit_key("signin"), api.signin_max_attempts, state.signin_window())
            .await
    {
        return Err(ApiError::too_many_requests(
            "Too many sign in attempts. Please try again later.",
        ));
    }

    let Json(body) = payload?;
    let (email, password) = match (body.email, body.password) {
        (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => (email, password),
        _ => return Err(ApiError::bad_request("Email and password are required")),
    };

    if password::validate_email_format(&email).is_err() {
        return Err(ApiError::bad_request("Invalid email format"));
    }

    let Some(user) = User::credentials_by_email(&state.pool, &email).await? else {
        tracing::warn!("Sign in failed: unknown account");
        return Err(ApiError::unauthorized("Invalid email or password"));
    };

    let hash = user.password_hash.clone();
    let verified = tokio::task::spawn_blocking(move || password::verify_password(&password, &hash))
        .await
        .map_err(|e| {
            tracing::error!("Password verification task failed: {}", e);
            ApiError::internal_server_error("Failed to sign in. Please try again.")
        })?
        .unwrap_or_else(|e| {
            tracing::warn!("Stored password hash for user {} is unreadable: {}", user.id, e);
            false
        });

    if !verified {
        tracing::warn!("Sign in failed for user {}: wrong password", user.id);
        return Err(ApiError::unauthorized("Invalid email or password"));
    }

    let identity = Identity::new(user.id, user.email.clone(), user.role);
    let session = state
        .sessions
        .issue(&identity, origin.user_agent.as_deref(), origin.ip.as_deref())
        .await?;

    tracing::info!("User {} signed in", user.id);

    let user = User::from(user);
    Ok(ApiResponse::success(json!({ "user": user }))
        .message("Signed in successfully")
        .cookie(state.sessions.session_cookie(&session.token)))
}
