// handlers/public/auth/session.rs - Logout and current-user handlers
//
// Both routes sit under the public `/api/auth` prefix, so they read and
// verify the session cookie themselves instead of relying on the middleware.

use axum::{extract::State, http::HeaderMap};
use serde_json::{json, Value};

use crate::auth::read_session_cookie;
use crate::database::models::User;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// POST|GET /api/auth/logout - Revoke the presented session and delete the cookie.
/// Always succeeds, even without a cookie or when the store is down.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> ApiResponse<Value> {
    if let Some(token) = read_session_cookie(&headers) {
        state.sessions.revoke(&token).await;
    }

    ApiResponse::success(json!({}))
        .message("Logged out successfully")
        .cookie(state.sessions.clear_cookie())
}

/// GET /api/auth/me - Details of the signed-in user
pub async fn me_get(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Value> {
    let token = read_session_cookie(&headers).ok_or_else(|| ApiError::unauthorized("Not authenticated"))?;
    let identity = state
        .sessions
        .verify(&token)
        .await
        .ok_or_else(|| ApiError::unauthorized("Not authenticated"))?;

    let user = User::find(&state.pool, identity.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(ApiResponse::success(json!({ "user": user })))
}
