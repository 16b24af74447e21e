// handlers/elevated/admin/tokens.rs - Session administration

use axum::{
    extract::{Path, State},
    Extension,
};
use serde_json::{json, Value};

use super::{parse_id, require_admin};
use crate::auth::Identity;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// GET /api/admin/tokens/:user_id - Active sessions of a user, most recently used first
pub async fn tokens_get(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(user_id): Path<String>,
) -> ApiResult<Value> {
    require_admin(&identity)?;
    let user_id = parse_id(&user_id, "Invalid user ID")?;

    let tokens = state.sessions.list_active_for_user(user_id).await?;

    Ok(ApiResponse::success(json!({
        "userId": user_id,
        "activeTokens": tokens.len(),
        "tokens": tokens,
    })))
}

/// DELETE /api/admin/tokens/:user_id - Revoke every session of a user
pub async fn tokens_delete(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(user_id): Path<String>,
) -> ApiResult<Value> {
    require_admin(&identity)?;
    let user_id = parse_id(&user_id, "Invalid user ID")?;

    let revoked = state.sessions.revoke_all_for_user(user_id).await?;
    tracing::info!("Admin {} revoked {} sessions of user {}", identity.user_id, revoked, user_id);

    Ok(ApiResponse::success(json!({ "userId": user_id, "revoked": revoked }))
        .message(format!("All tokens invalidated for user {}", user_id)))
}

/// POST /api/admin/tokens/cleanup - Delete expired and revoked session rows
pub async fn tokens_cleanup_post(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Value> {
    require_admin(&identity)?;

    let cleaned_up = state.sessions.purge().await?;

    Ok(ApiResponse::success(json!({ "cleanedUp": cleaned_up })).message("Token cleanup completed"))
}
