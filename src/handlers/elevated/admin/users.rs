// handlers/elevated/admin/users.rs - Account management

use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{non_blank, require_admin};
use crate::auth::{password, Identity, Role};
use crate::database::models::User;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// GET /api/admin/users - Every account with its enrollment count, newest first
pub async fn users_get(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Value> {
    require_admin(&identity)?;
    let users = User::list_with_enrollments(&state.pool).await?;
    Ok(ApiResponse::success(json!({ "users": users })))
}

/// POST /api/admin/users - Create an account with an explicit role
pub async fn users_post(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> ApiResult<Value> {
    require_admin(&identity)?;
    let Json(body) = payload?;

    let (Some(name), Some(email), Some(password)) =
        (non_blank(&body.name), non_blank(&body.email), body.password.clone().filter(|p| !p.is_empty()))
    else {
        return Err(ApiError::bad_request("Name, email, and password are required"));
    };
    if password::validate_email_format(email).is_err() {
        return Err(ApiError::bad_request("Please enter a valid email address"));
    }
    let role = match non_blank(&body.role) {
        Some(role) => role
            .parse::<Role>()
            .map_err(|e| ApiError::bad_request(e.to_string()))?,
        None => Role::User,
    };

    let email = email.to_lowercase();
    if User::email_exists(&state.pool, &email).await? {
        return Err(ApiError::conflict("User with this email already exists"));
    }

    let cost = state.config.security.password_hash_cost;
    let password_hash = tokio::task::spawn_blocking(move || password::hash_password(&password, cost))
        .await
        .map_err(|e| {
            tracing::error!("Password hashing task failed: {}", e);
            ApiError::internal_server_error("Failed to create user")
        })?
        .map_err(|e| {
            tracing::error!("Password hashing failed: {}", e);
            ApiError::internal_server_error("Failed to create user")
        })?;

    let user = User::create(&state.pool, name, &email, &password_hash, role).await?;
    tracing::info!("Admin {} created user {} with role {}", identity.user_id, user.id, role);

    Ok(ApiResponse::created(json!({
        "user": {
            "id": user.id,
            "name": user.name,
            "email": user.email,
            "role": user.role,
            "enrolled_courses": 0,
            "created_at": user.created_at,
        }
    }))
    .message("User created successfully"))
}
