// handlers/public/auth/signup.rs - POST /api/auth/signup handler

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{password, Identity, Role};
use crate::database::models::User;
use crate::error::ApiError;
use crate::handlers::client::ClientOrigin;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Signup with one of the configured admin emails creates an admin account
pub fn role_for_email(email: &str, admin_emails: &[String]) -> Role {
    if admin_emails.iter().any(|admin| admin.eq_ignore_ascii_case(email)) {
        Role::Admin
    } else {
        Role::User
    }
}

/**
 * POST /api/auth/signup - Create an account and sign it in
 *
 * Input: `{"name": "string", "email": "string", "password": "string"}`
 * Output: 201 with `{"data": {"user": {...}}}` and an `auth-token` cookie.
 * Validation failures answer 400 with the first violated rule; an existing
 * email (case-insensitive) answers 409.
 */
pub async fn signup_post(
    State(state): State<AppState>,
    origin: ClientOrigin,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> ApiResult<Value> {
    let api = &state.config.api;
    if api.enable_rate_limiting
        && !state
            .rate_limiter
            .check(&origin.rate_limit_key("signup"), api.signup_max_attempts, state.signup_window())
            .await
    {
        return Err(ApiError::too_many_requests(
            "Too many signup attempts. Please try again later.",
        ));
    }

    let Json(body) = payload?;
    let (name, email, password) = match (body.name, body.email, body.password) {
        (Some(name), Some(email), Some(password))
            if !name.is_empty() && !email.is_empty() && !password.is_empty() =>
        {
            (name, email, password)
        }
        _ => return Err(ApiError::bad_request("Name, email, and password are required")),
    };

    let name = name.trim().to_string();
    if name.chars().count() < 2 {
        return Err(ApiError::bad_request("Name must be at least 2 characters long"));
    }
    if password::validate_email_format(&email).is_err() {
        return Err(ApiError::bad_request("Please enter a valid email address"));
    }
    let validation = password::validate_password(&password);
    if let Some(message) = validation.first_error() {
        return Err(ApiError::bad_request(message));
    }

    let email = email.to_lowercase();
    if User::email_exists(&state.pool, &email).await? {
        return Err(ApiError::conflict("User with this email already exists"));
    }

    let cost = state.config.security.password_hash_cost;
    let password_hash = tokio::task::spawn_blocking(move || password::hash_password(&password, cost))
        .await
        .map_err(|e| {
            tracing::error!("Password hashing task failed: {}", e);
            ApiError::internal_server_error("Failed to create account. Please try again.")
        })?
        .map_err(|e| {
            tracing::error!("Password hashing failed: {}", e);
            ApiError::internal_server_error("Failed to create account. Please try again.")
        })?;

    let role = role_for_email(&email, &state.config.security.admin_emails);
    let user = match User::create(&state.pool, &name, &email, &password_hash, role).await {
        Ok(user) => user,
        // Lost a race with a concurrent signup for the same email
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
            return Err(ApiError::conflict("User with this email already exists"));
        }
        Err(e) => return Err(e.into()),
    };

    let identity = Identity::new(user.id, user.email.clone(), user.role);
    let session = state
        .sessions
        .issue(&identity, origin.user_agent.as_deref(), origin.ip.as_deref())
        .await?;

    tracing::info!("User {} signed up with role {}", user.id, user.role);

    Ok(ApiResponse::created(json!({ "user": user }))
        .message("Account created successfully")
        .cookie(state.sessions.session_cookie(&session.token)))
}
