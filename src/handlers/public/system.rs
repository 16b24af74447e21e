// handlers/public/system.rs - Service info and health check

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::database::DatabaseManager;
use crate::state::AppState;

/// GET / - Service description and endpoint map
pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "Course Platform API",
            "version": env!("CARGO_PKG_VERSION"),
            "endpoints": {
                "auth": "/api/auth/signin, /api/auth/signup, /api/auth/logout, /api/auth/me (public)",
                "catalog": "/api/courses (public)",
                "content": "/api/courses/:id/videos (session required)",
                "user": "/api/user/enroll, /api/user/enrolled-courses (session required)",
                "admin": "/api/admin/* (admin role required)",
                "health": "/health (public)",
            }
        }
    }))
}

/// GET /health - Database ping. 503 when the database is unreachable.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "error": true,
                    "message": "Database unavailable",
                    "code": "SERVICE_UNAVAILABLE",
                    "data": {
                        "status": "degraded",
                        "timestamp": now
                    }
                })),
            )
        }
    }
}
