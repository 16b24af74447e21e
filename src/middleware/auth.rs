use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;

use super::routes::{classify, is_api_path, RouteClass};
use crate::auth::claims::strip_identity_headers;
use crate::auth::{read_session_cookie, Role, SessionService};
use crate::error::ApiError;

pub const SIGN_IN_REDIRECT: &str = "/?auth=required";
pub const FORBIDDEN_REDIRECT: &str = "/dashboard";

/// Session middleware that authenticates protected routes and forwards the
/// caller's identity as a request extension and `x-user-*` headers.
pub async fn session_middleware(
    State(sessions): State<Arc<SessionService>>,
    mut request: Request,
    next: Next,
) -> Response {
    // Identity headers are only ever set here
    strip_identity_headers(request.headers_mut());

    let path = request.uri().path().to_string();
    let class = classify(&path);
    if class == RouteClass::Public {
        return next.run(request).await;
    }

    let is_api = is_api_path(&path);

    let Some(token) = read_session_cookie(request.headers()) else {
        tracing::debug!("No session cookie for {}", path);
        return if is_api {
            ApiError::unauthorized("Authentication required").into_response()
        } else {
            Redirect::temporary(SIGN_IN_REDIRECT).into_response()
        };
    };

    let Some(identity) = sessions.verify(&token).await else {
        tracing::info!("Rejected invalid session for {}", path);
        let mut response = if is_api {
            ApiError::unauthorized("Invalid token").into_response()
        } else {
            Redirect::temporary(SIGN_IN_REDIRECT).into_response()
        };
        response
            .headers_mut()
            .append(header::SET_COOKIE, sessions.clear_cookie());
        return response;
    };

    if class == RouteClass::AdminOnly && !identity.has_role(Role::Admin) {
        tracing::warn!("User {} denied admin route {}", identity.user_id, path);
        return if is_api {
            ApiError::forbidden("Admin access required").into_response()
        } else {
            Redirect::temporary(FORBIDDEN_REDIRECT).into_response()
        };
    }

    identity.write_headers(request.headers_mut());
    request.extensions_mut().insert(identity);

    next.run(request).await
}
