use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{elevated::admin, protected, public};
use crate::middleware::session_middleware;
use crate::state::AppState;

/// Build the full application router with the session middleware in front of every route
pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config.security.cors_origins);
    let sessions = state.sessions.clone();
    let request_logging = state.config.api.enable_request_logging;

    let router = Router::new()
        .merge(public_routes())
        .merge(page_routes())
        .merge(protected_routes())
        .merge(admin_routes())
        .with_state(state)
        .layer(from_fn_with_state(sessions, session_middleware))
        .layer(cors);

    if request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

fn public_routes() -> Router<AppState> {
    use public::auth;

    Router::new()
        .route("/", get(public::system::root))
        .route("/health", get(public::system::health))
        .route("/api/auth/signin", post(auth::signin_post))
        .route("/api/auth/signup", post(auth::signup_post))
        .route("/api/auth/logout", post(auth::logout).get(auth::logout))
        .route("/api/auth/me", get(auth::me_get))
        .route("/api/courses", get(public::courses::catalog_get))
}

fn page_routes() -> Router<AppState> {
    use public::pages;

    Router::new()
        .route("/courses", get(pages::courses_page))
        .route("/pricing", get(pages::pricing_page))
        .route("/dashboard", get(pages::dashboard_page))
        .route("/dashboard/course/:id", get(pages::course_player_page))
        .route("/admin", get(pages::admin_page))
}

fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/api/courses/:id/videos", get(protected::course_videos_get))
        .route("/api/user/enroll", post(protected::enroll_post))
        .route("/api/user/enrolled-courses", get(protected::enrolled_courses_get))
}

fn admin_routes() -> Router<AppState> {
    use admin::{catalog, tokens, users};

    Router::new()
        .route("/api/admin/users", get(users::users_get).post(users::users_post))
        .route("/api/admin/categories", get(catalog::categories_get))
        .route("/api/admin/courses", get(catalog::courses_get).post(catalog::courses_post))
        .route(
            "/api/admin/courses/:id",
            put(catalog::course_put).delete(catalog::course_delete),
        )
        .route("/api/admin/courses-list", get(catalog::courses_list_get))
        .route("/api/admin/videos", get(catalog::videos_get).post(catalog::videos_post))
        .route(
            "/api/admin/videos/:id",
            put(catalog::video_put).delete(catalog::video_delete),
        )
        .route("/api/admin/tokens/cleanup", post(tokens::tokens_cleanup_post))
        .route(
            "/api/admin/tokens/:user_id",
            get(tokens::tokens_get).delete(tokens::tokens_delete),
        )
}

/// Credentialed CORS for the configured frontend origins
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
}
