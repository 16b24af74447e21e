pub mod auth;
pub mod response;
pub mod routes;

pub use auth::session_middleware;
pub use response::{ApiResponse, ApiResult};
pub use routes::{classify, is_api_path, RouteClass};
