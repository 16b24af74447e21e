// handlers/public/auth/mod.rs - Public authentication handlers
//
// Session acquisition and release. These routes do not pass through the
// session check; signin and signup are rate limited per client IP.

pub mod session; // POST|GET /api/auth/logout, GET /api/auth/me
pub mod signin; // POST /api/auth/signin
pub mod signup; // POST /api/auth/signup

pub use session::{logout, me_get};
pub use signin::signin_post;
pub use signup::signup_post;
