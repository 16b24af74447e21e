// handlers/protected/mod.rs - Protected handlers (session required)
//
// Every route here sits behind the session middleware, which inserts the
// caller's `Identity` into request extensions before the handler runs.

pub mod courses; // GET /api/courses/:id/videos
pub mod user; // /api/user/*

pub use courses::course_videos_get;
pub use user::{enroll_post, enrolled_courses_get};
