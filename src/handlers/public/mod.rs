// handlers/public/mod.rs - Public handlers (no session required)
//
// Signin/signup/logout, the course catalog, health and page shells. The
// session middleware passes these paths through untouched. The page shells
// for `/dashboard` and `/admin` live here too but are gated by path prefix.

pub mod auth; // /api/auth/*
pub mod courses; // GET /api/courses
pub mod pages; // HTML shells
pub mod system; // GET /, GET /health
