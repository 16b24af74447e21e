// handlers/mod.rs - 3-Tier Handler Architecture
//
// Public (no session) → Protected (valid session) → Elevated (admin session).
// The tier a request falls into is decided by path in `middleware::routes`.

pub mod client;
pub mod elevated;
pub mod protected;
pub mod public;
