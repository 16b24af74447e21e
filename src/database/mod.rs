pub mod manager;
pub mod models;
pub mod schema;
pub mod tokens;

pub use manager::{DatabaseError, DatabaseManager};
pub use schema::ensure_schema;
pub use tokens::{MemoryTokenStore, PgTokenStore, TokenRecord, TokenStore, TokenStoreError};
