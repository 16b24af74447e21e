pub mod claims;
pub mod cookie;
pub mod password;
pub mod rate_limit;
pub mod role;
pub mod session;
pub mod token_hash;

pub use claims::{Claims, Identity, UserId};
pub use cookie::{read_session_cookie, SESSION_COOKIE};
pub use password::{validate_email_format, validate_password, PasswordValidation};
pub use rate_limit::{CounterStore, InMemoryCounterStore, RateLimiter};
pub use role::Role;
pub use session::{IssuedSession, RevocationCheckPolicy, SessionError, SessionService};
pub use token_hash::hash_token;
