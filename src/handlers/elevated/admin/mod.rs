// handlers/elevated/admin/mod.rs - Admin console API
//
// Mounted under /api/admin, which the session middleware restricts to the
// admin role. Each handler re-checks the role on the identity it receives so
// a routing mistake cannot expose these operations.

use crate::auth::{Identity, Role};
use crate::error::ApiError;

pub mod catalog; // courses, categories, videos
pub mod tokens; // session management
pub mod users; // account management

pub fn require_admin(identity: &Identity) -> Result<(), ApiError> {
    if identity.has_role(Role::Admin) {
        Ok(())
    } else {
        tracing::warn!("User {} reached an admin handler without the admin role", identity.user_id);
        Err(ApiError::forbidden("Admin access required"))
    }
}

/// Parse a numeric path id, answering 400 with `message` otherwise
pub fn parse_id(raw: &str, message: &str) -> Result<i32, ApiError> {
    raw.parse::<i32>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ApiError::bad_request(message))
}

/// Treat missing and blank strings alike
pub fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_check() {
        assert!(require_admin(&Identity::new(1, "a@x.com", Role::Admin)).is_ok());
        let err = require_admin(&Identity::new(2, "u@x.com", Role::User)).unwrap_err();
        assert_eq!(err.status_code(), 403);
    }

    #[test]
    fn id_parsing() {
        assert_eq!(parse_id("42", "bad").unwrap(), 42);
        assert!(parse_id("0", "bad").is_err());
        assert!(parse_id("abc", "bad").is_err());
        assert_eq!(parse_id("-1", "Invalid user ID").unwrap_err().message(), "Invalid user ID");
    }

    #[test]
    fn blank_strings_count_as_missing() {
        assert_eq!(non_blank(&Some("  ".into())), None);
        assert_eq!(non_blank(&None), None);
        assert_eq!(non_blank(&Some(" Rust ".into())), Some("Rust"));
    }
}
