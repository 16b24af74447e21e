use axum::http::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};

use super::role::Role;

pub type UserId = i32;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_EMAIL_HEADER: &str = "x-user-email";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Signed payload of a session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: UserId,
    pub email: String,
    pub role: Role,
    /// Unique per issuance so two sessions issued in the same second hash differently
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

/// Verified identity of the caller, recomputed from the token on every request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: UserId,
    pub email: String,
    pub role: Role,
}

impl Identity {
    pub fn new(user_id: UserId, email: impl Into<String>, role: Role) -> Self {
        Self {
            user_id,
            email: email.into(),
            role,
        }
    }

    pub fn has_role(&self, required: Role) -> bool {
        self.role.grants(required)
    }

    /// Write the identity headers handlers downstream of the session middleware read
    pub fn write_headers(&self, headers: &mut HeaderMap) {
        headers.insert(
            HeaderName::from_static(USER_ID_HEADER),
            HeaderValue::from(self.user_id),
        );
        if let Ok(email) = HeaderValue::from_str(&self.email) {
            headers.insert(HeaderName::from_static(USER_EMAIL_HEADER), email);
        }
        headers.insert(
            HeaderName::from_static(USER_ROLE_HEADER),
            HeaderValue::from_static(self.role.as_str()),
        );
    }
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.user_id,
            email: claims.email,
            role: claims.role,
        }
    }
}

/// Remove identity headers a client may have supplied itself
pub fn strip_identity_headers(headers: &mut HeaderMap) {
    for name in [USER_ID_HEADER, USER_EMAIL_HEADER, USER_ROLE_HEADER] {
        headers.remove(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claims_use_camel_case_user_id_on_the_wire() {
        let claims = Claims {
            user_id: 7,
            email: "a@b.co".into(),
            role: Role::User,
            jti: "x".into(),
            iat: 1,
            exp: 2,
        };
        let value = serde_json::to_value(&claims).unwrap();
        assert_eq!(value["userId"], 7);
        assert_eq!(value["role"], "user");
    }

    #[test]
    fn writes_and_strips_identity_headers() {
        let mut headers = HeaderMap::new();
        Identity::new(7, "student@example.com", Role::Admin).write_headers(&mut headers);
        assert_eq!(headers[USER_ID_HEADER], "7");
        assert_eq!(headers[USER_EMAIL_HEADER], "student@example.com");
        assert_eq!(headers[USER_ROLE_HEADER], "admin");

        strip_identity_headers(&mut headers);
        assert!(headers.is_empty());
    }
}
