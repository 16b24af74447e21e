use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Account role carried in session claims and stored in `users.role`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub const ALL: &'static [Role] = &[Role::User, Role::Admin];

    /// Roles whose permissions this role includes. Admin expands to every role.
    pub fn capabilities(self) -> &'static [Role] {
        match self {
            Role::User => &[Role::User],
            Role::Admin => Role::ALL,
        }
    }

    pub fn grants(self, required: Role) -> bool {
        self.capabilities().contains(&required)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

// Lets `sqlx(try_from = "String")` decode the `users.role` column
impl TryFrom<String> for Role {
    type Error = UnknownRole;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
