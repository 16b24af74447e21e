use serde::Serialize;

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Outcome of a password strength check. `errors` lists every violated rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PasswordValidation {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

impl PasswordValidation {
    pub fn first_error(&self) -> Option<&str> {
        self.errors.first().map(String::as_str)
    }
}

/// Validate password strength
///
/// Rules are checked in a fixed order: length, uppercase, lowercase, digit.
pub fn validate_password(password: &str) -> PasswordValidation {
    let mut errors = Vec::new();

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        errors.push(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        ));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        errors.push("Password must contain at least one uppercase letter".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        errors.push("Password must contain at least one lowercase letter".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        errors.push("Password must contain at least one number".to_string());
    }

    PasswordValidation {
        is_valid: errors.is_empty(),
        errors,
    }
}

/// Validate email format
///
/// Accepts `local@domain` with no whitespace, exactly one `@`, and a domain
/// holding a dot that is neither its first nor its last character.
pub fn validate_email_format(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email cannot be empty".to_string());
    }
    if email.chars().any(char::is_whitespace) {
        return Err("Invalid email format".to_string());
    }

    let mut parts = email.split('@');
    let (local, domain) = match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => (local, domain),
        _ => return Err("Invalid email format".to_string()),
    };
    if local.is_empty() {
        return Err("Invalid email format".to_string());
    }

    // Some dot in the domain must have text on both sides
    let has_inner_dot = domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len());
    if has_inner_dot {
        Ok(())
    } else {
        Err("Invalid email format".to_string())
    }
}

/// Hash password for storage. Blocking: call from `spawn_blocking` in async code.
pub fn hash_password(password: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, cost)
}

/// Verify password against a stored bcrypt hash. Blocking.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
    bcrypt::verify(password, hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_password_cites_minimum_length() {
        let result = validate_password("short1A");
        assert!(!result.is_valid);
        assert_eq!(
            result.first_error(),
            Some("Password must be at least 8 characters long")
        );
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn missing_uppercase_is_reported() {
        let result = validate_password("longenough1");
        assert!(!result.is_valid);
        assert_eq!(
            result.errors,
            vec!["Password must contain at least one uppercase letter".to_string()]
        );
    }

    #[test]
    fn strong_password_is_valid() {
        let result = validate_password("LongEnough1");
        assert!(result.is_valid);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn reports_every_violated_rule() {
        let result = validate_password("");
        assert_eq!(result.errors.len(), 4);
        assert!(result.errors[3].contains("number"));
    }

    #[test]
    fn email_format() {
        assert!(validate_email_format("student@example.com").is_ok());
        assert!(validate_email_format("a.b+c@sub.example.org").is_ok());
        assert!(validate_email_format("").is_err());
        assert!(validate_email_format("no-at-sign.com").is_err());
        assert!(validate_email_format("two@@example.com").is_err());
        assert!(validate_email_format("user@localhost").is_err());
        assert!(validate_email_format("user@.com").is_err());
        assert!(validate_email_format("us er@example.com").is_err());
        assert!(validate_email_format("a@x.com.").is_ok());
        assert!(validate_email_format("a@x..com").is_ok());
        assert!(validate_email_format("a@x.").is_err());
        assert!(validate_email_format("a@.").is_err());
    }

    #[test]
    fn hashes_and_verifies_passwords() {
        let hash = hash_password("LongEnough1", 4).unwrap();
        assert!(verify_password("LongEnough1", &hash).unwrap());
        assert!(!verify_password("WrongPass1", &hash).unwrap());
    }
}
