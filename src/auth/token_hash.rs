use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of a bearer credential. Used as the token store key
/// so raw credentials are never persisted.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}
