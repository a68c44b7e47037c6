//! Participant invitation tokens.
//!
//! Tokens are opaque random strings handed to the inviter once. Only their
//! SHA-256 hex digest is stored, so a database leak does not expose live links.

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Generate a fresh token. Returns `(plaintext, sha256_hex_hash)`.
pub fn generate_invitation_token() -> (String, String) {
    let plaintext = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
    let hash = hash_invitation_token(&plaintext);
    (plaintext, hash)
}

/// SHA-256 hex digest of a token, for lookup against the stored hash.
pub fn hash_invitation_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}
