// Password reset token generation and hashing.
// Raw tokens leave the system (email); only SHA-256 hashes are stored.

use base64::prelude::*;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Lifetime of a password reset token
const RESET_TOKEN_TTL_MINUTES: i64 = 15;

/// A freshly generated reset token pair
#[derive(Debug)]
pub struct ResetTokenInfo {
    /// Raw token (to send to the user)
    pub token: String,
    /// Hashed token (to store in the database)
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}

/// Generate a cryptographically secure password reset token.
/// 32 random bytes (256 bits of entropy), base64url encoded for safe
/// transmission, hashed with SHA-256 for storage at rest.
pub fn generate_reset_token() -> ResetTokenInfo {
    let mut token_bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut token_bytes);

    let token = BASE64_URL_SAFE_NO_PAD.encode(token_bytes);
    let token_hash = hash_token(&token);
    let expires_at = Utc::now() + Duration::minutes(RESET_TOKEN_TTL_MINUTES);

    ResetTokenInfo {
        token,
        token_hash,
        expires_at,
    }
}

/// SHA-256 hash of a raw token, hex encoded
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Constant-time comparison of a raw token against a stored hash
pub fn token_matches(raw_token: &str, stored_hash: &str) -> bool {
    let computed = hash_token(raw_token);
    computed.as_bytes().ct_eq(stored_hash.as_bytes()).into()
}
