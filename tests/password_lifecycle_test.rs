// Password reset token lifecycle, end to end without a database

use chrono::{Duration, Utc};
use funnel_data_core::utils::password::{hash_password_with_config, verify_password, PasswordConfig};
use funnel_data_core::utils::reset_token::{generate_reset_token, hash_token, token_matches};

fn fast_config() -> PasswordConfig {
    PasswordConfig {
        memory_cost: 1024,
        time_cost: 1,
        parallelism: 1,
        output_length: 32,
    }
}

#[test]
fn test_reset_token_shape() {
    let info = generate_reset_token();

    // 32 random bytes, url-safe base64 without padding
    assert_eq!(info.token.len(), 43);
    // SHA-256 hex digest
    assert_eq!(info.token_hash.len(), 64);
    assert!(info.expires_at > Utc::now());
    assert!(info.expires_at <= Utc::now() + Duration::minutes(15));
}

#[test]
fn test_reset_token_matching() {
    let info = generate_reset_token();

    assert_eq!(hash_token(&info.token), info.token_hash);
    assert!(token_matches(&info.token, &info.token_hash));

    let other = generate_reset_token();
    assert!(!token_matches(&other.token, &info.token_hash));
}

#[test]
fn test_full_reset_flow() {
    // Simulates begin -> email -> complete without touching storage:
    // only the hash is ever persisted, the raw token travels to the user
    let old_hash =
        hash_password_with_config("old-password-123", &fast_config()).expect("hashing failed");
    let info = generate_reset_token();

    // The raw token presented later must map back to the stored hash
    let presented = info.token.clone();
    assert!(token_matches(&presented, &info.token_hash));

    let new_hash =
        hash_password_with_config("new-password-456", &fast_config()).expect("hashing failed");
    assert_ne!(old_hash, new_hash);
    assert!(verify_password("new-password-456", &new_hash).unwrap());
    assert!(!verify_password("old-password-123", &new_hash).unwrap());
}
