// Password hashing and verification utilities using Argon2id

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use thiserror::Error;

/// Errors that can occur during password operations
#[derive(Error, Debug)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    HashingError(String),

    #[error("Failed to verify password: {0}")]
    VerificationError(String),

    #[error("Invalid password hash format")]
    InvalidHashFormat,
}

/// Configuration for Argon2 password hashing
/// Using Argon2id variant as recommended by OWASP
pub struct PasswordConfig {
    /// Memory cost in KiB (default: 19456 = 19 MiB)
    pub memory_cost: u32,
    /// Time cost (iterations, default: 2)
    pub time_cost: u32,
    /// Parallelism factor (default: 1)
    pub parallelism: u32,
    /// Output hash length in bytes (default: 32)
    pub output_length: usize,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        // OWASP recommended minimum parameters for Argon2id
        // https://cheatsheetseries.owasp.org/cheatsheets/Password_Storage_Cheat_Sheet.html
        Self {
            memory_cost: 19456,
            time_cost: 2,
            parallelism: 1,
            output_length: 32,
        }
    }
}

impl PasswordConfig {
    fn build_hasher(&self) -> Result<Argon2<'static>, PasswordError> {
        let params = Params::new(
            self.memory_cost,
            self.time_cost,
            self.parallelism,
            Some(self.output_length),
        )
        .map_err(|e| PasswordError::HashingError(e.to_string()))?;

        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

/// Hash a password using Argon2id with secure defaults
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    hash_password_with_config(password, &PasswordConfig::default())
}

/// Hash a password using Argon2id with custom configuration
pub fn hash_password_with_config(
    password: &str,
    config: &PasswordConfig,
) -> Result<String, PasswordError> {
    let argon2 = config.build_hasher()?;
    let salt = SaltString::generate(&mut OsRng);

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashingError(e.to_string()))?;

    // PHC string format: includes algorithm, version, params, salt and hash
    Ok(password_hash.to_string())
}

/// Verify a password against a hashed password in PHC string format
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| PasswordError::InvalidHashFormat)?;

    // Default Argon2 extracts params from the hash itself
    let argon2 = Argon2::default();

    match argon2.verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerificationError(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Keep test hashing cheap; production defaults are exercised by format checks
    fn fast_config() -> PasswordConfig {
        PasswordConfig {
            memory_cost: 1024,
            time_cost: 1,
            parallelism: 1,
            output_length: 32,
        }
    }

    #[test]
    fn test_hash_and_verify_roundtrip() {
        let hash = hash_password_with_config("correct horse battery staple", &fast_config())
            .expect("hashing should succeed");

        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse battery staple", &hash).unwrap());
        assert!(!verify_password("wrong password", &hash).unwrap());
    }

    #[test]
    fn test_unique_salts() {
        let config = fast_config();
        let h1 = hash_password_with_config("same-password", &config).unwrap();
        let h2 = hash_password_with_config("same-password", &config).unwrap();
        assert_ne!(h1, h2);
    }

    #[test]
    fn test_invalid_hash_format() {
        let result = verify_password("anything", "not-a-phc-string");
        assert!(matches!(result, Err(PasswordError::InvalidHashFormat)));
    }
}
