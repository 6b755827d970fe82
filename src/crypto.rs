//! Token generation, token hashing and password hashing.

use argon2::password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::Rng;
use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

use crate::TeamError;

/// Default token length in characters.
pub const DEFAULT_TOKEN_LENGTH: usize = 32;

/// Generates a URL-safe random token of `length` alphanumeric characters.
///
/// Drawn from the operating system CSPRNG. Each character carries about
/// 5.95 bits of entropy, so the default length gives roughly 190 bits.
///
/// ```rust
/// use covenant::crypto::generate_token;
///
/// let token = generate_token(32);
/// assert_eq!(token.len(), 32);
/// assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
/// ```
pub fn generate_token(length: usize) -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// Hashes a token with SHA-256 for storage.
///
/// Tokens are high-entropy, so a fast unsalted hash is sufficient and keeps
/// the hash usable as a lookup key.
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Password hashing used when creating accounts.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<String, TeamError>;

    fn verify(&self, password: &str, hash: &str) -> Result<bool, TeamError>;
}

/// Argon2id hasher.
#[derive(Debug, Clone)]
pub struct Argon2Hasher {
    /// Memory cost in KiB
    memory_cost: u32,
    time_cost: u32,
    parallelism: u32,
}

impl Default for Argon2Hasher {
    fn default() -> Self {
        Self {
            memory_cost: 19456,
            time_cost: 2,
            parallelism: 1,
        }
    }
}

impl Argon2Hasher {
    #[must_use]
    pub fn new(memory_cost: u32, time_cost: u32, parallelism: u32) -> Self {
        Self {
            memory_cost,
            time_cost,
            parallelism,
        }
    }

    /// Cheap parameters for tests. Never use in production.
    #[must_use]
    pub fn insecure_fast() -> Self {
        Self::new(256, 1, 1)
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<String, TeamError> {
        let salt = SaltString::generate(&mut OsRng);
        let params = Params::new(self.memory_cost, self.time_cost, self.parallelism, None)
            .map_err(|_| TeamError::PasswordHashError)?;

        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|_| TeamError::PasswordHashError)
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, TeamError> {
        let parsed = PasswordHash::new(hash).map_err(|_| TeamError::PasswordHashError)?;

        // params come from the encoded hash
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_token_length() {
        assert_eq!(generate_token(32).len(), 32);
        assert_eq!(generate_token(48).len(), 48);
    }

    #[test]
    fn test_generate_token_unique() {
        assert_ne!(generate_token(32), generate_token(32));
    }

    #[test]
    fn test_generate_token_url_safe() {
        let token = generate_token(200);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_hash_token() {
        assert_eq!(hash_token("abc123"), hash_token("abc123"));
        assert_ne!(hash_token("token1"), hash_token("token2"));
        assert_eq!(hash_token("anytoken").len(), 64);
    }

    #[test]
    fn test_argon2_roundtrip() {
        let hasher = Argon2Hasher::insecure_fast();
        let hash = hasher.hash("correct horse").unwrap();

        assert!(hasher.verify("correct horse", &hash).unwrap());
        assert!(!hasher.verify("wrong horse", &hash).unwrap());
    }

    #[test]
    fn test_argon2_malformed_hash() {
        let hasher = Argon2Hasher::insecure_fast();
        assert_eq!(
            hasher.verify("pw", "not-a-hash").unwrap_err(),
            TeamError::PasswordHashError
        );
    }
}
