//! Password Hashing
//! Mission: Salted, adaptive hashing with a per-deployment cost factor

use bcrypt::BcryptError;
use thiserror::Error;

/// Cost factor for the adaptive hash.
#[derive(Debug, Clone, Copy)]
pub struct PasswordConfig {
    pub cost: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self { cost: 10 }
    }
}

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hash(#[from] BcryptError),
}

pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<String, PasswordError>;

    /// `Ok(false)` is a mismatch. `Err` means the stored hash is unusable.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordError>;
}

/// bcrypt at a configured cost
#[derive(Debug, Clone, Copy)]
pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    pub fn new(config: PasswordConfig) -> Self {
        Self { cost: config.cost }
    }
}

impl PasswordHasher for BcryptHasher {
    fn hash(&self, password: &str) -> Result<String, PasswordError> {
        Ok(bcrypt::hash(password, self.cost)?)
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordError> {
        Ok(bcrypt::verify(password, hash)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> BcryptHasher {
        // Minimum cost keeps the tests fast
        BcryptHasher::new(PasswordConfig { cost: 4 })
    }

    #[test]
    fn test_hash_and_verify() {
        let hasher = hasher();
        let hash = hasher.hash("correct horse").unwrap();
        assert_ne!(hash, "correct horse");
        assert!(hasher.verify("correct horse", &hash).unwrap());
        assert!(!hasher.verify("wrong horse", &hash).unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        let hasher = hasher();
        let a = hasher.hash("same-password").unwrap();
        let b = hasher.hash("same-password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_cost_is_embedded_in_hash() {
        let hash = hasher().hash("pw").unwrap();
        assert!(hash.contains("$04$"));
    }

    #[test]
    fn test_malformed_hash_is_error_not_mismatch() {
        assert!(hasher().verify("pw", "not-a-bcrypt-hash").is_err());
    }
}
