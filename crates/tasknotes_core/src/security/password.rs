//! Password hashing.

use super::SecurityError;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{
    PasswordHash, PasswordHasher as PhcHasher, PasswordVerifier, SaltString,
};
use argon2::{Algorithm, Argon2, Params, Version};

/// Hashes and verifies account passwords.
pub trait PasswordHasher: Send + Sync {
    /// Returns a self-describing hash string for `plain`.
    fn hash_password(&self, plain: &str) -> Result<String, SecurityError>;
    /// Checks `plain` against a stored hash; malformed hashes never match.
    fn verify_password(&self, hash: &str, plain: &str) -> bool;
}

/// Argon2id hasher producing PHC strings (`$argon2id$v=19$...`).
#[derive(Debug, Clone)]
pub struct Argon2PasswordHasher {
    params: Params,
}

impl Argon2PasswordHasher {
    /// Hasher with explicit cost parameters (memory in KiB, iterations,
    /// lanes).
    pub fn with_cost(m_cost: u32, t_cost: u32, p_cost: u32) -> Result<Self, SecurityError> {
        let params = Params::new(m_cost, t_cost, p_cost, None)
            .map_err(|err| SecurityError::InvalidHasherParams(err.to_string()))?;
        Ok(Self { params })
    }

    /// Minimum-cost hasher for fixtures and tests. Not for production use.
    pub fn low_cost() -> Self {
        Self {
            params: Params::new(Params::MIN_M_COST, 1, 1, None).unwrap_or_default(),
        }
    }

    fn engine(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl Default for Argon2PasswordHasher {
    fn default() -> Self {
        Self {
            params: Params::default(),
        }
    }
}

impl PasswordHasher for Argon2PasswordHasher {
    fn hash_password(&self, plain: &str) -> Result<String, SecurityError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .engine()
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|err| SecurityError::Hashing(err.to_string()))?;
        Ok(hash.to_string())
    }

    fn verify_password(&self, hash: &str, plain: &str) -> bool {
        match PasswordHash::new(hash) {
            // Verification reads cost parameters from the hash itself.
            Ok(parsed) => Argon2::default()
                .verify_password(plain.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}
