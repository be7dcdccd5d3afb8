//! Password hashing port and its Argon2id implementation.

use argon2::password_hash::{
    rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
};
use argon2::{Algorithm, Argon2, Params, Version};

use crate::domain::error::DomainError;

/// Turns a plaintext password into a self-describing hash string and checks
/// candidates against it.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<String, DomainError>;

    fn verify(&self, password: &str, hash: &str) -> Result<bool, DomainError>;
}

/// Argon2id with a random 16-byte salt, emitting PHC strings
/// (`$argon2id$v=19$m=...,t=...,p=...$salt$hash`).
#[derive(Clone)]
pub struct Argon2Hasher {
    params: Params,
}

impl Argon2Hasher {
    pub fn new(memory_kib: u32, iterations: u32, parallelism: u32) -> Result<Self, DomainError> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|e| DomainError::password_hashing(e.to_string()))?;
        Ok(Self { params })
    }

    fn engine(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl Default for Argon2Hasher {
    fn default() -> Self {
        Self {
            params: Params::default(),
        }
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<String, DomainError> {
        let salt = SaltString::generate(&mut OsRng);
        self.engine()
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| DomainError::password_hashing(e.to_string()))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, DomainError> {
        let parsed =
            PasswordHash::new(hash).map_err(|e| DomainError::password_hashing(e.to_string()))?;
        // Parameters come from the PHC string, not from `self.params`.
        Ok(self
            .engine()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}
