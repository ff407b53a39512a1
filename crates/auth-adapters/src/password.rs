//! # Argon2 password hashing
//!
//! Argon2id implementation of `PasswordHasher`. Hashes are PHC strings, so
//! the salt and parameters travel with the hash.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Argon2,
};
use domains::{DomainError, PasswordHasher, Result};

#[derive(Default)]
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
}

impl Argon2Hasher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|_| DomainError::Internal("Failed to hash password".into()))
    }

    /// Verifies if a provided password matches a stored Argon2 hash.
    fn verify(&self, password: &str, hash: &str) -> Result<bool> {
        let parsed = PasswordHash::new(hash).map_err(|_| {
            tracing::error!("stored password hash is not a valid PHC string");
            DomainError::Internal("Invalid password hash format".into())
        })?;

        Ok(self
            .argon2
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}
