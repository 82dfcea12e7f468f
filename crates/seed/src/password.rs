//! Password hashing for bootstrap accounts.
//!
//! Hashes are Argon2id PHC strings. Production parameters are memory 2^16 KiB,
//! 3 iterations, 1 lane; tests use [`HashingParams::insecure_fast`].

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHasher as _, SaltString, rand_core::OsRng},
};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

/// Errors raised while hashing.
#[derive(Debug, Error)]
pub enum PasswordError {
    /// The Argon2 parameters were rejected.
    #[error("invalid hashing parameters: {0}")]
    Params(String),

    /// Hashing itself failed.
    #[error("password hashing failed: {0}")]
    Hash(String),

    /// The blocking hash task panicked or was cancelled.
    #[error("password hashing task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashingParams {
    /// Memory cost in KiB.
    pub memory_kib: u32,
    /// Number of iterations.
    pub iterations: u32,
    /// Degree of parallelism.
    pub parallelism: u32,
}

impl Default for HashingParams {
    fn default() -> Self {
        Self {
            memory_kib: 1 << 16,
            iterations: 3,
            parallelism: 1,
        }
    }
}

impl HashingParams {
    /// Minimal parameters for tests and dry runs. Never use for stored accounts.
    #[must_use]
    pub const fn insecure_fast() -> Self {
        Self {
            memory_kib: 64,
            iterations: 1,
            parallelism: 1,
        }
    }
}

/// Hashes passwords with Argon2id.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    params: Params,
}

impl PasswordHasher {
    /// Build a hasher with the given cost parameters.
    ///
    /// # Errors
    ///
    /// Returns `PasswordError::Params` if Argon2 rejects the parameters.
    pub fn new(params: HashingParams) -> Result<Self, PasswordError> {
        let params = Params::new(
            params.memory_kib,
            params.iterations,
            params.parallelism,
            None,
        )
        .map_err(|e| PasswordError::Params(e.to_string()))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash on the current thread.
    ///
    /// # Errors
    ///
    /// Returns `PasswordError::Hash` if hashing fails.
    pub fn hash_blocking(&self, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| PasswordError::Hash(e.to_string()))
    }

    /// Hash on the blocking thread pool and wait for the result.
    ///
    /// # Errors
    ///
    /// Returns `PasswordError` if hashing fails or the task is lost.
    pub async fn hash(&self, password: &SecretString) -> Result<String, PasswordError> {
        let hasher = self.clone();
        let password = password.clone();
        tokio::task::spawn_blocking(move || hasher.hash_blocking(password.expose_secret())).await?
    }
}
