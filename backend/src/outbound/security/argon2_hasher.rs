//! Argon2id implementation of the `PasswordHasher` port.
//!
//! Hashing is CPU-bound and deliberately slow, so both operations run on
//! Tokio's blocking pool rather than an async worker.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{
    self, PasswordHash as PhcHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
};
use argon2::{Algorithm, Argon2, Params, Version};
use async_trait::async_trait;
use zeroize::Zeroizing;

use crate::domain::PasswordHash;
use crate::domain::ports::{HashingError, PasswordHasher};

/// Longest plaintext accepted, in bytes.
pub const MAX_PASSWORD_BYTES: usize = 1024;

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Argon2Cost {
    /// Memory in KiB.
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for Argon2Cost {
    fn default() -> Self {
        Self {
            memory_kib: 19_456,
            iterations: 2,
            parallelism: 1,
        }
    }
}

/// Salted Argon2id hasher producing PHC strings.
#[derive(Debug, Clone)]
pub struct Argon2PasswordHasher {
    params: Params,
}

impl Argon2PasswordHasher {
    /// Build a hasher with explicit cost parameters.
    ///
    /// # Errors
    /// Returns [`HashingError::Primitive`] when Argon2 rejects the parameters.
    pub fn with_cost(cost: Argon2Cost) -> Result<Self, HashingError> {
        let params = Params::new(cost.memory_kib, cost.iterations, cost.parallelism, None)
            .map_err(|err| HashingError::primitive(err.to_string()))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    fn check_length(plaintext: &str) -> Result<(), HashingError> {
        if plaintext.len() > MAX_PASSWORD_BYTES {
            return Err(HashingError::input_too_long(MAX_PASSWORD_BYTES));
        }
        Ok(())
    }
}

impl Default for Argon2PasswordHasher {
    fn default() -> Self {
        Self {
            params: Params::new(19_456, 2, 1, None).unwrap_or_default(),
        }
    }
}

fn hash_blocking(argon2: &Argon2<'_>, plaintext: &[u8]) -> Result<PasswordHash, HashingError> {
    let salt = SaltString::generate(&mut OsRng);
    argon2
        .hash_password(plaintext, &salt)
        .map(|hash| PasswordHash::new(hash.to_string()))
        .map_err(|err| HashingError::primitive(err.to_string()))
}

fn verify_blocking(argon2: &Argon2<'_>, plaintext: &[u8], encoded: &str) -> Result<bool, HashingError> {
    let parsed =
        PhcHash::new(encoded).map_err(|err| HashingError::malformed_hash(err.to_string()))?;
    match argon2.verify_password(plaintext, &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(err) => Err(HashingError::primitive(err.to_string())),
    }
}

async fn run_blocking<T, F>(work: F) -> Result<T, HashingError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, HashingError> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|err| HashingError::primitive(format!("hashing task failed: {err}")))?
}

#[async_trait]
impl PasswordHasher for Argon2PasswordHasher {
    async fn hash(&self, plaintext: &str) -> Result<PasswordHash, HashingError> {
        Self::check_length(plaintext)?;
        let argon2 = self.argon2();
        let plaintext = Zeroizing::new(plaintext.as_bytes().to_vec());
        run_blocking(move || hash_blocking(&argon2, &plaintext)).await
    }

    async fn verify(&self, plaintext: &str, hash: &PasswordHash) -> Result<bool, HashingError> {
        Self::check_length(plaintext)?;
        let argon2 = self.argon2();
        let plaintext = Zeroizing::new(plaintext.as_bytes().to_vec());
        let encoded = hash.as_str().to_owned();
        run_blocking(move || verify_blocking(&argon2, &plaintext, &encoded)).await
    }
}
