//! Port for one-way password hashing.

use async_trait::async_trait;

use crate::domain::PasswordHash;

use super::define_port_error;

define_port_error! {
    /// Failures raised by credential hashers.
    pub enum HashingError {
        /// Plaintext exceeds the primitive's input limit.
        InputTooLong { max: usize } => "password must be at most {max} bytes",
        /// The stored hash could not be parsed.
        MalformedHash { message: String } => "stored password hash is malformed: {message}",
        /// The hashing primitive itself failed.
        Primitive { message: String } => "password hashing failed: {message}",
    }
}

/// Slow, salted, one-way password hashing.
///
/// Implementations compare in constant time and may run on a blocking pool.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PasswordHasher: Send + Sync {
    /// Hash `plaintext` with a fresh salt.
    async fn hash(&self, plaintext: &str) -> Result<PasswordHash, HashingError>;

    /// Check `plaintext` against a stored hash.
    async fn verify(&self, plaintext: &str, hash: &PasswordHash) -> Result<bool, HashingError>;
}
