//! Port for cache-resident refresh tokens.

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{RefreshToken, StudentId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by refresh token stores.
    pub enum RefreshTokenStoreError {
        /// Backend unreachable.
        Connection { message: String } => "refresh token store unavailable: {message}",
        /// Backend rejected a command or returned unreadable data.
        Command { message: String } => "refresh token store command failed: {message}",
    }
}

/// Stores at most one live refresh token per student.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// Persist `token` for `student_id`, replacing any previous token.
    async fn store(
        &self,
        student_id: &StudentId,
        token: &RefreshToken,
        ttl: Duration,
    ) -> Result<(), RefreshTokenStoreError>;

    /// Student the token belongs to, or `None` if unknown or expired.
    async fn lookup(&self, token: &RefreshToken)
    -> Result<Option<StudentId>, RefreshTokenStoreError>;

    /// Drop the student's token. Revoking an absent token succeeds.
    async fn revoke(&self, student_id: &StudentId) -> Result<(), RefreshTokenStoreError>;
}
