//! Port for signing and verifying access tokens.

use crate::domain::AccessClaims;

use super::define_port_error;

define_port_error! {
    /// Failures raised while encoding or decoding access tokens.
    pub enum AccessTokenError {
        /// Token text is not a well-formed token.
        Malformed { message: String } => "access token is malformed: {message}",
        /// Signature or algorithm check failed.
        InvalidSignature => "access token signature is invalid",
        /// Claims could not be signed.
        Encoding { message: String } => "access token could not be signed: {message}",
    }
}

/// Signs claims into compact tokens and verifies them back.
///
/// Expiry is not checked here; the token service compares `exp` against its
/// injected clock.
#[cfg_attr(test, mockall::automock)]
pub trait AccessTokenCodec: Send + Sync {
    fn encode(&self, claims: &AccessClaims) -> Result<String, AccessTokenError>;

    fn decode(&self, token: &str) -> Result<AccessClaims, AccessTokenError>;
}
