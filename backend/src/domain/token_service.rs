//! Access and refresh token lifecycle.
//!
//! Access tokens are short-lived signed claims checked without any storage
//! access. Refresh tokens are opaque values whose only record lives in the
//! refresh token store, so revoking one is a cache delete.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use tracing::{debug, error};

use crate::domain::ports::{AccessTokenCodec, RefreshTokenStore, RefreshTokenStoreError};
use crate::domain::{AccessClaims, AccessToken, Deadline, Error, RefreshToken, StudentId};

/// Lifetime of issued tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenLifetimes {
    pub access: Duration,
    pub refresh: Duration,
}

impl Default for TokenLifetimes {
    fn default() -> Self {
        Self {
            access: Duration::from_secs(60 * 60),
            refresh: Duration::from_secs(30 * 24 * 60 * 60),
        }
    }
}

/// Why a refresh token was not accepted.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RefreshTokenRejection {
    /// Token text is not a well-formed refresh token.
    #[error("refresh token is malformed")]
    Invalid,
    /// No live token matches; it expired, was revoked, or never existed.
    #[error("refresh token is unknown or expired")]
    NotFound,
    /// The token store could not be consulted.
    #[error(transparent)]
    Store(Error),
}

impl From<RefreshTokenRejection> for Error {
    fn from(value: RefreshTokenRejection) -> Self {
        match value {
            RefreshTokenRejection::Store(err) => err,
            rejection => Self::unauthorized(rejection.to_string()),
        }
    }
}

/// Issues and validates access and refresh tokens.
#[derive(Clone)]
pub struct TokenService {
    codec: Arc<dyn AccessTokenCodec>,
    refresh_tokens: Arc<dyn RefreshTokenStore>,
    clock: Arc<dyn Clock>,
    lifetimes: TokenLifetimes,
}

impl TokenService {
    pub fn new(
        codec: Arc<dyn AccessTokenCodec>,
        refresh_tokens: Arc<dyn RefreshTokenStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            codec,
            refresh_tokens,
            clock,
            lifetimes: TokenLifetimes::default(),
        }
    }

    #[must_use]
    pub fn with_lifetimes(mut self, lifetimes: TokenLifetimes) -> Self {
        self.lifetimes = lifetimes;
        self
    }

    fn map_store_error(error: RefreshTokenStoreError) -> Error {
        match error {
            RefreshTokenStoreError::Connection { message } => {
                Error::service_unavailable(format!("refresh token store unavailable: {message}"))
            }
            RefreshTokenStoreError::Command { message } => {
                Error::internal(format!("refresh token store error: {message}"))
            }
        }
    }

    /// Sign a fresh access token for `student_id`.
    pub fn issue_access_token(&self, student_id: &StudentId) -> Result<AccessToken, Error> {
        let access_ttl = TimeDelta::from_std(self.lifetimes.access)
            .map_err(|err| Error::internal(format!("access token lifetime out of range: {err}")))?;
        let issued_at = self.clock.utc().timestamp();
        let expires_at = issued_at.saturating_add(access_ttl.num_seconds());
        let claims = AccessClaims {
            sub: student_id.to_string(),
            iat: issued_at,
            exp: expires_at,
        };
        let token = self.codec.encode(&claims).map_err(|err| {
            error!(error = %err, student_id = %student_id, "failed to sign access token");
            Error::internal("failed to sign access token")
        })?;
        let expires_at = DateTime::<Utc>::from_timestamp(expires_at, 0)
            .ok_or_else(|| Error::internal("access token expiry out of range"))?;
        Ok(AccessToken {
            student_id: *student_id,
            token,
            expires_at,
        })
    }

    /// Check signature and expiry, returning the token's subject.
    ///
    /// A token is valid strictly before its `exp` second; every failure is
    /// reported as `unauthorized`.
    pub fn verify_access_token(&self, token: &str) -> Result<StudentId, Error> {
        let claims = self.codec.decode(token).map_err(|err| {
            debug!(error = %err, "access token rejected");
            Error::unauthorized("invalid access token")
        })?;
        if self.clock.utc().timestamp() >= claims.exp {
            debug!(sub = %claims.sub, exp = claims.exp, "access token expired");
            return Err(Error::unauthorized("access token expired"));
        }
        StudentId::new(&claims.sub).map_err(|_| Error::unauthorized("invalid access token"))
    }

    /// Generate and persist a refresh token, replacing any previous one.
    pub async fn issue_refresh_token(
        &self,
        student_id: &StudentId,
        deadline: Deadline,
    ) -> Result<RefreshToken, Error> {
        let token = RefreshToken::generate();
        let ttl = self.lifetimes.refresh;
        let write = async {
            self.refresh_tokens
                .store(student_id, &token, ttl)
                .await
                .map_err(Self::map_store_error)
        };
        deadline.run("refresh token write", write).await?;
        Ok(token)
    }

    /// Resolve a refresh token to the student it was issued to.
    pub async fn validate_refresh_token(
        &self,
        raw: &str,
        deadline: Deadline,
    ) -> Result<StudentId, RefreshTokenRejection> {
        let token = RefreshToken::parse(raw).map_err(|_| RefreshTokenRejection::Invalid)?;
        let lookup = async {
            self.refresh_tokens
                .lookup(&token)
                .await
                .map_err(Self::map_store_error)
        };
        deadline
            .run("refresh token lookup", lookup)
            .await
            .map_err(RefreshTokenRejection::Store)?
            .ok_or(RefreshTokenRejection::NotFound)
    }

    /// Drop the student's refresh token. Revoking twice succeeds.
    pub async fn revoke_refresh_token(
        &self,
        student_id: &StudentId,
        deadline: Deadline,
    ) -> Result<(), Error> {
        let revoke = async {
            self.refresh_tokens
                .revoke(student_id)
                .await
                .map_err(Self::map_store_error)
        };
        deadline.run("refresh token revoke", revoke).await
    }
}
