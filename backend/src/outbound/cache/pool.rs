//! Redis connection pool shared by the cache adapters.

use std::time::Duration;

use bb8_redis::RedisConnectionManager;
use bb8_redis::bb8::{self, PooledConnection, RunError};
use bb8_redis::redis::RedisError;
use tracing::debug;

/// Failure building the pool.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to build redis pool: {message}")]
pub struct RedisPoolError {
    message: String,
}

/// Coarse outcome of a failed Redis call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RedisFailure {
    /// Server unreachable, connection dropped, or checkout timed out.
    Connection(String),
    /// The server answered with an error or unexpected data.
    Command(String),
}

impl From<RedisError> for RedisFailure {
    fn from(error: RedisError) -> Self {
        debug!(error = %error, "redis call failed");
        if error.is_io_error()
            || error.is_connection_refusal()
            || error.is_connection_dropped()
            || error.is_timeout()
        {
            Self::Connection(error.to_string())
        } else {
            Self::Command(error.to_string())
        }
    }
}

impl From<RunError<RedisError>> for RedisFailure {
    fn from(error: RunError<RedisError>) -> Self {
        match error {
            RunError::User(err) => Self::Connection(err.to_string()),
            RunError::TimedOut => Self::Connection("redis pool checkout timed out".to_owned()),
        }
    }
}

/// Pool sizing and timeouts.
#[derive(Debug, Clone)]
pub struct RedisPoolConfig {
    url: String,
    max_size: u32,
    connection_timeout: Duration,
}

impl RedisPoolConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_size: 16,
            connection_timeout: Duration::from_secs(2),
        }
    }

    #[must_use]
    pub fn with_max_size(mut self, max_size: u32) -> Self {
        self.max_size = max_size.max(1);
        self
    }

    #[must_use]
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }
}

/// Cloneable handle to a `bb8` pool of multiplexed Redis connections.
#[derive(Clone)]
pub struct RedisPool {
    inner: bb8::Pool<RedisConnectionManager>,
}

impl RedisPool {
    /// Build the pool. Connections open lazily, so an unreachable server is
    /// reported by the first command rather than here. Must be called from
    /// within a Tokio runtime.
    ///
    /// # Errors
    /// Returns [`RedisPoolError`] if the URL cannot be parsed.
    pub fn new(config: RedisPoolConfig) -> Result<Self, RedisPoolError> {
        let manager = RedisConnectionManager::new(config.url.as_str()).map_err(|err| {
            RedisPoolError {
                message: err.to_string(),
            }
        })?;
        let inner = bb8::Pool::builder()
            .max_size(config.max_size)
            .connection_timeout(config.connection_timeout)
            .build_unchecked(manager);
        Ok(Self { inner })
    }

    pub(crate) async fn get(
        &self,
    ) -> Result<PooledConnection<'_, RedisConnectionManager>, RedisFailure> {
        self.inner.get().await.map_err(RedisFailure::from)
    }
}

/// Whole seconds for an `EX` argument. Redis rejects zero.
pub(crate) fn expiry_seconds(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}
