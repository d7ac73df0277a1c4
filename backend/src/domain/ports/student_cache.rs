//! Port interface for the student snapshot cache.
//!
//! The cache stores opaque strings; the record store owns the snapshot
//! encoding so adapters stay format-agnostic.

use std::time::Duration;

use async_trait::async_trait;

use super::{CacheKey, define_port_error};

define_port_error! {
    /// Errors surfaced by cache adapters.
    pub enum StudentCacheError {
        /// Cache backend is unreachable or the pool is exhausted.
        Connection { message: String } => "student cache unavailable: {message}",
        /// The backend rejected a command.
        Command { message: String } => "student cache command failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StudentCache: Send + Sync {
    /// Read the value stored under `key`, if any.
    async fn get(&self, key: &CacheKey) -> Result<Option<String>, StudentCacheError>;

    /// Store `value` under `key`. `None` means no expiry.
    async fn set(
        &self,
        key: &CacheKey,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<(), StudentCacheError>;

    /// Remove `key`. Removing a missing key succeeds.
    async fn delete(&self, key: &CacheKey) -> Result<(), StudentCacheError>;
}
