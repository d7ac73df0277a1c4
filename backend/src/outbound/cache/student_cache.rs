//! Redis-backed `StudentCache`.

use std::time::Duration;

use async_trait::async_trait;
use bb8_redis::redis::AsyncCommands;

use crate::domain::ports::{CacheKey, StudentCache, StudentCacheError};

use super::pool::{RedisFailure, RedisPool, expiry_seconds};

/// Stores student snapshots as plain Redis strings.
#[derive(Clone)]
pub struct RedisStudentCache {
    pool: RedisPool,
}

impl RedisStudentCache {
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }
}

fn map_failure(failure: RedisFailure) -> StudentCacheError {
    match failure {
        RedisFailure::Connection(message) => StudentCacheError::connection(message),
        RedisFailure::Command(message) => StudentCacheError::command(message),
    }
}

fn map_redis_error(error: bb8_redis::redis::RedisError) -> StudentCacheError {
    map_failure(RedisFailure::from(error))
}

#[async_trait]
impl StudentCache for RedisStudentCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<String>, StudentCacheError> {
        let mut conn = self.pool.get().await.map_err(map_failure)?;
        conn.get::<_, Option<String>>(key.as_str())
            .await
            .map_err(map_redis_error)
    }

    async fn set(
        &self,
        key: &CacheKey,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<(), StudentCacheError> {
        let mut conn = self.pool.get().await.map_err(map_failure)?;
        match ttl {
            Some(ttl) => conn
                .set_ex::<_, _, ()>(key.as_str(), value, expiry_seconds(ttl))
                .await
                .map_err(map_redis_error),
            None => conn
                .set::<_, _, ()>(key.as_str(), value)
                .await
                .map_err(map_redis_error),
        }
    }

    async fn delete(&self, key: &CacheKey) -> Result<(), StudentCacheError> {
        let mut conn = self.pool.get().await.map_err(map_failure)?;
        conn.del::<_, ()>(key.as_str())
            .await
            .map_err(map_redis_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(RedisFailure::Connection("refused".into()), StudentCacheError::connection("refused"))]
    #[case(RedisFailure::Command("WRONGTYPE".into()), StudentCacheError::command("WRONGTYPE"))]
    fn failures_map_to_port_errors(
        #[case] failure: RedisFailure,
        #[case] expected: StudentCacheError,
    ) {
        assert_eq!(map_failure(failure), expected);
    }
}
