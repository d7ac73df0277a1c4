//! Redis-backed `RefreshTokenStore`.
//!
//! Two keys describe each live token:
//!
//! - `refresh:user:<student id>` holds the SHA-256 digest of the token.
//! - `refresh:token:<digest>` holds the student id.
//!
//! Both share the token's TTL. The plaintext token is never written, so a
//! cache dump cannot be replayed.
//!
//! Replacing and revoking read the user key and rewrite both keys, so each
//! runs as one Lua script. Redis executes a script without interleaving other
//! commands, which keeps the pair consistent under concurrent sign-ins and
//! logouts.

use std::time::Duration;

use async_trait::async_trait;
use bb8_redis::redis::{self, AsyncCommands};
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::domain::ports::{RefreshTokenStore, RefreshTokenStoreError};
use crate::domain::{RefreshToken, StudentId};

use super::pool::{RedisFailure, RedisPool, expiry_seconds};

const TOKEN_KEY_PREFIX: &str = "refresh:token:";

/// KEYS[1] user key; ARGV digest, owner, seconds, token key prefix.
const STORE_SCRIPT: &str = r"
local previous = redis.call('GET', KEYS[1])
if previous and previous ~= ARGV[1] then
  redis.call('DEL', ARGV[4] .. previous)
end
redis.call('SET', KEYS[1], ARGV[1], 'EX', ARGV[3])
redis.call('SET', ARGV[4] .. ARGV[1], ARGV[2], 'EX', ARGV[3])
return 1
";

/// KEYS[1] user key; ARGV token key prefix.
const REVOKE_SCRIPT: &str = r"
local current = redis.call('GET', KEYS[1])
redis.call('DEL', KEYS[1])
if current then
  redis.call('DEL', ARGV[1] .. current)
end
return 1
";

fn user_key(student_id: &StudentId) -> String {
    format!("refresh:user:{student_id}")
}

fn token_key(digest: &str) -> String {
    format!("{TOKEN_KEY_PREFIX}{digest}")
}

fn digest(token: &RefreshToken) -> String {
    hex::encode(Sha256::digest(token.as_str().as_bytes()))
}

fn store_command(student_id: &StudentId, digest: &str, ttl: Duration) -> redis::Cmd {
    let mut cmd = redis::cmd("EVAL");
    cmd.arg(STORE_SCRIPT)
        .arg(1)
        .arg(user_key(student_id))
        .arg(digest)
        .arg(student_id.to_string())
        .arg(expiry_seconds(ttl))
        .arg(TOKEN_KEY_PREFIX);
    cmd
}

fn revoke_command(student_id: &StudentId) -> redis::Cmd {
    let mut cmd = redis::cmd("EVAL");
    cmd.arg(REVOKE_SCRIPT)
        .arg(1)
        .arg(user_key(student_id))
        .arg(TOKEN_KEY_PREFIX);
    cmd
}

fn map_failure(failure: RedisFailure) -> RefreshTokenStoreError {
    match failure {
        RedisFailure::Connection(message) => RefreshTokenStoreError::connection(message),
        RedisFailure::Command(message) => RefreshTokenStoreError::command(message),
    }
}

fn map_redis_error(error: redis::RedisError) -> RefreshTokenStoreError {
    map_failure(RedisFailure::from(error))
}

/// Refresh token store keeping one token per student.
#[derive(Clone)]
pub struct RedisRefreshTokenStore {
    pool: RedisPool,
}

impl RedisRefreshTokenStore {
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RefreshTokenStore for RedisRefreshTokenStore {
    async fn store(
        &self,
        student_id: &StudentId,
        token: &RefreshToken,
        ttl: Duration,
    ) -> Result<(), RefreshTokenStoreError> {
        let mut conn = self.pool.get().await.map_err(map_failure)?;
        store_command(student_id, &digest(token), ttl)
            .query_async::<()>(&mut *conn)
            .await
            .map_err(map_redis_error)
    }

    async fn lookup(
        &self,
        token: &RefreshToken,
    ) -> Result<Option<StudentId>, RefreshTokenStoreError> {
        let mut conn = self.pool.get().await.map_err(map_failure)?;
        let owner: Option<String> = conn
            .get(token_key(&digest(token)))
            .await
            .map_err(map_redis_error)?;
        owner
            .map(|raw| {
                StudentId::new(&raw).map_err(|_| {
                    warn!("refresh token entry holds an invalid student id");
                    RefreshTokenStoreError::command("stored refresh token owner is not a UUID")
                })
            })
            .transpose()
    }

    async fn revoke(&self, student_id: &StudentId) -> Result<(), RefreshTokenStoreError> {
        let mut conn = self.pool.get().await.map_err(map_failure)?;
        revoke_command(student_id)
            .query_async::<()>(&mut *conn)
            .await
            .map_err(map_redis_error)
    }
}
