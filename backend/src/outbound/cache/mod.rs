//! Redis adapters for the student snapshot cache and refresh tokens.
//!
//! Both adapters share one `bb8` pool of multiplexed connections.

mod pool;
mod refresh_token_store;
mod student_cache;

pub use pool::{RedisPool, RedisPoolConfig, RedisPoolError};
pub use refresh_token_store::RedisRefreshTokenStore;
pub use student_cache::RedisStudentCache;
