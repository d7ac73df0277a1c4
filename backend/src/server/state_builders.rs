//! Builders wiring outbound adapters into the domain services.

use std::sync::Arc;

use mockable::DefaultClock;
use reqwest::Url;
use tracing::info;
use zeroize::Zeroizing;

use student_records::domain::{
    CacheAsideStudentStore, CourseListTtls, StudentService, TokenLifetimes, TokenService,
};
use student_records::inbound::http::state::HttpState;
use student_records::outbound::cache::{
    RedisPool, RedisPoolConfig, RedisPoolError, RedisRefreshTokenStore, RedisStudentCache,
};
use student_records::outbound::courses::HttpCourseCatalogue;
use student_records::outbound::persistence::{
    DbPool, DieselStudentRepository, PoolConfig, PoolError, run_pending_migrations,
};
use student_records::outbound::security::{Argon2PasswordHasher, EmptySecret, JwtAccessTokenCodec};

use super::config::{AppSettings, MissingSetting};

/// Failures while assembling the service graph.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Settings(#[from] MissingSetting),
    #[error("database: {0}")]
    Database(#[from] PoolError),
    #[error("redis: {0}")]
    Redis(#[from] RedisPoolError),
    #[error("invalid course service url: {0}")]
    CourseServiceUrl(#[from] url::ParseError),
    #[error("course service client: {0}")]
    CourseClient(#[from] reqwest::Error),
    #[error("access token codec: {0}")]
    Codec(#[from] EmptySecret),
}

impl From<StartupError> for std::io::Error {
    fn from(value: StartupError) -> Self {
        std::io::Error::other(value.to_string())
    }
}

async fn build_db_pool(settings: &AppSettings) -> Result<DbPool, StartupError> {
    let url = settings.database_url()?;
    if settings.run_migrations {
        run_pending_migrations(url).await?;
    }
    let pool = DbPool::new(PoolConfig::new(url).with_max_size(settings.db_max_connections())).await?;
    Ok(pool)
}

fn build_token_service(
    settings: &AppSettings,
    redis: &RedisPool,
    secret: &Zeroizing<Vec<u8>>,
) -> Result<TokenService, StartupError> {
    let codec = JwtAccessTokenCodec::new(secret)?;
    Ok(TokenService::new(
        Arc::new(codec),
        Arc::new(RedisRefreshTokenStore::new(redis.clone())),
        Arc::new(DefaultClock),
    )
    .with_lifetimes(TokenLifetimes {
        access: settings.access_token_ttl(),
        refresh: settings.refresh_token_ttl(),
    }))
}

/// Build the shared HTTP state from settings.
///
/// # Errors
/// Returns [`StartupError`] when a dependency cannot be configured.
pub(super) async fn build_http_state(
    settings: &AppSettings,
    secret: &Zeroizing<Vec<u8>>,
) -> Result<HttpState, StartupError> {
    let db = build_db_pool(settings).await?;
    let redis = RedisPool::new(RedisPoolConfig::new(settings.redis_url()))?;

    let records = CacheAsideStudentStore::new(
        Arc::new(DieselStudentRepository::new(db)),
        Arc::new(RedisStudentCache::new(redis.clone())),
    )
    .with_course_list_ttls(CourseListTtls {
        populated: settings.course_list_ttl(),
        empty: settings.empty_course_list_ttl(),
    });
    let tokens = build_token_service(settings, &redis, secret)?;
    let courses = HttpCourseCatalogue::new(
        Url::parse(settings.course_service_url())?,
        settings.request_timeout(),
    )?;

    let students = StudentService::new(
        Arc::new(records),
        Arc::new(Argon2PasswordHasher::default()),
        tokens,
        Arc::new(courses),
    );
    info!(
        redis = settings.redis_url(),
        course_service = settings.course_service_url(),
        "service graph assembled"
    );
    Ok(HttpState::new(Arc::new(students)).with_request_timeout(settings.request_timeout()))
}
