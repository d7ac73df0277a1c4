//! Application settings loaded via OrthoConfig.
//!
//! Values come from `STUDENTS_*` environment variables, an optional
//! configuration file and command-line flags. Token secrets are handled
//! separately by [`super::jwt_secret`].

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

#[cfg(feature = "metrics")]
use actix_web_prom::PrometheusMetrics;

const DEFAULT_BIND_ADDR: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 8000);
const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";
const DEFAULT_COURSE_SERVICE_URL: &str = "http://localhost:8080";
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_COURSE_LIST_TTL_SECS: u64 = 300;
const DEFAULT_EMPTY_COURSE_LIST_TTL_SECS: u64 = 30;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_ACCESS_TOKEN_TTL_SECS: u64 = 60 * 60;
const DEFAULT_REFRESH_TOKEN_TTL_SECS: u64 = 30 * 24 * 60 * 60;

/// Runtime settings for the student records service.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "STUDENTS")]
pub struct AppSettings {
    /// Socket address the HTTP server binds to.
    pub bind_addr: Option<SocketAddr>,
    /// PostgreSQL connection URL. Required.
    pub database_url: Option<String>,
    /// Redis URL for the record cache and refresh tokens.
    pub redis_url: Option<String>,
    /// Base URL of the course service.
    pub course_service_url: Option<String>,
    /// Per-request deadline in milliseconds.
    pub request_timeout_ms: Option<u64>,
    /// Cache TTL for non-empty course lists.
    pub course_list_ttl_secs: Option<u64>,
    /// Cache TTL for empty course lists.
    pub empty_course_list_ttl_secs: Option<u64>,
    pub db_max_connections: Option<u32>,
    pub access_token_ttl_secs: Option<u64>,
    pub refresh_token_ttl_secs: Option<u64>,
    /// Apply embedded migrations before serving.
    #[ortho_config(default = true)]
    pub run_migrations: bool,
}

/// A required setting was not supplied.
#[derive(Debug, thiserror::Error)]
#[error("missing required setting {name} (set STUDENTS_{env})")]
pub struct MissingSetting {
    pub name: &'static str,
    pub env: &'static str,
}

impl AppSettings {
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr.unwrap_or(DEFAULT_BIND_ADDR)
    }

    /// # Errors
    /// Returns [`MissingSetting`] when no database URL is configured.
    pub fn database_url(&self) -> Result<&str, MissingSetting> {
        self.database_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or(MissingSetting {
                name: "database_url",
                env: "DATABASE_URL",
            })
    }

    pub fn redis_url(&self) -> &str {
        self.redis_url.as_deref().unwrap_or(DEFAULT_REDIS_URL)
    }

    pub fn course_service_url(&self) -> &str {
        self.course_service_url
            .as_deref()
            .unwrap_or(DEFAULT_COURSE_SERVICE_URL)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms.unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS))
    }

    pub fn course_list_ttl(&self) -> Duration {
        Duration::from_secs(
            self.course_list_ttl_secs
                .unwrap_or(DEFAULT_COURSE_LIST_TTL_SECS),
        )
    }

    pub fn empty_course_list_ttl(&self) -> Duration {
        Duration::from_secs(
            self.empty_course_list_ttl_secs
                .unwrap_or(DEFAULT_EMPTY_COURSE_LIST_TTL_SECS),
        )
    }

    pub fn db_max_connections(&self) -> u32 {
        self.db_max_connections
            .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS)
    }

    pub fn access_token_ttl(&self) -> Duration {
        Duration::from_secs(
            self.access_token_ttl_secs
                .unwrap_or(DEFAULT_ACCESS_TOKEN_TTL_SECS),
        )
    }

    pub fn refresh_token_ttl(&self) -> Duration {
        Duration::from_secs(
            self.refresh_token_ttl_secs
                .unwrap_or(DEFAULT_REFRESH_TOKEN_TTL_SECS),
        )
    }
}

/// Everything `create_server` needs besides the HTTP state.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    #[cfg(feature = "metrics")]
    pub(crate) prometheus: Option<PrometheusMetrics>,
}

impl ServerConfig {
    #[must_use]
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            #[cfg(feature = "metrics")]
            prometheus: None,
        }
    }

    /// Use a pre-built Prometheus middleware instead of the default one.
    #[cfg(feature = "metrics")]
    #[must_use]
    pub fn with_metrics(mut self, prometheus: PrometheusMetrics) -> Self {
        self.prometheus = Some(prometheus);
        self
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for settings parsing.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 11] = [
        "STUDENTS_BIND_ADDR",
        "STUDENTS_DATABASE_URL",
        "STUDENTS_REDIS_URL",
        "STUDENTS_COURSE_SERVICE_URL",
        "STUDENTS_REQUEST_TIMEOUT_MS",
        "STUDENTS_COURSE_LIST_TTL_SECS",
        "STUDENTS_EMPTY_COURSE_LIST_TTL_SECS",
        "STUDENTS_DB_MAX_CONNECTIONS",
        "STUDENTS_ACCESS_TOKEN_TTL_SECS",
        "STUDENTS_REFRESH_TOKEN_TTL_SECS",
        "STUDENTS_RUN_MIGRATIONS",
    ];

    fn load_from_empty_args() -> AppSettings {
        AppSettings::load_from_iter([OsString::from("student-records")])
            .expect("config should load")
    }

    fn cleared() -> Vec<(&'static str, Option<String>)> {
        VARS.iter().map(|name| (*name, None)).collect()
    }

    #[rstest]
    fn defaults_apply_when_unset() {
        let _guard = lock_env(cleared());

        let settings = load_from_empty_args();

        assert_eq!(settings.bind_addr(), SocketAddr::from(([0, 0, 0, 0], 8000)));
        assert_eq!(settings.redis_url(), DEFAULT_REDIS_URL);
        assert_eq!(settings.course_service_url(), DEFAULT_COURSE_SERVICE_URL);
        assert_eq!(settings.request_timeout(), Duration::from_secs(5));
        assert_eq!(settings.course_list_ttl(), Duration::from_secs(300));
        assert_eq!(settings.empty_course_list_ttl(), Duration::from_secs(30));
        assert_eq!(settings.db_max_connections(), 10);
        assert_eq!(settings.access_token_ttl(), Duration::from_secs(3600));
        assert!(settings.run_migrations);
    }

    #[rstest]
    fn database_url_is_required() {
        let _guard = lock_env(cleared());

        let err = load_from_empty_args()
            .database_url()
            .expect_err("no database url");

        assert!(err.to_string().contains("STUDENTS_DATABASE_URL"));
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let mut vars = cleared();
        vars.extend([
            ("STUDENTS_BIND_ADDR", Some("127.0.0.1:9000".to_owned())),
            (
                "STUDENTS_DATABASE_URL",
                Some("postgres://localhost/students".to_owned()),
            ),
            ("STUDENTS_REQUEST_TIMEOUT_MS", Some("250".to_owned())),
            ("STUDENTS_EMPTY_COURSE_LIST_TTL_SECS", Some("5".to_owned())),
            ("STUDENTS_RUN_MIGRATIONS", Some("false".to_owned())),
        ]);
        let _guard = lock_env(vars);

        let settings = load_from_empty_args();

        assert_eq!(settings.bind_addr(), SocketAddr::from(([127, 0, 0, 1], 9000)));
        assert_eq!(
            settings.database_url().expect("database url"),
            "postgres://localhost/students"
        );
        assert_eq!(settings.request_timeout(), Duration::from_millis(250));
        assert_eq!(settings.empty_course_list_ttl(), Duration::from_secs(5));
        assert!(!settings.run_migrations);
    }
}
