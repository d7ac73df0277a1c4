//! Student records service entry-point.

mod server;

use actix_web::web;
use mockable::DefaultEnv;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use server::jwt_secret::{BuildMode, jwt_secret_from_env};
use server::{AppSettings, ServerConfig, build_state, create_server};
use student_records::inbound::http::health::HealthState;

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load().map_err(|e| std::io::Error::other(e.to_string()))?;
    let secret = jwt_secret_from_env(&DefaultEnv::new(), BuildMode::from_debug_assertions())
        .map_err(std::io::Error::other)?;
    let http_state = build_state(&settings, &secret).await?;
    drop(secret);

    let config = ServerConfig::new(settings.bind_addr());
    #[cfg(feature = "metrics")]
    let config = config.with_metrics(server::metrics::build_metrics()?);

    let health_state = web::Data::new(HealthState::new());
    let result = create_server(health_state.clone(), http_state, config)?.await;
    health_state.mark_draining();
    info!("server stopped");
    result
}
