//! Server construction and middleware wiring.

mod config;
pub(crate) mod jwt_secret;
#[cfg(feature = "metrics")]
pub(crate) mod metrics;
mod state_builders;

pub use config::{AppSettings, ServerConfig};
pub use state_builders::StartupError;

use actix_web::body::MessageBody;
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use zeroize::Zeroizing;

#[cfg(debug_assertions)]
use student_records::ApiDoc;
use student_records::Trace;
use student_records::inbound::http::configure;
use student_records::inbound::http::health::{HealthState, live, ready};
use student_records::inbound::http::state::HttpState;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

fn build_app(
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .wrap(Trace)
        .service(web::scope("/api").configure(configure))
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app
}

/// Assemble the service graph from settings.
///
/// # Errors
/// Returns [`StartupError`] when a dependency cannot be configured.
pub async fn build_state(
    settings: &AppSettings,
    secret: &Zeroizing<Vec<u8>>,
) -> Result<web::Data<HttpState>, StartupError> {
    let state = state_builders::build_http_state(settings, secret).await?;
    Ok(web::Data::new(state))
}

/// Bind the HTTP server and mark the service ready.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let server_health_state = health_state.clone();
    let ServerConfig {
        bind_addr,
        #[cfg(feature = "metrics")]
        prometheus,
    } = config;

    #[cfg(feature = "metrics")]
    let prometheus = match prometheus {
        Some(prometheus) => prometheus,
        None => metrics::build_metrics()?,
    };

    let server = HttpServer::new(move || {
        let app = build_app(server_health_state.clone(), http_state.clone());

        #[cfg(feature = "metrics")]
        let app = app.wrap(prometheus.clone());

        app
    })
    .bind(bind_addr)?
    .shutdown_timeout(10)
    .run();

    health_state.mark_ready();
    tracing::info!(%bind_addr, "listening");
    Ok(server)
}
