//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every `/api` route, the health probes, the request
//! and response bodies, and the bearer-token security scheme. Swagger UI
//! serves it in debug builds; `cargo run --bin openapi-dump` prints it.

use crate::inbound::http::accounts::{
    AccessTokenResponse, RefreshRequest, RegistrationRequest, SignInRequest, SignInResponse,
};
use crate::inbound::http::schemas::{CourseResponse, ErrorCodeSchema, ErrorSchema, StudentResponse};
use crate::inbound::http::students::UpdateStudentRequest;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Register the bearer access-token scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "BearerAuth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .description(Some("Access token issued by POST /api/auth/sign-in."))
                    .build(),
            ),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Student records API",
        description = "Student registration, token authentication and record management."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("BearerAuth" = [])),
    paths(
        crate::inbound::http::accounts::sign_up,
        crate::inbound::http::accounts::sign_in,
        crate::inbound::http::accounts::refresh,
        crate::inbound::http::accounts::logout,
        crate::inbound::http::students::create_student,
        crate::inbound::http::students::get_student,
        crate::inbound::http::students::update_student,
        crate::inbound::http::students::delete_student,
        crate::inbound::http::students::get_student_courses,
        crate::inbound::http::courses::list_course_students,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        StudentResponse,
        CourseResponse,
        RegistrationRequest,
        SignInRequest,
        SignInResponse,
        RefreshRequest,
        AccessTokenResponse,
        UpdateStudentRequest,
    )),
    tags(
        (name = "auth", description = "Registration and token lifecycle"),
        (name = "students", description = "Student records"),
        (name = "courses", description = "Course rosters"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
