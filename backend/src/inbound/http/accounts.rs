//! Account handlers: sign-up, sign-in, token refresh and logout.
//!
//! ```text
//! POST /api/auth/sign-up {"firstName":"Ada","lastName":"Lovelace","email":"ada@example.com","password":"pw","courses":[]}
//! POST /api/auth/sign-in {"email":"ada@example.com","password":"pw"}
//! POST /api/auth/refresh {"refreshToken":"<64 hex chars>"}
//! POST /api/auth/logout  (Authorization: Bearer <token>)
//! ```

use actix_web::{HttpResponse, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::domain::{
    Age, Email, Error, FirstName, LastName, Registration, RegistrationProfile, SignInCredentials,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthenticatedStudent;
use crate::inbound::http::schemas::{ErrorSchema, StudentResponse};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{credentials_error, parse_courses, student_field_error};

/// Registration body shared by sign-up and `POST /api/students`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    #[schema(example = "Ada")]
    pub first_name: String,
    #[schema(example = "Lovelace")]
    pub last_name: String,
    #[schema(example = "ada@example.com")]
    pub email: String,
    #[schema(example = "correct horse battery staple")]
    pub password: String,
    #[serde(default)]
    #[schema(example = 36)]
    pub age: Option<i64>,
    #[serde(default)]
    pub courses: Vec<String>,
}

impl TryFrom<RegistrationRequest> for Registration {
    type Error = Error;

    fn try_from(value: RegistrationRequest) -> Result<Self, Self::Error> {
        let profile = RegistrationProfile {
            first_name: FirstName::new(value.first_name).map_err(student_field_error)?,
            last_name: LastName::new(value.last_name).map_err(student_field_error)?,
            email: Email::new(value.email).map_err(student_field_error)?,
            age: value
                .age
                .map(Age::from_i64)
                .transpose()
                .map_err(student_field_error)?,
            courses: parse_courses(value.courses)?,
        };
        Registration::try_new(profile, &value.password).map_err(credentials_error)
    }
}

/// Sign-in request body.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignInRequest {
    #[schema(example = "ada@example.com")]
    pub email: String,
    pub password: String,
}

impl TryFrom<SignInRequest> for SignInCredentials {
    type Error = Error;

    fn try_from(value: SignInRequest) -> Result<Self, Self::Error> {
        let email = Email::new(value.email).map_err(student_field_error)?;
        SignInCredentials::try_from_parts(email, &value.password).map_err(credentials_error)
    }
}

/// Tokens issued on sign-in.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignInResponse {
    /// Bearer access token.
    pub token: String,
    /// Opaque refresh token for `POST /api/auth/refresh`.
    pub refresh_token: String,
    /// Access token expiry.
    #[schema(value_type = String, format = DateTime)]
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Access token minted from a refresh token.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenResponse {
    pub token: String,
    #[schema(value_type = String, format = DateTime)]
    pub expires_at: DateTime<Utc>,
}

/// Register a new student account.
#[utoipa::path(
    post,
    path = "/api/auth/sign-up",
    request_body = RegistrationRequest,
    responses(
        (status = 201, description = "Student registered", body = StudentResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 409, description = "Email already registered", body = ErrorSchema),
        (status = 503, description = "Dependency unavailable", body = ErrorSchema)
    ),
    tags = ["auth"],
    operation_id = "signUp",
    security([])
)]
#[post("/auth/sign-up")]
pub async fn sign_up(
    state: web::Data<HttpState>,
    payload: web::Json<RegistrationRequest>,
) -> ApiResult<HttpResponse> {
    let registration = Registration::try_from(payload.into_inner())?;
    let student = state
        .students
        .sign_up(registration, state.deadline())
        .await?;
    Ok(HttpResponse::Created().json(StudentResponse::from(&student)))
}

/// Exchange email and password for tokens.
///
/// Unknown emails and wrong passwords produce the same response.
#[utoipa::path(
    post,
    path = "/api/auth/sign-in",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Signed in", body = SignInResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Invalid credentials", body = ErrorSchema)
    ),
    tags = ["auth"],
    operation_id = "signIn",
    security([])
)]
#[post("/auth/sign-in")]
pub async fn sign_in(
    state: web::Data<HttpState>,
    payload: web::Json<SignInRequest>,
) -> ApiResult<web::Json<SignInResponse>> {
    let credentials = SignInCredentials::try_from(payload.into_inner())?;
    let tokens = state
        .students
        .sign_in(&credentials, state.deadline())
        .await?;
    Ok(web::Json(SignInResponse {
        token: tokens.access.token,
        refresh_token: tokens.refresh_token.as_str().to_owned(),
        expires_at: tokens.access.expires_at,
    }))
}

/// Mint a fresh access token. The refresh token is not rotated.
#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New access token", body = AccessTokenResponse),
        (status = 401, description = "Refresh token invalid, expired or revoked", body = ErrorSchema)
    ),
    tags = ["auth"],
    operation_id = "refreshToken",
    security([])
)]
#[post("/auth/refresh")]
pub async fn refresh(
    state: web::Data<HttpState>,
    payload: web::Json<RefreshRequest>,
) -> ApiResult<web::Json<AccessTokenResponse>> {
    let access = state
        .students
        .refresh_token(&payload.refresh_token, state.deadline())
        .await?;
    Ok(web::Json(AccessTokenResponse {
        token: access.token,
        expires_at: access.expires_at,
    }))
}

/// Revoke the caller's refresh token. Repeating the call succeeds.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 204, description = "Logged out"),
        (status = 401, description = "Missing or invalid access token", body = ErrorSchema)
    ),
    tags = ["auth"],
    operation_id = "logout"
)]
#[post("/auth/logout")]
pub async fn logout(
    state: web::Data<HttpState>,
    student: AuthenticatedStudent,
) -> ApiResult<HttpResponse> {
    state.students.logout(student.id(), state.deadline()).await?;
    info!(student_id = %student.id(), "logout accepted");
    Ok(HttpResponse::NoContent().finish())
}
