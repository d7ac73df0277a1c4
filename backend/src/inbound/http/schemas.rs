//! OpenAPI schema definitions and shared response bodies.
//!
//! Domain types remain framework-agnostic by not deriving `ToSchema`. This
//! module provides the schema wrappers required for OpenAPI documentation
//! plus the JSON shapes shared by several handler modules.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::Student;
use crate::domain::ports::CourseDetails;

/// OpenAPI schema for [`crate::domain::ErrorCode`].
///
/// Stable machine-readable error codes returned in API error responses.
#[derive(ToSchema)]
#[schema(as = crate::domain::ErrorCode)]
pub enum ErrorCodeSchema {
    /// The request is malformed or fails validation.
    #[schema(rename = "invalid_request")]
    InvalidRequest,
    /// Missing, invalid or expired token.
    #[schema(rename = "unauthorized")]
    Unauthorized,
    /// Unknown email or wrong password.
    #[schema(rename = "authentication_failed")]
    AuthenticationFailed,
    /// The requested resource does not exist.
    #[schema(rename = "not_found")]
    NotFound,
    /// The email is already registered.
    #[schema(rename = "conflict")]
    Conflict,
    /// The request exceeded its deadline.
    #[schema(rename = "timeout")]
    Timeout,
    /// A backing service is unreachable.
    #[schema(rename = "service_unavailable")]
    ServiceUnavailable,
    /// An unexpected error occurred on the server.
    #[schema(rename = "internal_error")]
    InternalError,
}

/// OpenAPI schema for [`crate::domain::Error`].
#[derive(ToSchema)]
#[schema(as = crate::domain::Error, rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct ErrorSchema {
    /// Stable machine-readable error code.
    #[schema(example = "invalid_request")]
    code: ErrorCodeSchema,
    /// Human-readable message returned to clients.
    #[schema(example = "email must look like local@domain")]
    message: String,
    /// Correlation identifier matching the `Trace-Id` header.
    #[schema(example = "6f1c1d0e-4b7a-4d8e-9a39-0b9b7c3f5e21")]
    trace_id: Option<String>,
    /// Supplementary error details, such as the offending field.
    details: Option<serde_json::Value>,
}

/// Public view of a student. The password hash is never included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudentResponse {
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    pub id: String,
    #[schema(example = "Ada")]
    pub first_name: String,
    #[schema(example = "Lovelace")]
    pub last_name: String,
    #[schema(example = "ada@example.com")]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = 36)]
    pub age: Option<u8>,
    #[schema(example = json!(["cs-1", "math-101"]))]
    pub courses: Vec<String>,
}

impl From<&Student> for StudentResponse {
    fn from(student: &Student) -> Self {
        Self {
            id: student.id().to_string(),
            first_name: student.first_name().to_string(),
            last_name: student.last_name().to_string(),
            email: student.email().to_string(),
            age: student.age().map(|age| age.years()),
            courses: student
                .courses()
                .iter()
                .map(|course| course.to_string())
                .collect(),
        }
    }
}

/// Course details reported by the course service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseResponse {
    #[schema(example = "math-101")]
    pub id: String,
    #[schema(example = "Calculus I")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl From<CourseDetails> for CourseResponse {
    fn from(course: CourseDetails) -> Self {
        Self {
            id: course.id,
            name: course.name,
            description: course.description,
        }
    }
}
