//! Student resource handlers.
//!
//! ```text
//! POST   /api/students
//! GET    /api/students/{id}
//! PUT    /api/students/{id}  {"lastName":"King","courses":["cs-1"]}
//! DELETE /api/students/{id}
//! GET    /api/students/{id}/courses
//! ```
//!
//! Every route requires a bearer access token.

use actix_web::http::header::LOCATION;
use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Age, Error, FirstName, LastName, Registration, StudentChanges};
use crate::inbound::http::ApiResult;
use crate::inbound::http::accounts::RegistrationRequest;
use crate::inbound::http::auth::AuthenticatedStudent;
use crate::inbound::http::schemas::{CourseResponse, ErrorSchema, StudentResponse};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{parse_courses, parse_student_id, student_field_error};

/// Partial update body. Email is immutable and rejected as an unknown field.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateStudentRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<i64>,
    /// Replaces the whole course list when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub courses: Option<Vec<String>>,
}

impl TryFrom<UpdateStudentRequest> for StudentChanges {
    type Error = Error;

    fn try_from(value: UpdateStudentRequest) -> Result<Self, Self::Error> {
        let first_name = value
            .first_name
            .map(FirstName::new)
            .transpose()
            .map_err(student_field_error)?;
        let last_name = value
            .last_name
            .map(LastName::new)
            .transpose()
            .map_err(student_field_error)?;
        let age = value
            .age
            .map(Age::from_i64)
            .transpose()
            .map_err(student_field_error)?;
        let courses = value.courses.map(parse_courses).transpose()?;
        StudentChanges::new(first_name, last_name, age, courses).map_err(student_field_error)
    }
}

/// Create a student on behalf of an authenticated caller.
#[utoipa::path(
    post,
    path = "/api/students",
    request_body = RegistrationRequest,
    responses(
        (status = 201, description = "Student created", body = StudentResponse,
            headers(("Location" = String, description = "URL of the new student"))),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 409, description = "Email already registered", body = ErrorSchema)
    ),
    tags = ["students"],
    operation_id = "createStudent"
)]
#[post("/students")]
pub async fn create_student(
    state: web::Data<HttpState>,
    _caller: AuthenticatedStudent,
    payload: web::Json<RegistrationRequest>,
) -> ApiResult<HttpResponse> {
    let registration = Registration::try_from(payload.into_inner())?;
    let student = state
        .students
        .create_student(registration, state.deadline())
        .await?;
    Ok(HttpResponse::Created()
        .insert_header((LOCATION, format!("/api/students/{}", student.id())))
        .json(StudentResponse::from(&student)))
}

/// Fetch a student by id.
#[utoipa::path(
    get,
    path = "/api/students/{id}",
    params(("id" = String, Path, description = "Student UUID")),
    responses(
        (status = 200, description = "Student", body = StudentResponse),
        (status = 400, description = "Invalid id", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["students"],
    operation_id = "getStudentById"
)]
#[get("/students/{id}")]
pub async fn get_student(
    state: web::Data<HttpState>,
    _caller: AuthenticatedStudent,
    path: web::Path<String>,
) -> ApiResult<web::Json<StudentResponse>> {
    let id = parse_student_id(&path)?;
    let student = state
        .students
        .get_student_by_id(&id, state.deadline())
        .await?;
    Ok(web::Json(StudentResponse::from(&student)))
}

/// Apply a partial update and return the stored student.
#[utoipa::path(
    put,
    path = "/api/students/{id}",
    params(("id" = String, Path, description = "Student UUID")),
    request_body = UpdateStudentRequest,
    responses(
        (status = 200, description = "Updated student", body = StudentResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["students"],
    operation_id = "updateStudent"
)]
#[put("/students/{id}")]
pub async fn update_student(
    state: web::Data<HttpState>,
    _caller: AuthenticatedStudent,
    path: web::Path<String>,
    payload: web::Json<UpdateStudentRequest>,
) -> ApiResult<web::Json<StudentResponse>> {
    let id = parse_student_id(&path)?;
    let changes = StudentChanges::try_from(payload.into_inner())?;
    let student = state
        .students
        .update_student(&id, &changes, state.deadline())
        .await?;
    Ok(web::Json(StudentResponse::from(&student)))
}

#[utoipa::path(
    delete,
    path = "/api/students/{id}",
    params(("id" = String, Path, description = "Student UUID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 400, description = "Invalid id", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["students"],
    operation_id = "deleteStudent"
)]
#[delete("/students/{id}")]
pub async fn delete_student(
    state: web::Data<HttpState>,
    _caller: AuthenticatedStudent,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = parse_student_id(&path)?;
    state.students.delete_student(&id, state.deadline()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Course details for a student, fetched from the course service.
#[utoipa::path(
    get,
    path = "/api/students/{id}/courses",
    params(("id" = String, Path, description = "Student UUID")),
    responses(
        (status = 200, description = "Courses", body = [CourseResponse]),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 503, description = "Course service unavailable", body = ErrorSchema),
        (status = 504, description = "Course service timed out", body = ErrorSchema)
    ),
    tags = ["students"],
    operation_id = "getStudentCourses"
)]
#[get("/students/{id}/courses")]
pub async fn get_student_courses(
    state: web::Data<HttpState>,
    _caller: AuthenticatedStudent,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<CourseResponse>>> {
    let id = parse_student_id(&path)?;
    let courses = state
        .students
        .get_student_courses(&id, state.deadline())
        .await?;
    Ok(web::Json(
        courses.into_iter().map(CourseResponse::from).collect(),
    ))
}
