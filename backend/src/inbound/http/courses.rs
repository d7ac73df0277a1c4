//! Course roster handler.

use actix_web::{get, web};

use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthenticatedStudent;
use crate::inbound::http::schemas::{ErrorSchema, StudentResponse};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::parse_course_id;

/// Students attending a course, ordered by id.
#[utoipa::path(
    get,
    path = "/api/courses/{courseId}/students",
    params(("courseId" = String, Path, description = "Course identifier")),
    responses(
        (status = 200, description = "Students attending the course", body = [StudentResponse]),
        (status = 400, description = "Invalid course id", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["courses"],
    operation_id = "getStudentsByCourseId"
)]
#[get("/courses/{courseId}/students")]
pub async fn list_course_students(
    state: web::Data<HttpState>,
    _caller: AuthenticatedStudent,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<StudentResponse>>> {
    let course = parse_course_id(path.into_inner())?;
    let students = state
        .students
        .get_students_by_course_id(&course, state.deadline())
        .await?;
    Ok(web::Json(students.iter().map(StudentResponse::from).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StudentId;
    use crate::inbound::http::test_utils::{authenticating, json_body, sample_student, test_app};
    use actix_web::http::StatusCode;
    use actix_web::http::header::AUTHORIZATION;
    use actix_web::test as actix_test;
    use serde_json::json;

    #[actix_web::test]
    async fn lists_students_attending_the_course() {
        let caller = StudentId::random();
        let attendee = StudentId::random();
        let mut students = authenticating(caller);
        students
            .expect_get_students_by_course_id()
            .withf(|course, _| course.as_ref() == "math-101")
            .times(1)
            .returning(move |_, _| Ok(vec![sample_student(attendee)]));
        let app = actix_test::init_service(test_app(students)).await;
        let request = actix_test::TestRequest::get()
            .uri("/api/courses/math-101/students")
            .insert_header((AUTHORIZATION, "Bearer good"))
            .to_request();

        let response = actix_test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body[0]["id"], json!(attendee.to_string()));
        assert_eq!(body.as_array().map(Vec::len), Some(1));
    }

    #[actix_web::test]
    async fn unknown_course_is_an_empty_list() {
        let mut students = authenticating(StudentId::random());
        students
            .expect_get_students_by_course_id()
            .returning(|_, _| Ok(Vec::new()));
        let app = actix_test::init_service(test_app(students)).await;
        let request = actix_test::TestRequest::get()
            .uri("/api/courses/nobody-takes-this/students")
            .insert_header((AUTHORIZATION, "Bearer good"))
            .to_request();

        let response = actix_test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!([]));
    }

    #[actix_web::test]
    async fn roster_requires_authentication() {
        let mut students = authenticating(StudentId::random());
        students.expect_get_students_by_course_id().never();
        let app = actix_test::init_service(test_app(students)).await;
        let request = actix_test::TestRequest::get()
            .uri("/api/courses/math-101/students")
            .to_request();

        let response = actix_test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
