//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_web::body::MessageBody;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, test as actix_test, web};
use serde_json::Value;

use crate::domain::ports::MockStudentUseCases;
use crate::inbound::http::state::HttpState;
use crate::middleware::Trace;

/// Build an application serving the `/api` routes over the given mock.
pub fn test_app(
    students: MockStudentUseCases,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let state = web::Data::new(HttpState::new(Arc::new(students)));
    App::new()
        .app_data(state)
        .wrap(Trace)
        .service(web::scope("/api").configure(super::configure))
}

/// Mock whose bearer token `good` authenticates as `student`.
pub fn authenticating(student: crate::domain::StudentId) -> MockStudentUseCases {
    let mut students = MockStudentUseCases::new();
    students.expect_authenticate().returning(move |token| {
        if token == "good" {
            Ok(student)
        } else {
            Err(crate::domain::Error::unauthorized("invalid access token"))
        }
    });
    students
}

/// Read a JSON response body.
pub async fn json_body(response: ServiceResponse<impl MessageBody>) -> Value {
    let body = actix_test::read_body(response).await;
    serde_json::from_slice(&body).expect("json body")
}

/// A valid stored student attending `math-101`.
pub fn sample_student(id: crate::domain::StudentId) -> crate::domain::Student {
    use crate::domain::{Age, CourseId, Email, FirstName, LastName, NewStudent, PasswordHash};
    use std::collections::BTreeSet;

    crate::domain::Student::from_new(
        id,
        NewStudent {
            first_name: FirstName::new("Ada").expect("first name"),
            last_name: LastName::new("Lovelace").expect("last name"),
            email: Email::new("ada@example.com").expect("email"),
            password_hash: PasswordHash::new("$argon2id$v=19$m=8,t=1,p=1$c2FsdA$aGFzaA"),
            age: Some(Age::new(36).expect("age")),
            courses: BTreeSet::from([CourseId::new("math-101").expect("course")]),
        },
    )
}
