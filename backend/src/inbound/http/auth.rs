//! Bearer-token authentication extractor.
//!
//! Handlers that take an [`AuthenticatedStudent`] argument only run once the
//! `Authorization: Bearer <token>` header has been verified through the
//! driving port.

use actix_web::http::header::AUTHORIZATION;
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::{Ready, ready};
use tracing::debug;

use crate::domain::{Error, StudentId};
use crate::inbound::http::state::HttpState;

const BEARER_PREFIX: &str = "Bearer ";

/// Student identified by a valid access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedStudent(StudentId);

impl AuthenticatedStudent {
    pub fn id(&self) -> &StudentId {
        &self.0
    }
}

fn bearer_token(req: &HttpRequest) -> Result<&str, Error> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or_else(|| Error::unauthorized("missing bearer token"))?;
    let value = header
        .to_str()
        .map_err(|_| Error::unauthorized("malformed authorization header"))?;
    let token = value
        .get(..BEARER_PREFIX.len())
        .filter(|prefix| prefix.eq_ignore_ascii_case(BEARER_PREFIX))
        .and_then(|_| value.get(BEARER_PREFIX.len()..))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| Error::unauthorized("authorization header must use the Bearer scheme"))?;
    Ok(token)
}

fn authenticate(req: &HttpRequest) -> Result<AuthenticatedStudent, Error> {
    let state = req
        .app_data::<web::Data<HttpState>>()
        .ok_or_else(|| Error::internal("http state is not configured"))?;
    let token = bearer_token(req)?;
    let student_id = state.students.authenticate(token).inspect_err(|err| {
        debug!(error = %err, "bearer token rejected");
    })?;
    Ok(AuthenticatedStudent(student_id))
}

impl FromRequest for AuthenticatedStudent {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ports::MockStudentUseCases;
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, test};
    use rstest::rstest;
    use std::sync::Arc;

    const STUDENT: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";

    fn use_cases() -> MockStudentUseCases {
        let mut students = MockStudentUseCases::new();
        students.expect_authenticate().returning(|token| {
            if token == "good" {
                StudentId::new(STUDENT)
                    .map_err(|_| Error::internal("fixture id"))
            } else {
                Err(Error::unauthorized("invalid access token"))
            }
        });
        students
    }

    async fn call(header: Option<&str>) -> (StatusCode, Option<ErrorCode>, String) {
        let state = HttpState::new(Arc::new(use_cases()));
        let app = test::init_service(App::new().app_data(web::Data::new(state)).route(
            "/",
            web::get().to(|student: AuthenticatedStudent| async move {
                HttpResponse::Ok().body(student.id().to_string())
            }),
        ))
        .await;
        let mut req = test::TestRequest::get().uri("/");
        if let Some(value) = header {
            req = req.insert_header((AUTHORIZATION, value));
        }
        let res = test::call_service(&app, req.to_request()).await;
        let status = res.status();
        let body = test::read_body(res).await;
        let code = serde_json::from_slice::<Error>(&body)
            .ok()
            .map(|err| err.code());
        (status, code, String::from_utf8_lossy(&body).into_owned())
    }

    #[rstest]
    #[case("Bearer good")]
    #[case("bearer good")]
    #[case("Bearer   good  ")]
    #[actix_web::test]
    async fn valid_bearer_token_resolves_student(#[case] header: &str) {
        let (status, _, body) = call(Some(header)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, STUDENT);
    }

    #[rstest]
    #[case(None)]
    #[case(Some("Basic Zm9vOmJhcg=="))]
    #[case(Some("Bearer "))]
    #[case(Some("Bearer forged"))]
    #[actix_web::test]
    async fn missing_or_invalid_tokens_are_unauthorized(#[case] header: Option<&str>) {
        let (status, code, _) = call(header).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(code, Some(ErrorCode::Unauthorized));
    }
}
