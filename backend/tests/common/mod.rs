//! Shared helpers for the HTTP integration suites.
//!
//! Each suite builds the real actix application over the in-memory adapters
//! from `student_records::test_support`, so requests exercise routing,
//! extraction, the use-case layer, the cache-aside store and the token
//! service together.

#![allow(dead_code, reason = "each suite uses a different subset")]

use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{App, test, web};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Value, json};

use student_records::Trace;
use student_records::inbound::http::configure;
use student_records::inbound::http::state::HttpState;
use student_records::test_support::TestHarness;

pub const PASSWORD: &str = "correct horse battery staple";

pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub fn harness() -> TestHarness {
    TestHarness::new(start())
}

pub fn app(
    harness: &TestHarness,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody + use<>>,
        Error = actix_web::Error,
        InitError = (),
    > + use<>,
> {
    App::new()
        .app_data(web::Data::new(HttpState::new(harness.use_cases())))
        .wrap(Trace)
        .service(web::scope("/api").configure(configure))
}

pub fn registration(email: &str, courses: &[&str]) -> Value {
    json!({
        "firstName": "Ada",
        "lastName": "Lovelace",
        "email": email,
        "password": PASSWORD,
        "age": 36,
        "courses": courses,
    })
}

pub fn bearer(token: &str) -> (actix_web::http::header::HeaderName, String) {
    (AUTHORIZATION, format!("Bearer {token}"))
}

/// Send a request and decode the JSON body, if any.
pub async fn send<S, B>(app: &S, request: test::TestRequest) -> (StatusCode, Value)
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let response = test::call_service(app, request.to_request()).await;
    let status = response.status();
    let body = test::read_body(response).await;
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).expect("json body")
    };
    (status, value)
}

/// Tokens returned by sign-in.
pub struct Session {
    pub student_id: String,
    pub token: String,
    pub refresh_token: String,
}

/// Register `email` and sign in, returning the issued tokens.
pub async fn signed_up_session<S, B>(app: &S, email: &str, courses: &[&str]) -> Session
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let (status, student) = send(
        app,
        test::TestRequest::post()
            .uri("/api/auth/sign-up")
            .set_json(registration(email, courses)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "sign-up failed: {student}");

    let (status, tokens) = send(
        app,
        test::TestRequest::post()
            .uri("/api/auth/sign-in")
            .set_json(json!({ "email": email, "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "sign-in failed: {tokens}");

    Session {
        student_id: student["id"].as_str().expect("id").to_owned(),
        token: tokens["token"].as_str().expect("token").to_owned(),
        refresh_token: tokens["refreshToken"]
            .as_str()
            .expect("refresh token")
            .to_owned(),
    }
}
