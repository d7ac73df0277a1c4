//! Tests for the domain error payload and its trace correlation.

use super::*;
use rstest::{fixture, rstest};
use serde_json::json;

const TRACE_ID: &str = "00000000-0000-0000-0000-000000000000";

#[fixture]
fn expected_trace_id() -> String {
    TRACE_ID.to_owned()
}

#[rstest]
#[case(Error::invalid_request("bad"), ErrorCode::InvalidRequest)]
#[case(Error::unauthorized("no token"), ErrorCode::Unauthorized)]
#[case(
    Error::authentication_failed("invalid email or password"),
    ErrorCode::AuthenticationFailed
)]
#[case(Error::not_found("missing"), ErrorCode::NotFound)]
#[case(Error::conflict("taken"), ErrorCode::Conflict)]
#[case(Error::timeout("slow"), ErrorCode::Timeout)]
#[case(Error::service_unavailable("down"), ErrorCode::ServiceUnavailable)]
#[case(Error::internal("boom"), ErrorCode::InternalError)]
fn constructors_set_expected_code(#[case] error: Error, #[case] expected: ErrorCode) {
    assert_eq!(error.code(), expected);
}

#[rstest]
fn new_returns_none_when_trace_id_out_of_scope() {
    let error = Error::internal("boom");
    assert!(error.trace_id().is_none());
}

#[rstest]
#[tokio::test]
async fn new_captures_trace_id_in_scope(expected_trace_id: String) {
    let trace_id: TraceId = expected_trace_id
        .parse()
        .expect("fixtures provide a valid UUID");
    let error = TraceId::scope(trace_id, async move { Error::internal("boom") }).await;

    assert_eq!(error.trace_id(), Some(expected_trace_id.as_str()));
}

#[rstest]
fn serialises_codes_in_snake_case(expected_trace_id: String) {
    let error = Error::authentication_failed("invalid email or password")
        .with_trace_id(expected_trace_id)
        .with_details(json!({ "reason": "credentials" }));

    let value = serde_json::to_value(&error).expect("error serialises");
    assert_eq!(value["code"], "authentication_failed");
    assert_eq!(value["traceId"], TRACE_ID);
    assert_eq!(value["details"]["reason"], "credentials");
}

#[rstest]
fn optional_fields_are_omitted_when_absent() {
    let value = serde_json::to_value(Error::conflict("email already registered"))
        .expect("error serialises");
    let object = value.as_object().expect("error serialises to an object");
    assert!(!object.contains_key("traceId"));
    assert!(!object.contains_key("details"));
}

#[rstest]
fn deserialises_snake_case_trace_alias() {
    let error: Error = serde_json::from_value(json!({
        "code": "service_unavailable",
        "message": "down",
        "trace_id": TRACE_ID,
    }))
    .expect("payload deserialises");
    assert_eq!(error.code(), ErrorCode::ServiceUnavailable);
    assert_eq!(error.trace_id(), Some(TRACE_ID));
}

#[rstest]
fn display_uses_message() {
    assert_eq!(Error::timeout("store lookup timed out").to_string(), "store lookup timed out");
}
