//! Shared validation helpers for inbound HTTP adapters.
//!
//! Every helper produces an `invalid_request` error whose details name the
//! offending field, so clients can highlight it without parsing messages.

use std::collections::BTreeSet;

use actix_web::error::{JsonPayloadError, PathError};
use actix_web::{HttpRequest, web};
use serde_json::json;

use crate::domain::{
    CourseId, CredentialsValidationError, Error, StudentId, StudentValidationError,
};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    InvalidUuid,
    InvalidField,
    InvalidBody,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidUuid => "invalid_uuid",
            ErrorCode::InvalidField => "invalid_field",
            ErrorCode::InvalidBody => "invalid_body",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(&self) -> &str {
        self.0
    }
}

pub(crate) const STUDENT_ID: FieldName = FieldName::new("id");
pub(crate) const COURSE_ID: FieldName = FieldName::new("courseId");

pub(crate) fn invalid_uuid_error(field: FieldName, value: &str) -> Error {
    let field = field.as_str();
    Error::invalid_request(format!("{field} must be a valid UUID")).with_details(json!({
        "field": field,
        "value": value,
        "code": ErrorCode::InvalidUuid.as_str(),
    }))
}

/// Parse a student id taken from the request path.
pub(crate) fn parse_student_id(raw: &str) -> Result<StudentId, Error> {
    StudentId::new(raw).map_err(|_| invalid_uuid_error(STUDENT_ID, raw))
}

pub(crate) fn parse_course_id(raw: String) -> Result<CourseId, Error> {
    CourseId::new(raw).map_err(|err| {
        Error::invalid_request(err.to_string()).with_details(json!({
            "field": COURSE_ID.as_str(),
            "code": ErrorCode::InvalidField.as_str(),
        }))
    })
}

/// Map a domain validation failure to a field-scoped `invalid_request`.
pub(crate) fn student_field_error(err: StudentValidationError) -> Error {
    Error::invalid_request(err.to_string()).with_details(json!({
        "field": err.field(),
        "code": ErrorCode::InvalidField.as_str(),
    }))
}

pub(crate) fn credentials_error(err: CredentialsValidationError) -> Error {
    Error::invalid_request(err.to_string()).with_details(json!({
        "field": "password",
        "code": ErrorCode::InvalidField.as_str(),
    }))
}

/// Validate a course list, reporting the index of the first bad entry.
pub(crate) fn parse_courses(values: Vec<String>) -> Result<BTreeSet<CourseId>, Error> {
    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            CourseId::new(value).map_err(|err| {
                Error::invalid_request(err.to_string()).with_details(json!({
                    "field": "courses",
                    "index": index,
                    "code": ErrorCode::InvalidField.as_str(),
                }))
            })
        })
        .collect()
}

fn body_error(err: &JsonPayloadError) -> Error {
    Error::invalid_request(format!("invalid JSON body: {err}")).with_details(json!({
        "field": "body",
        "code": ErrorCode::InvalidBody.as_str(),
    }))
}

/// JSON extractor configuration that reports malformed bodies as domain
/// `invalid_request` errors.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(64 * 1024)
        .error_handler(|err, _req: &HttpRequest| body_error(&err).into())
}

/// Path extractor configuration with the same error envelope.
pub fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err: PathError, _req: &HttpRequest| {
        Error::invalid_request(format!("invalid path: {err}")).into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode as DomainCode;
    use rstest::rstest;

    fn detail<'a>(err: &'a Error, key: &str) -> Option<&'a serde_json::Value> {
        err.details().and_then(|details| details.get(key))
    }

    #[rstest]
    fn invalid_student_id_names_the_field() {
        let err = parse_student_id("42").expect_err("not a uuid");
        assert_eq!(err.code(), DomainCode::InvalidRequest);
        assert_eq!(detail(&err, "field"), Some(&json!("id")));
        assert_eq!(detail(&err, "value"), Some(&json!("42")));
        assert_eq!(detail(&err, "code"), Some(&json!("invalid_uuid")));
    }

    #[rstest]
    fn blank_course_reports_its_index() {
        let err = parse_courses(vec!["math-101".into(), "  ".into()]).expect_err("blank");
        assert_eq!(detail(&err, "field"), Some(&json!("courses")));
        assert_eq!(detail(&err, "index"), Some(&json!(1)));
    }

    #[rstest]
    fn duplicate_courses_collapse() {
        let courses =
            parse_courses(vec!["cs-1".into(), "cs-1".into(), " cs-1 ".into()]).expect("valid");
        assert_eq!(courses.len(), 1);
    }

    #[rstest]
    #[case(StudentValidationError::InvalidEmail, "email")]
    #[case(StudentValidationError::EmptyFirstName, "firstName")]
    #[case(StudentValidationError::AgeOutOfRange { max: 150 }, "age")]
    fn student_errors_use_wire_field_names(
        #[case] err: StudentValidationError,
        #[case] field: &str,
    ) {
        let mapped = student_field_error(err);
        assert_eq!(detail(&mapped, "field"), Some(&json!(field)));
    }
}
