//! Domain primitives, services and ports.
//!
//! Purpose: define strongly typed student records, the authentication token
//! lifecycle and the cache-aside store, independent of HTTP, SQL and Redis.
//! Adapters live in `inbound` and `outbound` and meet the domain at the
//! traits in [`ports`].
//!
//! Public surface:
//! - `Error` / `ErrorCode`: failure payload shared by every layer.
//! - `Student` and its value types: validated record fields.
//! - `CacheAsideStudentStore`: cache-aside implementation of `StudentRecords`.
//! - `TokenService`: access and refresh token issue and validation.
//! - `StudentService`: implementation of the `StudentUseCases` driving port.

pub mod auth;
pub mod deadline;
pub mod error;
pub mod ports;
pub mod student;
pub mod student_service;
pub mod student_store;
pub mod token_service;
pub mod trace_id;

pub use self::auth::{
    AccessClaims, AccessToken, AuthTokens, CredentialsValidationError, MalformedRefreshToken,
    REFRESH_TOKEN_BYTES, RefreshToken, Registration, RegistrationProfile, SignInCredentials,
};
pub use self::deadline::Deadline;
pub use self::error::{Error, ErrorCode};
pub use self::student::{
    AGE_MAX, Age, COURSE_ID_MAX, CourseId, EMAIL_MAX, Email, FirstName, LastName, NAME_MAX,
    NewStudent, PasswordHash, Student, StudentChanges, StudentId, StudentValidationError,
};
pub use self::student_service::StudentService;
pub use self::student_store::{CacheAsideStudentStore, CourseListTtls};
pub use self::token_service::{RefreshTokenRejection, TokenLifetimes, TokenService};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};

/// Convenient result alias for domain and handler code.
///
/// # Examples
/// ```
/// use student_records::domain::{ApiResult, Error};
///
/// fn lookup() -> ApiResult<()> {
///     Err(Error::not_found("student missing"))
/// }
/// assert!(lookup().is_err());
/// ```
pub type ApiResult<T> = Result<T, Error>;
