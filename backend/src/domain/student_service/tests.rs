//! Use-case tests: mocks for single-rule checks, in-memory adapters for
//! end-to-end flows.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use mockable::Clock;
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::{
    AccessTokenError, MockAccessTokenCodec, MockCourseCatalogue, MockPasswordHasher,
    MockStudentRecords,
};
use crate::domain::{
    AccessClaims, CacheAsideStudentStore, Email, ErrorCode, FirstName, LastName, PasswordHash,
    RegistrationProfile,
};
use crate::test_support::{
    InMemoryRefreshTokenStore, InMemoryStudentCache, InMemoryStudentRepository,
    InsecurePasswordHasher, MutableClock, StaticCourseCatalogue,
};

fn deadline() -> Deadline {
    Deadline::after(Duration::from_secs(5))
}

fn clock() -> Arc<MutableClock> {
    Arc::new(MutableClock::new(
        Utc.with_ymd_and_hms(2026, 9, 1, 10, 0, 0)
            .single()
            .expect("valid timestamp"),
    ))
}

/// Codec whose tokens are the subject prefixed with `token:`.
fn transparent_codec(clock: &Arc<MutableClock>) -> MockAccessTokenCodec {
    let mut codec = MockAccessTokenCodec::new();
    codec
        .expect_encode()
        .returning(|claims| Ok(format!("token:{}:{}", claims.sub, claims.exp)));
    let now = clock.utc().timestamp();
    codec.expect_decode().returning(move |token| {
        let mut parts = token.splitn(3, ':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some("token"), Some(sub), Some(exp)) => Ok(AccessClaims {
                sub: sub.to_owned(),
                iat: now,
                exp: exp
                    .parse()
                    .map_err(|_| AccessTokenError::malformed("exp"))?,
            }),
            _ => Err(AccessTokenError::malformed("shape")),
        }
    });
    codec
}

fn token_service(clock: &Arc<MutableClock>) -> TokenService {
    TokenService::new(
        Arc::new(transparent_codec(clock)),
        Arc::new(InMemoryRefreshTokenStore::new(clock.clone())),
        clock.clone(),
    )
}

fn registration(email: &str, password: &str) -> Registration {
    Registration::try_new(
        RegistrationProfile {
            first_name: FirstName::new("Ada").expect("first name"),
            last_name: LastName::new("Lovelace").expect("last name"),
            email: Email::new(email).expect("email"),
            age: None,
            courses: BTreeSet::from([CourseId::new("math-101").expect("course")]),
        },
        password,
    )
    .expect("valid registration")
}

fn credentials(email: &str, password: &str) -> SignInCredentials {
    SignInCredentials::try_from_parts(Email::new(email).expect("email"), password)
        .expect("valid credentials")
}

fn mocked_service(records: MockStudentRecords, hasher: MockPasswordHasher) -> StudentService {
    StudentService::new(
        Arc::new(records),
        Arc::new(hasher),
        token_service(&clock()),
        Arc::new(MockCourseCatalogue::new()),
    )
}

#[rstest]
#[tokio::test]
async fn sign_up_rejects_taken_email_before_hashing() {
    let mut records = MockStudentRecords::new();
    records
        .expect_email_exists()
        .times(1)
        .returning(|_, _| Ok(true));
    records.expect_create().never();
    let mut hasher = MockPasswordHasher::new();
    hasher.expect_hash().never();

    let err = mocked_service(records, hasher)
        .sign_up(registration("ada@example.com", "pw"), deadline())
        .await
        .expect_err("duplicate email");
    assert_eq!(err.code(), ErrorCode::Conflict);
}

/// Shared sink for a test-scoped `fmt` subscriber.
#[derive(Clone, Default)]
struct LogBuffer(Arc<std::sync::Mutex<Vec<u8>>>);

impl std::io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().expect("log buffer").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl LogBuffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().expect("log buffer")).into_owned()
    }
}

#[rstest]
#[tokio::test]
async fn taken_email_is_not_written_to_logs() {
    let logs = LogBuffer::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .with_writer(move || writer.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let mut records = MockStudentRecords::new();
    records.expect_email_exists().returning(|_, _| Ok(true));
    let err = mocked_service(records, MockPasswordHasher::new())
        .sign_up(registration("ada@example.com", "pw"), deadline())
        .await
        .expect_err("duplicate email");

    assert_eq!(err.code(), ErrorCode::Conflict);
    let output = logs.contents();
    assert!(output.contains("email_taken"), "missing rejection log: {output}");
    assert!(!output.contains("ada@example.com"), "email leaked: {output}");
}

#[rstest]
#[case::hash_matches(Ok(true))]
#[case::hash_differs(Ok(false))]
#[tokio::test]
async fn unknown_email_still_verifies_once(#[case] outcome: Result<bool, HashingError>) {
    let mut records = MockStudentRecords::new();
    records.expect_get_by_email().returning(|_, _| Ok(None));
    let mut hasher = MockPasswordHasher::new();
    hasher
        .expect_verify()
        .withf(|plaintext, hash| plaintext == "s3cret" && hash.as_str().starts_with("$argon2id$"))
        .times(1)
        .return_once(move |_, _| outcome);

    let err = mocked_service(records, hasher)
        .sign_in(&credentials("nobody@example.com", "s3cret"), deadline())
        .await
        .expect_err("unknown email");
    assert_eq!(err.code(), ErrorCode::AuthenticationFailed);
}

#[rstest]
#[tokio::test]
async fn overlong_password_is_rejected_alike_for_unknown_email() {
    let mut records = MockStudentRecords::new();
    records.expect_get_by_email().returning(|_, _| Ok(None));
    let mut hasher = MockPasswordHasher::new();
    hasher
        .expect_verify()
        .times(1)
        .returning(|_, _| Err(HashingError::input_too_long(1024_usize)));

    let err = mocked_service(records, hasher)
        .sign_in(&credentials("nobody@example.com", "s3cret"), deadline())
        .await
        .expect_err("overlong password");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[tokio::test]
async fn sign_up_stores_hash_not_plaintext() {
    let mut records = MockStudentRecords::new();
    records
        .expect_email_exists()
        .times(1)
        .returning(|_, _| Ok(false));
    records
        .expect_create()
        .withf(|student, _| student.password_hash.as_str() == "hashed")
        .times(1)
        .returning(|student, _| Ok(Student::from_new(StudentId::random(), student)));
    let mut hasher = MockPasswordHasher::new();
    hasher
        .expect_hash()
        .withf(|plaintext| plaintext == "pw")
        .times(1)
        .returning(|_| Ok(PasswordHash::new("hashed")));

    let created = mocked_service(records, hasher)
        .sign_up(registration("ada@example.com", "pw"), deadline())
        .await
        .expect("sign-up succeeds");
    assert_eq!(created.password_hash().as_str(), "hashed");
}

#[rstest]
#[tokio::test]
async fn overlong_password_is_invalid_request() {
    let mut records = MockStudentRecords::new();
    records
        .expect_email_exists()
        .returning(|_, _| Ok(false));
    let mut hasher = MockPasswordHasher::new();
    hasher
        .expect_hash()
        .returning(|_| Err(HashingError::input_too_long(1024_usize)));

    let err = mocked_service(records, hasher)
        .create_student(registration("ada@example.com", "pw"), deadline())
        .await
        .expect_err("hash rejected");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[tokio::test]
async fn store_race_on_email_surfaces_conflict() {
    let mut records = MockStudentRecords::new();
    records
        .expect_email_exists()
        .returning(|_, _| Ok(false));
    records
        .expect_create()
        .returning(|_, _| Err(Error::conflict("email ada@example.com is already registered")));
    let mut hasher = MockPasswordHasher::new();
    hasher
        .expect_hash()
        .returning(|_| Ok(PasswordHash::new("hashed")));

    let err = mocked_service(records, hasher)
        .sign_up(registration("ada@example.com", "pw"), deadline())
        .await
        .expect_err("race lost");
    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[rstest]
#[tokio::test]
async fn missing_student_is_not_found() {
    let mut records = MockStudentRecords::new();
    records.expect_get_by_id().returning(|_, _| Ok(None));

    let err = mocked_service(records, MockPasswordHasher::new())
        .get_student_by_id(&StudentId::random(), deadline())
        .await
        .expect_err("absent");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn course_service_failure_is_service_unavailable() {
    let id = StudentId::random();
    let mut records = MockStudentRecords::new();
    records.expect_get_by_id().returning(move |_, _| {
        Ok(Some(Student::from_new(
            id,
            NewStudent {
                first_name: FirstName::new("Ada").expect("first name"),
                last_name: LastName::new("Lovelace").expect("last name"),
                email: Email::new("ada@example.com").expect("email"),
                password_hash: PasswordHash::new("hashed"),
                age: None,
                courses: BTreeSet::new(),
            },
        )))
    });
    let mut catalogue = MockCourseCatalogue::new();
    catalogue
        .expect_courses_for_student()
        .times(1)
        .returning(|_| Err(CourseCatalogueError::timeout("5s elapsed")));
    let service = StudentService::new(
        Arc::new(records),
        Arc::new(MockPasswordHasher::new()),
        token_service(&clock()),
        Arc::new(catalogue),
    );

    let err = service
        .get_student_courses(&id, deadline())
        .await
        .expect_err("catalogue down");
    assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
}

struct Flow {
    clock: Arc<MutableClock>,
    repository: Arc<InMemoryStudentRepository>,
    catalogue: Arc<StaticCourseCatalogue>,
    service: StudentService,
}

#[fixture]
fn flow() -> Flow {
    let clock = clock();
    let repository = Arc::new(InMemoryStudentRepository::new());
    let cache = Arc::new(InMemoryStudentCache::new(clock.clone()));
    let catalogue = Arc::new(StaticCourseCatalogue::new());
    let service = StudentService::new(
        Arc::new(CacheAsideStudentStore::new(repository.clone(), cache)),
        Arc::new(InsecurePasswordHasher),
        token_service(&clock),
        catalogue.clone(),
    );
    Flow {
        clock,
        repository,
        catalogue,
        service,
    }
}

#[rstest]
#[tokio::test]
async fn sign_up_then_sign_in_succeeds(flow: Flow) {
    let created = flow
        .service
        .sign_up(registration("Ada@Example.com", "s3cret"), deadline())
        .await
        .expect("sign-up succeeds");

    let tokens = flow
        .service
        .sign_in(&credentials("ada@example.com", "s3cret"), deadline())
        .await
        .expect("sign-in succeeds");

    assert_eq!(tokens.access.student_id, *created.id());
    assert_eq!(
        flow.service.authenticate(&tokens.access.token),
        Ok(*created.id())
    );
}

#[rstest]
#[tokio::test]
async fn wrong_password_and_unknown_email_look_identical(flow: Flow) {
    flow.service
        .sign_up(registration("ada@example.com", "s3cret"), deadline())
        .await
        .expect("sign-up succeeds");

    let wrong_password = flow
        .service
        .sign_in(&credentials("ada@example.com", "guess"), deadline())
        .await
        .expect_err("wrong password");
    let unknown_email = flow
        .service
        .sign_in(&credentials("nobody@example.com", "s3cret"), deadline())
        .await
        .expect_err("unknown email");

    assert_eq!(wrong_password.code(), ErrorCode::AuthenticationFailed);
    assert_eq!(wrong_password.code(), unknown_email.code());
    assert_eq!(wrong_password.message(), unknown_email.message());
}

#[rstest]
#[tokio::test]
async fn refresh_issues_new_access_token_until_logout(flow: Flow) {
    let created = flow
        .service
        .sign_up(registration("ada@example.com", "s3cret"), deadline())
        .await
        .expect("sign-up succeeds");
    let tokens = flow
        .service
        .sign_in(&credentials("ada@example.com", "s3cret"), deadline())
        .await
        .expect("sign-in succeeds");

    flow.clock.advance_seconds(60);
    let refreshed = flow
        .service
        .refresh_token(tokens.refresh_token.as_str(), deadline())
        .await
        .expect("refresh succeeds");
    assert_eq!(refreshed.student_id, *created.id());
    assert!(refreshed.expires_at > tokens.access.expires_at);

    flow.service
        .logout(created.id(), deadline())
        .await
        .expect("logout succeeds");
    flow.service
        .logout(created.id(), deadline())
        .await
        .expect("second logout succeeds");

    let err = flow
        .service
        .refresh_token(tokens.refresh_token.as_str(), deadline())
        .await
        .expect_err("revoked");
    assert_eq!(err.code(), ErrorCode::Unauthorized);
}

#[rstest]
#[tokio::test]
async fn crud_round_trip_through_the_store(flow: Flow) {
    let created = flow
        .service
        .create_student(registration("ada@example.com", "s3cret"), deadline())
        .await
        .expect("create succeeds");
    let math = CourseId::new("math-101").expect("course");

    let enrolled = flow
        .service
        .get_students_by_course_id(&math, deadline())
        .await
        .expect("course lookup");
    assert_eq!(enrolled, vec![created.clone()]);

    let changes = StudentChanges::new(None, Some(LastName::new("King").expect("name")), None, None)
        .expect("non-empty changes");
    let updated = flow
        .service
        .update_student(created.id(), &changes, deadline())
        .await
        .expect("update succeeds");
    assert_eq!(updated.last_name().as_ref(), "King");

    flow.service
        .delete_student(created.id(), deadline())
        .await
        .expect("delete succeeds");
    assert!(flow.repository.stored(created.id()).is_none());
    let err = flow
        .service
        .get_student_by_id(created.id(), deadline())
        .await
        .expect_err("deleted");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn student_courses_come_from_the_catalogue(flow: Flow) {
    let created = flow
        .service
        .sign_up(registration("ada@example.com", "s3cret"), deadline())
        .await
        .expect("sign-up succeeds");
    let details = vec![CourseDetails {
        id: "math-101".into(),
        name: "Calculus".into(),
        description: Some("Limits and series".into()),
    }];
    flow.catalogue.set_courses(*created.id(), details.clone());

    let courses = flow
        .service
        .get_student_courses(created.id(), deadline())
        .await
        .expect("courses load");
    assert_eq!(courses, details);

    let err = flow
        .service
        .get_student_courses(&StudentId::random(), deadline())
        .await
        .expect_err("unknown student");
    assert_eq!(err.code(), ErrorCode::NotFound);
}
