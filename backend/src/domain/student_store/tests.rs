//! Behaviour of the cache-aside store against in-memory doubles.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use mockable::Clock;
use rstest::{fixture, rstest};

use super::*;
use crate::domain::{Age, ErrorCode, FirstName, LastName, PasswordHash};
use crate::test_support::{InMemoryStudentCache, InMemoryStudentRepository, MutableClock};

type Store = CacheAsideStudentStore<InMemoryStudentRepository, InMemoryStudentCache>;

struct Harness {
    clock: Arc<MutableClock>,
    repository: Arc<InMemoryStudentRepository>,
    cache: Arc<InMemoryStudentCache>,
    store: Store,
}

#[fixture]
fn harness() -> Harness {
    let clock = Arc::new(MutableClock::new(
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0)
            .single()
            .expect("valid timestamp"),
    ));
    let repository = Arc::new(InMemoryStudentRepository::new());
    let cache = Arc::new(InMemoryStudentCache::new(clock.clone()));
    let store = CacheAsideStudentStore::new(repository.clone(), cache.clone());
    Harness {
        clock,
        repository,
        cache,
        store,
    }
}

fn deadline() -> Deadline {
    Deadline::after(Duration::from_secs(5))
}

fn course(id: &str) -> CourseId {
    CourseId::new(id).expect("course id")
}

fn new_student(email: &str, courses: &[&str]) -> NewStudent {
    NewStudent {
        first_name: FirstName::new("Ada").expect("first name"),
        last_name: LastName::new("Lovelace").expect("last name"),
        email: Email::new(email).expect("email"),
        password_hash: PasswordHash::new("insecure$pw"),
        age: Some(Age::new(36).expect("age")),
        courses: courses.iter().map(|id| course(id)).collect(),
    }
}

#[rstest]
#[tokio::test]
async fn create_then_get_returns_stored_record_from_cache(harness: Harness) {
    let created = harness
        .store
        .create(new_student("ada@example.com", &["math-101"]), deadline())
        .await
        .expect("create succeeds");

    let fetched = harness
        .store
        .get_by_id(created.id(), deadline())
        .await
        .expect("lookup succeeds")
        .expect("student exists");

    assert_eq!(fetched, created);
    assert_eq!(harness.repository.calls().get("find_by_id"), 0);
}

#[rstest]
#[tokio::test]
async fn second_lookup_is_served_from_cache(harness: Harness) {
    let student = Student::from_new(
        StudentId::random(),
        new_student("grace@example.com", &[]),
    );
    harness.repository.seed(student.clone());

    for _ in 0..2 {
        let fetched = harness
            .store
            .get_by_id(student.id(), deadline())
            .await
            .expect("lookup succeeds");
        assert_eq!(fetched.as_ref(), Some(&student));
    }

    assert_eq!(harness.repository.calls().get("find_by_id"), 1);
    assert!(harness.cache.peek(&CacheKey::for_student(student.id())).is_some());
    assert!(harness.cache.expiry_of(&CacheKey::for_student(student.id())).is_none());
}

#[rstest]
#[tokio::test]
async fn missing_student_is_not_an_error_and_is_not_cached(harness: Harness) {
    let id = StudentId::random();
    let found = harness
        .store
        .get_by_id(&id, deadline())
        .await
        .expect("lookup succeeds");

    assert!(found.is_none());
    assert_eq!(harness.cache.calls().get("set"), 0);
}

#[rstest]
#[tokio::test]
async fn unreachable_cache_fails_reads(harness: Harness) {
    harness.cache.set_unavailable(true);
    let err = harness
        .store
        .get_by_id(&StudentId::random(), deadline())
        .await
        .expect_err("cache outage surfaces");

    assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
    assert_eq!(harness.repository.calls().get("find_by_id"), 0);
}

#[rstest]
#[tokio::test]
async fn cache_failure_after_write_is_swallowed(harness: Harness) {
    harness.cache.set_unavailable(true);
    let created = harness
        .store
        .create(new_student("ada@example.com", &[]), deadline())
        .await
        .expect("store write wins");

    assert_eq!(harness.repository.stored(created.id()), Some(created));
}

#[rstest]
#[tokio::test]
async fn undecodable_entry_is_evicted_and_refetched(harness: Harness) {
    let student = Student::from_new(StudentId::random(), new_student("ada@example.com", &[]));
    harness.repository.seed(student.clone());
    let key = CacheKey::for_student(student.id());
    harness.cache.insert_raw(key.clone(), "{not json");

    let fetched = harness
        .store
        .get_by_id(student.id(), deadline())
        .await
        .expect("lookup succeeds");

    assert_eq!(fetched, Some(student.clone()));
    assert_eq!(harness.repository.calls().get("find_by_id"), 1);
    let cached: Student =
        serde_json::from_str(&harness.cache.peek(&key).expect("repopulated")).expect("decodes");
    assert_eq!(cached, student);
}

#[rstest]
#[tokio::test]
async fn update_refreshes_cached_record(harness: Harness) {
    let created = harness
        .store
        .create(new_student("ada@example.com", &[]), deadline())
        .await
        .expect("create succeeds");
    let changes = StudentChanges::new(
        Some(FirstName::new("Augusta").expect("first name")),
        None,
        None,
        None,
    )
    .expect("non-empty changes");

    let updated = harness
        .store
        .update(created.id(), &changes, deadline())
        .await
        .expect("update succeeds");
    let fetched = harness
        .store
        .get_by_id(created.id(), deadline())
        .await
        .expect("lookup succeeds");

    assert_eq!(updated.first_name().as_ref(), "Augusta");
    assert_eq!(fetched, Some(updated));
    assert_eq!(harness.repository.calls().get("find_by_id"), 0);
}

#[rstest]
#[tokio::test]
async fn update_of_missing_student_is_not_found(harness: Harness) {
    let changes = StudentChanges::new(None, None, Some(Age::new(20).expect("age")), None)
        .expect("non-empty changes");
    let err = harness
        .store
        .update(&StudentId::random(), &changes, deadline())
        .await
        .expect_err("missing student");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn delete_evicts_and_missing_delete_is_not_found(harness: Harness) {
    let created = harness
        .store
        .create(new_student("ada@example.com", &[]), deadline())
        .await
        .expect("create succeeds");

    harness
        .store
        .delete(created.id(), deadline())
        .await
        .expect("delete succeeds");
    assert!(harness.cache.peek(&CacheKey::for_student(created.id())).is_none());

    let err = harness
        .store
        .delete(created.id(), deadline())
        .await
        .expect_err("second delete");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn course_list_stays_stale_until_ttl_lapses(harness: Harness) {
    let created = harness
        .store
        .create(new_student("ada@example.com", &["math-101"]), deadline())
        .await
        .expect("create succeeds");
    let math = course("math-101");

    let before = harness
        .store
        .get_by_course_id(&math, deadline())
        .await
        .expect("course lookup");
    assert_eq!(before.len(), 1);

    let drop_math = StudentChanges::new(None, None, None, Some(BTreeSet::new()))
        .expect("non-empty changes");
    harness
        .store
        .update(created.id(), &drop_math, deadline())
        .await
        .expect("update succeeds");

    let stale = harness
        .store
        .get_by_course_id(&math, deadline())
        .await
        .expect("course lookup");
    assert_eq!(stale.iter().map(|s| *s.id()).collect::<Vec<_>>(), vec![*created.id()]);

    harness.clock.advance(CourseListTtls::default().populated);
    let fresh = harness
        .store
        .get_by_course_id(&math, deadline())
        .await
        .expect("course lookup");
    assert!(fresh.is_empty());
    assert_eq!(harness.repository.calls().get("find_by_course"), 2);
}

#[rstest]
#[tokio::test]
async fn empty_course_lists_use_short_ttl(harness: Harness) {
    let ttls = CourseListTtls {
        populated: Duration::from_secs(600),
        empty: Duration::from_secs(10),
    };
    let store = harness.store.clone().with_course_list_ttls(ttls);
    let empty = course("poetry-110");

    let students = store
        .get_by_course_id(&empty, deadline())
        .await
        .expect("course lookup");

    assert!(students.is_empty());
    let expiry = harness
        .cache
        .expiry_of(&CacheKey::for_course(&empty))
        .expect("expiry recorded");
    assert_eq!(expiry - harness.clock.utc(), chrono::TimeDelta::seconds(10));
}

#[rstest]
#[case(
    StudentRepositoryError::connection("refused"),
    ErrorCode::ServiceUnavailable
)]
#[case(StudentRepositoryError::query("syntax error"), ErrorCode::InternalError)]
#[case(StudentRepositoryError::duplicate_email("ada@example.com"), ErrorCode::Conflict)]
#[tokio::test]
async fn repository_failures_map_to_domain_codes(
    harness: Harness,
    #[case] failure: StudentRepositoryError,
    #[case] expected: ErrorCode,
) {
    harness.repository.fail_with(Some(failure));
    let err = harness
        .store
        .create(new_student("ada@example.com", &[]), deadline())
        .await
        .expect_err("store failure surfaces");
    assert_eq!(err.code(), expected);
    assert_eq!(harness.cache.calls().get("set"), 0);
}

#[rstest]
#[tokio::test]
async fn email_checks_bypass_the_cache(harness: Harness) {
    harness
        .store
        .create(new_student("ada@example.com", &[]), deadline())
        .await
        .expect("create succeeds");
    let email = Email::new("ADA@example.com").expect("email");

    assert!(harness.store.email_exists(&email, deadline()).await.expect("check"));
    assert!(
        harness
            .store
            .get_by_email(&email, deadline())
            .await
            .expect("lookup")
            .is_some()
    );
    assert_eq!(harness.cache.calls().get("get"), 0);
}

#[rstest]
#[tokio::test]
async fn concurrent_disjoint_updates_keep_both_changes(harness: Harness) {
    let created = harness
        .store
        .create(new_student("ada@example.com", &[]), deadline())
        .await
        .expect("create succeeds");
    let rename = StudentChanges::new(
        None,
        Some(LastName::new("King").expect("last name")),
        None,
        None,
    )
    .expect("non-empty changes");
    let enrol = StudentChanges::new(None, None, None, Some(BTreeSet::from([course("cs-1")])))
        .expect("non-empty changes");

    let (first, second) = tokio::join!(
        harness.store.update(created.id(), &rename, deadline()),
        harness.store.update(created.id(), &enrol, deadline()),
    );
    first.expect("rename succeeds");
    second.expect("enrol succeeds");

    let stored = harness.repository.stored(created.id()).expect("still stored");
    assert_eq!(stored.last_name().as_ref(), "King");
    assert!(stored.attends(&course("cs-1")));
}
