//! In-memory adapters for unit and integration tests.
//!
//! Compiled for the crate's own tests and, through the `test-support`
//! feature, for the integration suites under `tests/`. Every double counts
//! its calls so tests can assert cache transparency, and the cache doubles
//! honour TTLs against an injected [`Clock`].

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeDelta, Utc};
use mockable::Clock;

use crate::domain::ports::{
    CacheKey, CourseCatalogue, CourseCatalogueError, CourseDetails, HashingError, PasswordHasher,
    RefreshTokenStore, RefreshTokenStoreError, StudentCache, StudentCacheError, StudentRepository,
    StudentRepositoryError, StudentUseCases,
};
use crate::domain::{
    CacheAsideStudentStore, CourseId, Email, NewStudent, PasswordHash, RefreshToken, Student,
    StudentChanges, StudentId, StudentService, TokenService,
};
use crate::outbound::security::JwtAccessTokenCodec;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn to_time_delta(duration: Duration) -> TimeDelta {
    match TimeDelta::from_std(duration) {
        Ok(delta) => delta,
        Err(error) => panic!("duration out of range: {error}; duration={duration:?}"),
    }
}

/// Clock that only moves when told to.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn advance(&self, delta: Duration) {
        *lock(&self.0) += to_time_delta(delta);
    }

    pub fn advance_seconds(&self, seconds: i64) {
        *lock(&self.0) += TimeDelta::seconds(seconds);
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *lock(&self.0)
    }
}

/// Per-operation call counters.
#[derive(Debug, Default)]
pub struct CallCounter(Mutex<HashMap<&'static str, usize>>);

impl CallCounter {
    fn record(&self, operation: &'static str) {
        *lock(&self.0).entry(operation).or_default() += 1;
    }

    /// How many times `operation` was called.
    pub fn get(&self, operation: &'static str) -> usize {
        lock(&self.0).get(operation).copied().unwrap_or_default()
    }
}

/// Student repository backed by a map, with call counters and failure
/// injection.
#[derive(Debug, Default)]
pub struct InMemoryStudentRepository {
    students: Mutex<BTreeMap<StudentId, Student>>,
    failure: Mutex<Option<StudentRepositoryError>>,
    calls: CallCounter,
}

impl InMemoryStudentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls made so far, keyed by port method name.
    pub fn calls(&self) -> &CallCounter {
        &self.calls
    }

    /// Fail every subsequent call with `error`; `None` restores normal
    /// behaviour.
    pub fn fail_with(&self, error: Option<StudentRepositoryError>) {
        *lock(&self.failure) = error;
    }

    /// Insert a record directly, bypassing the counters.
    pub fn seed(&self, student: Student) {
        lock(&self.students).insert(*student.id(), student);
    }

    /// Stored record, bypassing the counters.
    pub fn stored(&self, id: &StudentId) -> Option<Student> {
        lock(&self.students).get(id).cloned()
    }

    fn enter(&self, operation: &'static str) -> Result<(), StudentRepositoryError> {
        self.calls.record(operation);
        match lock(&self.failure).clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl StudentRepository for InMemoryStudentRepository {
    async fn find_by_id(&self, id: &StudentId) -> Result<Option<Student>, StudentRepositoryError> {
        self.enter("find_by_id")?;
        Ok(lock(&self.students).get(id).cloned())
    }

    async fn find_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<Student>, StudentRepositoryError> {
        self.enter("find_by_email")?;
        Ok(lock(&self.students)
            .values()
            .find(|student| student.email() == email)
            .cloned())
    }

    async fn find_by_course(
        &self,
        course: &CourseId,
    ) -> Result<Vec<Student>, StudentRepositoryError> {
        self.enter("find_by_course")?;
        Ok(lock(&self.students)
            .values()
            .filter(|student| student.attends(course))
            .cloned()
            .collect())
    }

    async fn insert(&self, student: &NewStudent) -> Result<Student, StudentRepositoryError> {
        self.enter("insert")?;
        let mut students = lock(&self.students);
        if students.values().any(|existing| existing.email() == &student.email) {
            return Err(StudentRepositoryError::duplicate_email(
                student.email.as_ref(),
            ));
        }
        let created = Student::from_new(StudentId::random(), student.clone());
        students.insert(*created.id(), created.clone());
        Ok(created)
    }

    async fn update(
        &self,
        id: &StudentId,
        changes: &StudentChanges,
    ) -> Result<Option<Student>, StudentRepositoryError> {
        self.enter("update")?;
        let mut students = lock(&self.students);
        let Some(existing) = students.get_mut(id) else {
            return Ok(None);
        };
        *existing = existing.clone().with_changes(changes);
        Ok(Some(existing.clone()))
    }

    async fn delete(&self, id: &StudentId) -> Result<bool, StudentRepositoryError> {
        self.enter("delete")?;
        Ok(lock(&self.students).remove(id).is_some())
    }

    async fn email_exists(&self, email: &Email) -> Result<bool, StudentRepositoryError> {
        self.enter("email_exists")?;
        Ok(lock(&self.students)
            .values()
            .any(|student| student.email() == email))
    }
}

#[derive(Debug, Clone)]
struct Expiring<T> {
    value: T,
    expires_at: Option<DateTime<Utc>>,
}

impl<T> Expiring<T> {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_none_or(|expires_at| now < expires_at)
    }
}

/// Key/value cache that honours TTLs against an injected clock.
pub struct InMemoryStudentCache {
    entries: Mutex<HashMap<CacheKey, Expiring<String>>>,
    clock: Arc<dyn Clock>,
    unavailable: Mutex<bool>,
    calls: CallCounter,
}

impl InMemoryStudentCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
            unavailable: Mutex::new(false),
            calls: CallCounter::default(),
        }
    }

    pub fn calls(&self) -> &CallCounter {
        &self.calls
    }

    /// Make every subsequent call fail with a connection error.
    pub fn set_unavailable(&self, unavailable: bool) {
        *lock(&self.unavailable) = unavailable;
    }

    /// Store a raw value directly, bypassing the counters.
    pub fn insert_raw(&self, key: CacheKey, value: impl Into<String>) {
        lock(&self.entries).insert(
            key,
            Expiring {
                value: value.into(),
                expires_at: None,
            },
        );
    }

    /// Live raw value for `key`, bypassing the counters.
    pub fn peek(&self, key: &CacheKey) -> Option<String> {
        let now = self.clock.utc();
        lock(&self.entries)
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value.clone())
    }

    /// Expiry recorded for `key`, if the entry exists and has one.
    pub fn expiry_of(&self, key: &CacheKey) -> Option<DateTime<Utc>> {
        lock(&self.entries).get(key).and_then(|entry| entry.expires_at)
    }

    fn enter(&self, operation: &'static str) -> Result<(), StudentCacheError> {
        self.calls.record(operation);
        if *lock(&self.unavailable) {
            return Err(StudentCacheError::connection("connection refused"));
        }
        Ok(())
    }
}

#[async_trait]
impl StudentCache for InMemoryStudentCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<String>, StudentCacheError> {
        self.enter("get")?;
        let now = self.clock.utc();
        let mut entries = lock(&self.entries);
        match entries.get(key) {
            Some(entry) if entry.is_live(now) => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(
        &self,
        key: &CacheKey,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<(), StudentCacheError> {
        self.enter("set")?;
        let expires_at = ttl.map(|ttl| self.clock.utc() + to_time_delta(ttl));
        lock(&self.entries).insert(
            key.clone(),
            Expiring {
                value: value.to_owned(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &CacheKey) -> Result<(), StudentCacheError> {
        self.enter("delete")?;
        lock(&self.entries).remove(key);
        Ok(())
    }
}

#[derive(Default)]
struct RefreshTokenEntries {
    by_student: HashMap<StudentId, Expiring<String>>,
    by_token: HashMap<String, Expiring<StudentId>>,
}

/// Refresh token store with the same one-token-per-student semantics as the
/// Redis adapter.
pub struct InMemoryRefreshTokenStore {
    entries: Mutex<RefreshTokenEntries>,
    clock: Arc<dyn Clock>,
    unavailable: Mutex<bool>,
}

impl InMemoryRefreshTokenStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(RefreshTokenEntries::default()),
            clock,
            unavailable: Mutex::new(false),
        }
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        *lock(&self.unavailable) = unavailable;
    }

    /// Whether a live token is recorded for `student_id`.
    pub fn has_token_for(&self, student_id: &StudentId) -> bool {
        let now = self.clock.utc();
        lock(&self.entries)
            .by_student
            .get(student_id)
            .is_some_and(|entry| entry.is_live(now))
    }

    fn check_available(&self) -> Result<(), RefreshTokenStoreError> {
        if *lock(&self.unavailable) {
            return Err(RefreshTokenStoreError::connection("connection refused"));
        }
        Ok(())
    }
}

#[async_trait]
impl RefreshTokenStore for InMemoryRefreshTokenStore {
    async fn store(
        &self,
        student_id: &StudentId,
        token: &RefreshToken,
        ttl: Duration,
    ) -> Result<(), RefreshTokenStoreError> {
        self.check_available()?;
        let expires_at = Some(self.clock.utc() + to_time_delta(ttl));
        let mut entries = lock(&self.entries);
        if let Some(previous) = entries.by_student.remove(student_id) {
            entries.by_token.remove(&previous.value);
        }
        entries.by_student.insert(
            *student_id,
            Expiring {
                value: token.as_str().to_owned(),
                expires_at,
            },
        );
        entries.by_token.insert(
            token.as_str().to_owned(),
            Expiring {
                value: *student_id,
                expires_at,
            },
        );
        Ok(())
    }

    async fn lookup(
        &self,
        token: &RefreshToken,
    ) -> Result<Option<StudentId>, RefreshTokenStoreError> {
        self.check_available()?;
        let now = self.clock.utc();
        Ok(lock(&self.entries)
            .by_token
            .get(token.as_str())
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value))
    }

    async fn revoke(&self, student_id: &StudentId) -> Result<(), RefreshTokenStoreError> {
        self.check_available()?;
        let mut entries = lock(&self.entries);
        if let Some(previous) = entries.by_student.remove(student_id) {
            entries.by_token.remove(&previous.value);
        }
        Ok(())
    }
}

/// Fast, non-cryptographic hasher so tests avoid Argon2's cost.
#[derive(Debug, Default, Clone, Copy)]
pub struct InsecurePasswordHasher;

const INSECURE_PREFIX: &str = "insecure$";

#[async_trait]
impl PasswordHasher for InsecurePasswordHasher {
    async fn hash(&self, plaintext: &str) -> Result<PasswordHash, HashingError> {
        Ok(PasswordHash::new(format!("{INSECURE_PREFIX}{plaintext}")))
    }

    async fn verify(&self, plaintext: &str, hash: &PasswordHash) -> Result<bool, HashingError> {
        let stored = hash
            .as_str()
            .strip_prefix(INSECURE_PREFIX)
            .ok_or_else(|| HashingError::malformed_hash("missing test prefix"))?;
        Ok(stored == plaintext)
    }
}

/// Course catalogue that serves canned responses.
#[derive(Default)]
pub struct StaticCourseCatalogue {
    courses: Mutex<HashMap<StudentId, Vec<CourseDetails>>>,
    failure: Mutex<Option<CourseCatalogueError>>,
}

impl StaticCourseCatalogue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_courses(&self, student_id: StudentId, courses: Vec<CourseDetails>) {
        lock(&self.courses).insert(student_id, courses);
    }

    pub fn fail_with(&self, error: Option<CourseCatalogueError>) {
        *lock(&self.failure) = error;
    }
}

#[async_trait]
impl CourseCatalogue for StaticCourseCatalogue {
    async fn courses_for_student(
        &self,
        student_id: &StudentId,
    ) -> Result<Vec<CourseDetails>, CourseCatalogueError> {
        if let Some(error) = lock(&self.failure).clone() {
            return Err(error);
        }
        Ok(lock(&self.courses)
            .get(student_id)
            .cloned()
            .unwrap_or_default())
    }
}

/// Signing secret used by [`TestHarness`].
pub const TEST_JWT_SECRET: &[u8] = b"test-secret-test-secret-test-secret!";

/// A [`StudentService`] over in-memory adapters, with handles to each double.
pub struct TestHarness {
    pub clock: Arc<MutableClock>,
    pub repository: Arc<InMemoryStudentRepository>,
    pub cache: Arc<InMemoryStudentCache>,
    pub refresh_tokens: Arc<InMemoryRefreshTokenStore>,
    pub courses: Arc<StaticCourseCatalogue>,
    service: StudentService,
}

impl TestHarness {
    /// Build the graph with the clock at `now`.
    ///
    /// # Panics
    /// Panics if [`TEST_JWT_SECRET`] is rejected by the codec.
    pub fn new(now: DateTime<Utc>) -> Self {
        let clock = Arc::new(MutableClock::new(now));
        let repository = Arc::new(InMemoryStudentRepository::new());
        let cache = Arc::new(InMemoryStudentCache::new(clock.clone()));
        let refresh_tokens = Arc::new(InMemoryRefreshTokenStore::new(clock.clone()));
        let courses = Arc::new(StaticCourseCatalogue::new());
        let codec = match JwtAccessTokenCodec::new(TEST_JWT_SECRET) {
            Ok(codec) => codec,
            Err(error) => panic!("test secret rejected: {error}"),
        };
        let tokens = TokenService::new(Arc::new(codec), refresh_tokens.clone(), clock.clone());
        let records = CacheAsideStudentStore::new(repository.clone(), cache.clone());
        let service = StudentService::new(
            Arc::new(records),
            Arc::new(InsecurePasswordHasher),
            tokens,
            courses.clone(),
        );
        Self {
            clock,
            repository,
            cache,
            refresh_tokens,
            courses,
            service,
        }
    }

    /// The use cases as the HTTP layer sees them.
    pub fn use_cases(&self) -> Arc<dyn StudentUseCases> {
        Arc::new(self.service.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::{fixture, rstest};

    #[fixture]
    fn clock() -> Arc<MutableClock> {
        Arc::new(MutableClock::new(
            Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0)
                .single()
                .expect("valid timestamp"),
        ))
    }

    #[rstest]
    #[tokio::test]
    async fn cache_entries_expire_after_ttl(clock: Arc<MutableClock>) {
        let cache = InMemoryStudentCache::new(clock.clone());
        let key = CacheKey::new("course:v1:math-101:students").expect("valid key");
        cache
            .set(&key, "[]", Some(Duration::from_secs(30)))
            .await
            .expect("set succeeds");

        clock.advance_seconds(29);
        assert_eq!(cache.get(&key).await, Ok(Some("[]".to_owned())));

        clock.advance_seconds(1);
        assert_eq!(cache.get(&key).await, Ok(None));
        assert_eq!(cache.calls().get("get"), 2);
    }

    #[rstest]
    #[tokio::test]
    async fn reissuing_refresh_token_drops_previous(clock: Arc<MutableClock>) {
        let store = InMemoryRefreshTokenStore::new(clock);
        let student = StudentId::random();
        let first = RefreshToken::generate();
        let second = RefreshToken::generate();
        let ttl = Duration::from_secs(60);

        store.store(&student, &first, ttl).await.expect("store first");
        store.store(&student, &second, ttl).await.expect("store second");

        assert_eq!(store.lookup(&first).await, Ok(None));
        assert_eq!(store.lookup(&second).await, Ok(Some(student)));
    }

    #[rstest]
    #[tokio::test]
    async fn insecure_hasher_round_trips() {
        let hasher = InsecurePasswordHasher;
        let hash = hasher.hash("pw").await.expect("hash");
        assert_eq!(hasher.verify("pw", &hash).await, Ok(true));
        assert_eq!(hasher.verify("other", &hash).await, Ok(false));
    }
}
