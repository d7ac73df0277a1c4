//! Cache-aside record store for students.
//!
//! Reads consult the cache first and fall back to the persistent store,
//! populating the cache on the way out. Writes go to the store first and then
//! refresh the cache on a best-effort basis: once the store has accepted a
//! write, a cache failure is logged and never fails the call.
//!
//! Course membership lists are cached under their own keys with a TTL and are
//! not invalidated by student writes. A course list may therefore be stale for
//! up to [`CourseListTtls::populated`] after an update.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::domain::ports::{
    CacheKey, StudentCache, StudentCacheError, StudentRecords, StudentRepository,
    StudentRepositoryError,
};
use crate::domain::{
    CourseId, Deadline, Email, Error, NewStudent, Student, StudentChanges, StudentId,
};

/// Expiry applied to cached course membership lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CourseListTtls {
    /// TTL for lists with at least one student.
    pub populated: Duration,
    /// TTL for empty lists, kept short so new enrolments surface quickly.
    pub empty: Duration,
}

impl Default for CourseListTtls {
    fn default() -> Self {
        Self {
            populated: Duration::from_secs(300),
            empty: Duration::from_secs(30),
        }
    }
}

impl CourseListTtls {
    fn for_len(&self, len: usize) -> Duration {
        if len == 0 { self.empty } else { self.populated }
    }
}

/// Cache-aside store implementing [`StudentRecords`].
pub struct CacheAsideStudentStore<R, C> {
    repository: Arc<R>,
    cache: Arc<C>,
    ttls: CourseListTtls,
}

impl<R, C> Clone for CacheAsideStudentStore<R, C> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            cache: Arc::clone(&self.cache),
            ttls: self.ttls,
        }
    }
}

impl<R, C> CacheAsideStudentStore<R, C> {
    /// Create a store over the given repository and cache.
    pub fn new(repository: Arc<R>, cache: Arc<C>) -> Self {
        Self {
            repository,
            cache,
            ttls: CourseListTtls::default(),
        }
    }

    /// Override the course-list expiry.
    #[must_use]
    pub fn with_course_list_ttls(mut self, ttls: CourseListTtls) -> Self {
        self.ttls = ttls;
        self
    }
}

impl<R, C> CacheAsideStudentStore<R, C>
where
    R: StudentRepository,
    C: StudentCache,
{
    fn map_repository_error(error: StudentRepositoryError) -> Error {
        match error {
            StudentRepositoryError::Connection { message } => {
                Error::service_unavailable(format!("student repository unavailable: {message}"))
            }
            StudentRepositoryError::Query { message } => {
                Error::internal(format!("student repository error: {message}"))
            }
            StudentRepositoryError::DuplicateEmail { email } => {
                Error::conflict(format!("email {email} is already registered"))
            }
        }
    }

    fn map_cache_error(error: StudentCacheError) -> Error {
        match error {
            StudentCacheError::Connection { message } => {
                Error::service_unavailable(format!("student cache unavailable: {message}"))
            }
            StudentCacheError::Command { message } => {
                Error::internal(format!("student cache error: {message}"))
            }
        }
    }

    /// Read and decode a cached value. Undecodable entries are evicted and
    /// reported as a miss.
    async fn read_cached<T>(&self, key: &CacheKey) -> Result<Option<T>, Error>
    where
        T: DeserializeOwned,
    {
        let Some(raw) = self.cache.get(key).await.map_err(Self::map_cache_error)? else {
            debug!(key = %key, "student cache miss");
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                warn!(key = %key, error = %err, "evicting undecodable cache entry");
                if let Err(evict_err) = self.cache.delete(key).await {
                    warn!(key = %key, error = %evict_err, "failed to evict cache entry");
                }
                Ok(None)
            }
        }
    }

    /// Best-effort cache write. Failures are logged and swallowed.
    async fn populate<T>(&self, deadline: Deadline, key: &CacheKey, value: &T, ttl: Option<Duration>)
    where
        T: Serialize + ?Sized,
    {
        let encoded = match serde_json::to_string(value) {
            Ok(encoded) => encoded,
            Err(err) => {
                warn!(key = %key, error = %err, "failed to encode cache entry");
                return;
            }
        };
        let write = async {
            self.cache
                .set(key, &encoded, ttl)
                .await
                .map_err(Self::map_cache_error)
        };
        if let Err(err) = deadline.run("student cache write", write).await {
            warn!(key = %key, error = %err, "cache write failed after store access");
        }
    }

    /// Best-effort eviction. Failures are logged and swallowed.
    async fn evict(&self, deadline: Deadline, key: &CacheKey) {
        let delete = async { self.cache.delete(key).await.map_err(Self::map_cache_error) };
        if let Err(err) = deadline.run("student cache eviction", delete).await {
            warn!(key = %key, error = %err, "cache eviction failed after store delete");
        }
    }
}

#[async_trait]
impl<R, C> StudentRecords for CacheAsideStudentStore<R, C>
where
    R: StudentRepository,
    C: StudentCache,
{
    async fn get_by_id(
        &self,
        id: &StudentId,
        deadline: Deadline,
    ) -> Result<Option<Student>, Error> {
        let key = CacheKey::for_student(id);
        let cached = deadline
            .run("student cache read", self.read_cached::<Student>(&key))
            .await?;
        if let Some(student) = cached {
            return Ok(Some(student));
        }

        let lookup = async {
            self.repository
                .find_by_id(id)
                .await
                .map_err(Self::map_repository_error)
        };
        let found = deadline.run("student lookup", lookup).await?;
        if let Some(student) = &found {
            self.populate(deadline, &key, student, None).await;
        }
        Ok(found)
    }

    async fn get_by_course_id(
        &self,
        course: &CourseId,
        deadline: Deadline,
    ) -> Result<Vec<Student>, Error> {
        let key = CacheKey::for_course(course);
        let cached = deadline
            .run("course list cache read", self.read_cached::<Vec<Student>>(&key))
            .await?;
        if let Some(students) = cached {
            return Ok(students);
        }

        let lookup = async {
            self.repository
                .find_by_course(course)
                .await
                .map_err(Self::map_repository_error)
        };
        let students = deadline.run("course list lookup", lookup).await?;
        let ttl = self.ttls.for_len(students.len());
        self.populate(deadline, &key, students.as_slice(), Some(ttl))
            .await;
        Ok(students)
    }

    async fn get_by_email(
        &self,
        email: &Email,
        deadline: Deadline,
    ) -> Result<Option<Student>, Error> {
        let lookup = async {
            self.repository
                .find_by_email(email)
                .await
                .map_err(Self::map_repository_error)
        };
        deadline.run("student email lookup", lookup).await
    }

    async fn create(&self, student: NewStudent, deadline: Deadline) -> Result<Student, Error> {
        let insert = async {
            self.repository
                .insert(&student)
                .await
                .map_err(Self::map_repository_error)
        };
        let created = deadline.run("student insert", insert).await?;
        debug!(student_id = %created.id(), "student created");
        self.populate(deadline, &CacheKey::for_student(created.id()), &created, None)
            .await;
        Ok(created)
    }

    async fn update(
        &self,
        id: &StudentId,
        changes: &StudentChanges,
        deadline: Deadline,
    ) -> Result<Student, Error> {
        let update = async {
            self.repository
                .update(id, changes)
                .await
                .map_err(Self::map_repository_error)
        };
        let updated = deadline
            .run("student update", update)
            .await?
            .ok_or_else(|| Error::not_found(format!("student {id} not found")))?;
        self.populate(deadline, &CacheKey::for_student(id), &updated, None)
            .await;
        Ok(updated)
    }

    async fn delete(&self, id: &StudentId, deadline: Deadline) -> Result<(), Error> {
        let delete = async {
            self.repository
                .delete(id)
                .await
                .map_err(Self::map_repository_error)
        };
        if !deadline.run("student delete", delete).await? {
            return Err(Error::not_found(format!("student {id} not found")));
        }
        self.evict(deadline, &CacheKey::for_student(id)).await;
        Ok(())
    }

    async fn email_exists(&self, email: &Email, deadline: Deadline) -> Result<bool, Error> {
        let lookup = async {
            self.repository
                .email_exists(email)
                .await
                .map_err(Self::map_repository_error)
        };
        deadline.run("student email check", lookup).await
    }
}

#[cfg(test)]
mod tests;
