//! Port for the cache-aside record store.
//!
//! Every read and write the use cases perform goes through this port so the
//! cache stays consistent with the persistent store.

use async_trait::async_trait;

use crate::domain::{
    CourseId, Deadline, Email, Error, NewStudent, Student, StudentChanges, StudentId,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StudentRecords: Send + Sync {
    /// Cached lookup by id. `Ok(None)` when the store has no such student.
    async fn get_by_id(&self, id: &StudentId, deadline: Deadline)
    -> Result<Option<Student>, Error>;

    /// Cached lookup of every student enrolled in `course`.
    async fn get_by_course_id(
        &self,
        course: &CourseId,
        deadline: Deadline,
    ) -> Result<Vec<Student>, Error>;

    /// Uncached lookup by email.
    async fn get_by_email(&self, email: &Email, deadline: Deadline)
    -> Result<Option<Student>, Error>;

    /// Persist a new student and cache the stored record.
    async fn create(&self, student: NewStudent, deadline: Deadline) -> Result<Student, Error>;

    /// Apply a partial update and refresh the cached record.
    async fn update(
        &self,
        id: &StudentId,
        changes: &StudentChanges,
        deadline: Deadline,
    ) -> Result<Student, Error>;

    /// Remove a student and evict its cached record.
    async fn delete(&self, id: &StudentId, deadline: Deadline) -> Result<(), Error>;

    /// Uncached email existence check.
    async fn email_exists(&self, email: &Email, deadline: Deadline) -> Result<bool, Error>;
}
