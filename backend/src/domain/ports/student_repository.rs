//! Port abstraction for the persistent student store.
//!
//! Only the cache-aside record store talks to this port. Use-case code goes
//! through [`super::StudentRecords`] instead.

use async_trait::async_trait;

use crate::domain::{CourseId, Email, NewStudent, Student, StudentChanges, StudentId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by student repository adapters.
    pub enum StudentRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "student repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "student repository query failed: {message}",
        /// The unique email index rejected an insert.
        DuplicateEmail { email: String } => "email {email} is already registered",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StudentRepository: Send + Sync {
    /// Fetch a student by identifier.
    async fn find_by_id(&self, id: &StudentId) -> Result<Option<Student>, StudentRepositoryError>;

    /// Fetch a student by normalised email.
    async fn find_by_email(&self, email: &Email)
    -> Result<Option<Student>, StudentRepositoryError>;

    /// Every student whose course set contains `course`.
    async fn find_by_course(&self, course: &CourseId)
    -> Result<Vec<Student>, StudentRepositoryError>;

    /// Insert a student; the store assigns the id.
    async fn insert(&self, student: &NewStudent) -> Result<Student, StudentRepositoryError>;

    /// Apply `changes` atomically and return the post-update row, or `None`
    /// when no row matches.
    async fn update(
        &self,
        id: &StudentId,
        changes: &StudentChanges,
    ) -> Result<Option<Student>, StudentRepositoryError>;

    /// Delete a student. Returns whether a row was removed.
    async fn delete(&self, id: &StudentId) -> Result<bool, StudentRepositoryError>;

    async fn email_exists(&self, email: &Email) -> Result<bool, StudentRepositoryError>;
}
