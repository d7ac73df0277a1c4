//! Driving port for the student-records use cases.
//!
//! Inbound adapters call this port and nothing else, which keeps handler
//! tests independent of persistence, caching and token infrastructure.

use async_trait::async_trait;

use crate::domain::{
    AccessToken, AuthTokens, CourseId, Deadline, Error, Registration, SignInCredentials, Student,
    StudentChanges, StudentId,
};

use super::CourseDetails;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StudentUseCases: Send + Sync {
    /// Register a new student. Fails with `conflict` on a taken email.
    async fn sign_up(&self, registration: Registration, deadline: Deadline)
    -> Result<Student, Error>;

    /// Exchange credentials for an access and refresh token.
    async fn sign_in(
        &self,
        credentials: &SignInCredentials,
        deadline: Deadline,
    ) -> Result<AuthTokens, Error>;

    /// Revoke the student's refresh token. Idempotent.
    async fn logout(&self, student_id: &StudentId, deadline: Deadline) -> Result<(), Error>;

    /// Mint a new access token from a refresh token.
    async fn refresh_token(&self, refresh_token: &str, deadline: Deadline)
    -> Result<AccessToken, Error>;

    /// Verify a bearer access token and return its subject.
    fn authenticate(&self, access_token: &str) -> Result<StudentId, Error>;

    async fn create_student(
        &self,
        registration: Registration,
        deadline: Deadline,
    ) -> Result<Student, Error>;

    async fn get_student_by_id(&self, id: &StudentId, deadline: Deadline)
    -> Result<Student, Error>;

    async fn get_students_by_course_id(
        &self,
        course: &CourseId,
        deadline: Deadline,
    ) -> Result<Vec<Student>, Error>;

    async fn update_student(
        &self,
        id: &StudentId,
        changes: &StudentChanges,
        deadline: Deadline,
    ) -> Result<Student, Error>;

    async fn delete_student(&self, id: &StudentId, deadline: Deadline) -> Result<(), Error>;

    /// Course details for a student, fetched from the course service.
    async fn get_student_courses(
        &self,
        id: &StudentId,
        deadline: Deadline,
    ) -> Result<Vec<CourseDetails>, Error>;
}
