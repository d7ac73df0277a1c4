//! Student use cases.
//!
//! [`StudentService`] implements the [`StudentUseCases`] driving port by
//! composing the record store, the credential hasher, the token service and
//! the course catalogue. It reaches persistent data only through
//! [`StudentRecords`], so every write keeps the cache in step.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::domain::ports::{
    CourseCatalogue, CourseCatalogueError, CourseDetails, HashingError, PasswordHasher,
    StudentRecords, StudentUseCases,
};
use crate::domain::{
    AccessToken, AuthTokens, CourseId, Deadline, Error, NewStudent, PasswordHash, Registration,
    SignInCredentials, Student, StudentChanges, StudentId, TokenService,
};

const INVALID_CREDENTIALS: &str = "invalid email or password";

/// Argon2id hash matching no password, verified against on unknown emails so
/// both rejection paths pay for one hash.
const UNKNOWN_EMAIL_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$4gmnHm7gLVZCKCvjKF+mkQ$n47pg7RWfGPhv9c/39CWbYN5VVFSZV2oGsPVAUhom1Q";

/// Orchestrates sign-up, sign-in, token refresh and student CRUD.
#[derive(Clone)]
pub struct StudentService {
    records: Arc<dyn StudentRecords>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: TokenService,
    courses: Arc<dyn CourseCatalogue>,
}

impl StudentService {
    pub fn new(
        records: Arc<dyn StudentRecords>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: TokenService,
        courses: Arc<dyn CourseCatalogue>,
    ) -> Self {
        Self {
            records,
            hasher,
            tokens,
            courses,
        }
    }

    fn map_hashing_error(error: HashingError) -> Error {
        match error {
            HashingError::InputTooLong { max } => {
                Error::invalid_request(format!("password must be at most {max} bytes"))
                    .with_details(serde_json::json!({ "field": "password" }))
            }
            other => Error::internal(other.to_string()),
        }
    }

    fn map_catalogue_error(error: &CourseCatalogueError) -> Error {
        warn!(error = %error, "course service call failed");
        Error::service_unavailable(format!("course service unavailable: {error}"))
    }

    async fn register(&self, registration: Registration, deadline: Deadline) -> Result<Student, Error> {
        if self.records.email_exists(registration.email(), deadline).await? {
            info!(reason = "email_taken", "registration rejected");
            return Err(Error::conflict("email already registered"));
        }

        let (profile, password) = registration.into_parts();
        let hash = async {
            self.hasher
                .hash(password.as_str())
                .await
                .map_err(Self::map_hashing_error)
        };
        let password_hash = deadline.run("password hash", hash).await?;
        let student = NewStudent {
            first_name: profile.first_name,
            last_name: profile.last_name,
            email: profile.email,
            password_hash,
            age: profile.age,
            courses: profile.courses,
        };
        let created = self.records.create(student, deadline).await?;
        info!(student_id = %created.id(), "student registered");
        Ok(created)
    }
}

#[async_trait]
impl StudentUseCases for StudentService {
    async fn sign_up(&self, registration: Registration, deadline: Deadline) -> Result<Student, Error> {
        self.register(registration, deadline).await
    }

    async fn sign_in(
        &self,
        credentials: &SignInCredentials,
        deadline: Deadline,
    ) -> Result<AuthTokens, Error> {
        let Some(student) = self
            .records
            .get_by_email(credentials.email(), deadline)
            .await?
        else {
            let dummy = PasswordHash::new(UNKNOWN_EMAIL_HASH);
            let verify = async {
                match self.hasher.verify(credentials.password(), &dummy).await {
                    Err(err @ HashingError::InputTooLong { .. }) => Err(Self::map_hashing_error(err)),
                    _ => Ok(()),
                }
            };
            deadline.run("password verify", verify).await?;
            info!(reason = "unknown_email", "sign-in rejected");
            return Err(Error::authentication_failed(INVALID_CREDENTIALS));
        };

        let verify = async {
            self.hasher
                .verify(credentials.password(), student.password_hash())
                .await
                .map_err(Self::map_hashing_error)
        };
        if !deadline.run("password verify", verify).await? {
            info!(reason = "wrong_password", student_id = %student.id(), "sign-in rejected");
            return Err(Error::authentication_failed(INVALID_CREDENTIALS));
        }

        let access = self.tokens.issue_access_token(student.id())?;
        let refresh_token = self.tokens.issue_refresh_token(student.id(), deadline).await?;
        info!(student_id = %student.id(), "student signed in");
        Ok(AuthTokens {
            access,
            refresh_token,
        })
    }

    async fn logout(&self, student_id: &StudentId, deadline: Deadline) -> Result<(), Error> {
        self.tokens.revoke_refresh_token(student_id, deadline).await?;
        info!(student_id = %student_id, "student logged out");
        Ok(())
    }

    async fn refresh_token(
        &self,
        refresh_token: &str,
        deadline: Deadline,
    ) -> Result<AccessToken, Error> {
        let student_id = self
            .tokens
            .validate_refresh_token(refresh_token, deadline)
            .await
            .map_err(|rejection| {
                info!(reason = %rejection, "refresh rejected");
                Error::from(rejection)
            })?;
        self.tokens.issue_access_token(&student_id)
    }

    fn authenticate(&self, access_token: &str) -> Result<StudentId, Error> {
        self.tokens.verify_access_token(access_token)
    }

    async fn create_student(
        &self,
        registration: Registration,
        deadline: Deadline,
    ) -> Result<Student, Error> {
        self.register(registration, deadline).await
    }

    async fn get_student_by_id(&self, id: &StudentId, deadline: Deadline) -> Result<Student, Error> {
        self.records
            .get_by_id(id, deadline)
            .await?
            .ok_or_else(|| Error::not_found(format!("student {id} not found")))
    }

    async fn get_students_by_course_id(
        &self,
        course: &CourseId,
        deadline: Deadline,
    ) -> Result<Vec<Student>, Error> {
        self.records.get_by_course_id(course, deadline).await
    }

    async fn update_student(
        &self,
        id: &StudentId,
        changes: &StudentChanges,
        deadline: Deadline,
    ) -> Result<Student, Error> {
        self.records.update(id, changes, deadline).await
    }

    async fn delete_student(&self, id: &StudentId, deadline: Deadline) -> Result<(), Error> {
        self.records.delete(id, deadline).await
    }

    async fn get_student_courses(
        &self,
        id: &StudentId,
        deadline: Deadline,
    ) -> Result<Vec<CourseDetails>, Error> {
        self.get_student_by_id(id, deadline).await?;
        let fetch = async {
            self.courses
                .courses_for_student(id)
                .await
                .map_err(|err| Self::map_catalogue_error(&err))
        };
        deadline.run("course lookup", fetch).await
    }
}

#[cfg(test)]
mod tests;
