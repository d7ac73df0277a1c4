//! PostgreSQL-backed `StudentRepository` implementation using Diesel.
//!
//! Updates run as a single `UPDATE ... RETURNING` statement so concurrent
//! writers touching different fields never overwrite each other's changes.
//! Course membership queries use the array containment operator, which the
//! GIN index on `courses` serves.

use std::collections::BTreeSet;

use async_trait::async_trait;
use diesel::dsl::{exists, now};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{StudentRepository, StudentRepositoryError};
use crate::domain::{
    Age, CourseId, Email, FirstName, LastName, NewStudent, PasswordHash, Student, StudentChanges,
    StudentId, StudentValidationError,
};

use super::diesel_error_mapping::{DieselFailure, classify_diesel_error};
use super::models::{NewStudentRow, StudentChangeset, StudentRow};
use super::pool::{DbPool, PoolError};
use super::schema::students;

/// Diesel-backed implementation of the `StudentRepository` port.
#[derive(Clone)]
pub struct DieselStudentRepository {
    pool: DbPool,
}

impl DieselStudentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> StudentRepositoryError {
    StudentRepositoryError::connection(error.into_message())
}

fn map_diesel_error(error: diesel::result::Error, email: Option<&Email>) -> StudentRepositoryError {
    match (classify_diesel_error(error), email) {
        (DieselFailure::Connection(message), _) => StudentRepositoryError::connection(message),
        (DieselFailure::UniqueViolation { .. }, Some(email)) => {
            StudentRepositoryError::duplicate_email(email.as_ref())
        }
        (DieselFailure::UniqueViolation { constraint }, None) => {
            StudentRepositoryError::query(format!(
                "unique constraint violated: {}",
                constraint.as_deref().unwrap_or("unknown")
            ))
        }
        (DieselFailure::Query(message), _) => StudentRepositoryError::query(message),
    }
}

fn map_query_error(error: diesel::result::Error) -> StudentRepositoryError {
    map_diesel_error(error, None)
}

fn corrupt_row(id: uuid::Uuid, err: &StudentValidationError) -> StudentRepositoryError {
    StudentRepositoryError::query(format!("stored student {id} is invalid: {err}"))
}

/// Convert a database row into a domain student, rejecting rows that no
/// longer satisfy the domain invariants.
fn row_to_student(row: StudentRow) -> Result<Student, StudentRepositoryError> {
    let id = row.id;
    let invalid = |err: StudentValidationError| corrupt_row(id, &err);
    let age = row
        .age
        .map(|years| Age::from_i64(i64::from(years)))
        .transpose()
        .map_err(invalid)?;
    let courses = row
        .courses
        .into_iter()
        .map(CourseId::new)
        .collect::<Result<BTreeSet<_>, _>>()
        .map_err(invalid)?;
    let student = NewStudent {
        first_name: FirstName::new(row.first_name).map_err(invalid)?,
        last_name: LastName::new(row.last_name).map_err(invalid)?,
        email: Email::new(row.email).map_err(invalid)?,
        password_hash: PasswordHash::new(row.password_hash),
        age,
        courses,
    };
    Ok(Student::from_new(StudentId::from_uuid(id), student))
}

fn rows_to_students(rows: Vec<StudentRow>) -> Result<Vec<Student>, StudentRepositoryError> {
    rows.into_iter().map(row_to_student).collect()
}

fn course_strings<'a>(courses: impl IntoIterator<Item = &'a CourseId>) -> Vec<String> {
    courses
        .into_iter()
        .map(|course| course.as_ref().to_owned())
        .collect()
}

fn changeset(changes: &StudentChanges) -> StudentChangeset<'_> {
    StudentChangeset {
        first_name: changes.first_name().map(|name| name.as_ref()),
        last_name: changes.last_name().map(|name| name.as_ref()),
        age: changes.age().map(|age| i16::from(age.years())),
        courses: changes.courses().map(|courses| course_strings(courses)),
    }
}

#[async_trait]
impl StudentRepository for DieselStudentRepository {
    async fn find_by_id(&self, id: &StudentId) -> Result<Option<Student>, StudentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<StudentRow> = students::table
            .find(id.as_uuid())
            .select(StudentRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_query_error)?;
        row.map(row_to_student).transpose()
    }

    async fn find_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<Student>, StudentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<StudentRow> = students::table
            .filter(students::email.eq(email.as_ref()))
            .select(StudentRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_query_error)?;
        row.map(row_to_student).transpose()
    }

    async fn find_by_course(
        &self,
        course: &CourseId,
    ) -> Result<Vec<Student>, StudentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<StudentRow> = students::table
            .filter(students::courses.contains(vec![course.as_ref().to_owned()]))
            .order(students::id)
            .select(StudentRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_query_error)?;
        rows_to_students(rows)
    }

    async fn insert(&self, student: &NewStudent) -> Result<Student, StudentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewStudentRow {
            first_name: student.first_name.as_ref(),
            last_name: student.last_name.as_ref(),
            email: student.email.as_ref(),
            password_hash: student.password_hash.as_str(),
            age: student.age.map(|age| i16::from(age.years())),
            courses: course_strings(&student.courses),
        };
        let stored: StudentRow = diesel::insert_into(students::table)
            .values(&row)
            .returning(StudentRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, Some(&student.email)))?;
        row_to_student(stored)
    }

    async fn update(
        &self,
        id: &StudentId,
        changes: &StudentChanges,
    ) -> Result<Option<Student>, StudentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<StudentRow> = diesel::update(students::table.find(id.as_uuid()))
            .set((&changeset(changes), students::updated_at.eq(now)))
            .returning(StudentRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_query_error)?;
        row.map(row_to_student).transpose()
    }

    async fn delete(&self, id: &StudentId) -> Result<bool, StudentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let removed = diesel::delete(students::table.find(id.as_uuid()))
            .execute(&mut conn)
            .await
            .map_err(map_query_error)?;
        Ok(removed > 0)
    }

    async fn email_exists(&self, email: &Email) -> Result<bool, StudentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::select(exists(
            students::table.filter(students::email.eq(email.as_ref())),
        ))
        .get_result(&mut conn)
        .await
        .map_err(map_query_error)
    }
}

#[cfg(test)]
mod tests {
    //! Mapping and row conversion; query behaviour is covered against a live
    //! database outside the unit suite.
    use super::*;
    use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind};
    use rstest::rstest;
    use uuid::Uuid;

    fn row() -> StudentRow {
        StudentRow {
            id: Uuid::new_v4(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".into(),
            age: Some(36),
            courses: vec!["math-101".into(), "cs-1".into()],
        }
    }

    #[rstest]
    fn pool_error_maps_to_connection_error() {
        let err = map_pool_error(PoolError::checkout("connection refused"));
        assert_eq!(err, StudentRepositoryError::connection("connection refused"));
    }

    #[rstest]
    fn not_found_maps_to_query_error() {
        let err = map_query_error(diesel::result::Error::NotFound);
        assert!(matches!(err, StudentRepositoryError::Query { .. }));
    }

    #[derive(Debug)]
    struct EmailIndex;

    impl DatabaseErrorInformation for EmailIndex {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint"
        }
        fn details(&self) -> Option<&str> {
            None
        }
        fn hint(&self) -> Option<&str> {
            None
        }
        fn table_name(&self) -> Option<&str> {
            Some("students")
        }
        fn column_name(&self) -> Option<&str> {
            None
        }
        fn constraint_name(&self) -> Option<&str> {
            Some("students_email_key")
        }
        fn statement_position(&self) -> Option<i32> {
            None
        }
    }

    fn unique_violation() -> diesel::result::Error {
        diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, Box::new(EmailIndex))
    }

    #[rstest]
    fn unique_violation_on_insert_is_duplicate_email() {
        let email = Email::new("ada@example.com").expect("email");
        let err = map_diesel_error(unique_violation(), Some(&email));
        assert_eq!(err, StudentRepositoryError::duplicate_email("ada@example.com"));
    }

    #[rstest]
    fn unique_violation_elsewhere_names_the_constraint() {
        let err = map_query_error(unique_violation());
        assert!(err.to_string().contains("students_email_key"));
    }

    #[rstest]
    fn row_converts_to_student() {
        let row = row();
        let id = row.id;
        let student = row_to_student(row).expect("valid row");
        assert_eq!(student.id().as_uuid(), &id);
        assert_eq!(student.age().map(Age::years), Some(36));
        assert_eq!(student.courses().len(), 2);
    }

    #[rstest]
    #[case::negative_age(StudentRow { age: Some(-1), ..row() })]
    #[case::bad_email(StudentRow { email: "nope".into(), ..row() })]
    #[case::blank_course(StudentRow { courses: vec![" ".into()], ..row() })]
    fn invalid_rows_are_query_errors(#[case] row: StudentRow) {
        let err = row_to_student(row).expect_err("corrupt row");
        assert!(err.to_string().contains("is invalid"));
    }

    #[rstest]
    fn changeset_only_sets_supplied_fields() {
        let changes = StudentChanges::new(
            None,
            Some(LastName::new("King").expect("last name")),
            None,
            Some(BTreeSet::from([CourseId::new("cs-1").expect("course")])),
        )
        .expect("non-empty changes");
        let set = changeset(&changes);

        assert!(set.first_name.is_none());
        assert_eq!(set.last_name, Some("King"));
        assert!(set.age.is_none());
        assert_eq!(set.courses, Some(vec!["cs-1".to_owned()]));
    }
}
