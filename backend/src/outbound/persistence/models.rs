//! Internal Diesel row structs for the `students` table.
//!
//! These types never leave the persistence layer.

use diesel::prelude::*;
use uuid::Uuid;

use super::schema::students;

/// Row read back from `students`. Audit timestamps are not selected.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = students)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct StudentRow {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub age: Option<i16>,
    pub courses: Vec<String>,
}

/// Insertable row; the database assigns `id` and timestamps.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = students)]
pub(crate) struct NewStudentRow<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub age: Option<i16>,
    pub courses: Vec<String>,
}

/// Partial update. `None` fields are left untouched.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = students)]
pub(crate) struct StudentChangeset<'a> {
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
    pub age: Option<i16>,
    pub courses: Option<Vec<String>>,
}
