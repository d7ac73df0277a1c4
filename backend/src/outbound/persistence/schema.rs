//! Diesel table definitions for the PostgreSQL schema.
//!
//! Must match `backend/migrations` exactly; regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Student records. `email` carries a unique index and `courses` a GIN
    /// index for membership queries.
    students (id) {
        id -> Uuid,
        first_name -> Varchar,
        last_name -> Varchar,
        email -> Varchar,
        password_hash -> Text,
        age -> Nullable<Int2>,
        courses -> Array<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}
