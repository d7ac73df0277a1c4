//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL student repository using Diesel ORM
//! - **cache**: Redis snapshot cache and refresh token store
//! - **security**: Argon2id password hashing and HS256 access tokens
//! - **courses**: HTTP client for the course service
//!
//! Adapters are thin translators that convert between domain types and
//! infrastructure-specific representations. They contain no business logic.

pub mod cache;
pub mod courses;
pub mod persistence;
pub mod security;
