//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (`StudentRepository`, `StudentCache`, `PasswordHasher`,
//! `AccessTokenCodec`, `RefreshTokenStore`, `CourseCatalogue`) are
//! implemented by outbound adapters. `StudentRecords` is implemented by the
//! domain's cache-aside store. `StudentUseCases` is the driving port called
//! by inbound adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod access_token_codec;
mod cache_key;
mod course_catalogue;
mod password_hasher;
mod refresh_token_store;
mod student_cache;
mod student_records;
mod student_repository;
mod student_use_cases;

#[cfg(test)]
pub use access_token_codec::MockAccessTokenCodec;
pub use access_token_codec::{AccessTokenCodec, AccessTokenError};
pub use cache_key::{CacheKey, CacheKeyValidationError};
#[cfg(test)]
pub use course_catalogue::MockCourseCatalogue;
pub use course_catalogue::{CourseCatalogue, CourseCatalogueError, CourseDetails};
#[cfg(test)]
pub use password_hasher::MockPasswordHasher;
pub use password_hasher::{HashingError, PasswordHasher};
#[cfg(test)]
pub use refresh_token_store::MockRefreshTokenStore;
pub use refresh_token_store::{RefreshTokenStore, RefreshTokenStoreError};
#[cfg(test)]
pub use student_cache::MockStudentCache;
pub use student_cache::{StudentCache, StudentCacheError};
#[cfg(test)]
pub use student_records::MockStudentRecords;
pub use student_records::StudentRecords;
#[cfg(test)]
pub use student_repository::MockStudentRepository;
pub use student_repository::{StudentRepository, StudentRepositoryError};
#[cfg(test)]
pub use student_use_cases::MockStudentUseCases;
pub use student_use_cases::StudentUseCases;
