//! Keys under which student snapshots live in the cache.

use thiserror::Error;

use crate::domain::{CourseId, StudentId};

/// Bump when the cached snapshot shape changes so old entries are ignored.
const SNAPSHOT_VERSION: &str = "v1";

/// Cache key for a student snapshot or a course membership list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Construct a key after checking it is non-empty and free of whitespace.
    pub fn new(value: impl Into<String>) -> Result<Self, CacheKeyValidationError> {
        let raw = value.into();
        if raw.trim().is_empty() {
            return Err(CacheKeyValidationError::Empty);
        }
        if raw.chars().any(char::is_whitespace) {
            return Err(CacheKeyValidationError::ContainsWhitespace);
        }
        Ok(Self(raw))
    }

    /// Key holding a single student snapshot.
    ///
    /// # Examples
    /// ```
    /// use student_records::domain::StudentId;
    /// use student_records::domain::ports::CacheKey;
    ///
    /// let id = StudentId::new("0b6c7a43-0f1e-4a53-9d2a-3c1c55f2d0b1").expect("uuid");
    /// assert_eq!(
    ///     CacheKey::for_student(&id).as_str(),
    ///     "student:v1:0b6c7a43-0f1e-4a53-9d2a-3c1c55f2d0b1"
    /// );
    /// ```
    pub fn for_student(id: &StudentId) -> Self {
        Self(format!("student:{SNAPSHOT_VERSION}:{id}"))
    }

    /// Key holding the list of students enrolled in `course`.
    ///
    /// Course ids may contain spaces, so they are percent-encoded.
    pub fn for_course(course: &CourseId) -> Self {
        let encoded: String = course
            .as_ref()
            .chars()
            .map(|ch| match ch {
                ' ' => "%20".to_owned(),
                '%' => "%25".to_owned(),
                ':' => "%3A".to_owned(),
                other => other.to_string(),
            })
            .collect();
        Self(format!("course:{SNAPSHOT_VERSION}:{encoded}:students"))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Validation errors returned when constructing [`CacheKey`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheKeyValidationError {
    #[error("cache key must not be empty")]
    Empty,
    #[error("cache key must not contain whitespace")]
    ContainsWhitespace,
}
