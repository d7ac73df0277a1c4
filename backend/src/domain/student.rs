//! Student data model.
//!
//! Value types validate on construction so the rest of the domain can rely
//! on their invariants. Every newtype round-trips through serde as a plain
//! string (or UUID) so cached snapshots stay readable.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum length of a first or last name, in characters.
pub const NAME_MAX: usize = 100;
/// Maximum length of an email address, in characters.
pub const EMAIL_MAX: usize = 254;
/// Maximum length of a course identifier, in characters.
pub const COURSE_ID_MAX: usize = 64;
/// Oldest accepted age.
pub const AGE_MAX: u8 = 150;

/// Validation errors raised by student value constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StudentValidationError {
    InvalidId,
    EmptyFirstName,
    FirstNameTooLong { max: usize },
    EmptyLastName,
    LastNameTooLong { max: usize },
    EmptyEmail,
    EmailTooLong { max: usize },
    InvalidEmail,
    EmptyCourseId,
    CourseIdTooLong { max: usize },
    AgeOutOfRange { max: u8 },
    EmptyChanges,
}

impl fmt::Display for StudentValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidId => write!(f, "student id must be a valid UUID"),
            Self::EmptyFirstName => write!(f, "first name must not be empty"),
            Self::FirstNameTooLong { max } => {
                write!(f, "first name must be at most {max} characters")
            }
            Self::EmptyLastName => write!(f, "last name must not be empty"),
            Self::LastNameTooLong { max } => {
                write!(f, "last name must be at most {max} characters")
            }
            Self::EmptyEmail => write!(f, "email must not be empty"),
            Self::EmailTooLong { max } => write!(f, "email must be at most {max} characters"),
            Self::InvalidEmail => write!(f, "email must look like local@domain"),
            Self::EmptyCourseId => write!(f, "course id must not be empty"),
            Self::CourseIdTooLong { max } => {
                write!(f, "course id must be at most {max} characters")
            }
            Self::AgeOutOfRange { max } => write!(f, "age must be between 0 and {max}"),
            Self::EmptyChanges => write!(f, "update must change at least one field"),
        }
    }
}

impl std::error::Error for StudentValidationError {}

impl StudentValidationError {
    /// Request field the error refers to, in the wire (camelCase) spelling.
    pub fn field(&self) -> &'static str {
        match self {
            Self::InvalidId => "id",
            Self::EmptyFirstName | Self::FirstNameTooLong { .. } => "firstName",
            Self::EmptyLastName | Self::LastNameTooLong { .. } => "lastName",
            Self::EmptyEmail | Self::EmailTooLong { .. } | Self::InvalidEmail => "email",
            Self::EmptyCourseId | Self::CourseIdTooLong { .. } => "courses",
            Self::AgeOutOfRange { .. } => "age",
            Self::EmptyChanges => "body",
        }
    }
}

/// Store-assigned student identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudentId(Uuid);

impl StudentId {
    /// Parse an identifier from its textual form.
    pub fn new(id: impl AsRef<str>) -> Result<Self, StudentValidationError> {
        let raw = id.as_ref();
        if raw.trim() != raw {
            return Err(StudentValidationError::InvalidId);
        }
        Uuid::parse_str(raw)
            .map(Self)
            .map_err(|_| StudentValidationError::InvalidId)
    }

    /// Wrap a UUID produced by the persistent store.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Generate a random identifier. Used by in-memory stores.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

fn validate_name(
    raw: String,
    empty: StudentValidationError,
    too_long: StudentValidationError,
) -> Result<String, StudentValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(empty);
    }
    if trimmed.chars().count() > NAME_MAX {
        return Err(too_long);
    }
    Ok(trimmed.to_owned())
}

macro_rules! string_newtype {
    ($(#[$meta:meta])* $name:ident, $validate:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Validate and construct the value.
            pub fn new(value: impl Into<String>) -> Result<Self, StudentValidationError> {
                let validate: fn(String) -> Result<String, StudentValidationError> = $validate;
                validate(value.into()).map(Self)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.0.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_ref())
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = StudentValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }
    };
}

string_newtype!(
    /// Student first name, trimmed and non-empty.
    FirstName,
    |raw| validate_name(
        raw,
        StudentValidationError::EmptyFirstName,
        StudentValidationError::FirstNameTooLong { max: NAME_MAX },
    )
);

string_newtype!(
    /// Student last name, trimmed and non-empty.
    LastName,
    |raw| validate_name(
        raw,
        StudentValidationError::EmptyLastName,
        StudentValidationError::LastNameTooLong { max: NAME_MAX },
    )
);

string_newtype!(
    /// Email address, trimmed and lowercased.
    ///
    /// ## Invariants
    /// - exactly one `@` with non-empty local and domain parts
    /// - no whitespace
    /// - at most [`EMAIL_MAX`] characters
    ///
    /// # Examples
    /// ```
    /// use student_records::domain::Email;
    ///
    /// let email = Email::new("  Ada@Example.COM ").expect("valid email");
    /// assert_eq!(email.as_ref(), "ada@example.com");
    /// ```
    Email,
    |raw| {
        let normalised = raw.trim().to_lowercase();
        if normalised.is_empty() {
            return Err(StudentValidationError::EmptyEmail);
        }
        if normalised.chars().count() > EMAIL_MAX {
            return Err(StudentValidationError::EmailTooLong { max: EMAIL_MAX });
        }
        if normalised.chars().any(char::is_whitespace) {
            return Err(StudentValidationError::InvalidEmail);
        }
        match normalised.split_once('@') {
            Some((local, domain))
                if !local.is_empty() && !domain.is_empty() && !domain.contains('@') =>
            {
                Ok(normalised)
            }
            _ => Err(StudentValidationError::InvalidEmail),
        }
    }
);

string_newtype!(
    /// Course identifier as issued by the course service.
    CourseId,
    |raw| {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(StudentValidationError::EmptyCourseId);
        }
        if trimmed.chars().count() > COURSE_ID_MAX {
            return Err(StudentValidationError::CourseIdTooLong { max: COURSE_ID_MAX });
        }
        Ok(trimmed.to_owned())
    }
);

/// Student age in whole years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Age(u8);

impl Age {
    /// Validate and construct an age.
    pub fn new(years: u8) -> Result<Self, StudentValidationError> {
        if years > AGE_MAX {
            return Err(StudentValidationError::AgeOutOfRange { max: AGE_MAX });
        }
        Ok(Self(years))
    }

    /// Convert from a wider integer, as read from JSON or SQL.
    pub fn from_i64(years: i64) -> Result<Self, StudentValidationError> {
        u8::try_from(years)
            .map_err(|_| StudentValidationError::AgeOutOfRange { max: AGE_MAX })
            .and_then(Self::new)
    }

    /// Age in years.
    pub fn years(self) -> u8 {
        self.0
    }
}

impl From<Age> for u8 {
    fn from(value: Age) -> Self {
        value.0
    }
}

impl TryFrom<u8> for Age {
    type Error = StudentValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Output of the credential hasher. Never the plaintext.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Wrap an encoded hash string (PHC format).
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    /// Borrow the encoded hash.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(<redacted>)")
    }
}

/// A stored student record.
///
/// The snapshot includes the password hash because it is also the cache
/// representation; inbound adapters must project it away before responding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    id: StudentId,
    first_name: FirstName,
    last_name: LastName,
    email: Email,
    password_hash: PasswordHash,
    age: Option<Age>,
    courses: BTreeSet<CourseId>,
}

impl Student {
    /// Assemble a student from a new-record payload and its assigned id.
    pub fn from_new(id: StudentId, new: NewStudent) -> Self {
        let NewStudent {
            first_name,
            last_name,
            email,
            password_hash,
            age,
            courses,
        } = new;
        Self {
            id,
            first_name,
            last_name,
            email,
            password_hash,
            age,
            courses,
        }
    }

    /// Return a copy with the supplied changes applied.
    pub fn with_changes(mut self, changes: &StudentChanges) -> Self {
        if let Some(first_name) = &changes.first_name {
            self.first_name = first_name.clone();
        }
        if let Some(last_name) = &changes.last_name {
            self.last_name = last_name.clone();
        }
        if let Some(age) = changes.age {
            self.age = Some(age);
        }
        if let Some(courses) = &changes.courses {
            self.courses = courses.clone();
        }
        self
    }

    pub fn id(&self) -> &StudentId {
        &self.id
    }

    pub fn first_name(&self) -> &FirstName {
        &self.first_name
    }

    pub fn last_name(&self) -> &LastName {
        &self.last_name
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn password_hash(&self) -> &PasswordHash {
        &self.password_hash
    }

    pub fn age(&self) -> Option<Age> {
        self.age
    }

    pub fn courses(&self) -> &BTreeSet<CourseId> {
        &self.courses
    }

    /// Whether the student is enrolled in `course`.
    pub fn attends(&self, course: &CourseId) -> bool {
        self.courses.contains(course)
    }
}

/// Payload for creating a student. The store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStudent {
    pub first_name: FirstName,
    pub last_name: LastName,
    pub email: Email,
    pub password_hash: PasswordHash,
    pub age: Option<Age>,
    pub courses: BTreeSet<CourseId>,
}

/// Partial update of the mutable student fields.
///
/// Email, id and password hash are deliberately absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentChanges {
    first_name: Option<FirstName>,
    last_name: Option<LastName>,
    age: Option<Age>,
    courses: Option<BTreeSet<CourseId>>,
}

impl StudentChanges {
    /// Build a change set, rejecting one that changes nothing.
    ///
    /// # Examples
    /// ```
    /// use student_records::domain::{FirstName, StudentChanges, StudentValidationError};
    ///
    /// let rename = StudentChanges::new(Some(FirstName::new("Ada")?), None, None, None)?;
    /// assert!(rename.first_name().is_some());
    ///
    /// let empty = StudentChanges::new(None, None, None, None);
    /// assert_eq!(empty, Err(StudentValidationError::EmptyChanges));
    /// # Ok::<(), StudentValidationError>(())
    /// ```
    pub fn new(
        first_name: Option<FirstName>,
        last_name: Option<LastName>,
        age: Option<Age>,
        courses: Option<BTreeSet<CourseId>>,
    ) -> Result<Self, StudentValidationError> {
        let changes = Self {
            first_name,
            last_name,
            age,
            courses,
        };
        if changes.is_empty() {
            return Err(StudentValidationError::EmptyChanges);
        }
        Ok(changes)
    }

    fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.age.is_none()
            && self.courses.is_none()
    }

    pub fn first_name(&self) -> Option<&FirstName> {
        self.first_name.as_ref()
    }

    pub fn last_name(&self) -> Option<&LastName> {
        self.last_name.as_ref()
    }

    pub fn age(&self) -> Option<Age> {
        self.age
    }

    pub fn courses(&self) -> Option<&BTreeSet<CourseId>> {
        self.courses.as_ref()
    }
}
