//! Authentication primitives: sign-up and sign-in payloads and issued tokens.
//!
//! Inbound adapters build these from raw request bodies so the domain only
//! ever sees validated values. Plaintext passwords are held in
//! [`Zeroizing`] buffers and never leave this module except by reference.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::{Age, CourseId, Email, FirstName, LastName, StudentId};

/// Errors raised when validating credential payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialsValidationError {
    /// Password was blank.
    EmptyPassword,
}

impl fmt::Display for CredentialsValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPassword => write!(f, "password must not be empty"),
        }
    }
}

impl std::error::Error for CredentialsValidationError {}

fn checked_password(password: &str) -> Result<Zeroizing<String>, CredentialsValidationError> {
    if password.is_empty() {
        return Err(CredentialsValidationError::EmptyPassword);
    }
    Ok(Zeroizing::new(password.to_owned()))
}

/// Validated sign-in credentials.
///
/// ## Invariants
/// - `email` is normalised by [`Email`].
/// - `password` is non-empty and keeps caller whitespace.
///
/// # Examples
/// ```
/// use student_records::domain::{Email, SignInCredentials};
///
/// let email = Email::new("ada@example.com").expect("valid email");
/// let creds = SignInCredentials::try_from_parts(email, "hunter2").expect("valid creds");
/// assert_eq!(creds.password(), "hunter2");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInCredentials {
    email: Email,
    password: Zeroizing<String>,
}

impl SignInCredentials {
    /// Construct credentials from a validated email and a raw password.
    pub fn try_from_parts(email: Email, password: &str) -> Result<Self, CredentialsValidationError> {
        Ok(Self {
            email,
            password: checked_password(password)?,
        })
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Validated sign-up payload. Also used for authenticated student creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    first_name: FirstName,
    last_name: LastName,
    email: Email,
    password: Zeroizing<String>,
    age: Option<Age>,
    courses: BTreeSet<CourseId>,
}

/// Validated profile fields of a [`Registration`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationProfile {
    pub first_name: FirstName,
    pub last_name: LastName,
    pub email: Email,
    pub age: Option<Age>,
    pub courses: BTreeSet<CourseId>,
}

impl Registration {
    /// Combine validated profile fields with a raw password.
    pub fn try_new(
        profile: RegistrationProfile,
        password: &str,
    ) -> Result<Self, CredentialsValidationError> {
        let RegistrationProfile {
            first_name,
            last_name,
            email,
            age,
            courses,
        } = profile;
        Ok(Self {
            first_name,
            last_name,
            email,
            password: checked_password(password)?,
            age,
            courses,
        })
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn password(&self) -> &str {
        self.password.as_str()
    }

    /// Split into profile fields and the plaintext password.
    pub fn into_parts(self) -> (RegistrationProfile, Zeroizing<String>) {
        let Self {
            first_name,
            last_name,
            email,
            password,
            age,
            courses,
        } = self;
        (
            RegistrationProfile {
                first_name,
                last_name,
                email,
                age,
                courses,
            },
            password,
        )
    }
}

/// Claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Student id the token was issued to.
    pub sub: String,
    /// Issued-at, seconds since the Unix epoch.
    pub iat: i64,
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
}

/// Signed, expiring bearer credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub student_id: StudentId,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Number of random bytes behind a refresh token.
pub const REFRESH_TOKEN_BYTES: usize = 32;

/// Opaque refresh token: 32 random bytes, hex encoded.
#[derive(Clone, PartialEq, Eq)]
pub struct RefreshToken(Zeroizing<String>);

/// Refresh token text that is not 64 lowercase hex characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MalformedRefreshToken;

impl fmt::Display for MalformedRefreshToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "refresh token is malformed")
    }
}

impl std::error::Error for MalformedRefreshToken {}

impl RefreshToken {
    /// Generate a fresh token from the thread-local CSPRNG.
    pub fn generate() -> Self {
        let bytes: [u8; REFRESH_TOKEN_BYTES] = rand::thread_rng().r#gen();
        Self(Zeroizing::new(hex::encode(bytes)))
    }

    /// Parse caller-supplied token text.
    ///
    /// # Examples
    /// ```
    /// use student_records::domain::RefreshToken;
    ///
    /// assert!(RefreshToken::parse(&"ab".repeat(32)).is_ok());
    /// assert!(RefreshToken::parse("short").is_err());
    /// ```
    pub fn parse(raw: &str) -> Result<Self, MalformedRefreshToken> {
        let well_formed = raw.len() == REFRESH_TOKEN_BYTES * 2
            && raw
                .bytes()
                .all(|byte| byte.is_ascii_digit() || (b'a'..=b'f').contains(&byte));
        if !well_formed {
            return Err(MalformedRefreshToken);
        }
        Ok(Self(Zeroizing::new(raw.to_owned())))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for RefreshToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RefreshToken(<redacted>)")
    }
}

/// Tokens returned by a successful sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthTokens {
    pub access: AccessToken,
    pub refresh_token: RefreshToken,
}
