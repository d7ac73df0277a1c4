//! HS256 JSON Web Token implementation of the `AccessTokenCodec` port.

use std::collections::HashSet;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::domain::AccessClaims;
use crate::domain::ports::{AccessTokenCodec, AccessTokenError};

/// Rejected signing secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("jwt signing secret must not be empty")]
pub struct EmptySecret;

/// Signs and verifies access tokens with a shared HMAC secret.
///
/// Expiry is checked by the token service against its clock, so validation
/// here covers signature, algorithm and claim presence only.
#[derive(Clone)]
pub struct JwtAccessTokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl JwtAccessTokenCodec {
    /// Build a codec from raw secret bytes. The caller keeps ownership of the
    /// secret and is responsible for zeroising it.
    ///
    /// # Errors
    /// Returns [`EmptySecret`] for a zero-length secret.
    pub fn new(secret: &[u8]) -> Result<Self, EmptySecret> {
        if secret.is_empty() {
            return Err(EmptySecret);
        }
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.required_spec_claims =
            HashSet::from(["exp".to_owned(), "sub".to_owned()]);
        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        })
    }
}

impl std::fmt::Debug for JwtAccessTokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtAccessTokenCodec")
            .field("algorithm", &Algorithm::HS256)
            .finish_non_exhaustive()
    }
}

impl AccessTokenCodec for JwtAccessTokenCodec {
    fn encode(&self, claims: &AccessClaims) -> Result<String, AccessTokenError> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|err| AccessTokenError::encoding(err.to_string()))
    }

    fn decode(&self, token: &str) -> Result<AccessClaims, AccessTokenError> {
        jsonwebtoken::decode::<AccessClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    AccessTokenError::invalid_signature()
                }
                _ => AccessTokenError::malformed(err.to_string()),
            })
    }
}
