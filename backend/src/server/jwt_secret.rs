//! Access-token signing secret loading.
//!
//! Lookup order: the file named by `JWT_SECRET_FILE`, then the inline
//! `JWT_SECRET` variable. Release builds refuse secrets shorter than
//! [`JWT_SECRET_MIN_LEN`] bytes and never fall back to an ephemeral secret.
//! Debug builds, or any build with `JWT_ALLOW_EPHEMERAL=1`, generate a random
//! secret with a warning; tokens then stop verifying on restart.

use std::path::PathBuf;

use mockable::Env;
use rand::RngCore;
use tracing::warn;
use zeroize::Zeroizing;

pub(crate) const JWT_SECRET_MIN_LEN: usize = 32;
const SECRET_FILE_ENV: &str = "JWT_SECRET_FILE";
const SECRET_ENV: &str = "JWT_SECRET";
const ALLOW_EPHEMERAL_ENV: &str = "JWT_ALLOW_EPHEMERAL";

/// Build mode for secret validation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildMode {
    Debug,
    Release,
}

impl BuildMode {
    #[must_use]
    pub fn from_debug_assertions() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Release
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum JwtSecretError {
    #[error("no JWT secret configured; set {SECRET_FILE_ENV} or {SECRET_ENV}")]
    Missing,
    #[error("failed to read JWT secret at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("JWT secret from {origin} too short: need >= {min_len} bytes, got {length}")]
    TooShort {
        origin: String,
        length: usize,
        min_len: usize,
    },
}

fn allow_ephemeral<E: Env>(env: &E, mode: BuildMode) -> bool {
    mode == BuildMode::Debug
        || env
            .string(ALLOW_EPHEMERAL_ENV)
            .is_some_and(|value| matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
}

fn configured_secret<E: Env>(env: &E) -> Result<Option<(String, Zeroizing<Vec<u8>>)>, JwtSecretError> {
    if let Some(path) = env.string(SECRET_FILE_ENV) {
        let path = PathBuf::from(path);
        let bytes = std::fs::read(&path).map_err(|source| JwtSecretError::Read {
            path: path.clone(),
            source,
        })?;
        // Trailing newlines from `echo secret > file` are not part of the key.
        let mut bytes = Zeroizing::new(bytes);
        while bytes.last().is_some_and(|byte| matches!(byte, b'\n' | b'\r')) {
            bytes.pop();
        }
        return Ok(Some((path.display().to_string(), bytes)));
    }
    Ok(env
        .string(SECRET_ENV)
        .filter(|value| !value.is_empty())
        .map(|value| (SECRET_ENV.to_owned(), Zeroizing::new(value.into_bytes()))))
}

fn ephemeral() -> Zeroizing<Vec<u8>> {
    let mut bytes = Zeroizing::new(vec![0_u8; JWT_SECRET_MIN_LEN * 2]);
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

/// Resolve the HS256 signing secret.
///
/// # Errors
/// Returns [`JwtSecretError`] when release rules reject the configured
/// secret or no secret is available and ephemeral secrets are not allowed.
pub fn jwt_secret_from_env<E: Env>(
    env: &E,
    mode: BuildMode,
) -> Result<Zeroizing<Vec<u8>>, JwtSecretError> {
    match configured_secret(env) {
        Ok(Some((origin, secret))) => {
            if mode == BuildMode::Release && secret.len() < JWT_SECRET_MIN_LEN {
                return Err(JwtSecretError::TooShort {
                    origin,
                    length: secret.len(),
                    min_len: JWT_SECRET_MIN_LEN,
                });
            }
            if secret.is_empty() {
                warn!(origin = %origin, "JWT secret is empty; using ephemeral secret");
                return Ok(ephemeral());
            }
            Ok(secret)
        }
        Ok(None) if allow_ephemeral(env, mode) => {
            warn!("using ephemeral JWT secret; tokens will not survive a restart");
            Ok(ephemeral())
        }
        Ok(None) => Err(JwtSecretError::Missing),
        Err(error) if allow_ephemeral(env, mode) => {
            warn!(error = %error, "using ephemeral JWT secret; tokens will not survive a restart");
            Ok(ephemeral())
        }
        Err(error) => Err(error),
    }
}
