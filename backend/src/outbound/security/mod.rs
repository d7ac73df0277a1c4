//! Credential hashing and access token signing adapters.

mod argon2_hasher;
mod jwt_codec;

pub use argon2_hasher::{Argon2Cost, Argon2PasswordHasher, MAX_PASSWORD_BYTES};
pub use jwt_codec::{EmptySecret, JwtAccessTokenCodec};
