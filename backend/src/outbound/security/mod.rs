//! Credential signing and password hashing adapters.

mod bcrypt_hasher;
mod jwt_tokens;

pub use bcrypt_hasher::BcryptPasswordHasher;
pub use jwt_tokens::{DEFAULT_TOKEN_TTL, JwtTokenService};
