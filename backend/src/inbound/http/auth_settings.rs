//! Credential signing and cookie settings.
//!
//! This module centralises the environment-driven authentication settings so
//! they are validated consistently and can be tested in isolation. Debug
//! builds tolerate missing values and fall back to development defaults;
//! release builds require every toggle and a signing secret of at least
//! [`SECRET_MIN_LEN`] bytes.

use std::path::PathBuf;

use mockable::Env;
use rand::RngCore;
use tracing::warn;
use zeroize::{Zeroize, Zeroizing};

use super::state::CookiePolicy;

pub mod fingerprint;
mod parsing;

use parsing::EnvReader;

const SECRET_DEFAULT_PATH: &str = "/var/run/secrets/auth_secret";
/// Shortest signing secret accepted in release builds.
pub const SECRET_MIN_LEN: usize = 32;
pub(crate) const SECRET_FILE_ENV: &str = "AUTH_SECRET_FILE";
pub(crate) const COOKIE_SECURE_ENV: &str = "AUTH_COOKIE_SECURE";
pub(crate) const SAMESITE_ENV: &str = "AUTH_SAMESITE";
pub(crate) const ALLOW_EPHEMERAL_ENV: &str = "AUTH_ALLOW_EPHEMERAL";

/// Build mode for settings validation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildMode {
    /// Debug builds tolerate defaults and emit warnings for missing toggles.
    Debug,
    /// Release builds require explicit, valid toggles.
    Release,
}

impl BuildMode {
    /// Determine the build mode from `cfg!(debug_assertions)`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use marketplace::inbound::http::auth_settings::BuildMode;
    ///
    /// let mode = BuildMode::from_debug_assertions();
    /// assert_eq!(mode == BuildMode::Debug, cfg!(debug_assertions));
    /// ```
    #[must_use]
    pub fn from_debug_assertions() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Release
        }
    }

    pub(crate) fn is_debug(self) -> bool {
        matches!(self, Self::Debug)
    }
}

/// Settings derived from the environment.
pub struct AuthSettings {
    secret: Zeroizing<Vec<u8>>,
    /// Attributes for the credential cookie.
    pub cookies: CookiePolicy,
    /// Whether the secret was generated for this process only.
    pub ephemeral: bool,
}

impl AuthSettings {
    /// HMAC key for signing credentials.
    pub fn secret(&self) -> &[u8] {
        &self.secret
    }

    /// Short, non-reversible identifier of the active secret for logs.
    pub fn fingerprint(&self) -> String {
        fingerprint::secret_fingerprint(&self.secret)
    }
}

impl std::fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSettings")
            .field("fingerprint", &self.fingerprint())
            .field("cookies", &self.cookies)
            .field("ephemeral", &self.ephemeral)
            .finish()
    }
}

/// Errors raised while validating authentication settings.
#[derive(thiserror::Error, Debug)]
pub enum AuthConfigError {
    /// A required environment variable is missing.
    #[error("missing required environment variable: {name}")]
    MissingEnv { name: &'static str },
    /// A variable is present but contains an invalid value.
    #[error("invalid value for {name}='{value}'; expected {expected}")]
    InvalidEnv {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
    /// Reading the secret file failed.
    #[error("failed to read signing secret at {path}: {source}")]
    SecretRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The secret file is too short for release builds.
    #[error("signing secret at {path} too short: need >= {min_len} bytes, got {length}")]
    SecretTooShort {
        path: PathBuf,
        length: usize,
        min_len: usize,
    },
    /// `SameSite=None` requires a secure cookie in release builds.
    #[error("AUTH_SAMESITE=None requires AUTH_COOKIE_SECURE=1")]
    InsecureSameSiteNone,
    /// Release builds must not sign with a per-process secret.
    #[error("AUTH_ALLOW_EPHEMERAL must be 0 in release builds")]
    EphemeralNotAllowed,
}

/// Build authentication settings from environment variables and build mode.
///
/// # Examples
///
/// ```rust
/// use marketplace::inbound::http::auth_settings::{BuildMode, auth_settings_from_env};
/// use mockable::MockEnv;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let secret_path = std::env::temp_dir().join("auth_secret_example");
/// std::fs::write(&secret_path, vec![b'a'; 32])?;
///
/// let secret_path = secret_path.to_str().expect("valid path").to_string();
/// let mut env = MockEnv::new();
/// env.expect_string().returning(move |name| match name {
///     "AUTH_SECRET_FILE" => Some(secret_path.clone()),
///     "AUTH_COOKIE_SECURE" => Some("1".to_string()),
///     "AUTH_SAMESITE" => Some("Strict".to_string()),
///     "AUTH_ALLOW_EPHEMERAL" => Some("0".to_string()),
///     _ => None,
/// });
///
/// let settings = auth_settings_from_env(&env, BuildMode::Release)?;
/// assert!(settings.cookies.secure);
/// assert_eq!(settings.secret().len(), 32);
/// # Ok(())
/// # }
/// ```
pub fn auth_settings_from_env<E: Env>(
    env: &E,
    mode: BuildMode,
) -> Result<AuthSettings, AuthConfigError> {
    let reader = EnvReader::new(env, mode);
    let secure = reader.flag(COOKIE_SECURE_ENV, true)?;
    let same_site = reader.same_site(secure)?;
    let allow_ephemeral = reader.flag(ALLOW_EPHEMERAL_ENV, false)?;
    if allow_ephemeral && !mode.is_debug() {
        return Err(AuthConfigError::EphemeralNotAllowed);
    }
    let (secret, ephemeral) = read_secret(&reader, allow_ephemeral)?;
    Ok(AuthSettings {
        secret,
        cookies: CookiePolicy { secure, same_site },
        ephemeral,
    })
}

fn read_secret<E: Env>(
    reader: &EnvReader<'_, E>,
    allow_ephemeral: bool,
) -> Result<(Zeroizing<Vec<u8>>, bool), AuthConfigError> {
    let path = PathBuf::from(
        reader
            .string(SECRET_FILE_ENV)
            .unwrap_or_else(|| SECRET_DEFAULT_PATH.to_owned()),
    );
    let mode = reader.mode();
    match std::fs::read(&path) {
        Ok(mut bytes) => {
            let trimmed_len = bytes.trim_ascii_end().len();
            bytes.truncate(trimmed_len);
            let length = bytes.len();
            if mode == BuildMode::Release && length < SECRET_MIN_LEN {
                bytes.zeroize();
                return Err(AuthConfigError::SecretTooShort {
                    path,
                    length,
                    min_len: SECRET_MIN_LEN,
                });
            }
            Ok((Zeroizing::new(bytes), false))
        }
        Err(error) if mode.is_debug() || allow_ephemeral => {
            warn!(
                path = %path.display(),
                error = %error,
                "using temporary signing secret (dev only)"
            );
            Ok((ephemeral_secret(), true))
        }
        Err(error) => Err(AuthConfigError::SecretRead {
            path,
            source: error,
        }),
    }
}

/// Random per-process secret of [`SECRET_MIN_LEN`] bytes.
fn ephemeral_secret() -> Zeroizing<Vec<u8>> {
    let mut bytes = Zeroizing::new(vec![0_u8; SECRET_MIN_LEN]);
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}
