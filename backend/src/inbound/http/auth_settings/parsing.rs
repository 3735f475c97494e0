//! Build-mode aware readers for authentication environment toggles.

use actix_web::cookie::SameSite;
use mockable::Env;
use tracing::warn;

use super::{AuthConfigError, BuildMode, SAMESITE_ENV};

const BOOL_EXPECTED: &str = "1|0|true|false|yes|no|y|n";
const SAMESITE_EXPECTED: &str = "Strict|Lax|None";

/// Reads toggles from `env`. Debug builds replace missing or invalid values
/// with a fallback and log a warning; release builds fail.
pub(super) struct EnvReader<'a, E> {
    env: &'a E,
    mode: BuildMode,
}

impl<'a, E: Env> EnvReader<'a, E> {
    pub(super) const fn new(env: &'a E, mode: BuildMode) -> Self {
        Self { env, mode }
    }

    pub(super) const fn mode(&self) -> BuildMode {
        self.mode
    }

    pub(super) fn string(&self, name: &str) -> Option<String> {
        self.env.string(name)
    }

    /// `fallback` in debug builds, `error` in release builds.
    pub(super) fn tolerate<T>(&self, fallback: T, error: AuthConfigError) -> Result<T, AuthConfigError> {
        if self.mode.is_debug() {
            warn!(%error, "using development default");
            Ok(fallback)
        } else {
            Err(error)
        }
    }

    pub(super) fn flag(&self, name: &'static str, default: bool) -> Result<bool, AuthConfigError> {
        let Some(raw) = self.env.string(name) else {
            return self.tolerate(default, AuthConfigError::MissingEnv { name });
        };
        match parse_bool(&raw) {
            Some(flag) => Ok(flag),
            None => self.tolerate(
                default,
                AuthConfigError::InvalidEnv {
                    name,
                    value: raw,
                    expected: BOOL_EXPECTED,
                },
            ),
        }
    }

    /// `SameSite` attribute for the credential cookie. `None` is only
    /// accepted alongside a secure cookie.
    pub(super) fn same_site(&self, cookie_secure: bool) -> Result<SameSite, AuthConfigError> {
        let default = if self.mode.is_debug() {
            SameSite::Lax
        } else {
            SameSite::Strict
        };
        let Some(raw) = self.env.string(SAMESITE_ENV) else {
            return self.tolerate(default, AuthConfigError::MissingEnv { name: SAMESITE_ENV });
        };
        match parse_same_site(&raw) {
            Some(SameSite::None) if !cookie_secure => {
                self.tolerate(SameSite::None, AuthConfigError::InsecureSameSiteNone)
            }
            Some(same_site) => Ok(same_site),
            None => self.tolerate(
                default,
                AuthConfigError::InvalidEnv {
                    name: SAMESITE_ENV,
                    value: raw,
                    expected: SAMESITE_EXPECTED,
                },
            ),
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Some(true),
        "0" | "false" | "no" | "n" => Some(false),
        _ => None,
    }
}

fn parse_same_site(value: &str) -> Option<SameSite> {
    match value.trim().to_ascii_lowercase().as_str() {
        "lax" => Some(SameSite::Lax),
        "strict" => Some(SameSite::Strict),
        "none" => Some(SameSite::None),
        _ => None,
    }
}
