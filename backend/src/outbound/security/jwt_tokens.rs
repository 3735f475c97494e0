//! HS256 signed credentials via `jsonwebtoken`.
//!
//! Expiry is checked against the injected [`Clock`] rather than the library's
//! wall-clock check, so tests can move time deterministically.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::ports::{IssuedToken, TokenError, TokenService};
use crate::domain::{CredentialClaims, Identity, Permission, Role};

/// Default credential lifetime.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::hours(24);

#[derive(Debug, Serialize, Deserialize)]
struct WireClaims {
    sub: String,
    email: String,
    role: Role,
    #[serde(default)]
    permissions: Vec<Permission>,
    iat: i64,
    exp: i64,
}

fn timestamp(seconds: i64) -> Result<DateTime<Utc>, TokenError> {
    DateTime::from_timestamp(seconds, 0)
        .ok_or_else(|| TokenError::malformed(format!("timestamp out of range: {seconds}")))
}

/// [`TokenService`] signing with a shared HMAC secret.
pub struct JwtTokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl JwtTokenService {
    /// Build from raw secret bytes. The keys copy the secret, so callers may
    /// wipe their buffer afterwards.
    pub fn new(secret: &[u8], ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
            clock,
        }
    }

    fn validation() -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub"]);
        validation
    }
}

impl TokenService for JwtTokenService {
    fn issue(&self, identity: &Identity) -> Result<IssuedToken, TokenError> {
        let issued_at = self.clock.utc();
        let expires_at = issued_at + self.ttl;
        let claims = WireClaims {
            sub: identity.subject_id().to_string(),
            email: identity.email().to_owned(),
            role: identity.role(),
            permissions: identity.permissions().iter().copied().collect(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|err| TokenError::signing(err.to_string()))?;
        Ok(IssuedToken { token, expires_at })
    }

    fn verify(&self, token: &str) -> Result<CredentialClaims, TokenError> {
        let decoded = decode::<WireClaims>(token, &self.decoding, &Self::validation()).map_err(
            |err| match err.kind() {
                ErrorKind::InvalidSignature => TokenError::bad_signature(),
                _ => TokenError::malformed(err.to_string()),
            },
        )?;
        let claims = decoded.claims;
        if claims.exp <= self.clock.utc().timestamp() {
            return Err(TokenError::expired());
        }
        let subject = Uuid::parse_str(&claims.sub)
            .map_err(|err| TokenError::malformed(format!("invalid subject: {err}")))?;
        Ok(CredentialClaims {
            subject,
            email: claims.email,
            role: claims.role,
            permissions: claims.permissions.into_iter().collect(),
            issued_at: timestamp(claims.iat)?,
            expires_at: timestamp(claims.exp)?,
        })
    }
}
