//! Signed, time-limited credentials.
//!
//! A credential is a compact HS256 JWS whose payload names the user it was
//! issued to. There is no server-side record: a credential is valid as long as
//! its signature checks out against the configured secret and its expiry is in
//! the future.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Deserializer, Serialize};
use std::{fmt, time::Duration};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::{errors::Error, types::UserId};

pub const DEFAULT_TOKEN_EXPIRY: Duration = Duration::from_secs(6 * 60 * 60);

#[derive(Debug, Error)]
pub enum TokenError {
    /// Malformed, tampered, expired, wrongly signed or not authorized.
    #[error("invalid credential")]
    InvalidCredential,

    #[error("sign credential: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

impl From<TokenError> for Error {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::InvalidCredential => Error::Unauthenticated { message: None },
            TokenError::Signing(e) => Error::Internal {
                operation: format!("sign credential: {e}"),
            },
        }
    }
}

/// Credential payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialClaims {
    pub authorized: bool,
    pub exp: i64, // Expiration time, unix seconds
    #[serde(rename = "userID", deserialize_with = "deserialize_subject")]
    pub subject: UserId,
}

/// Floats at or above 2^53 no longer hold every integer, so a float subject
/// in that range may already have been rounded to a neighbouring id.
const MAX_EXACT_FLOAT_SUBJECT: f64 = 9_007_199_254_740_992.0;

/// Accepts any JSON number that converts to a `u64` without loss, so `42` and
/// `42.0` are both user 42 while `-1`, `1.5`, `1e30` or a float beyond 2^53
/// are rejected. Integer literals keep the full `u64` range.
fn deserialize_subject<'de, D>(deserializer: D) -> Result<UserId, D::Error>
where
    D: Deserializer<'de>,
{
    let number = serde_json::Number::deserialize(deserializer)?;
    if let Some(id) = number.as_u64() {
        return Ok(id);
    }
    match number.as_f64() {
        Some(f) if f >= 0.0 && f.fract() == 0.0 && f < MAX_EXACT_FLOAT_SUBJECT => Ok(f as u64),
        _ => Err(serde::de::Error::custom(format!("subject {number} is not a user identifier"))),
    }
}

/// Issues and verifies credentials with a symmetric secret.
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    expiry: Duration,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec").field("expiry", &self.expiry).finish_non_exhaustive()
    }
}

impl TokenCodec {
    pub fn new(secret: &str, expiry: Duration) -> Self {
        // Only the HMAC family is accepted. Expiry is checked against the
        // caller's clock in `verify_at`, without leeway.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            expiry,
        }
    }

    pub fn expiry(&self) -> Duration {
        self.expiry
    }

    /// Issue a credential for `subject` that expires one expiry period from now.
    pub fn issue(&self, subject: UserId) -> Result<String, TokenError> {
        self.issue_at(subject, Utc::now())
    }

    #[instrument(skip(self), err)]
    pub fn issue_at(&self, subject: UserId, now: DateTime<Utc>) -> Result<String, TokenError> {
        let lifetime = i64::try_from(self.expiry.as_secs()).unwrap_or(i64::MAX);
        let claims = CredentialClaims {
            authorized: true,
            exp: now.timestamp().saturating_add(lifetime),
            subject,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(TokenError::Signing)
    }

    /// Verify a credential and return the user it was issued to.
    pub fn verify(&self, token: &str) -> Result<UserId, TokenError> {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<UserId, TokenError> {
        // With a symmetric secret every decode failure is the client's fault:
        // bad encoding, unexpected algorithm, bad signature or bad claims.
        let data = decode::<CredentialClaims>(token, &self.decoding, &self.validation).map_err(|e| {
            debug!(error = %e, "credential rejected");
            TokenError::InvalidCredential
        })?;

        let claims = data.claims;
        if !claims.authorized {
            debug!(subject = claims.subject, "credential is not authorized");
            return Err(TokenError::InvalidCredential);
        }
        if claims.exp <= now.timestamp() {
            debug!(subject = claims.subject, exp = claims.exp, "credential expired");
            return Err(TokenError::InvalidCredential);
        }

        Ok(claims.subject)
    }
}
