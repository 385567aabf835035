use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Role;

/// Claims the client reads out of a session token.
///
/// `exp` is a JWT NumericDate: seconds since the epoch, possibly fractional.
/// Every field is optional here; deciding what a missing claim means is the
/// validator's job, not the decoder's.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (user id as issued by the auth service).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Expiration instant, seconds since the epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl SessionClaims {
    /// Expiration as milliseconds since the epoch.
    pub fn expires_at_millis(&self) -> Option<f64> {
        self.exp.map(|secs| secs * 1000.0)
    }
}

#[derive(Debug, Error)]
pub enum TokenDecodeError {
    #[error("token is empty")]
    Empty,

    #[error("malformed token: {0}")]
    Malformed(#[from] jsonwebtoken::errors::Error),
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has no expiration claim")]
    MissingExpiry,

    #[error("token has expired")]
    Expired,
}

/// Decode the payload of a `header.payload.signature` token.
///
/// The signature segment must be present but is not verified; the client holds
/// no key. Unknown header algorithms (including `none`) are decode failures.
pub fn decode_claims(token: &str) -> Result<SessionClaims, TokenDecodeError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(TokenDecodeError::Empty);
    }

    let data = jsonwebtoken::decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(&[]),
        &unverified_validation(),
    )?;

    Ok(data.claims)
}

fn unverified_validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();
    validation
}

/// Check the expiration claim against `now`.
///
/// The claim is scaled to milliseconds and compared strictly: a token whose
/// expiry equals `now` is still valid.
pub fn validate_claims(claims: &SessionClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    let expires_at = claims
        .expires_at_millis()
        .ok_or(TokenValidationError::MissingExpiry)?;

    if expires_at < now.timestamp_millis() as f64 {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}
