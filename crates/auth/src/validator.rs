//! Token validator.
//!
//! Every decode failure degrades to "expired"; nothing here returns an error
//! to the caller, so guards and views can treat the output as a plain answer.

use chrono::{DateTime, Utc};

use crate::claims::{TokenValidationError, decode_claims, validate_claims};
use crate::Role;

/// Whether the stored credential should be treated as expired right now.
pub fn is_expired(token: Option<&str>) -> bool {
    is_expired_at(token, Utc::now())
}

/// Whether the credential is expired at `now`.
///
/// Absent, undecodable and expiry-less tokens are all expired.
pub fn is_expired_at(token: Option<&str>, now: DateTime<Utc>) -> bool {
    let Some(token) = token else {
        return true;
    };

    let claims = match decode_claims(token) {
        Ok(claims) => claims,
        Err(err) => {
            tracing::warn!(error = %err, "failed to decode session token");
            return true;
        }
    };

    match validate_claims(&claims, now) {
        Ok(()) => false,
        Err(TokenValidationError::MissingExpiry) => {
            tracing::warn!("session token has no expiration claim");
            true
        }
        Err(TokenValidationError::Expired) => true,
    }
}

/// Role claim of a token, verbatim.
///
/// Does not re-check expiry; callers run [`is_expired`] first. A token without
/// a role claim, or one that fails to decode, yields `None`, which admission
/// treats as the lowest privilege.
pub fn get_role(token: &str) -> Option<Role> {
    match decode_claims(token) {
        Ok(claims) => claims.role,
        Err(err) => {
            tracing::warn!(error = %err, "failed to decode session token for role");
            None
        }
    }
}

/// Session state derived from one read of the credential slot.
///
/// Never cached: build a fresh one for every admission check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub is_expired: bool,
    pub role: Option<Role>,
}

impl SessionState {
    pub fn derive(token: Option<&str>, now: DateTime<Utc>) -> Self {
        let is_expired = is_expired_at(token, now);
        // The role is only meaningful for a live session.
        let role = match token {
            Some(token) if !is_expired => get_role(token),
            _ => None,
        };
        Self { is_expired, role }
    }

    pub fn is_authenticated(&self) -> bool {
        !self.is_expired
    }

    pub fn is_admin(&self) -> bool {
        self.role.as_ref().is_some_and(Role::is_admin)
    }
}
