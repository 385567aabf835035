use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Role claim carried by a session token.
///
/// Roles are opaque strings at this layer. The remote API issues `admin`,
/// `doctor` and `patient`; anything else is passed through verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub const ADMIN: Role = Role(Cow::Borrowed("admin"));
    pub const DOCTOR: Role = Role(Cow::Borrowed("doctor"));
    pub const PATIENT: Role = Role(Cow::Borrowed("patient"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_admin(&self) -> bool {
        *self == Self::ADMIN
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
