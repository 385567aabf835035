//! `igaku-auth`: session-token validation and route admission (client side).
//!
//! This crate is intentionally decoupled from HTTP. It never verifies token
//! signatures: the remote API stays the authority, the client only decides
//! which surfaces are worth rendering.

pub mod claims;
pub mod guard;
pub mod roles;
pub mod session;
pub mod validator;

pub use claims::{SessionClaims, TokenDecodeError, TokenValidationError, decode_claims, validate_claims};
pub use guard::{Admission, AdmissionCheck, Navigator, RecordingNavigator, RouteGuard, Surface, SurfacePolicy};
pub use roles::Role;
pub use session::{
    CREDENTIAL_KEY, CredentialStore, CredentialStoreError, FileCredentialStore,
    InMemoryCredentialStore, SessionContext,
};
pub use validator::{SessionState, get_role, is_expired, is_expired_at};
