//! Remote API error model.
//!
//! Every failure carries a distinct user-visible message; nothing here is
//! retried automatically.

use igaku_core::DomainError;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// `400`: the API rejected the request parameters.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// `401` on an authenticated endpoint.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// `403`: authenticated, but not allowed.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// `401` on login.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// `409` on registration.
    #[error("username or email already taken")]
    AccountTaken,

    #[error("API error ({status}): {message}")]
    Status { status: u16, message: String },

    /// The API could not be reached at all (connect failure or timeout).
    #[error("API unreachable: {0}")]
    Offline(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("response error: {0}")]
    Parse(String),

    #[error("no session credential")]
    MissingCredential,

    #[error(transparent)]
    InvalidQuery(#[from] DomainError),
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl ApiError {
    /// Map a non-success status of an authenticated endpoint.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<ErrorBody>(body)
            .map(|b| b.message)
            .unwrap_or_else(|_| body.trim().to_string());

        match status {
            400 => ApiError::BadRequest(message),
            401 => ApiError::Unauthenticated(message),
            403 => ApiError::Forbidden(message),
            _ => ApiError::Status { status, message },
        }
    }

    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            ApiError::Offline(err.to_string())
        } else if err.is_decode() {
            ApiError::Parse(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }

    pub fn is_offline(&self) -> bool {
        matches!(self, ApiError::Offline(_))
    }

    /// Whether the API answered with an HTTP status.
    pub fn is_http_answer(&self) -> bool {
        matches!(
            self,
            ApiError::BadRequest(_)
                | ApiError::Unauthenticated(_)
                | ApiError::Forbidden(_)
                | ApiError::InvalidCredentials
                | ApiError::AccountTaken
                | ApiError::Status { .. }
        )
    }

    /// Message fit for display to the viewer.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::BadRequest(_) => "Invalid request parameters".to_string(),
            ApiError::Unauthenticated(_) => {
                "Your session is no longer valid, please sign in again".to_string()
            }
            ApiError::Forbidden(_) => "You are not allowed to access this resource".to_string(),
            ApiError::InvalidCredentials => "Invalid username or password".to_string(),
            ApiError::AccountTaken => "Username or Email already taken".to_string(),
            ApiError::Status { .. } => "Something went wrong".to_string(),
            ApiError::Offline(_) => "Unable to reach the server".to_string(),
            ApiError::Network(_) => "Network error".to_string(),
            ApiError::Parse(_) => "Unexpected response from the server".to_string(),
            ApiError::MissingCredential => "Failed to authenticate".to_string(),
            ApiError::InvalidQuery(err) => err.to_string(),
        }
    }
}
