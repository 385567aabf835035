//! Offline mode detection and state management.

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Connectivity state of the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectivityState {
    /// Online and connected to the API.
    #[default]
    Online,
    /// Offline (network unreachable or API unavailable).
    Offline,
}

/// Offline mode configuration and state.
#[derive(Debug)]
pub struct OfflineMode {
    state: ConnectivityState,
    api_url: String,
}

impl OfflineMode {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            state: ConnectivityState::Online,
            api_url: api_url.into(),
        }
    }

    pub fn state(&self) -> ConnectivityState {
        self.state
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Mark the client as offline.
    pub fn set_offline(&mut self) {
        if self.state != ConnectivityState::Offline {
            tracing::warn!("API at {} unreachable; switching to offline mode", self.api_url);
        }
        self.state = ConnectivityState::Offline;
    }

    /// Mark the client as online.
    pub fn set_online(&mut self) {
        if self.state != ConnectivityState::Online {
            tracing::info!("API at {} reachable again", self.api_url);
        }
        self.state = ConnectivityState::Online;
    }

    pub fn is_offline(&self) -> bool {
        self.state == ConnectivityState::Offline
    }

    /// Fold the outcome of a request into the connectivity state.
    ///
    /// Unreachability flips the client offline. Only an HTTP answer, including
    /// an error status, flips it back online; other failures leave the state
    /// as it was.
    pub fn observe<T>(&mut self, result: &Result<T, ApiError>) {
        match result {
            Ok(_) => self.set_online(),
            Err(err) if err.is_offline() => self.set_offline(),
            Err(err) if err.is_http_answer() => self.set_online(),
            Err(_) => {}
        }
    }
}
