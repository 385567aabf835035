//! View controllers.
//!
//! Each controller runs the admission guard on every render pass and only
//! fetches once admitted. Fetch responses are tagged with a ticket from the
//! controller's own [`FetchTracker`]; stale responses come back as
//! [`ViewOutcome::Superseded`].

pub mod auth;
pub mod home;
pub mod profile;
pub mod users;

use std::sync::{Arc, Mutex, PoisonError};

use igaku_auth::{AdmissionCheck, CredentialStoreError, RouteGuard, SessionContext, Surface};
use thiserror::Error;

use crate::api::ApiClient;
use crate::cache::{CacheError, ProfileSnapshotCache};
use crate::error::ApiError;
use crate::offline::{ConnectivityState, OfflineMode};

pub use auth::{LoginView, RegisterView};
pub use home::HomeView;
pub use profile::{ProfileDisplay, ProfileSource, ProfileView};
pub use users::UsersView;

/// What a view produced on one render pass.
#[derive(Debug)]
pub enum ViewOutcome<T> {
    /// The guard did not admit the viewer; a redirect to this surface was
    /// requested.
    Redirected(Surface),
    Ready(T),
    Failed(ViewError),
    /// A newer fetch started (or the view was left) before this one returned.
    Superseded,
}

impl<T> ViewOutcome<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, ViewOutcome::Ready(_))
    }

    pub fn ready(self) -> Option<T> {
        match self {
            ViewOutcome::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn redirected_to(&self) -> Option<Surface> {
        match self {
            ViewOutcome::Redirected(surface) => Some(*surface),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ViewError> {
        match self {
            ViewOutcome::Failed(err) => Some(err),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ViewError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Credential(#[from] CredentialStoreError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl ViewError {
    pub fn user_message(&self) -> String {
        match self {
            ViewError::Api(err) => err.user_message(),
            ViewError::Credential(_) => "Failed to store session".to_string(),
            ViewError::Cache(_) => "Failed to read local data".to_string(),
        }
    }
}

/// Everything a view needs, injected once and shared by every view.
#[derive(Clone)]
pub struct AppContext {
    guard: RouteGuard,
    api: ApiClient,
    cache: Option<ProfileSnapshotCache>,
    offline: Arc<Mutex<OfflineMode>>,
}

impl AppContext {
    pub fn new(guard: RouteGuard, api: ApiClient) -> Self {
        let offline = OfflineMode::new(api.base_url());
        Self {
            guard,
            api,
            cache: None,
            offline: Arc::new(Mutex::new(offline)),
        }
    }

    pub fn with_cache(mut self, cache: ProfileSnapshotCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn guard(&self) -> &RouteGuard {
        &self.guard
    }

    pub fn session(&self) -> &SessionContext {
        self.guard.session()
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn cache(&self) -> Option<&ProfileSnapshotCache> {
        self.cache.as_ref()
    }

    pub fn connectivity(&self) -> ConnectivityState {
        self.offline
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .state()
    }

    pub(crate) fn observe<T>(&self, result: &Result<T, ApiError>) {
        self.offline
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .observe(result);
    }

    /// Sign out and drop the cached profile.
    pub async fn sign_out(&self) -> Result<(), ViewError> {
        if let Some(cache) = &self.cache {
            cache.clear().await?;
        }
        self.session().sign_out(&**self.guard.navigator())?;
        Ok(())
    }
}

impl core::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AppContext")
            .field("session", self.guard.session())
            .field("api", &self.api.base_url())
            .field("cache", &self.cache.is_some())
            .field("connectivity", &self.connectivity())
            .finish()
    }
}

/// Run the guard for `surface` and hand back the stored credential, or the
/// outcome the view must return instead.
pub(crate) fn admitted_credential<T>(
    ctx: &AppContext,
    surface: Surface,
) -> Result<String, ViewOutcome<T>> {
    let check: AdmissionCheck = ctx.guard.check(surface);
    if let Some(target) = check.admission.redirect_target() {
        return Err(ViewOutcome::Redirected(target));
    }
    check
        .admitted_credential()
        .map(str::to_string)
        .ok_or(ViewOutcome::Failed(ViewError::Api(ApiError::MissingCredential)))
}
