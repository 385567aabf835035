//! Self-profile view with offline fallback.
//!
//! When the API is unreachable the last stored profile snapshot is shown
//! instead, marked with the time it was captured.

use chrono::{DateTime, Utc};
use igaku_auth::Surface;

use super::{AppContext, ViewError, ViewOutcome, admitted_credential};
use crate::fetch::FetchTracker;
use crate::types::UserData;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileSource {
    Live,
    Snapshot { cached_at: DateTime<Utc> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileDisplay {
    pub profile: UserData,
    pub source: ProfileSource,
}

impl ProfileDisplay {
    pub fn is_live(&self) -> bool {
        self.source == ProfileSource::Live
    }
}

#[derive(Debug)]
pub struct ProfileView {
    ctx: AppContext,
    tracker: FetchTracker,
}

impl ProfileView {
    pub fn new(ctx: AppContext) -> Self {
        Self {
            ctx,
            tracker: FetchTracker::new(),
        }
    }

    pub async fn render(&self) -> ViewOutcome<ProfileDisplay> {
        let token = match admitted_credential(&self.ctx, Surface::Profile) {
            Ok(token) => token,
            Err(outcome) => return outcome,
        };

        let ticket = self.tracker.begin();
        let result = self.ctx.api().fetch_self(&token).await;
        self.ctx.observe(&result);

        if !self.tracker.is_current(ticket) {
            tracing::debug!("discarding stale profile response");
            return ViewOutcome::Superseded;
        }

        match result {
            Ok(profile) => {
                if let Some(cache) = self.ctx.cache() {
                    // A failed snapshot write must not hide a live profile.
                    if let Err(err) = cache.store(&profile).await {
                        tracing::warn!(error = %err, "failed to store profile snapshot");
                    }
                }
                ViewOutcome::Ready(ProfileDisplay {
                    profile,
                    source: ProfileSource::Live,
                })
            }
            Err(err) if err.is_offline() => self.fallback(err.into()).await,
            Err(err) => ViewOutcome::Failed(err.into()),
        }
    }

    /// Leave the view; any fetch still in flight is discarded on arrival.
    pub fn leave(&self) {
        self.tracker.invalidate();
    }

    async fn fallback(&self, err: ViewError) -> ViewOutcome<ProfileDisplay> {
        let Some(cache) = self.ctx.cache() else {
            return ViewOutcome::Failed(err);
        };

        match cache.load(None).await {
            Ok(Some(snapshot)) => {
                tracing::info!(cached_at = %snapshot.cached_at, "showing cached profile while offline");
                ViewOutcome::Ready(ProfileDisplay {
                    profile: snapshot.profile,
                    source: ProfileSource::Snapshot {
                        cached_at: snapshot.cached_at,
                    },
                })
            }
            Ok(None) => ViewOutcome::Failed(err),
            Err(cache_err) => {
                tracing::warn!(error = %cache_err, "failed to read profile snapshot");
                ViewOutcome::Failed(err)
            }
        }
    }
}
