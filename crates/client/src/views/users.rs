//! Admin-only user list with paging, sorting and CSV export.

use igaku_auth::Surface;
use igaku_core::Page;

use super::{AppContext, ViewOutcome, admitted_credential};
use crate::export::render_user_csv;
use crate::fetch::FetchTracker;
use crate::types::{UserData, UserListQuery};

#[derive(Debug)]
pub struct UsersView {
    ctx: AppContext,
    tracker: FetchTracker,
}

impl UsersView {
    pub fn new(ctx: AppContext) -> Self {
        Self {
            ctx,
            tracker: FetchTracker::new(),
        }
    }

    /// Fetch one page of users.
    ///
    /// Changing the query while a page is loading supersedes the older
    /// request; only the latest one is returned as ready.
    pub async fn render(&self, query: &UserListQuery) -> ViewOutcome<Page<UserData>> {
        let token = match admitted_credential(&self.ctx, Surface::Users) {
            Ok(token) => token,
            Err(outcome) => return outcome,
        };

        let ticket = self.tracker.begin();
        let result = self.ctx.api().list_users(&token, query).await;
        self.ctx.observe(&result);

        if !self.tracker.is_current(ticket) {
            tracing::debug!(page = query.page.page(), "discarding stale user list response");
            return ViewOutcome::Superseded;
        }

        match result {
            Ok(page) => ViewOutcome::Ready(page),
            Err(err) => ViewOutcome::Failed(err.into()),
        }
    }

    /// CSV rows for the page selected by `query`.
    ///
    /// Runs the same admission check as [`UsersView::render`] and does not
    /// touch the view's fetch generation.
    pub async fn export(&self, query: &UserListQuery) -> ViewOutcome<String> {
        let token = match admitted_credential(&self.ctx, Surface::Users) {
            Ok(token) => token,
            Err(outcome) => return outcome,
        };

        let result = self.ctx.api().list_users(&token, query).await;
        self.ctx.observe(&result);

        match result {
            Ok(page) => {
                tracing::info!(rows = page.data.len(), "exporting user list");
                ViewOutcome::Ready(render_user_csv(&page.data))
            }
            Err(err) => ViewOutcome::Failed(err.into()),
        }
    }

    pub fn leave(&self) {
        self.tracker.invalidate();
    }
}
