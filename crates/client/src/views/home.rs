use igaku_auth::Surface;

use super::{AppContext, ViewOutcome};

/// Landing surface; authenticated, no fetch.
#[derive(Debug, Clone)]
pub struct HomeView {
    ctx: AppContext,
}

impl HomeView {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }

    pub fn render(&self) -> ViewOutcome<()> {
        match self.ctx.guard().admit(Surface::Home).redirect_target() {
            Some(target) => ViewOutcome::Redirected(target),
            None => ViewOutcome::Ready(()),
        }
    }
}
