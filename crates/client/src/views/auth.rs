//! Login and registration surfaces.
//!
//! Both are auth-only: a viewer holding a live session is sent home. A
//! successful submit drops the previous account's profile snapshot, stores the
//! issued token and redirects home.

use igaku_auth::{Navigator, Surface};

use super::{AppContext, ViewError, ViewOutcome};
use crate::error::ApiError;
use crate::types::{LoginCredentials, RegistrationFields};

fn render_auth_only(ctx: &AppContext, surface: Surface) -> ViewOutcome<()> {
    match ctx.guard().admit(surface).redirect_target() {
        Some(target) => ViewOutcome::Redirected(target),
        None => ViewOutcome::Ready(()),
    }
}

async fn complete_sign_in(ctx: &AppContext, result: Result<String, ApiError>) -> ViewOutcome<()> {
    ctx.observe(&result);

    let token = match result {
        Ok(token) => token,
        Err(err) => return ViewOutcome::Failed(err.into()),
    };

    // The snapshot belongs to whoever signed in before.
    if let Some(cache) = ctx.cache() {
        if let Err(err) = cache.clear().await {
            return ViewOutcome::Failed(err.into());
        }
    }

    if let Err(err) = ctx.session().sign_in(&token) {
        return ViewOutcome::Failed(ViewError::Credential(err));
    }

    ctx.guard().navigator().redirect(Surface::Home.path());
    ViewOutcome::Redirected(Surface::Home)
}

#[derive(Debug, Clone)]
pub struct LoginView {
    ctx: AppContext,
}

impl LoginView {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }

    pub fn render(&self) -> ViewOutcome<()> {
        render_auth_only(&self.ctx, Surface::Login)
    }

    pub async fn submit(&self, credentials: &LoginCredentials) -> ViewOutcome<()> {
        let result = self.ctx.api().login(credentials).await;
        complete_sign_in(&self.ctx, result).await
    }
}

#[derive(Debug, Clone)]
pub struct RegisterView {
    ctx: AppContext,
}

impl RegisterView {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }

    pub fn render(&self) -> ViewOutcome<()> {
        render_auth_only(&self.ctx, Surface::Register)
    }

    pub async fn submit(&self, fields: &RegistrationFields) -> ViewOutcome<()> {
        let result = self.ctx.api().register(fields).await;
        complete_sign_in(&self.ctx, result).await
    }
}
