//! Route admission guard.
//!
//! Runs on every admission check of a surface (every render pass, not only the
//! first). There is no background timer: a token that expires while a surface
//! is open is caught by the next check.
//!
//! Policy, evaluated in order:
//! - auth-only surfaces (login, register) send live sessions home;
//! - authenticated surfaces send expired/absent sessions to login;
//! - role-gated surfaces send everyone without the role to unauthorized.
//!
//! The authentication check always runs before the role check.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use crate::session::SessionContext;
use crate::validator::{get_role, is_expired_at};
use crate::Role;

/// Navigation service.
///
/// `redirect` is a fire-and-forget request; it does not stop the caller.
pub trait Navigator: Send + Sync {
    fn redirect(&self, path: &str);
}

impl<N> Navigator for Arc<N>
where
    N: Navigator + ?Sized,
{
    fn redirect(&self, path: &str) {
        (**self).redirect(path)
    }
}

/// Navigator that only records requested paths.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    redirects: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn redirects(&self) -> Vec<String> {
        self.redirects
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn last(&self) -> Option<String> {
        self.redirects.lock().ok()?.last().cloned()
    }
}

impl Navigator for RecordingNavigator {
    fn redirect(&self, path: &str) {
        if let Ok(mut redirects) = self.redirects.lock() {
            redirects.push(path.to_string());
        }
    }
}

/// Client surfaces (views) the guard knows about.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Surface {
    Home,
    Profile,
    Users,
    Login,
    Register,
    Unauthorized,
    NotFound,
}

impl Surface {
    pub fn path(&self) -> &'static str {
        match self {
            Surface::Home => "/",
            Surface::Profile => "/profile",
            Surface::Users => "/users",
            Surface::Login => "/auth/login",
            Surface::Register => "/auth/register",
            Surface::Unauthorized => "/unauthorized",
            Surface::NotFound => "/404",
        }
    }

    pub fn policy(&self) -> SurfacePolicy {
        match self {
            Surface::Home | Surface::Profile => SurfacePolicy::authenticated(),
            Surface::Users => SurfacePolicy::role(Role::ADMIN),
            Surface::Login | Surface::Register => SurfacePolicy::auth_only(),
            Surface::Unauthorized | Surface::NotFound => SurfacePolicy::public(),
        }
    }
}

impl core::fmt::Display for Surface {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.path())
    }
}

/// Admission requirements of one surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfacePolicy {
    pub requires_auth: bool,
    pub auth_only: bool,
    pub required_role: Option<Role>,
}

impl SurfacePolicy {
    pub fn public() -> Self {
        Self {
            requires_auth: false,
            auth_only: false,
            required_role: None,
        }
    }

    pub fn authenticated() -> Self {
        Self {
            requires_auth: true,
            ..Self::public()
        }
    }

    pub fn auth_only() -> Self {
        Self {
            auth_only: true,
            ..Self::public()
        }
    }

    pub fn role(role: Role) -> Self {
        Self {
            requires_auth: true,
            required_role: Some(role),
            ..Self::public()
        }
    }
}

/// Outcome of one admission check.
///
/// `Admitted` is the only outcome from which a view may start fetching.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    RedirectingToLogin,
    RedirectingToHome,
    RedirectingToUnauthorized,
}

impl Admission {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Admission::Admitted)
    }

    pub fn redirect_target(&self) -> Option<Surface> {
        match self {
            Admission::Admitted => None,
            Admission::RedirectingToLogin => Some(Surface::Login),
            Admission::RedirectingToHome => Some(Surface::Home),
            Admission::RedirectingToUnauthorized => Some(Surface::Unauthorized),
        }
    }
}

/// Guard bound to a session context and a navigator.
#[derive(Clone)]
pub struct RouteGuard {
    session: SessionContext,
    navigator: Arc<dyn Navigator>,
}

impl RouteGuard {
    pub fn new(session: SessionContext, navigator: Arc<dyn Navigator>) -> Self {
        Self { session, navigator }
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    /// Pure admission decision for `surface` given a raw credential.
    ///
    /// - No IO
    /// - No panics
    pub fn decide(surface: Surface, token: Option<&str>, now: DateTime<Utc>) -> Admission {
        let policy = surface.policy();

        if policy.auth_only {
            return if is_expired_at(token, now) {
                Admission::Admitted
            } else {
                Admission::RedirectingToHome
            };
        }

        if !policy.requires_auth {
            return Admission::Admitted;
        }

        let token = match token {
            Some(token) if !is_expired_at(Some(token), now) => token,
            _ => return Admission::RedirectingToLogin,
        };

        if let Some(required) = &policy.required_role {
            if get_role(token).as_ref() != Some(required) {
                return Admission::RedirectingToUnauthorized;
            }
        }

        Admission::Admitted
    }

    /// Check `surface` against the current credential, requesting a redirect
    /// when the viewer may not stay.
    pub fn admit(&self, surface: Surface) -> Admission {
        self.check(surface).admission
    }

    pub fn admit_at(&self, surface: Surface, now: DateTime<Utc>) -> Admission {
        self.check_at(surface, now).admission
    }

    /// Like [`RouteGuard::admit`], also handing back the credential the
    /// decision was made on so the view can reuse it as its bearer token.
    pub fn check(&self, surface: Surface) -> AdmissionCheck {
        self.check_at(surface, Utc::now())
    }

    pub fn check_at(&self, surface: Surface, now: DateTime<Utc>) -> AdmissionCheck {
        // One read of the slot per check.
        let credential = self.session.token();
        let admission = Self::decide(surface, credential.as_deref(), now);

        match admission.redirect_target() {
            Some(target) => {
                tracing::info!(surface = %surface, target = %target, "admission denied; redirecting");
                self.navigator.redirect(target.path());
            }
            None => tracing::debug!(surface = %surface, "admitted"),
        }

        AdmissionCheck {
            admission,
            credential,
        }
    }
}

/// Outcome of [`RouteGuard::check`].
#[derive(Clone, PartialEq, Eq)]
pub struct AdmissionCheck {
    pub admission: Admission,
    credential: Option<String>,
}

impl AdmissionCheck {
    /// The credential, only when the surface admitted the viewer.
    pub fn admitted_credential(&self) -> Option<&str> {
        if self.admission.is_admitted() {
            self.credential.as_deref()
        } else {
            None
        }
    }
}

impl core::fmt::Debug for AdmissionCheck {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AdmissionCheck")
            .field("admission", &self.admission)
            .field("has_credential", &self.credential.is_some())
            .finish()
    }
}

impl core::fmt::Debug for RouteGuard {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RouteGuard")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}
