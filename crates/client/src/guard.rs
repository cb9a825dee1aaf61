//! Route guards.
//!
//! Guards are pure decisions over a [`SessionSnapshot`]; performing the
//! redirect is left to the caller's [`Navigator`](crate::Navigator). The
//! async `check` helpers only add "wait for the session to initialize"
//! in front of the decision.
//!
//! Each navigation attempt ends in exactly one [`GuardOutcome`]. There is no
//! retry: a redirected user has to navigate again (typically after logging
//! in).

use crate::routes::{self, RETURN_URL_PARAM};
use crate::session::{SessionSnapshot, SessionStore};

/// A redirect target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    /// Path to navigate to.
    pub path: String,
    /// Page to resume after login, sent as `?returnUrl=`.
    pub return_url: Option<String>,
}

impl Redirect {
    /// Redirect to the login page, optionally remembering where to resume.
    #[must_use]
    pub fn login(return_url: Option<&str>) -> Self {
        Self {
            path: routes::LOGIN.to_string(),
            return_url: return_url.map(str::to_string),
        }
    }

    /// Redirect to the default signed-in landing page.
    #[must_use]
    pub fn home() -> Self {
        Self {
            path: routes::HOME.to_string(),
            return_url: None,
        }
    }

    /// Render as a relative URL with the query string encoded.
    #[must_use]
    pub fn to_url(&self) -> String {
        match &self.return_url {
            Some(url) => format!(
                "{}?{RETURN_URL_PARAM}={}",
                self.path,
                urlencoding::encode(url)
            ),
            None => self.path.clone(),
        }
    }
}

impl std::fmt::Display for Redirect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_url())
    }
}

/// Result of one navigation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    Allow,
    Redirect(Redirect),
}

impl GuardOutcome {
    /// Whether navigation may proceed.
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Guards routes that need any signed-in user.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthGuard;

impl AuthGuard {
    /// Decide whether `requested_path` may be entered.
    ///
    /// Signed-out users go to login with the requested path as `returnUrl`,
    /// unless the path is itself part of the login/registration flow.
    #[must_use]
    pub fn decide(snapshot: SessionSnapshot, requested_path: &str) -> GuardOutcome {
        if snapshot.authenticated {
            return GuardOutcome::Allow;
        }

        let return_url = (!routes::is_auth_flow(requested_path)).then_some(requested_path);
        tracing::debug!(path = %requested_path, "Unauthenticated navigation redirected to login");
        GuardOutcome::Redirect(Redirect::login(return_url))
    }

    /// Wait for session initialization, then decide.
    pub async fn check(session: &SessionStore, requested_path: &str) -> GuardOutcome {
        session.wait_initialized().await;
        Self::decide(session.snapshot(), requested_path)
    }
}

/// Guards the admin area.
///
/// A signed-in customer without the admin role is sent to the regular
/// landing page, never to login: their session is valid, just not
/// privileged, and must not be discarded.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdminGuard;

impl AdminGuard {
    /// Decide whether the admin area may be entered.
    #[must_use]
    pub fn decide(snapshot: SessionSnapshot) -> GuardOutcome {
        match (snapshot.authenticated, snapshot.admin) {
            (true, true) => GuardOutcome::Allow,
            (true, false) => {
                tracing::debug!("Non-admin navigation to admin area redirected home");
                GuardOutcome::Redirect(Redirect::home())
            }
            (false, _) => GuardOutcome::Redirect(Redirect::login(None)),
        }
    }

    /// Wait for session initialization, then decide.
    pub async fn check(session: &SessionStore) -> GuardOutcome {
        session.wait_initialized().await;
        Self::decide(session.snapshot())
    }
}
