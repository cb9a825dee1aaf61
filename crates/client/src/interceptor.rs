//! HTTP error interceptor.
//!
//! Every failed exchange passes through [`ErrorInterceptor::handle`] exactly
//! once. The interceptor:
//!
//! 1. classifies the failure by status code,
//! 2. treats a 401 from a non-auth endpoint as an expired session (clears
//!    the [`SessionStore`] and redirects to login),
//! 3. picks a fixed user-facing message and shows it through the
//!    [`Notifier`], except for a 401 from an auth endpoint where the form
//!    already shows its own inline error.
//!
//! It never retries and never swallows the failure: the caller still
//! receives the original error afterwards.

use std::sync::Arc;

use crate::error::ClientError;
use crate::guard::Redirect;
use crate::session::SessionStore;
use crate::telemetry;

/// Per-file upload ceiling enforced by the backend (50 MB).
pub const MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

/// Endpoints whose 401 means "wrong credentials" rather than "session expired".
const AUTH_ENDPOINTS: &[&str] = &["/auth/login", "/auth/register", "/auth/me"];

/// Fixed user-facing messages.
pub mod messages {
    pub const INVALID_CREDENTIALS: &str = "Invalid email or password.";
    pub const SESSION_EXPIRED: &str = "Your session has expired. Please log in again.";
    pub const FORBIDDEN: &str = "You do not have permission to perform this action.";
    pub const NOT_FOUND: &str = "The requested resource was not found.";
    pub const UNPROCESSABLE: &str = "The submitted data is invalid. Please check your input.";
    pub const SERVER_ERROR: &str = "Something went wrong on our end. Please try again later.";
    pub const NETWORK: &str = "Unable to reach the server. Please check your connection.";
    pub const UNEXPECTED: &str = "An unexpected error occurred. Please try again.";
}

/// Displays a message to the user (snackbar, toast, stderr...).
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// Performs a navigation decided by a guard or the interceptor.
pub trait Navigator: Send + Sync {
    fn navigate(&self, redirect: &Redirect);
}

/// Notifier that writes messages to the tracing log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, message: &str) {
        tracing::warn!(target: "printshop_client::notify", "{message}");
    }
}

/// Navigator that only records the requested redirect in the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNavigator;

impl Navigator for TracingNavigator {
    fn navigate(&self, redirect: &Redirect) {
        tracing::info!(target: "printshop_client::navigate", to = %redirect, "Navigation requested");
    }
}

/// Status-based failure classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// 401.
    Unauthorized,
    /// 403.
    Forbidden,
    /// 404.
    NotFound,
    /// 413.
    PayloadTooLarge,
    /// 422.
    Unprocessable,
    /// 500.
    ServerError,
    /// Any other status.
    Other(u16),
    /// No response at all.
    Network,
}

impl FailureKind {
    /// Classify a response status; `None` means the request never got one.
    #[must_use]
    pub const fn classify(status: Option<u16>) -> Self {
        match status {
            None => Self::Network,
            Some(401) => Self::Unauthorized,
            Some(403) => Self::Forbidden,
            Some(404) => Self::NotFound,
            Some(413) => Self::PayloadTooLarge,
            Some(422) => Self::Unprocessable,
            Some(500) => Self::ServerError,
            Some(other) => Self::Other(other),
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not_found",
            Self::PayloadTooLarge => "payload_too_large",
            Self::Unprocessable => "unprocessable",
            Self::ServerError => "server_error",
            Self::Other(_) => "other",
            Self::Network => "network",
        }
    }
}

/// The facts about a failed exchange the interceptor needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpFailure {
    /// HTTP method, e.g. `POST`.
    pub method: String,
    /// Request path relative to the API root, e.g. `/auth/login`.
    pub path: String,
    /// Response status, `None` for transport failures.
    pub status: Option<u16>,
    /// Backend-provided detail message.
    pub detail: Option<String>,
}

impl HttpFailure {
    /// Describe `error` raised by `method path`.
    ///
    /// Returns `None` for errors that are not exchange failures (storage,
    /// JSON) and therefore are not intercepted.
    #[must_use]
    pub fn from_error(method: &str, path: &str, error: &ClientError) -> Option<Self> {
        let (status, detail) = match error {
            ClientError::Status { status, detail, .. } => (Some(status.as_u16()), detail.clone()),
            ClientError::Http(e) => (e.status().map(|s| s.as_u16()), None),
            _ => return None,
        };

        Some(Self {
            method: method.to_string(),
            path: path.to_string(),
            status,
            detail,
        })
    }

    /// Whether the request targeted login, registration or `/auth/me`.
    #[must_use]
    pub fn is_auth_endpoint(&self) -> bool {
        let path = self.path.split(['?', '#']).next().unwrap_or(&self.path);
        // The client joins paths with or without a leading slash alike.
        let path = path.trim_start_matches('/');
        AUTH_ENDPOINTS.iter().any(|endpoint| {
            path.strip_prefix(endpoint.trim_start_matches('/'))
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        })
    }
}

/// What the interceptor did with one failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interception {
    pub kind: FailureKind,
    /// The message computed for this failure.
    pub message: String,
    /// Whether the message was passed to the notifier.
    pub displayed: bool,
    /// Whether the session was cleared.
    pub session_cleared: bool,
    /// Navigation performed, if any.
    pub redirect: Option<Redirect>,
}

/// Central handler for failed HTTP exchanges.
#[derive(Clone)]
pub struct ErrorInterceptor {
    session: SessionStore,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
}

impl ErrorInterceptor {
    /// Create an interceptor acting on `session`.
    #[must_use]
    pub fn new(
        session: SessionStore,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            session,
            notifier,
            navigator,
        }
    }

    /// Create an interceptor whose effects only go to the log.
    #[must_use]
    pub fn logging(session: SessionStore) -> Self {
        Self::new(session, Arc::new(TracingNotifier), Arc::new(TracingNavigator))
    }

    /// Classify `failure`, apply session and navigation effects, and show
    /// the resulting message.
    pub fn handle(&self, failure: &HttpFailure) -> Interception {
        let kind = FailureKind::classify(failure.status);
        telemetry::http_failure_breadcrumb(&failure.method, &failure.path, failure.status, kind.label());

        let mut session_cleared = false;
        let mut redirect = None;
        let mut displayed = true;

        let message = match kind {
            FailureKind::Unauthorized if failure.is_auth_endpoint() => {
                // The login/register form renders its own inline error.
                displayed = false;
                tracing::debug!(path = %failure.path, "Credentials rejected");
                messages::INVALID_CREDENTIALS.to_string()
            }
            FailureKind::Unauthorized => {
                tracing::warn!(path = %failure.path, "Session expired; signing out");
                self.session.logout();
                session_cleared = true;
                let target = Redirect::login(None);
                self.navigator.navigate(&target);
                redirect = Some(target);
                messages::SESSION_EXPIRED.to_string()
            }
            FailureKind::Forbidden => messages::FORBIDDEN.to_string(),
            FailureKind::NotFound => messages::NOT_FOUND.to_string(),
            FailureKind::PayloadTooLarge => payload_too_large_message(),
            FailureKind::Unprocessable => failure
                .detail
                .clone()
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| messages::UNPROCESSABLE.to_string()),
            FailureKind::ServerError => {
                tracing::error!(method = %failure.method, path = %failure.path, "Backend error");
                messages::SERVER_ERROR.to_string()
            }
            FailureKind::Network => messages::NETWORK.to_string(),
            FailureKind::Other(status) => {
                tracing::warn!(status, path = %failure.path, "Unclassified HTTP failure");
                messages::UNEXPECTED.to_string()
            }
        };

        if displayed {
            self.notifier.notify(&message);
        }

        Interception {
            kind,
            message,
            displayed,
            session_cleared,
            redirect,
        }
    }
}

impl std::fmt::Debug for ErrorInterceptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorInterceptor")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

fn payload_too_large_message() -> String {
    format!(
        "File is too large. The maximum size is {} MB ({MAX_UPLOAD_BYTES} bytes) per file.",
        MAX_UPLOAD_BYTES / (1024 * 1024)
    )
}
