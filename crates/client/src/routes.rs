//! Route paths and post-login navigation.

use printshop_core::User;

/// Login entry point.
pub const LOGIN: &str = "/auth/login";

/// Registration form.
pub const REGISTER: &str = "/auth/register";

/// Prefix shared by every page of the login/registration flow.
pub const AUTH_FLOW_PREFIX: &str = "/auth";

/// Default landing area for signed-in customers.
pub const HOME: &str = "/photos";

/// Landing page for administrators after login.
pub const ADMIN_HOME: &str = "/admin/orders";

/// Query parameter carrying the page to resume after login.
pub const RETURN_URL_PARAM: &str = "returnUrl";

/// Whether `path` belongs to the login/registration flow.
///
/// Query strings and fragments are ignored, so `/auth/login?returnUrl=/x`
/// still counts.
#[must_use]
pub fn is_auth_flow(path: &str) -> bool {
    let path = strip_query(path);
    path == AUTH_FLOW_PREFIX
        || path
            .strip_prefix(AUTH_FLOW_PREFIX)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Accept a return destination only if it is a local absolute path.
///
/// Rejects scheme-relative (`//evil.example`), absolute URLs, backslash
/// tricks, and anything inside the auth flow (which would loop).
#[must_use]
pub fn sanitize_return_url(candidate: &str) -> Option<&str> {
    let candidate = candidate.trim();
    let local = candidate.starts_with('/')
        && !candidate.starts_with("//")
        && !candidate.contains('\\')
        && !candidate.contains("://");

    (local && !is_auth_flow(candidate)).then_some(candidate)
}

/// Where to navigate after a successful login or registration.
///
/// Administrators always land on the admin area; everyone else resumes at
/// `return_url` when it is safe, or the default landing page.
#[must_use]
pub fn post_login_destination(user: &User, return_url: Option<&str>) -> String {
    if user.is_admin() {
        return ADMIN_HOME.to_string();
    }

    return_url
        .and_then(sanitize_return_url)
        .unwrap_or(HOME)
        .to_string()
}

fn strip_query(path: &str) -> &str {
    path.split(['?', '#']).next().unwrap_or(path)
}
