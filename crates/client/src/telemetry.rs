//! Sentry context helpers.
//!
//! All of these are no-ops until the host initializes Sentry, so the library
//! can call them unconditionally.

use printshop_core::User;

/// Associate subsequent Sentry events with `user`.
pub fn set_user(user: &User) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user.id.to_string()),
            email: user.email.clone(),
            ..Default::default()
        }));
    });
}

/// Stop associating Sentry events with a user (logout, expired session).
pub fn clear_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Record a breadcrumb for a failed HTTP exchange.
///
/// Breadcrumbs show up in later Sentry reports as the trail of requests that
/// led to an error.
pub fn http_failure_breadcrumb(method: &str, path: &str, status: Option<u16>, kind: &str) {
    let mut breadcrumb = sentry::Breadcrumb {
        ty: "http".to_string(),
        category: Some("http".to_string()),
        message: Some(format!("{method} {path} failed ({kind})")),
        level: sentry::Level::Warning,
        ..Default::default()
    };

    breadcrumb
        .data
        .insert("method".to_string(), serde_json::Value::String(method.to_string()));
    breadcrumb
        .data
        .insert("url".to_string(), serde_json::Value::String(path.to_string()));
    if let Some(status) = status {
        breadcrumb
            .data
            .insert("status_code".to_string(), serde_json::Value::from(status));
    }

    sentry::add_breadcrumb(breadcrumb);
}
