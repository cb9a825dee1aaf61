//! Sign-in, registration and session inspection.

use printshop_client::forms::{LoginForm, RegisterForm};
use printshop_client::routes;
use printshop_core::User;

use super::{CommandError, Context};

fn describe(user: &User) -> String {
    format!("{} ({}, {})", user.display_name(), user.id, user.role)
}

/// Sign in and report where the storefront would land.
pub async fn login(
    context: &Context,
    identifier: String,
    password: String,
) -> Result<(), CommandError> {
    let request = LoginForm {
        identifier,
        password,
    }
    .validate()?;

    let session = context.auth.login(&request).await?;
    tracing::info!(
        "Signed in as {}, landing on {}",
        describe(&session.user),
        routes::post_login_destination(&session.user, None)
    );
    Ok(())
}

/// Create an account; the new session is persisted like a login.
pub async fn register(context: &Context, form: &RegisterForm) -> Result<(), CommandError> {
    let request = form.validate()?;

    let session = context.auth.register(&request).await?;
    tracing::info!("Registered {}", describe(&session.user));
    Ok(())
}

/// Report the cached user without contacting the backend.
pub fn whoami(context: &Context) -> Result<(), CommandError> {
    let user = context
        .session
        .current_user()
        .filter(|_| context.session.is_authenticated())
        .ok_or(CommandError::SignedOut)?;

    tracing::info!("{}", describe(&user));
    Ok(())
}

/// Reconcile the cached session with the backend.
pub async fn validate(context: &Context) -> Result<(), CommandError> {
    if !context.auth.validate_token().await {
        return Err(CommandError::SignedOut);
    }

    match context.session.current_user() {
        Some(user) => tracing::info!("Session valid for {}", describe(&user)),
        None => tracing::warn!("Token kept, but no user is cached"),
    }
    Ok(())
}

pub fn logout(context: &Context) {
    context.auth.logout();
    tracing::info!("Signed out");
}
