//! Route guard evaluation.

use printshop_client::{AdminGuard, AuthGuard, GuardOutcome};

use super::{CommandError, Context};

/// Run the auth guard, then the admin guard when requested.
pub async fn check(context: &Context, path: &str, admin: bool) -> Result<(), CommandError> {
    let mut outcome = AuthGuard::check(&context.session, path).await;
    if admin && outcome.is_allowed() {
        outcome = AdminGuard::check(&context.session).await;
    }

    match outcome {
        GuardOutcome::Allow => {
            tracing::info!("{path}: allowed");
            Ok(())
        }
        GuardOutcome::Redirect(redirect) => Err(CommandError::Denied(redirect)),
    }
}
