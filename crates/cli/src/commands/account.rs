//! Account commands.

use capstone_storefront::error::AppError;
use capstone_storefront::identity::SignUpOutcome;
use capstone_storefront::services::auth::SignUpForm;
use capstone_storefront::state::AppState;

use crate::console;

/// Sign in. Confirmation is printed by the notifier.
///
/// # Errors
///
/// Returns an error if the email is malformed or the credentials are rejected.
pub async fn login(state: &AppState, email: &str, password: &str) -> Result<(), AppError> {
    state.auth().login(email, password).await?;
    Ok(())
}

/// Create an account.
///
/// # Errors
///
/// Returns an error if the form is invalid or the provider rejects it.
pub async fn signup(state: &AppState, form: &SignUpForm) -> Result<(), AppError> {
    match state.auth().signup(form).await? {
        SignUpOutcome::SignedIn(session) => {
            tracing::debug!(user_id = %session.user_id(), "signed in after signup");
        }
        SignUpOutcome::ConfirmationRequired(_) => {
            console::line("Sign in once your email is confirmed.");
        }
    }
    Ok(())
}

/// Sign out.
///
/// # Errors
///
/// Returns an error if the provider could not revoke the session. The local
/// session is ended regardless.
pub async fn logout(state: &AppState) -> Result<(), AppError> {
    if state.auth().current_identity().is_none() {
        console::line("You are not signed in.");
        return Ok(());
    }
    state.auth().logout().await?;
    Ok(())
}

pub fn whoami(state: &AppState) {
    match state.auth().current_identity() {
        Some(identity) => {
            let email = identity
                .email
                .as_ref()
                .map_or_else(String::new, |e| format!(" <{e}>"));
            console::line(&format!("{}{email} (id {})", identity.display_name(), identity.id));
        }
        None => console::line("Not signed in."),
    }
}
