//! Authentication service.
//!
//! Signs shoppers in and out through the identity provider, persists the
//! session between runs, and publishes every change on the [`SessionHub`] so
//! the cart and wishlist controllers can switch data sources.

mod error;

pub use error::AuthError;

use std::sync::Arc;

use chrono::Utc;

use capstone_core::{Email, Identity};

use crate::error::{clear_sentry_user, set_sentry_user};
use crate::identity::{
    AuthEvent, IdentityProvider, Session, SessionHub, SignUpOutcome, StoredSession,
};
use crate::notify::{self, Notification, Notifier};
use crate::storage::{LocalStore, StorageError, keys};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Sign-up form input.
#[derive(Debug, Clone, Default)]
pub struct SignUpForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl SignUpForm {
    /// Check the form locally. Returns the trimmed name and parsed email.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure in form order.
    pub fn validate(&self) -> Result<(String, Email), AuthError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(AuthError::MissingName);
        }
        let email = Email::parse(&self.email)?;
        validate_password(&self.password)?;
        if self.password != self.confirm_password {
            return Err(AuthError::PasswordMismatch);
        }
        Ok((name.to_owned(), email))
    }
}

/// Authentication service.
#[derive(Clone)]
pub struct AuthService {
    provider: Arc<dyn IdentityProvider>,
    hub: Arc<SessionHub>,
    store: Arc<dyn LocalStore>,
    notifier: Arc<dyn Notifier>,
}

impl AuthService {
    /// Create a new authentication service.
    #[must_use]
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        hub: Arc<SessionHub>,
        store: Arc<dyn LocalStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            provider,
            hub,
            store,
            notifier,
        }
    }

    /// The signed-in shopper, if any.
    #[must_use]
    pub fn current_identity(&self) -> Option<Identity> {
        self.hub.current().map(|s| s.identity)
    }

    // =========================================================================
    // Password Authentication
    // =========================================================================

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` before any I/O if the email is
    /// malformed, `AuthError::Provider` if the provider rejects the login.
    pub async fn login(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let email = Email::parse(email)?;

        match self.provider.sign_in_with_password(&email, password).await {
            Ok(session) => {
                let identity = session.identity.clone();
                self.establish(AuthEvent::SignedIn, session).await;
                self.notify(
                    "Login successful",
                    format!("Welcome back, {}!", identity.display_name()),
                    notify::LONG,
                );
                tracing::info!(user_id = %identity.id, "login succeeded");
                Ok(identity)
            }
            Err(e) => {
                tracing::warn!(email_domain = email.domain(), error = %e, "login failed");
                self.notify("Login failed", e.user_message(), notify::LONG);
                Err(e.into())
            }
        }
    }

    /// Create an account.
    ///
    /// # Errors
    ///
    /// Returns a validation error (see [`AuthError::is_validation`]) before
    /// any I/O, or `AuthError::Provider` if the provider rejects the sign-up.
    pub async fn signup(&self, form: &SignUpForm) -> Result<SignUpOutcome, AuthError> {
        let (name, email) = form.validate()?;

        let outcome = match self.provider.sign_up(&name, &email, &form.password).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(email_domain = email.domain(), error = %e, "signup failed");
                self.notify("Signup failed", e.user_message(), notify::LONG);
                return Err(e.into());
            }
        };

        match &outcome {
            SignUpOutcome::SignedIn(session) => {
                tracing::info!(user_id = %session.user_id(), "signup succeeded");
                self.establish(AuthEvent::SignedIn, session.clone()).await;
                self.notify(
                    "Signup successful",
                    format!("Welcome to Capstone, {name}!"),
                    notify::LONG,
                );
            }
            SignUpOutcome::ConfirmationRequired(identity) => {
                tracing::info!(user_id = %identity.id, "signup awaiting confirmation");
                self.notify(
                    "Signup successful",
                    format!("Check {email} to confirm your account."),
                    notify::LONG,
                );
            }
        }
        Ok(outcome)
    }

    /// Sign out. The local session ends even if the provider call fails.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Provider` if the provider could not revoke the
    /// session.
    pub async fn logout(&self) -> Result<(), AuthError> {
        let mut result = Ok(());
        if let Some(session) = self.hub.current()
            && let Err(e) = self.provider.sign_out(&session).await
        {
            tracing::warn!(user_id = %session.user_id(), error = %e, "provider sign-out failed");
            self.notify("Logout failed", e.user_message(), notify::LONG);
            result = Err(e.into());
        }

        self.forget();
        clear_sentry_user();
        self.hub.publish(AuthEvent::SignedOut, None).await;
        self.notify(
            "Logged out",
            "You have been successfully logged out.",
            notify::SHORT,
        );
        result
    }

    // =========================================================================
    // Session Persistence
    // =========================================================================

    /// Restore the session saved by a previous run and publish it as the
    /// initial session. Expired sessions are refreshed when possible.
    pub async fn restore(&self) -> Option<Identity> {
        let mut session = self.load_session();

        if session.as_ref().is_some_and(|s| s.is_expired_at(Utc::now())) {
            let refresh_token = session
                .as_ref()
                .and_then(|s| s.refresh_token().map(str::to_owned));
            session = match refresh_token {
                Some(token) => match self.provider.refresh(&token).await {
                    Ok(fresh) => {
                        tracing::info!(user_id = %fresh.user_id(), "expired session refreshed");
                        Some(fresh)
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "session refresh failed; signing out");
                        None
                    }
                },
                None => None,
            };
            match &session {
                Some(fresh) => self.persist(fresh),
                None => self.forget(),
            }
        }

        if let Some(session) = &session {
            set_sentry_user(&session.identity.id, session.identity.email.as_ref().map(Email::as_str));
        }
        let identity = session.as_ref().map(|s| s.identity.clone());
        self.hub.publish(AuthEvent::InitialSession, session).await;
        identity
    }

    /// Exchange the current refresh token for new tokens.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Provider` if the provider rejects the refresh.
    pub async fn refresh(&self) -> Result<Option<Identity>, AuthError> {
        let Some(token) = self
            .hub
            .current()
            .and_then(|s| s.refresh_token().map(str::to_owned))
        else {
            return Ok(None);
        };
        let fresh = self.provider.refresh(&token).await?;
        let identity = fresh.identity.clone();
        self.establish(AuthEvent::TokenRefreshed, fresh).await;
        Ok(Some(identity))
    }

    /// Identity mirrored under the legacy `user` key, if readable.
    #[must_use]
    pub fn stored_user(&self) -> Option<Identity> {
        let raw = self
            .store
            .get(keys::USER)
            .map_err(|e| tracing::warn!(error = %e, "user slot unreadable"))
            .ok()??;
        serde_json::from_str(&raw)
            .map_err(|e| tracing::warn!(error = %e, "corrupt user slot ignored"))
            .ok()
    }

    async fn establish(&self, event: AuthEvent, session: Session) {
        self.persist(&session);
        set_sentry_user(&session.identity.id, session.identity.email.as_ref().map(Email::as_str));
        self.hub.publish(event, Some(session)).await;
    }

    fn load_session(&self) -> Option<Session> {
        let raw = self
            .store
            .get(keys::SESSION)
            .map_err(|e| tracing::warn!(error = %e, "session slot unreadable"))
            .ok()??;
        serde_json::from_str::<StoredSession>(&raw)
            .map(Session::from)
            .map_err(|e| tracing::warn!(error = %e, "corrupt session slot ignored"))
            .ok()
    }

    fn persist(&self, session: &Session) {
        let write = || -> Result<(), StorageError> {
            self.store
                .set(keys::SESSION, &serde_json::to_string(&session.to_stored())?)?;
            self.store
                .set(keys::USER, &serde_json::to_string(&session.identity)?)?;
            Ok(())
        };
        if let Err(e) = write() {
            tracing::warn!(error = %e, "failed to persist session");
        }
    }

    fn forget(&self) {
        for key in [keys::SESSION, keys::USER] {
            if let Err(e) = self.store.remove(key) {
                tracing::warn!(key, error = %e, "failed to clear session slot");
            }
        }
    }

    fn notify(
        &self,
        title: &str,
        description: impl Into<String>,
        duration: std::time::Duration,
    ) {
        self.notifier
            .notify(Notification::new(title, description, duration));
    }
}

/// Validate password strength.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::identity::MemoryIdentityProvider;
    use crate::notify::RecordingNotifier;
    use crate::storage::MemoryStore;

    struct Fixture {
        auth: AuthService,
        hub: Arc<SessionHub>,
        store: Arc<MemoryStore>,
        notifier: Arc<RecordingNotifier>,
    }

    fn fixture() -> Fixture {
        let hub = Arc::new(SessionHub::new());
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let auth = AuthService::new(
            Arc::new(MemoryIdentityProvider::with_demo_account()),
            hub.clone(),
            store.clone(),
            notifier.clone(),
        );
        Fixture {
            auth,
            hub,
            store,
            notifier,
        }
    }

    fn form(password: &str, confirm: &str) -> SignUpForm {
        SignUpForm {
            name: "Jo Park".into(),
            email: "jo@example.com".into(),
            password: password.into(),
            confirm_password: confirm.into(),
        }
    }

    #[test]
    fn test_signup_validation_order() {
        let mut f = form("longenough", "longenough");
        f.name = "  ".into();
        assert!(matches!(f.validate(), Err(AuthError::MissingName)));

        assert!(matches!(
            form("short", "short").validate(),
            Err(AuthError::WeakPassword(_))
        ));

        let err = form("longenough", "different").validate().unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.user_message(), "Passwords do not match");
    }

    #[tokio::test]
    async fn test_login_publishes_and_persists() {
        let fx = fixture();
        let identity = fx.auth.login("user@example.com", "password123").await.unwrap();

        assert_eq!(identity.display_name(), "Demo User");
        assert_eq!(fx.hub.current().unwrap().user_id(), &identity.id);
        assert!(fx.store.get(keys::SESSION).unwrap().is_some());
        assert_eq!(fx.auth.stored_user(), Some(identity));

        let toasts = fx.notifier.take();
        assert_eq!(toasts[0].title, "Login successful");
        assert_eq!(toasts[0].description, "Welcome back, Demo User!");
        assert_eq!(toasts[0].duration, notify::LONG);
    }

    #[tokio::test]
    async fn test_login_failure_toasts() {
        let fx = fixture();
        let err = fx.auth.login("user@example.com", "wrong").await.unwrap_err();
        assert!(matches!(err, AuthError::Provider(_)));
        assert!(fx.hub.current().is_none());
        assert_eq!(fx.notifier.titles(), vec!["Login failed"]);
    }

    #[tokio::test]
    async fn test_invalid_email_is_inline() {
        let fx = fixture();
        let err = fx.auth.login("not-an-email", "password123").await.unwrap_err();
        assert!(err.is_validation());
        assert!(fx.notifier.titles().is_empty());
    }

    #[tokio::test]
    async fn test_signup_then_logout() {
        let fx = fixture();
        let outcome = fx
            .auth
            .signup(&form("longenough", "longenough"))
            .await
            .unwrap();
        assert!(matches!(outcome, SignUpOutcome::SignedIn(_)));
        assert_eq!(fx.notifier.take()[0].description, "Welcome to Capstone, Jo Park!");

        fx.auth.logout().await.unwrap();
        assert!(fx.hub.current().is_none());
        assert_eq!(fx.store.get(keys::USER).unwrap(), None);
        assert_eq!(fx.store.get(keys::SESSION).unwrap(), None);
        assert_eq!(fx.notifier.titles(), vec!["Logged out"]);
    }

    #[tokio::test]
    async fn test_signup_duplicate_email() {
        let fx = fixture();
        let mut f = form("longenough", "longenough");
        f.email = "user@example.com".into();
        let err = fx.auth.signup(&f).await.unwrap_err();
        assert_eq!(
            err.user_message(),
            "Email already in use. Please try a different email or log in."
        );
        assert_eq!(fx.notifier.titles(), vec!["Signup failed"]);
    }

    #[tokio::test]
    async fn test_restore_round_trip() {
        let fx = fixture();
        let identity = fx.auth.login("user@example.com", "password123").await.unwrap();

        // A later run shares the store but starts with an empty hub
        let hub = Arc::new(SessionHub::new());
        let next = AuthService::new(
            Arc::new(MemoryIdentityProvider::with_demo_account()),
            hub.clone(),
            fx.store.clone(),
            fx.notifier.clone(),
        );
        assert_eq!(next.restore().await, Some(identity));
        assert_eq!(hub.subscribe().borrow().event, AuthEvent::InitialSession);
    }

    #[tokio::test]
    async fn test_restore_tolerates_corrupt_slot() {
        let fx = fixture();
        fx.store.set(keys::SESSION, "{oops").unwrap();
        fx.store.set(keys::USER, "{oops").unwrap();
        assert_eq!(fx.auth.restore().await, None);
        assert_eq!(fx.auth.stored_user(), None);
    }
}
