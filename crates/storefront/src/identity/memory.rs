//! In-memory identity provider for demo mode and tests.

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use capstone_core::{Email, Identity, UserId};

use super::{IdentityProvider, Session, SignUpOutcome};
use crate::backend::BackendError;

const INVALID_CREDENTIALS: &str = "Invalid email or password. Please try again.";
const EMAIL_IN_USE: &str = "Email already in use. Please try a different email or log in.";

#[derive(Debug, Clone)]
struct Account {
    identity: Identity,
    password: String,
}

/// Identity provider holding accounts in a `Vec`.
///
/// Access tokens are random UUIDs; there is no expiry.
#[derive(Debug, Default)]
pub struct MemoryIdentityProvider {
    accounts: Mutex<Vec<Account>>,
}

impl MemoryIdentityProvider {
    /// An empty provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A provider with the demo account `user@example.com` / `password123`.
    #[must_use]
    pub fn with_demo_account() -> Self {
        let provider = Self::new();
        if let Ok(email) = Email::parse("user@example.com") {
            provider.add_account(UserId::new("1"), "Demo User", email, "password123");
        }
        provider
    }

    /// Register an account directly.
    pub fn add_account(&self, id: UserId, full_name: &str, email: Email, password: &str) {
        self.accounts().push(Account {
            identity: Identity::new(id, Some(email), Some(full_name.to_owned())),
            password: password.to_owned(),
        });
    }

    fn accounts(&self) -> MutexGuard<'_, Vec<Account>> {
        self.accounts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn issue(identity: Identity) -> Session {
        Session::new(
            identity,
            uuid::Uuid::new_v4().to_string(),
            Some(uuid::Uuid::new_v4().to_string()),
            None,
        )
    }
}

fn rejected(message: &str) -> BackendError {
    BackendError::Api {
        status: 400,
        message: message.to_owned(),
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn sign_in_with_password(
        &self,
        email: &Email,
        password: &str,
    ) -> Result<Session, BackendError> {
        let identity = self
            .accounts()
            .iter()
            .find(|a| a.identity.email.as_ref() == Some(email) && a.password == password)
            .map(|a| a.identity.clone())
            .ok_or_else(|| rejected(INVALID_CREDENTIALS))?;
        Ok(Self::issue(identity))
    }

    async fn sign_up(
        &self,
        full_name: &str,
        email: &Email,
        password: &str,
    ) -> Result<SignUpOutcome, BackendError> {
        let identity = {
            let mut accounts = self.accounts();
            if accounts
                .iter()
                .any(|a| a.identity.email.as_ref() == Some(email))
            {
                return Err(rejected(EMAIL_IN_USE));
            }
            let identity = Identity::new(
                UserId::new((accounts.len() + 1).to_string()),
                Some(email.clone()),
                Some(full_name.to_owned()),
            );
            accounts.push(Account {
                identity: identity.clone(),
                password: password.to_owned(),
            });
            identity
        };
        Ok(SignUpOutcome::SignedIn(Self::issue(identity)))
    }

    async fn refresh(&self, _refresh_token: &str) -> Result<Session, BackendError> {
        Err(rejected("Refresh tokens are not supported in demo mode"))
    }

    async fn sign_out(&self, _session: &Session) -> Result<(), BackendError> {
        Ok(())
    }
}
