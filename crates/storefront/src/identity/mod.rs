//! Identity provider seam and the session observer.
//!
//! The identity provider (the backend's auth service) owns sessions; this
//! crate only asks it to sign shoppers in and out and then broadcasts the
//! result through a [`SessionHub`]. Components that care about who is signed
//! in either register a [`SessionListener`] (awaited on every change, in
//! registration order) or hold a `watch` receiver from
//! [`SessionHub::subscribe`].

mod memory;
mod session;

pub use memory::MemoryIdentityProvider;
pub use session::{AuthEvent, Session, SessionChange, StoredSession};

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::watch;

use capstone_core::{Email, Identity};

use crate::backend::BackendError;

/// Result of a sign-up request.
#[derive(Debug, Clone)]
pub enum SignUpOutcome {
    /// The account is active and signed in.
    SignedIn(Session),
    /// The account exists but the email must be confirmed first.
    ConfirmationRequired(Identity),
}

/// External identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Exchange email and password for a session.
    async fn sign_in_with_password(
        &self,
        email: &Email,
        password: &str,
    ) -> Result<Session, BackendError>;

    /// Create an account. `full_name` is stored as profile metadata.
    async fn sign_up(
        &self,
        full_name: &str,
        email: &Email,
        password: &str,
    ) -> Result<SignUpOutcome, BackendError>;

    /// Exchange a refresh token for a fresh session.
    async fn refresh(&self, refresh_token: &str) -> Result<Session, BackendError>;

    /// Revoke a session.
    async fn sign_out(&self, session: &Session) -> Result<(), BackendError>;
}

/// Receives every session change published on a [`SessionHub`].
#[async_trait]
pub trait SessionListener: Send + Sync {
    async fn on_session_change(&self, change: &SessionChange);
}

/// Session observer: current identity plus change notifications.
pub struct SessionHub {
    tx: watch::Sender<SessionChange>,
    listeners: Mutex<Vec<Arc<dyn SessionListener>>>,
}

impl Default for SessionHub {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionHub {
    /// Create a hub with no session.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SessionChange {
            event: AuthEvent::InitialSession,
            session: None,
        });
        Self {
            tx,
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// The current session, if someone is signed in.
    #[must_use]
    pub fn current(&self) -> Option<Session> {
        self.tx.borrow().session.clone()
    }

    /// Receiver of the latest change. Intermediate changes may be skipped.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionChange> {
        self.tx.subscribe()
    }

    /// Register a listener for all future changes.
    pub fn register(&self, listener: Arc<dyn SessionListener>) {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }

    /// Record a change and deliver it to every listener.
    pub async fn publish(&self, event: AuthEvent, session: Option<Session>) {
        let change = SessionChange { event, session };
        tracing::debug!(
            event = ?change.event,
            user_id = change.user_id().map(capstone_core::UserId::as_str),
            "session change"
        );
        self.tx.send_replace(change.clone());

        let listeners = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for listener in listeners {
            listener.on_session_change(&change).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use capstone_core::UserId;

    use super::*;

    #[derive(Default)]
    struct Counting {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SessionListener for Counting {
        async fn on_session_change(&self, _change: &SessionChange) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn session() -> Session {
        Session::new(
            Identity::new(UserId::new("u-1"), None, None),
            "token",
            None,
            None,
        )
    }

    #[tokio::test]
    async fn test_publish_updates_current_and_listeners() {
        let hub = SessionHub::new();
        let listener = Arc::new(Counting::default());
        hub.register(listener.clone());
        let rx = hub.subscribe();

        assert!(hub.current().is_none());

        hub.publish(AuthEvent::SignedIn, Some(session())).await;
        assert_eq!(
            hub.current().map(|s| s.user_id().clone()),
            Some(UserId::new("u-1"))
        );
        assert_eq!(rx.borrow().event, AuthEvent::SignedIn);

        hub.publish(AuthEvent::SignedOut, None).await;
        assert!(hub.current().is_none());
        assert_eq!(listener.calls.load(Ordering::SeqCst), 2);
    }
}
