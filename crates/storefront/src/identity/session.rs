//! Session types.
//!
//! A [`Session`] is the identity provider's notion of "who is signed in",
//! plus the tokens needed to talk to the backend on their behalf.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use capstone_core::{Identity, UserId};

/// A signed-in session.
///
/// Implements `Debug` manually to redact tokens.
#[derive(Clone)]
pub struct Session {
    /// Who is signed in.
    pub identity: Identity,
    access_token: SecretString,
    refresh_token: Option<SecretString>,
    /// When the access token stops being accepted.
    pub expires_at: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("identity", &self.identity)
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl Session {
    /// Create a session.
    #[must_use]
    pub fn new(
        identity: Identity,
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            identity,
            access_token: SecretString::from(access_token.into()),
            refresh_token: refresh_token.map(SecretString::from),
            expires_at,
        }
    }

    /// The signed-in user's id.
    #[must_use]
    pub const fn user_id(&self) -> &UserId {
        &self.identity.id
    }

    /// Bearer token for backend requests.
    #[must_use]
    pub fn access_token(&self) -> &str {
        self.access_token.expose_secret()
    }

    /// Token used to obtain a fresh session.
    #[must_use]
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_ref().map(ExposeSecret::expose_secret)
    }

    /// Whether the access token has expired at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }

    /// Serializable form for the local `session` slot.
    #[must_use]
    pub fn to_stored(&self) -> StoredSession {
        StoredSession {
            identity: self.identity.clone(),
            access_token: self.access_token().to_owned(),
            refresh_token: self.refresh_token().map(str::to_owned),
            expires_at: self.expires_at,
        }
    }
}

impl From<StoredSession> for Session {
    fn from(stored: StoredSession) -> Self {
        Self::new(
            stored.identity,
            stored.access_token,
            stored.refresh_token,
            stored.expires_at,
        )
    }
}

/// Session as persisted in local storage between runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSession {
    pub identity: Identity,
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Why the session observer fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthEvent {
    /// Session restored (or found absent) at startup.
    InitialSession,
    SignedIn,
    SignedOut,
    /// Same user, new tokens.
    TokenRefreshed,
    /// Same user, new profile data.
    UserUpdated,
}

/// One notification from the session observer.
#[derive(Debug, Clone)]
pub struct SessionChange {
    pub event: AuthEvent,
    pub session: Option<Session>,
}

impl SessionChange {
    /// User id of the session carried by this change, if any.
    #[must_use]
    pub fn user_id(&self) -> Option<&UserId> {
        self.session.as_ref().map(Session::user_id)
    }
}
