//! Authentication error types.

use thiserror::Error;

use crate::backend::BackendError;
use crate::storage::StorageError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] capstone_core::EmailError),

    /// Sign-up without a name.
    #[error("name is required")]
    MissingName,

    /// Password too short.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Password and confirmation differ.
    #[error("Passwords do not match")]
    PasswordMismatch,

    /// The identity provider rejected the request or could not be reached.
    #[error("identity provider error: {0}")]
    Provider(#[from] BackendError),

    /// Persisted session could not be read or written.
    #[error("session storage error: {0}")]
    Storage(#[from] StorageError),
}

impl AuthError {
    /// Whether the error was caught by local form validation, before any I/O.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidEmail(_) | Self::MissingName | Self::WeakPassword(_) | Self::PasswordMismatch
        )
    }

    /// Message suitable for showing inline or in a toast.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidEmail(e) => e.to_string(),
            Self::MissingName => "Please enter your name.".to_string(),
            Self::WeakPassword(msg) => msg.clone(),
            Self::PasswordMismatch => "Passwords do not match".to_string(),
            Self::Provider(e) => e.user_message(),
            Self::Storage(_) => "An error occurred. Please try again.".to_string(),
        }
    }
}
