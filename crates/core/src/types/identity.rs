//! Signed-in shopper identity.

use serde::{Deserialize, Serialize};

use super::{Email, UserId};

/// Shown when neither a profile name nor an email is available.
pub const PLACEHOLDER_NAME: &str = "Shopper";

/// The identity the backend reports for a signed-in shopper.
///
/// Holds no tokens, so it is safe to mirror into local storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Stable user identifier issued by the identity provider.
    pub id: UserId,
    /// Email address, if the account has one.
    #[serde(default)]
    pub email: Option<Email>,
    /// Profile-supplied name (`full_name` in user metadata).
    #[serde(default)]
    pub full_name: Option<String>,
}

impl Identity {
    /// Create an identity.
    #[must_use]
    pub const fn new(id: UserId, email: Option<Email>, full_name: Option<String>) -> Self {
        Self {
            id,
            email,
            full_name,
        }
    }

    /// Name to greet the shopper with.
    ///
    /// Prefers the profile name, then the local part of the email, then
    /// [`PLACEHOLDER_NAME`].
    #[must_use]
    pub fn display_name(&self) -> &str {
        if let Some(name) = self.full_name.as_deref().map(str::trim)
            && !name.is_empty()
        {
            return name;
        }
        match self.email.as_ref().map(Email::local_part) {
            Some(local) if !local.is_empty() => local,
            _ => PLACEHOLDER_NAME,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn identity(email: Option<&str>, name: Option<&str>) -> Identity {
        Identity::new(
            UserId::new("u-1"),
            email.map(|e| Email::parse(e).unwrap()),
            name.map(String::from),
        )
    }

    #[test]
    fn test_display_name_prefers_profile_name() {
        let id = identity(Some("demo@example.com"), Some("Demo User"));
        assert_eq!(id.display_name(), "Demo User");
    }

    #[test]
    fn test_display_name_falls_back_to_email_local_part() {
        assert_eq!(identity(Some("demo@example.com"), None).display_name(), "demo");
        assert_eq!(
            identity(Some("demo@example.com"), Some("   ")).display_name(),
            "demo"
        );
    }

    #[test]
    fn test_display_name_placeholder() {
        assert_eq!(identity(None, None).display_name(), PLACEHOLDER_NAME);
    }
}
