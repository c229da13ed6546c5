//! Local mirror storage.
//!
//! A durable per-device key-value slot holding JSON text, the equivalent of
//! the browser's local storage. Keys used by the storefront:
//!
//! - [`keys::CART`] - cart snapshot (array of cart items)
//! - [`keys::WISHLIST`] - wishlist snapshot (array of products)
//! - [`keys::USER`] - signed-in identity (legacy, no tokens)
//! - [`keys::SESSION`] - persisted auth session, restored at startup
//!
//! Writes are synchronous and complete before the caller continues.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use thiserror::Error;

/// Local storage keys.
pub mod keys {
    /// Cart snapshot.
    pub const CART: &str = "cart";
    /// Wishlist snapshot.
    pub const WISHLIST: &str = "wishlist";
    /// Signed-in identity mirror.
    pub const USER: &str = "user";
    /// Persisted auth session (tokens included).
    pub const SESSION: &str = "session";
}

/// Errors from the local mirror.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Key contains characters that cannot be used as a slot name.
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),

    /// Filesystem operation failed.
    #[error("storage I/O error on {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// Value could not be (de)serialized.
    #[error("storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Durable key-value storage for JSON text.
pub trait LocalStore: Send + Sync {
    /// Read a slot. `Ok(None)` when the slot has never been written.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the slot exists but cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace a slot's contents.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the value cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a slot. Removing an absent slot is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the slot exists but cannot be removed.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Keys are used as file names, so only `[A-Za-z0-9_-]` is accepted.
fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key() {
        assert!(validate_key("cart").is_ok());
        assert!(validate_key("sb-auth_token").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("../etc/passwd").is_err());
        assert!(validate_key("a b").is_err());
    }
}
