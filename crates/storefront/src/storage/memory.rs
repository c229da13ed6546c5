//! In-memory local store for tests and ephemeral sessions.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{LocalStore, StorageError, validate_key};

/// Local store backed by a `HashMap`. Contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slots: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store with existing slots.
    #[must_use]
    pub fn with_slots<I, K, V>(slots: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            slots: Mutex::new(
                slots
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LocalStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        validate_key(key)?;
        Ok(self.slots().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        self.slots().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        self.slots().remove(key);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_slots() {
        let store = MemoryStore::with_slots([("wishlist", "[]")]);
        assert_eq!(store.get("wishlist").unwrap().as_deref(), Some("[]"));
        assert_eq!(store.get("cart").unwrap(), None);
    }

    #[test]
    fn test_overwrite_and_remove() {
        let store = MemoryStore::new();
        store.set("user", "{}").unwrap();
        store.set("user", "{\"id\":\"1\"}").unwrap();
        assert_eq!(store.get("user").unwrap().as_deref(), Some("{\"id\":\"1\"}"));
        store.remove("user").unwrap();
        assert_eq!(store.get("user").unwrap(), None);
    }
}
