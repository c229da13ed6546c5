//! In-memory remote records for demo mode and tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use capstone_core::{CollectionKind, UserId};

use super::{BackendError, RemoteRecords};
use crate::identity::Session;

/// Remote rows kept in a map keyed by `(collection, user)`.
///
/// Failure switches and a write delay let tests exercise the sync layer's
/// error and coalescing paths.
#[derive(Debug, Default)]
pub struct MemoryRecords {
    rows: Mutex<HashMap<(CollectionKind, UserId), Value>>,
    fail_fetches: AtomicBool,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
    write_delay: Mutex<Option<Duration>>,
}

impl MemoryRecords {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a row as if a previous session had written it.
    pub fn seed(&self, kind: CollectionKind, user_id: &UserId, snapshot: Value) {
        self.rows().insert((kind, user_id.clone()), snapshot);
    }

    /// The row stored for a user, if any.
    #[must_use]
    pub fn row(&self, kind: CollectionKind, user_id: &UserId) -> Option<Value> {
        self.rows().get(&(kind, user_id.clone())).cloned()
    }

    /// Make every fetch fail.
    pub fn fail_fetches(&self, fail: bool) {
        self.fail_fetches.store(fail, Ordering::SeqCst);
    }

    /// Make every upsert and clear fail.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Delay each write, to hold it in flight.
    pub fn set_write_delay(&self, delay: Option<Duration>) {
        *self
            .write_delay
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = delay;
    }

    /// Number of writes attempted (upserts and clears).
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn rows(&self) -> MutexGuard<'_, HashMap<(CollectionKind, UserId), Value>> {
        self.rows.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn begin_write(&self, kind: CollectionKind) -> Result<(), BackendError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let delay = *self
            .write_delay
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(BackendError::Simulated(format!("{kind} write rejected")));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteRecords for MemoryRecords {
    async fn fetch(
        &self,
        kind: CollectionKind,
        session: &Session,
    ) -> Result<Option<Value>, BackendError> {
        if self.fail_fetches.load(Ordering::SeqCst) {
            return Err(BackendError::Simulated(format!("{kind} fetch rejected")));
        }
        Ok(self.row(kind, session.user_id()))
    }

    async fn upsert(
        &self,
        kind: CollectionKind,
        session: &Session,
        snapshot: &Value,
    ) -> Result<(), BackendError> {
        self.begin_write(kind).await?;
        self.seed(kind, session.user_id(), snapshot.clone());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use capstone_core::Identity;
    use serde_json::json;

    use super::*;

    fn session(id: &str) -> Session {
        Session::new(Identity::new(UserId::new(id), None, None), "t", None, None)
    }

    #[tokio::test]
    async fn test_rows_are_per_user_and_kind() {
        let records = MemoryRecords::new();
        let alice = session("alice");

        records
            .upsert(CollectionKind::Cart, &alice, &json!([{ "id": "1" }]))
            .await
            .unwrap();

        assert!(
            records
                .fetch(CollectionKind::Wishlist, &alice)
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            records
                .fetch(CollectionKind::Cart, &session("bob"))
                .await
                .unwrap()
                .is_none()
        );
        assert_eq!(
            records.fetch(CollectionKind::Cart, &alice).await.unwrap(),
            Some(json!([{ "id": "1" }]))
        );

        records.clear(CollectionKind::Cart, &alice).await.unwrap();
        assert_eq!(
            records.row(CollectionKind::Cart, alice.user_id()),
            Some(json!([]))
        );
        assert_eq!(records.write_count(), 2);
    }

    #[tokio::test]
    async fn test_clear_creates_missing_row() {
        let records = MemoryRecords::new();
        let carol = session("carol");

        records.clear(CollectionKind::Wishlist, &carol).await.unwrap();
        assert_eq!(
            records.fetch(CollectionKind::Wishlist, &carol).await.unwrap(),
            Some(json!([]))
        );
    }

    #[tokio::test]
    async fn test_failure_switches() {
        let records = MemoryRecords::new();
        let alice = session("alice");
        records.fail_fetches(true);
        records.fail_writes(true);

        assert!(records.fetch(CollectionKind::Cart, &alice).await.is_err());
        assert!(
            records
                .upsert(CollectionKind::Cart, &alice, &json!([]))
                .await
                .is_err()
        );
        assert!(records.row(CollectionKind::Cart, alice.user_id()).is_none());
    }
}
