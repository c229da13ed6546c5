//! Generic synchronization controller for one collection.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use capstone_core::{Collection, UserId};

use super::replicate::{LocalMirrorSink, RemoteSink, Snapshot, SnapshotSink, replicate};
use super::{RemoteWriter, snapshot};
use crate::backend::RemoteRecords;
use crate::identity::{Session, SessionChange, SessionListener};
use crate::storage::LocalStore;

struct State<C> {
    value: C,
    /// Session used for remote writes; refreshed on every change.
    session: Option<Session>,
    /// User whose data is loaded; `None` is the anonymous shopper.
    owner: Option<UserId>,
    loaded: bool,
}

/// Keeps one in-memory collection in step with its local mirror and the
/// signed-in user's remote row.
pub struct SyncController<C: Collection> {
    state: Mutex<State<C>>,
    /// Bumped per load; a load that finishes after a newer one started is
    /// discarded.
    generation: AtomicU64,
    local: LocalMirrorSink,
    store: Arc<dyn LocalStore>,
    records: Arc<dyn RemoteRecords>,
    writer: RemoteWriter,
}

impl<C: Collection> SyncController<C> {
    /// Create a controller holding an empty collection.
    ///
    /// Nothing is loaded until the first session change arrives. Must be
    /// called from within a Tokio runtime.
    #[must_use]
    pub fn new(store: Arc<dyn LocalStore>, records: Arc<dyn RemoteRecords>) -> Self {
        Self {
            state: Mutex::new(State {
                value: C::default(),
                session: None,
                owner: None,
                loaded: false,
            }),
            generation: AtomicU64::new(0),
            local: LocalMirrorSink::new(Arc::clone(&store)),
            store,
            writer: RemoteWriter::spawn(C::KIND, Arc::clone(&records)),
            records,
        }
    }

    fn state(&self) -> MutexGuard<'_, State<C>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the current collection.
    #[must_use]
    pub fn snapshot(&self) -> C {
        self.state().value.clone()
    }

    /// Read the current collection without copying it.
    pub fn with<R>(&self, f: impl FnOnce(&C) -> R) -> R {
        f(&self.state().value)
    }

    /// Apply a transition. When it changes something, the new value is
    /// written to the local mirror before this returns and queued for the
    /// remote row if someone is signed in.
    pub fn apply(&self, transition: impl FnOnce(&mut C) -> Option<C::Change>) -> Option<C::Change> {
        let mut state = self.state();
        let change = transition(&mut state.value)?;

        match snapshot::to_value(&state.value) {
            Ok(value) => {
                let remote = RemoteSink::new(&self.writer);
                let sinks: [&dyn SnapshotSink; 2] = [&self.local, &remote];
                replicate(
                    &sinks,
                    Snapshot {
                        kind: C::KIND,
                        value: &value,
                        session: state.session.as_ref(),
                    },
                );
            }
            Err(e) => tracing::error!(kind = %C::KIND, error = %e, "snapshot encoding failed"),
        }
        Some(change)
    }

    /// React to a session change: load the authoritative source on a real
    /// transition, otherwise just pick up the new tokens.
    pub async fn observe(&self, change: &SessionChange) {
        let user = change.user_id().cloned();
        {
            let mut state = self.state();
            state.session.clone_from(&change.session);
            if state.loaded && state.owner == user {
                tracing::debug!(kind = %C::KIND, event = ?change.event, "same identity; no reload");
                return;
            }
            state.loaded = true;
            state.owner.clone_from(&user);
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        match &change.session {
            Some(session) => self.load_for(generation, session).await,
            None => {
                let value = self.read_local();
                self.install(generation, value, "local");
            }
        }
    }

    async fn load_for(&self, generation: u64, session: &Session) {
        match self.records.fetch(C::KIND, session).await {
            Ok(Some(row)) => self.install(generation, snapshot::from_value(row), "remote"),
            Ok(None) => {
                tracing::info!(
                    kind = %C::KIND,
                    user_id = %session.user_id(),
                    "no remote row yet; keeping local snapshot"
                );
                let value = self.read_local();
                self.install(generation, value, "local");
            }
            Err(e) => tracing::warn!(
                kind = %C::KIND,
                user_id = %session.user_id(),
                error = %e,
                "remote fetch failed; keeping current state"
            ),
        }
    }

    fn read_local(&self) -> C {
        match self.store.get(C::KIND.local_key()) {
            Ok(raw) => snapshot::decode(raw.as_deref()),
            Err(e) => {
                tracing::warn!(kind = %C::KIND, error = %e, "local mirror unreadable; starting empty");
                C::default()
            }
        }
    }

    /// Replace the in-memory value with a loaded one and mirror it locally.
    fn install(&self, generation: u64, value: C, source: &'static str) {
        let mut state = self.state();
        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!(kind = %C::KIND, source, "stale load discarded");
            return;
        }
        state.value = value;
        tracing::info!(kind = %C::KIND, source, entries = state.value.len(), "collection loaded");

        match snapshot::to_value(&state.value) {
            Ok(value) => {
                let sinks: [&dyn SnapshotSink; 1] = [&self.local];
                replicate(
                    &sinks,
                    Snapshot {
                        kind: C::KIND,
                        value: &value,
                        session: None,
                    },
                );
            }
            Err(e) => tracing::error!(kind = %C::KIND, error = %e, "snapshot encoding failed"),
        }
    }

    /// Wait for queued remote writes to finish.
    pub async fn flush(&self) {
        self.writer.flush().await;
    }
}

#[async_trait]
impl<C: Collection> SessionListener for SyncController<C> {
    async fn on_session_change(&self, change: &SessionChange) {
        self.observe(change).await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use capstone_core::{Identity, Price, Product, ProductId, Wishlist};
    use serde_json::json;

    use super::*;
    use crate::backend::MemoryRecords;
    use crate::identity::AuthEvent;
    use crate::storage::MemoryStore;

    fn product(id: &str) -> Product {
        Product::new(id, format!("Cap {id}"), "Street", Price::from_cents(2500))
    }

    fn signed_in(id: &str) -> SessionChange {
        SessionChange {
            event: AuthEvent::SignedIn,
            session: Some(Session::new(
                Identity::new(UserId::new(id), None, None),
                "t",
                None,
                None,
            )),
        }
    }

    fn signed_out() -> SessionChange {
        SessionChange {
            event: AuthEvent::SignedOut,
            session: None,
        }
    }

    fn setup() -> (Arc<MemoryStore>, Arc<MemoryRecords>, SyncController<Wishlist>) {
        let store = Arc::new(MemoryStore::new());
        let records = Arc::new(MemoryRecords::new());
        let controller = SyncController::new(store.clone(), records.clone());
        (store, records, controller)
    }

    #[tokio::test]
    async fn test_initial_anonymous_load_reads_local() {
        let (store, _records, controller) = setup();
        store
            .set("wishlist", &serde_json::to_string(&[product("3")]).unwrap())
            .unwrap();

        controller
            .observe(&SessionChange {
                event: AuthEvent::InitialSession,
                session: None,
            })
            .await;

        assert!(controller.with(|w| w.contains(&ProductId::new("3"))));
    }

    #[tokio::test]
    async fn test_same_identity_does_not_reload() {
        let (_store, records, controller) = setup();
        controller.observe(&signed_in("u")).await;
        controller.apply(|w| w.add(product("1")));

        records.seed(
            capstone_core::CollectionKind::Wishlist,
            &UserId::new("u"),
            json!([]),
        );
        let mut refreshed = signed_in("u");
        refreshed.event = AuthEvent::TokenRefreshed;
        controller.observe(&refreshed).await;

        assert_eq!(controller.snapshot().len(), 1);
    }

    #[tokio::test]
    async fn test_apply_mirrors_locally_and_remotely() {
        let (store, records, controller) = setup();
        controller.observe(&signed_in("u")).await;

        assert!(controller.apply(|w| w.add(product("1"))).is_some());
        // Local mirror is written before apply returns
        assert!(store.get("wishlist").unwrap().unwrap().contains("\"id\":\"1\""));

        controller.flush().await;
        let row = records
            .row(capstone_core::CollectionKind::Wishlist, &UserId::new("u"))
            .unwrap();
        assert_eq!(row.as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn test_no_op_replicates_nothing() {
        let (store, _records, controller) = setup();
        controller.observe(&signed_out()).await;
        store.remove("wishlist").unwrap();

        assert!(controller.apply(|w| w.remove(&ProductId::new("9"))).is_none());
        assert_eq!(store.get("wishlist").unwrap(), None);
    }

    #[tokio::test]
    async fn test_anonymous_mutation_skips_remote() {
        let (_store, records, controller) = setup();
        controller.observe(&signed_out()).await;
        controller.apply(|w| w.add(product("1")));
        controller.flush().await;
        assert_eq!(records.write_count(), 0);
    }
}
