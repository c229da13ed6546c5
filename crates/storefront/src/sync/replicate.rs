//! Fan-out of one snapshot to every replica.

use std::sync::Arc;

use serde_json::Value;

use capstone_core::CollectionKind;

use super::{RemoteWriter, SyncError};
use crate::identity::Session;
use crate::storage::LocalStore;

/// One full collection value on its way to the replicas.
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    pub kind: CollectionKind,
    pub value: &'a Value,
    /// Session of the user the snapshot belongs to, if anyone is signed in.
    pub session: Option<&'a Session>,
}

/// A downstream replica of a collection.
pub trait SnapshotSink: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Store the snapshot, or hand it off for storing.
    ///
    /// # Errors
    ///
    /// Returns `SyncError` if the replica rejects the snapshot.
    fn write(&self, snapshot: Snapshot<'_>) -> Result<(), SyncError>;
}

/// Writes snapshots to the local mirror slot of their collection.
#[derive(Clone)]
pub struct LocalMirrorSink {
    store: Arc<dyn LocalStore>,
}

impl LocalMirrorSink {
    #[must_use]
    pub fn new(store: Arc<dyn LocalStore>) -> Self {
        Self { store }
    }
}

impl SnapshotSink for LocalMirrorSink {
    fn name(&self) -> &'static str {
        "local"
    }

    fn write(&self, snapshot: Snapshot<'_>) -> Result<(), SyncError> {
        let text = serde_json::to_string(snapshot.value)?;
        self.store.set(snapshot.kind.local_key(), &text)?;
        Ok(())
    }
}

/// Queues snapshots of signed-in users on the remote writer.
pub struct RemoteSink<'a> {
    writer: &'a RemoteWriter,
}

impl<'a> RemoteSink<'a> {
    #[must_use]
    pub const fn new(writer: &'a RemoteWriter) -> Self {
        Self { writer }
    }
}

impl SnapshotSink for RemoteSink<'_> {
    fn name(&self) -> &'static str {
        "remote"
    }

    fn write(&self, snapshot: Snapshot<'_>) -> Result<(), SyncError> {
        let Some(session) = snapshot.session else {
            return Ok(());
        };
        self.writer.submit(session.clone(), snapshot.value.clone())
    }
}

/// Write `snapshot` to every sink. A failing sink is logged and does not stop
/// the others. Returns the number of sinks that failed.
pub fn replicate(sinks: &[&dyn SnapshotSink], snapshot: Snapshot<'_>) -> usize {
    let mut failures = 0;
    for sink in sinks {
        if let Err(e) = sink.write(snapshot) {
            failures += 1;
            tracing::warn!(
                kind = %snapshot.kind,
                sink = sink.name(),
                error = %e,
                "snapshot replication failed"
            );
        }
    }
    failures
}
