//! Cart and wishlist synchronization.
//!
//! # Architecture
//!
//! ```text
//! SessionHub ──► SyncController<C> ──► in-memory C
//!                      │ apply()
//!                      ▼
//!                 replicate(snapshot)
//!                 ├── LocalMirrorSink ──► LocalStore       (synchronous)
//!                 └── RemoteSink ──► RemoteWriter ──► RemoteRecords (async, coalesced)
//! ```
//!
//! On a session transition the controller picks the authoritative source
//! (remote row for a signed-in user, falling back to the local mirror when
//! the user has no row yet) and replaces the in-memory value. Every
//! mutation afterwards replicates the full snapshot to both sinks.

mod controller;
mod replicate;
pub mod snapshot;
mod writer;

pub use controller::SyncController;
pub use replicate::{LocalMirrorSink, RemoteSink, Snapshot, SnapshotSink, replicate};
pub use writer::RemoteWriter;

use thiserror::Error;

use crate::storage::StorageError;

/// Errors raised while replicating a snapshot.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Local mirror write failed.
    #[error("local mirror error: {0}")]
    Storage(#[from] StorageError),

    /// Snapshot could not be serialized.
    #[error("snapshot encoding error: {0}")]
    Encode(#[from] serde_json::Error),

    /// The remote writer task is gone.
    #[error("remote writer stopped")]
    WriterStopped,
}
