//! Serialized, coalescing remote writes.
//!
//! Each controller owns one [`RemoteWriter`]. A background task performs at
//! most one remote write at a time. Pending snapshots are kept one per user:
//! a new snapshot replaces the one still waiting for the same user, so after
//! a burst only the latest is sent, while a snapshot queued for a user who
//! has since signed out still reaches that user's row.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tokio::sync::{mpsc, watch};

use capstone_core::CollectionKind;

use super::SyncError;
use crate::backend::RemoteRecords;
use crate::identity::Session;

/// A queued write. Carries its owner's session, so it still lands in the
/// right row after a sign-out or user switch.
#[derive(Debug, Clone)]
struct Job {
    /// Earliest submission this job stands for.
    first_seq: u64,
    seq: u64,
    session: Session,
    value: Value,
}

#[derive(Debug, Default)]
struct Pending {
    submitted: u64,
    /// At most one job per user, oldest first.
    jobs: VecDeque<Job>,
}

impl Pending {
    /// Highest sequence number below which every submission is settled.
    fn settled(&self) -> u64 {
        self.jobs
            .front()
            .map_or(self.submitted, |job| job.first_seq - 1)
    }
}

type Shared = Arc<Mutex<Pending>>;

fn lock(pending: &Shared) -> MutexGuard<'_, Pending> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}

fn next_job(pending: &Shared) -> Option<Job> {
    lock(pending).jobs.pop_front()
}

/// Handle to a collection's remote write task.
#[derive(Debug)]
pub struct RemoteWriter {
    kind: CollectionKind,
    pending: Shared,
    wake: mpsc::Sender<()>,
    completed: watch::Receiver<u64>,
}

impl RemoteWriter {
    /// Start the write task for `kind`.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn spawn(kind: CollectionKind, records: Arc<dyn RemoteRecords>) -> Self {
        let pending = Shared::default();
        let (wake, woken) = mpsc::channel(1);
        let (done, completed) = watch::channel(0);
        tokio::spawn(run(kind, records, Arc::clone(&pending), woken, done));
        Self {
            kind,
            pending,
            wake,
            completed,
        }
    }

    /// Queue `value` for the row of `session`'s user, replacing any snapshot
    /// still waiting for that user.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::WriterStopped` if the write task has exited.
    pub fn submit(&self, session: Session, value: Value) -> Result<(), SyncError> {
        if self.wake.is_closed() {
            return Err(SyncError::WriterStopped);
        }
        {
            let mut pending = lock(&self.pending);
            pending.submitted += 1;
            let seq = pending.submitted;
            if let Some(job) = pending
                .jobs
                .iter_mut()
                .find(|job| job.session.user_id() == session.user_id())
            {
                job.seq = seq;
                job.session = session;
                job.value = value;
            } else {
                pending.jobs.push_back(Job {
                    first_seq: seq,
                    seq,
                    session,
                    value,
                });
            }
        }
        match self.wake.try_send(()) {
            Ok(()) | Err(mpsc::error::TrySendError::Full(())) => Ok(()),
            Err(mpsc::error::TrySendError::Closed(())) => Err(SyncError::WriterStopped),
        }
    }

    /// Wait until everything submitted so far has been written (or dropped
    /// in favour of a later snapshot for the same user).
    pub async fn flush(&self) {
        let target = lock(&self.pending).submitted;
        let mut completed = self.completed.clone();
        if completed.wait_for(|&done| done >= target).await.is_err() {
            tracing::warn!(kind = %self.kind, "remote writer stopped before flushing");
        }
    }
}

async fn run(
    kind: CollectionKind,
    records: Arc<dyn RemoteRecords>,
    pending: Shared,
    mut woken: mpsc::Receiver<()>,
    done: watch::Sender<u64>,
) {
    loop {
        while let Some(job) = next_job(&pending) {
            write(kind, records.as_ref(), &job).await;
            done.send_replace(lock(&pending).settled());
        }
        if woken.recv().await.is_none() {
            break;
        }
    }
    tracing::debug!(%kind, "remote writer stopped");
}

async fn write(kind: CollectionKind, records: &dyn RemoteRecords, job: &Job) {
    // An empty list clears the row, creating it if the user has none yet
    let result = if job.value.as_array().is_some_and(Vec::is_empty) {
        records.clear(kind, &job.session).await
    } else {
        records.upsert(kind, &job.session, &job.value).await
    };

    match result {
        Ok(()) => tracing::debug!(
            %kind,
            seq = job.seq,
            user_id = %job.session.user_id(),
            "remote snapshot written"
        ),
        Err(e) => tracing::warn!(
            %kind,
            seq = job.seq,
            user_id = %job.session.user_id(),
            error = %e,
            "remote snapshot write failed"
        ),
    }
}
