//! Per-user remote rows over `/rest/v1`.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Method;
use serde_json::{Map, Value, json};

use capstone_core::CollectionKind;

use super::{BackendClient, BackendError};
use crate::identity::Session;

/// Remote record store: one row per user per collection.
///
/// Snapshots travel as raw JSON so that a malformed row is the sync layer's
/// problem to tolerate, not a transport error.
#[async_trait]
pub trait RemoteRecords: Send + Sync {
    /// Fetch the snapshot stored for the session's user.
    ///
    /// `Ok(None)` means the user has no row yet.
    async fn fetch(
        &self,
        kind: CollectionKind,
        session: &Session,
    ) -> Result<Option<Value>, BackendError>;

    /// Insert or overwrite the user's row with `snapshot`.
    async fn upsert(
        &self,
        kind: CollectionKind,
        session: &Session,
        snapshot: &Value,
    ) -> Result<(), BackendError>;

    /// Empty the user's row, creating it if the user has none yet.
    async fn clear(&self, kind: CollectionKind, session: &Session) -> Result<(), BackendError> {
        self.upsert(kind, session, &Value::Array(Vec::new())).await
    }
}

/// PostgREST-style implementation of [`RemoteRecords`].
#[derive(Debug, Clone)]
pub struct RestRecords {
    client: BackendClient,
}

impl RestRecords {
    #[must_use]
    pub const fn new(client: BackendClient) -> Self {
        Self { client }
    }

    fn table_path(kind: CollectionKind) -> String {
        format!("rest/v1/{}", kind.remote_table())
    }
}

fn user_filter(session: &Session) -> String {
    format!("eq.{}", session.user_id())
}

/// Pull the snapshot column out of a `select` response.
fn first_row_column(rows: Vec<Map<String, Value>>, column: &str) -> Option<Value> {
    rows.into_iter()
        .next()
        .map(|mut row| row.remove(column).unwrap_or(Value::Null))
}

#[async_trait]
impl RemoteRecords for RestRecords {
    async fn fetch(
        &self,
        kind: CollectionKind,
        session: &Session,
    ) -> Result<Option<Value>, BackendError> {
        let filter = user_filter(session);
        let url = self.client.endpoint(
            &Self::table_path(kind),
            &[("select", kind.remote_column()), ("user_id", filter.as_str())],
        )?;
        let rows: Vec<Map<String, Value>> = self
            .client
            .send_json(
                self.client
                    .request(Method::GET, url)
                    .bearer_auth(session.access_token()),
            )
            .await?;
        Ok(first_row_column(rows, kind.remote_column()))
    }

    async fn upsert(
        &self,
        kind: CollectionKind,
        session: &Session,
        snapshot: &Value,
    ) -> Result<(), BackendError> {
        let url = self
            .client
            .endpoint(&Self::table_path(kind), &[("on_conflict", "user_id")])?;
        let mut body = Map::new();
        body.insert("user_id".into(), json!(session.user_id()));
        body.insert(kind.remote_column().into(), snapshot.clone());
        body.insert("updated_at".into(), json!(Utc::now().to_rfc3339()));

        self.client
            .send(
                self.client
                    .request(Method::POST, url)
                    .bearer_auth(session.access_token())
                    .header("Prefer", "resolution=merge-duplicates,return=minimal")
                    .json(&Value::Object(body)),
            )
            .await?;
        tracing::debug!(%kind, user_id = %session.user_id(), "remote row upserted");
        Ok(())
    }
}
