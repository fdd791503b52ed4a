// SPDX-FileCopyrightText: 2026 iMessageForwarder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Store handles shared by the request handlers.
//!
//! Each store wraps one [`Database`] opened at startup and lives for the
//! whole process; handlers borrow it through shared state instead of opening
//! a connection per request.

use std::path::Path;

use imf_core::{ActionKind, HistoryTable, ImfError, NewAction, QueueStatus, QueuedRow, RowId};
use serde_json::{Map, Value};
use tracing::debug;

use crate::database::Database;
use crate::queries;

/// The relay-owned queue of outgoing actions.
#[derive(Clone)]
pub struct QueueStore {
    db: Database,
}

impl QueueStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Open (and migrate) the queue store at `path`.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, ImfError> {
        Database::open(path).await.map(Self::new)
    }

    /// Persist a validated action and return its new identity.
    pub async fn enqueue(&self, action: &NewAction) -> Result<RowId, ImfError> {
        let id = queries::queue::enqueue(&self.db, action).await?;
        debug!(kind = %action.kind(), rowid = %id, "action queued");
        Ok(id)
    }

    pub async fn get(&self, kind: ActionKind, id: RowId) -> Result<Option<QueuedRow>, ImfError> {
        queries::queue::get(&self.db, kind, id).await
    }

    /// Report whether a queued action has been consumed by the sender.
    pub async fn status(
        &self,
        kind: ActionKind,
        id: RowId,
        echo_rows: bool,
    ) -> Result<QueueStatus, ImfError> {
        let row = self.get(kind, id).await?;
        Ok(QueueStatus::from_lookup(row, echo_rows))
    }

    pub async fn count(&self, kind: ActionKind) -> Result<i64, ImfError> {
        queries::queue::count(&self.db, kind).await
    }

    pub async fn pending(&self, kind: ActionKind, limit: usize) -> Result<Vec<QueuedRow>, ImfError> {
        queries::queue::pending(&self.db, kind, limit).await
    }

    pub async fn checkpoint(&self) -> Result<(), ImfError> {
        self.db.checkpoint().await
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

/// Read-only view of the messaging client's history database.
#[derive(Clone)]
pub struct HistoryStore {
    db: Database,
}

impl HistoryStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn open(path: impl AsRef<Path>) -> Result<Self, ImfError> {
        Database::open_read_only(path).await.map(Self::new)
    }

    pub async fn row(
        &self,
        table: HistoryTable,
        id: RowId,
    ) -> Result<Option<Map<String, Value>>, ImfError> {
        queries::history::row(&self.db, table, id).await
    }

    pub async fn attachment_filename(&self, id: RowId) -> Result<Option<Option<String>>, ImfError> {
        queries::history::attachment_filename(&self.db, id).await
    }
}
