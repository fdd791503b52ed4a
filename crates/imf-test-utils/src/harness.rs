// SPDX-FileCopyrightText: 2026 iMessageForwarder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for router-level integration testing.
//!
//! `TestHarness` assembles a complete relay stack against temp SQLite files:
//! a migrated queue store, a history store seeded with a few message, chat
//! and attachment rows, attachment files under a temp home directory, and a
//! [`MockExporter`]. Requests are driven through the routers in-process.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Method, Request, StatusCode};
use axum::Router;
use imf_core::{ActionKind, ImfError, RowId};
use imf_gateway::AppState;
use imf_storage::{AttachmentResolver, HistoryStore, QueueStore};
use tower::ServiceExt;

use crate::mock_exporter::MockExporter;

/// Service identity used by the harness.
pub const SERVICE_NAME: &str = "iMessageForwarder";

const HISTORY_SCHEMA: &str = "
    CREATE TABLE message (
        ROWID INTEGER PRIMARY KEY AUTOINCREMENT,
        guid TEXT UNIQUE NOT NULL,
        text TEXT,
        handle_id INTEGER DEFAULT 0,
        date INTEGER,
        is_from_me INTEGER DEFAULT 0,
        attributedBody BLOB
    );
    CREATE TABLE chat (
        ROWID INTEGER PRIMARY KEY AUTOINCREMENT,
        guid TEXT UNIQUE NOT NULL,
        chat_identifier TEXT,
        display_name TEXT
    );
    CREATE TABLE attachment (
        ROWID INTEGER PRIMARY KEY AUTOINCREMENT,
        guid TEXT UNIQUE NOT NULL,
        filename TEXT,
        mime_type TEXT,
        total_bytes INTEGER DEFAULT 0
    );
    INSERT INTO message (ROWID, guid, text, handle_id, date, is_from_me)
        VALUES (1, 'MSG-1', 'hello from history', 3, 700000000, 0);
    INSERT INTO chat (ROWID, guid, chat_identifier, display_name)
        VALUES (1, 'iMessage;-;+15550001111', '+15550001111', 'Relay');
";

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    echo_rows: bool,
    exporter: MockExporter,
    attachments: Vec<(String, Option<Vec<u8>>)>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            echo_rows: false,
            exporter: MockExporter::new(),
            attachments: Vec::new(),
        }
    }

    /// Echo queued rows in status responses.
    pub fn with_echo_rows(mut self, echo: bool) -> Self {
        self.echo_rows = echo;
        self
    }

    pub fn with_exporter(mut self, exporter: MockExporter) -> Self {
        self.exporter = exporter;
        self
    }

    /// Add an attachment row with the given stored filename. When `content`
    /// is set and the filename is `~`-relative, the file is written under the
    /// harness home directory. An empty filename is stored as NULL. Rows get
    /// ids 1, 2, ... in call order.
    pub fn with_attachment(mut self, filename: &str, content: Option<&[u8]>) -> Self {
        self.attachments
            .push((filename.to_string(), content.map(<[u8]>::to_vec)));
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, ImfError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| ImfError::Storage { source: e.into() })?;
        let queue_path = temp_dir.path().join("queue.db");
        let history_path = temp_dir.path().join("chat.db");
        let home_dir = temp_dir.path().join("home");
        std::fs::create_dir_all(&home_dir).map_err(|e| ImfError::Storage { source: e.into() })?;

        seed_history(&history_path, &home_dir, &self.attachments)?;

        let queue = QueueStore::open(&queue_path).await?;
        let history = HistoryStore::open(&history_path).await?;
        let attachments = AttachmentResolver::new(history.clone(), home_dir.clone());

        let state = AppState {
            service_name: Arc::from(SERVICE_NAME),
            queue: queue.clone(),
            history,
            attachments,
            exporter: Arc::new(self.exporter.clone()),
            echo_rows: self.echo_rows,
        };

        Ok(TestHarness {
            state,
            queue,
            exporter: self.exporter,
            queue_path,
            home_dir,
            _temp_dir: temp_dir,
        })
    }
}

fn seed_history(
    path: &Path,
    home: &Path,
    attachments: &[(String, Option<Vec<u8>>)],
) -> Result<(), ImfError> {
    let storage = |e: rusqlite::Error| ImfError::Storage {
        source: Box::new(e),
    };
    let conn = rusqlite::Connection::open(path).map_err(storage)?;
    conn.execute_batch(HISTORY_SCHEMA).map_err(storage)?;

    for (idx, (filename, content)) in attachments.iter().enumerate() {
        let rowid = i64::try_from(idx + 1).map_err(|e| ImfError::Internal(e.to_string()))?;
        let stored: Option<&str> = (!filename.is_empty()).then_some(filename.as_str());
        conn.execute(
            "INSERT INTO attachment (ROWID, guid, filename) VALUES (?1, ?2, ?3)",
            rusqlite::params![rowid, format!("ATT-{rowid}"), stored],
        )
        .map_err(storage)?;

        if let Some(bytes) = content {
            let on_disk = imf_storage::expand_home(filename, home);
            if let Some(parent) = on_disk.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ImfError::Storage { source: e.into() })?;
            }
            std::fs::write(&on_disk, bytes).map_err(|e| ImfError::Storage { source: e.into() })?;
        }
    }
    Ok(())
}

/// A buffered response from one in-process request.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    /// The body parsed as JSON. Panics if it is not JSON.
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("response body should be JSON")
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// A complete relay environment with temp storage and a mock exporter.
pub struct TestHarness {
    /// Shared handler state, for building routers.
    pub state: AppState,
    /// Queue store (temp DB, cleaned up on drop).
    pub queue: QueueStore,
    /// The mock exporter wired into `state`.
    pub exporter: MockExporter,
    pub queue_path: PathBuf,
    /// Directory `~` expands to for attachments.
    pub home_dir: PathBuf,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// A harness with default options.
    pub async fn new() -> Result<Self, ImfError> {
        Self::builder().build().await
    }

    pub fn plain_router(&self) -> Router {
        imf_gateway::plain_router(self.state.clone())
    }

    pub fn secure_router(&self) -> Router {
        imf_gateway::secure_router(self.state.clone())
    }

    /// Issue a GET against `router`.
    pub async fn get(&self, router: Router, uri: &str) -> TestResponse {
        send(router, Method::GET, uri, Body::empty()).await
    }

    /// Issue a POST with a raw body against `router`.
    pub async fn post(&self, router: Router, uri: &str, body: impl Into<Body>) -> TestResponse {
        send(router, Method::POST, uri, body.into()).await
    }

    /// POST a JSON value to the secure router's ingestion endpoint.
    pub async fn enqueue(&self, kind: ActionKind, body: &serde_json::Value) -> TestResponse {
        self.post(
            self.secure_router(),
            &format!("/queue/{kind}"),
            body.to_string(),
        )
        .await
    }

    /// Delete a queued row from a separate connection, the way the external
    /// sender does once an action has been delivered.
    pub async fn consume(&self, kind: ActionKind, id: RowId) -> Result<bool, ImfError> {
        let sql = format!("DELETE FROM \"{kind}\" WHERE ROWID = ?1");
        self.execute_on_queue(sql, vec![id.0])
            .await
            .map(|deleted| deleted > 0)
    }

    /// Drop a queue table from a separate connection so every later
    /// statement the store runs against it fails.
    pub async fn drop_queue_table(&self, kind: ActionKind) -> Result<(), ImfError> {
        self.execute_on_queue(format!("DROP TABLE \"{kind}\""), Vec::new())
            .await
            .map(|_| ())
    }

    async fn execute_on_queue(&self, sql: String, params: Vec<i64>) -> Result<usize, ImfError> {
        let path = self.queue_path.clone();
        tokio::task::spawn_blocking(move || {
            let conn = rusqlite::Connection::open(path)?;
            conn.busy_timeout(std::time::Duration::from_secs(5))?;
            conn.execute(&sql, rusqlite::params_from_iter(params))
        })
        .await
        .map_err(|e| ImfError::Internal(e.to_string()))?
        .map_err(|e| ImfError::Storage {
            source: Box::new(e),
        })
    }
}

async fn send(router: Router, method: Method, uri: &str, body: Body) -> TestResponse {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body)
        .expect("request should build");
    let response = router.oneshot(request).await.expect("router is infallible");
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    TestResponse {
        status,
        headers,
        body,
    }
}
