// SPDX-FileCopyrightText: 2026 iMessageForwarder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers.
//!
//! Liveness: GET /ping. Ingestion: POST /queue/{kind}. Status:
//! GET /queue/{table}/{id}. Retrieval: GET /retrieve/update,
//! GET /retrieve/file/{id}, GET /retrieve/{table}/{id}.

use axum::{
    body::{Body, Bytes},
    extract::{Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use imf_core::validation::{parse_last_update_time, parse_row_id};
use imf_core::{ActionKind, HistoryTable, ImfError, NewAction, QueueStatus, RowId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio_util::io::ReaderStream;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::server::AppState;

/// Response body for GET /ping.
#[derive(Debug, Serialize)]
pub struct PingResponse {
    pub name: String,
}

/// Response body for a successful enqueue.
#[derive(Debug, Serialize)]
pub struct EnqueueResponse {
    #[serde(rename = "ROWID")]
    pub rowid: RowId,
}

/// Response body for GET /retrieve/{table}/{id}.
#[derive(Debug, Serialize)]
pub struct HistoryRowResponse {
    pub row: Option<Map<String, Value>>,
}

/// Query string of GET /retrieve/update.
#[derive(Debug, Deserialize)]
pub struct UpdateParams {
    pub last_update_time: Option<String>,
}

/// GET /ping
pub async fn ping(State(state): State<AppState>) -> Json<PingResponse> {
    Json(PingResponse {
        name: state.service_name.to_string(),
    })
}

/// POST /queue/{kind}
///
/// An empty body is treated as `{}` so it fails on the missing keys rather
/// than on JSON syntax.
pub async fn enqueue(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let kind = ActionKind::from_route(&kind)?;
    let value = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Object(Map::new())
    } else {
        serde_json::from_slice::<Value>(&body).map_err(|_| ImfError::MalformedBody)?
    };

    let action = NewAction::from_json(kind, &value)?;
    let rowid = state.queue.enqueue(&action).await?;

    let location = HeaderValue::from_str(&format!("/queue/{kind}/{rowid}"))
        .map_err(|e| ImfError::Internal(e.to_string()))?;
    info!(%kind, %rowid, "action accepted");
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(EnqueueResponse { rowid }),
    )
        .into_response())
}

/// GET /queue/{table}/{id}
///
/// The table is checked before the id, so an unknown table wins over a bad id.
pub async fn queue_status(
    State(state): State<AppState>,
    Path((table, id)): Path<(String, String)>,
) -> Result<Json<QueueStatus>, ApiError> {
    let kind = ActionKind::from_route(&table)?;
    let rowid = parse_row_id(&id)?;
    let status = state.queue.status(kind, rowid, state.echo_rows).await?;
    debug!(%kind, %rowid, sent = status.sent, "status lookup");
    Ok(Json(status))
}

/// GET /retrieve/update?last_update_time=N
///
/// Streams the exporter's stdout as it is produced. Dropping the response
/// (client disconnect) drops the stream, which kills the exporter.
pub async fn update(
    State(state): State<AppState>,
    Query(params): Query<UpdateParams>,
) -> Result<Response, ApiError> {
    let since = parse_last_update_time(params.last_update_time.as_deref())?;
    let stream = state.exporter.open(since).await?;
    debug!(exporter = state.exporter.name(), last_update_time = since, "streaming export");
    Ok((
        [(header::CONTENT_TYPE, "application/json")],
        Body::from_stream(stream),
    )
        .into_response())
}

/// GET /retrieve/file/{id}
pub async fn file(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let rowid = parse_row_id(&id)?;
    let path = state.attachments.resolve(rowid).await?;

    let file = tokio::fs::File::open(&path)
        .await
        .map_err(|e| ImfError::NotFound(format!("{e}: {}", path.display())))?;
    let metadata = file
        .metadata()
        .await
        .map_err(|e| ImfError::NotFound(format!("{e}: {}", path.display())))?;
    // Directories open fine on Unix and only fail on the first read.
    if !metadata.is_file() {
        return Err(ImfError::NotFound(format!("not a regular file: {}", path.display())).into());
    }
    let len = metadata.len();

    let mut response = Body::from_stream(ReaderStream::new(file)).into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/octet-stream"),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
    let disposition = path
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(|name| HeaderValue::from_str(&format!("inline; filename=\"{name}\"")).ok());
    if let Some(value) = disposition {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }

    debug!(%rowid, path = %path.display(), bytes = len, "sending attachment");
    Ok(response)
}

/// GET /retrieve/{table}/{id}
pub async fn history_row(
    State(state): State<AppState>,
    Path((table, id)): Path<(String, String)>,
) -> Result<Json<HistoryRowResponse>, ApiError> {
    let table = HistoryTable::from_route(&table)?;
    let rowid = parse_row_id(&id)?;
    let row = state.history.row(table, rowid).await?;
    Ok(Json(HistoryRowResponse { row }))
}
