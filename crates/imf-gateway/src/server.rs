// SPDX-FileCopyrightText: 2026 iMessageForwarder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Routers, shared state, and the two listeners.
//!
//! The plain listener exposes only liveness and queue status. Ingestion and
//! retrieval are reachable only on the mutual-TLS listener.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    routing::{get, post},
    Router,
};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::Request;
use hyper_util::rt::TokioIo;
use imf_core::{HistoryExporter, ImfError};
use imf_storage::{AttachmentResolver, HistoryStore, QueueStore};
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Identity returned by GET /ping.
    pub service_name: Arc<str>,
    pub queue: QueueStore,
    pub history: HistoryStore,
    pub attachments: AttachmentResolver,
    pub exporter: Arc<dyn HistoryExporter>,
    /// Whether queue status responses include row content.
    pub echo_rows: bool,
}

/// Routes served without client authentication.
pub fn plain_router(state: AppState) -> Router {
    Router::new()
        .route("/ping", get(handlers::ping))
        .route("/queue/{table}/{id}", get(handlers::queue_status))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Routes served behind mutual TLS.
pub fn secure_router(state: AppState) -> Router {
    let queue = Router::new().route("/{kind}", post(handlers::enqueue));

    let retrieve = Router::new()
        .route("/update", get(handlers::update))
        .route("/file/{id}", get(handlers::file))
        .route("/{table}/{id}", get(handlers::history_row));

    Router::new()
        .route("/ping", get(handlers::ping))
        .nest("/queue", queue)
        .nest("/retrieve", retrieve)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind a TCP listener, mapping failures to a descriptive error.
pub async fn bind(host: &str, port: u16) -> Result<TcpListener, ImfError> {
    TcpListener::bind((host, port))
        .await
        .map_err(|e| ImfError::Internal(format!("failed to bind {host}:{port}: {e}")))
}

/// Serve `app` over plain HTTP until `shutdown` fires.
pub async fn serve_plain(
    listener: TcpListener,
    app: Router,
    shutdown: CancellationToken,
) -> Result<(), ImfError> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "plain listener ready");
    }
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| ImfError::Internal(format!("plain listener error: {e}")))
}

/// Serve `app` over mutual TLS until `shutdown` fires.
///
/// Each connection is handshaken on its own task; a client that fails
/// certificate verification is dropped before any request is read.
pub async fn serve_tls(
    listener: TcpListener,
    acceptor: TlsAcceptor,
    app: Router,
    shutdown: CancellationToken,
) -> Result<(), ImfError> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "mutual-TLS listener ready");
    }

    loop {
        let (stream, peer) = tokio::select! {
            _ = shutdown.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok(conn) => conn,
                Err(e) => {
                    warn!(error = %e, "accept failed");
                    continue;
                }
            },
        };

        tokio::spawn(serve_tls_connection(
            stream,
            peer,
            acceptor.clone(),
            app.clone(),
            shutdown.clone(),
        ));
    }

    debug!("mutual-TLS listener stopped accepting");
    Ok(())
}

async fn serve_tls_connection(
    stream: tokio::net::TcpStream,
    peer: SocketAddr,
    acceptor: TlsAcceptor,
    app: Router,
    shutdown: CancellationToken,
) {
    let tls = match acceptor.accept(stream).await {
        Ok(tls) => tls,
        Err(e) => {
            debug!(%peer, error = %e, "TLS handshake rejected");
            return;
        }
    };

    let service = service_fn(move |req: Request<Incoming>| {
        let app = app.clone();
        async move { app.oneshot(req.map(Body::new)).await }
    });

    let conn = http1::Builder::new().serve_connection(TokioIo::new(tls), service);
    tokio::pin!(conn);

    tokio::select! {
        result = conn.as_mut() => {
            if let Err(e) = result {
                debug!(%peer, error = %e, "connection closed with error");
            }
        }
        _ = shutdown.cancelled() => {
            conn.as_mut().graceful_shutdown();
            if let Err(e) = conn.await {
                debug!(%peer, error = %e, "connection closed with error during shutdown");
            }
        }
    }
}
