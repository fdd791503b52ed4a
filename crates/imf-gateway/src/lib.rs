// SPDX-FileCopyrightText: 2026 iMessageForwarder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP surface of the iMessageForwarder relay.
//!
//! Two axum routers share one [`AppState`]: a plain router for liveness and
//! queue status, and a secure router for ingestion and history retrieval that
//! is only ever served behind mutual TLS.

pub mod error;
pub mod exporter;
pub mod handlers;
pub mod server;
pub mod tls;

pub use error::{ApiError, ErrorResponse};
pub use exporter::CommandExporter;
pub use server::{bind, plain_router, secure_router, serve_plain, serve_tls, AppState};
