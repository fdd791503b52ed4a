// SPDX-FileCopyrightText: 2026 iMessageForwarder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the iMessageForwarder relay.
//!
//! The `Display` output of the caller-facing variants is the exact text
//! returned in `{"error": ...}` response bodies, so wording changes here are
//! wire-visible.

use thiserror::Error;

/// The primary error type used across storage, gateway, and exporter code.
#[derive(Debug, Error)]
pub enum ImfError {
    /// One or more required keys were absent (or null) in a write request.
    #[error("Missing {} keys in request body.", format_key_list(.missing))]
    Validation { missing: Vec<&'static str> },

    /// A text-like field was present but not a JSON string.
    #[error("\"{field}\" value must be a string.")]
    InvalidType { field: &'static str },

    /// An id-like value failed strict decimal-digit parsing.
    #[error("\"{field}\" value must be an integer.")]
    InvalidId { field: &'static str },

    /// Route parameter outside the queue kind set.
    #[error("Table must be one of {{message, chat, reaction, rename}}.")]
    UnknownKind,

    /// Route parameter outside the history table set.
    #[error("Table must be one of {{message, chat, attachment}}.")]
    UnknownTable,

    /// Request body could not be read as a JSON object.
    #[error("Request body must be a JSON object.")]
    MalformedBody,

    /// Missing attachment row or missing file on disk.
    #[error("{0}")]
    NotFound(String),

    /// Backing persistence failure (open, query, migration).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The external history exporter could not be started or failed mid-stream.
    #[error("exporter error: {message}")]
    Exporter {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation exceeded its deadline.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Configuration could not be turned into a runnable service.
    #[error("configuration error: {0}")]
    Config(String),

    /// TLS material could not be loaded or assembled.
    #[error("tls error: {0}")]
    Tls(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ImfError {
    /// Whether the error was caused by the caller's input rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ImfError::Validation { .. }
                | ImfError::InvalidType { .. }
                | ImfError::InvalidId { .. }
                | ImfError::UnknownKind
                | ImfError::UnknownTable
                | ImfError::MalformedBody
                | ImfError::NotFound(_)
        )
    }
}

/// Renders `["a"]` as `"a"`, `["a", "b"]` as `"a" or "b"` and longer lists
/// as `"a", "b", or "c"`.
fn format_key_list(keys: &[&'static str]) -> String {
    let quoted: Vec<String> = keys.iter().map(|k| format!("\"{k}\"")).collect();
    match quoted.as_slice() {
        [] => String::new(),
        [only] => only.clone(),
        [first, second] => format!("{first} or {second}"),
        [init @ .., last] => format!("{}, or {last}", init.join(", ")),
    }
}
