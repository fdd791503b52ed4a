// SPDX-FileCopyrightText: 2026 iMessageForwarder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversion of [`ImfError`] into HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use imf_core::ImfError;
use serde::Serialize;
use tracing::{error, warn};

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Handler error wrapper so `?` can be used on [`ImfError`] results.
#[derive(Debug)]
pub struct ApiError(pub ImfError);

impl From<ImfError> for ApiError {
    fn from(err: ImfError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            err if err.is_client_error() => StatusCode::BAD_REQUEST,
            ImfError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self.0, "request failed");
        } else {
            warn!(error = %self.0, "request rejected");
        }
        let body = ErrorResponse {
            error: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caller_faults_map_to_bad_request() {
        for err in [
            ImfError::UnknownKind,
            ImfError::UnknownTable,
            ImfError::MalformedBody,
            ImfError::InvalidId { field: "ROWID" },
            ImfError::Validation {
                missing: vec!["text"],
            },
            ImfError::NotFound("gone".into()),
        ] {
            assert_eq!(ApiError(err).status(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn service_faults_map_to_server_errors() {
        let storage = ApiError(ImfError::Storage {
            source: Box::new(std::io::Error::other("disk full")),
        });
        assert_eq!(storage.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let exporter = ApiError(ImfError::Exporter {
            message: "spawn failed".into(),
            source: None,
        });
        assert_eq!(exporter.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let timeout = ApiError(ImfError::Timeout {
            duration: std::time::Duration::from_secs(1),
        });
        assert_eq!(timeout.status(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[tokio::test]
    async fn body_is_error_object() {
        let response = ApiError(ImfError::UnknownKind).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"error": "Table must be one of {message, chat, reaction, rename}."})
        );
    }
}
