// SPDX-FileCopyrightText: 2026 iMessageForwarder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock history exporter for deterministic testing.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream;

use imf_core::{ByteStream, HistoryExporter, ImfError};

/// Exporter that replays fixed chunks and remembers each `last_update_time`.
#[derive(Clone, Default)]
pub struct MockExporter {
    chunks: Vec<Bytes>,
    fail_to_start: bool,
    calls: Arc<Mutex<Vec<i64>>>,
}

impl MockExporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Chunks emitted, in order, by every export.
    pub fn with_chunks<I, B>(chunks: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        Self {
            chunks: chunks.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// An exporter whose program cannot be started.
    pub fn failing() -> Self {
        Self {
            fail_to_start: true,
            ..Self::default()
        }
    }

    /// Timestamps passed to [`HistoryExporter::open`] so far.
    pub fn calls(&self) -> Vec<i64> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl HistoryExporter for MockExporter {
    fn name(&self) -> &str {
        "mock-exporter"
    }

    async fn open(&self, last_update_time: i64) -> Result<ByteStream, ImfError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(last_update_time);
        }
        if self.fail_to_start {
            return Err(ImfError::Exporter {
                message: "mock exporter refused to start".to_string(),
                source: None,
            });
        }
        let chunks: Vec<Result<Bytes, std::io::Error>> =
            self.chunks.iter().cloned().map(Ok).collect();
        Ok(Box::pin(stream::iter(chunks)))
    }
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;

    use super::*;

    #[tokio::test]
    async fn records_timestamps_and_replays_chunks() {
        let exporter = MockExporter::with_chunks(["[", "]"]);
        let stream = exporter.open(42).await.unwrap();
        let chunks: Vec<Bytes> = stream.map(Result::unwrap).collect().await;
        assert_eq!(chunks, vec![Bytes::from("["), Bytes::from("]")]);
        assert_eq!(exporter.calls(), vec![42]);
    }

    #[tokio::test]
    async fn failing_exporter_still_records_the_call() {
        let exporter = MockExporter::failing();
        assert!(exporter.open(7).await.is_err());
        assert_eq!(exporter.calls(), vec![7]);
    }
}
