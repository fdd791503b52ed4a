// SPDX-FileCopyrightText: 2026 iMessageForwarder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! History exporter trait.
//!
//! The exporter is an external process that, given a timestamp, emits every
//! history record updated since then. The relay only forwards its output.

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;

use crate::error::ImfError;

/// Lazy, finite, non-restartable sequence of output chunks.
///
/// Dropping the stream cancels the underlying export.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Source of incremental history exports.
#[async_trait]
pub trait HistoryExporter: Send + Sync {
    /// Human-readable identifier used in logs.
    fn name(&self) -> &str;

    /// Start an export of records updated at or after `last_update_time`.
    ///
    /// Errors returned here mean nothing was started; failures after the
    /// first chunk surface as `Err` items on the stream.
    async fn open(&self, last_update_time: i64) -> Result<ByteStream, ImfError>;
}
