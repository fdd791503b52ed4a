// SPDX-FileCopyrightText: 2026 iMessageForwarder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams to external collaborators.

pub mod exporter;

pub use exporter::{ByteStream, HistoryExporter};
