// SPDX-FileCopyrightText: 2026 iMessageForwarder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for iMessageForwarder integration tests.
//!
//! # Components
//!
//! - [`TestHarness`] - temp queue store, seeded history store, attachments on
//!   disk, and both routers wired to a [`MockExporter`]
//! - [`MockExporter`] - history exporter that records every requested timestamp
//! - [`tls`] - throwaway CA and leaf certificates for mutual-TLS tests

pub mod harness;
pub mod mock_exporter;
pub mod tls;

pub use harness::{TestHarness, TestResponse};
pub use mock_exporter::MockExporter;
