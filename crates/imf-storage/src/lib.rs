// SPDX-FileCopyrightText: 2026 iMessageForwarder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for the iMessageForwarder relay.
//!
//! Two databases are involved: the queue store, which the relay owns and
//! migrates, and the history store, which belongs to the messaging client
//! and is only ever opened read-only.

pub mod attachments;
pub mod database;
pub mod migrations;
pub mod queries;
pub mod store;

pub use attachments::{expand_home, AttachmentResolver};
pub use database::Database;
pub use store::{HistoryStore, QueueStore};
