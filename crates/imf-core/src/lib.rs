// SPDX-FileCopyrightText: 2026 iMessageForwarder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the iMessageForwarder relay.
//!
//! Holds the vocabulary shared by every other crate in the workspace: the
//! closed sets of queue kinds and history tables, typed queue actions and
//! rows, request validation, the error taxonomy, and the narrow trait the
//! retrieval side uses to talk to the external history exporter.

pub mod error;
pub mod traits;
pub mod types;
pub mod validation;

pub use error::ImfError;
pub use traits::{ByteStream, HistoryExporter};
pub use types::{
    ActionKind, ChatRow, HistoryTable, MessageRow, NewAction, NewChat, NewMessage, NewReaction,
    NewRename, QueueStatus, QueuedRow, ReactionRow, RenameRow, RowId,
};
