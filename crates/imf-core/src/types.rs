// SPDX-FileCopyrightText: 2026 iMessageForwarder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the queue store, history store, and gateway.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::ImfError;

/// Store-assigned row identity (`ROWID`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(pub i64);

impl std::fmt::Display for RowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The four kinds of queued outgoing actions. Each kind owns one queue table.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Message,
    Chat,
    Reaction,
    Rename,
}

impl ActionKind {
    pub const ALL: [ActionKind; 4] = [
        ActionKind::Message,
        ActionKind::Chat,
        ActionKind::Reaction,
        ActionKind::Rename,
    ];

    /// Parse a route segment, mapping anything outside the closed set to
    /// [`ImfError::UnknownKind`].
    pub fn from_route(segment: &str) -> Result<Self, ImfError> {
        segment.parse().map_err(|_| ImfError::UnknownKind)
    }

    /// Keys a write request for this kind must carry, in wire order.
    pub fn required_fields(self) -> &'static [&'static str] {
        match self {
            ActionKind::Message => &["chat_id", "text"],
            ActionKind::Chat => &["recipient_string", "text"],
            ActionKind::Reaction => &["chat_id", "associated_guid", "associated_type"],
            ActionKind::Rename => &["chat_id", "group_title"],
        }
    }
}

/// Tables of the authoritative history store exposed for reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum HistoryTable {
    Message,
    Chat,
    Attachment,
}

impl HistoryTable {
    /// Parse a route segment, mapping anything outside the closed set to
    /// [`ImfError::UnknownTable`].
    pub fn from_route(segment: &str) -> Result<Self, ImfError> {
        segment.parse().map_err(|_| ImfError::UnknownTable)
    }
}

// --- Validated write payloads ---

/// A new message to an existing chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub chat_id: i64,
    pub text: String,
}

/// A new chat opened with an opaque recipient string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewChat {
    pub recipient_string: String,
    pub text: String,
}

/// A reaction ("tapback") to an existing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReaction {
    pub chat_id: i64,
    pub associated_guid: String,
    pub associated_type: String,
}

/// A group conversation rename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRename {
    pub chat_id: i64,
    pub group_title: String,
}

/// A validated action ready to be appended to its queue table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewAction {
    Message(NewMessage),
    Chat(NewChat),
    Reaction(NewReaction),
    Rename(NewRename),
}

impl NewAction {
    pub fn kind(&self) -> ActionKind {
        match self {
            NewAction::Message(_) => ActionKind::Message,
            NewAction::Chat(_) => ActionKind::Chat,
            NewAction::Reaction(_) => ActionKind::Reaction,
            NewAction::Rename(_) => ActionKind::Rename,
        }
    }
}

// --- Persisted queue rows ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRow {
    #[serde(rename = "ROWID")]
    pub rowid: RowId,
    pub chat_id: i64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRow {
    #[serde(rename = "ROWID")]
    pub rowid: RowId,
    pub recipient_string: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionRow {
    #[serde(rename = "ROWID")]
    pub rowid: RowId,
    pub chat_id: i64,
    pub associated_guid: String,
    pub associated_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameRow {
    #[serde(rename = "ROWID")]
    pub rowid: RowId,
    pub chat_id: i64,
    pub group_title: String,
}

/// A row still present in one of the queue tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum QueuedRow {
    Message(MessageRow),
    Chat(ChatRow),
    Reaction(ReactionRow),
    Rename(RenameRow),
}

impl QueuedRow {
    pub fn rowid(&self) -> RowId {
        match self {
            QueuedRow::Message(r) => r.rowid,
            QueuedRow::Chat(r) => r.rowid,
            QueuedRow::Reaction(r) => r.rowid,
            QueuedRow::Rename(r) => r.rowid,
        }
    }
}

/// Answer to "has this queued action been consumed?".
///
/// `sent` is true iff the row is no longer in its queue table. `row` is only
/// populated when the deployment echoes row content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueStatus {
    pub sent: bool,
    pub row: Option<QueuedRow>,
}

impl QueueStatus {
    /// Build a status from a lookup result, dropping the row unless `echo` is set.
    pub fn from_lookup(row: Option<QueuedRow>, echo: bool) -> Self {
        let sent = row.is_none();
        Self {
            sent,
            row: if echo { row } else { None },
        }
    }
}
