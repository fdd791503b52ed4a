// SPDX-FileCopyrightText: 2026 iMessageForwarder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Strict parsing of ids and write-request bodies.
//!
//! Ids are accepted only as pure ASCII decimal digits: `"12a"`, `""`, `"-1"`
//! and `" 3"` are all rejected rather than coerced.

use serde_json::{Map, Value};

use crate::error::ImfError;
use crate::types::{
    ActionKind, NewAction, NewChat, NewMessage, NewReaction, NewRename, RowId,
};

/// Parse a decimal-digit string into a non-negative integer.
///
/// Returns `None` for empty input, any non-digit character, or overflow.
pub fn parse_decimal(value: &str) -> Option<i64> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse::<i64>().ok()
}

/// Parse a `ROWID` route segment.
pub fn parse_row_id(value: &str) -> Result<RowId, ImfError> {
    parse_decimal(value)
        .map(RowId)
        .ok_or(ImfError::InvalidId { field: "ROWID" })
}

/// Parse the optional `last_update_time` query parameter, defaulting to 0.
pub fn parse_last_update_time(value: Option<&str>) -> Result<i64, ImfError> {
    match value {
        None => Ok(0),
        Some(v) => parse_decimal(v).ok_or(ImfError::InvalidId {
            field: "last_update_time",
        }),
    }
}

impl NewAction {
    /// Validate a JSON request body against the required fields of `kind`.
    ///
    /// Missing (or null) keys are reported together before any value is
    /// inspected; `chat_id` must then be a digit string or a non-negative
    /// integer, and text fields must be strings (empty is allowed).
    pub fn from_json(kind: ActionKind, body: &Value) -> Result<Self, ImfError> {
        let obj = body.as_object().ok_or(ImfError::MalformedBody)?;

        let missing: Vec<&'static str> = kind
            .required_fields()
            .iter()
            .copied()
            .filter(|field| obj.get(*field).is_none_or(Value::is_null))
            .collect();
        if !missing.is_empty() {
            return Err(ImfError::Validation { missing });
        }

        let action = match kind {
            ActionKind::Message => NewAction::Message(NewMessage {
                chat_id: chat_id(obj)?,
                text: string_field(obj, "text")?,
            }),
            ActionKind::Chat => NewAction::Chat(NewChat {
                recipient_string: string_field(obj, "recipient_string")?,
                text: string_field(obj, "text")?,
            }),
            ActionKind::Reaction => NewAction::Reaction(NewReaction {
                chat_id: chat_id(obj)?,
                associated_guid: string_field(obj, "associated_guid")?,
                associated_type: string_field(obj, "associated_type")?,
            }),
            ActionKind::Rename => NewAction::Rename(NewRename {
                chat_id: chat_id(obj)?,
                group_title: string_field(obj, "group_title")?,
            }),
        };
        Ok(action)
    }
}

fn chat_id(obj: &Map<String, Value>) -> Result<i64, ImfError> {
    let invalid = ImfError::InvalidId { field: "chat_id" };
    match obj.get("chat_id") {
        Some(Value::String(s)) => parse_decimal(s).ok_or(invalid),
        Some(Value::Number(n)) => n.as_i64().filter(|v| *v >= 0).ok_or(invalid),
        _ => Err(invalid),
    }
}

fn string_field(obj: &Map<String, Value>, field: &'static str) -> Result<String, ImfError> {
    match obj.get(field) {
        Some(Value::String(s)) => Ok(s.clone()),
        _ => Err(ImfError::InvalidType { field }),
    }
}
