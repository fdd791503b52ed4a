// SPDX-FileCopyrightText: 2026 iMessageForwarder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Queue table operations.
//!
//! Table and column names come from the closed [`ActionKind`] set; request
//! data only ever reaches SQLite as bound parameters.

use imf_core::{
    ActionKind, ChatRow, ImfError, MessageRow, NewAction, QueuedRow, ReactionRow, RenameRow,
    RowId,
};
use rusqlite::{params, OptionalExtension, Row};

use crate::database::Database;

fn columns(kind: ActionKind) -> &'static str {
    match kind {
        ActionKind::Message => "id, chat_id, text",
        ActionKind::Chat => "id, recipient_string, text",
        ActionKind::Reaction => "id, chat_id, associated_guid, associated_type",
        ActionKind::Rename => "id, chat_id, group_title",
    }
}

fn map_row(kind: ActionKind, row: &Row<'_>) -> rusqlite::Result<QueuedRow> {
    let rowid = RowId(row.get(0)?);
    Ok(match kind {
        ActionKind::Message => QueuedRow::Message(MessageRow {
            rowid,
            chat_id: row.get(1)?,
            text: row.get(2)?,
        }),
        ActionKind::Chat => QueuedRow::Chat(ChatRow {
            rowid,
            recipient_string: row.get(1)?,
            text: row.get(2)?,
        }),
        ActionKind::Reaction => QueuedRow::Reaction(ReactionRow {
            rowid,
            chat_id: row.get(1)?,
            associated_guid: row.get(2)?,
            associated_type: row.get(3)?,
        }),
        ActionKind::Rename => QueuedRow::Rename(RenameRow {
            rowid,
            chat_id: row.get(1)?,
            group_title: row.get(2)?,
        }),
    })
}

/// Append a validated action to its table. Returns the new row identity.
pub async fn enqueue(db: &Database, action: &NewAction) -> Result<RowId, ImfError> {
    let action = action.clone();
    db.connection()
        .call(move |conn| -> Result<RowId, rusqlite::Error> {
            match &action {
                NewAction::Message(m) => conn.execute(
                    "INSERT INTO message (chat_id, text) VALUES (?1, ?2)",
                    params![m.chat_id, m.text],
                )?,
                NewAction::Chat(c) => conn.execute(
                    "INSERT INTO chat (recipient_string, text) VALUES (?1, ?2)",
                    params![c.recipient_string, c.text],
                )?,
                NewAction::Reaction(r) => conn.execute(
                    "INSERT INTO reaction (chat_id, associated_guid, associated_type)
                     VALUES (?1, ?2, ?3)",
                    params![r.chat_id, r.associated_guid, r.associated_type],
                )?,
                NewAction::Rename(r) => conn.execute(
                    "INSERT INTO \"rename\" (chat_id, group_title) VALUES (?1, ?2)",
                    params![r.chat_id, r.group_title],
                )?,
            };
            Ok(RowId(conn.last_insert_rowid()))
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Fetch a row that is still queued. `None` means it was consumed or never existed.
pub async fn get(db: &Database, kind: ActionKind, id: RowId) -> Result<Option<QueuedRow>, ImfError> {
    let sql = format!("SELECT {} FROM \"{kind}\" WHERE id = ?1", columns(kind));
    db.connection()
        .call(move |conn| {
            conn.query_row(&sql, params![id.0], |row| map_row(kind, row))
                .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Number of rows currently waiting in a table.
pub async fn count(db: &Database, kind: ActionKind) -> Result<i64, ImfError> {
    let sql = format!("SELECT COUNT(*) FROM \"{kind}\"");
    db.connection()
        .call(move |conn| conn.query_row(&sql, [], |row| row.get(0)))
        .await
        .map_err(crate::database::map_tr_err)
}

/// Oldest waiting rows of a table, in insertion order.
pub async fn pending(
    db: &Database,
    kind: ActionKind,
    limit: usize,
) -> Result<Vec<QueuedRow>, ImfError> {
    let sql = format!(
        "SELECT {} FROM \"{kind}\" ORDER BY id ASC LIMIT ?1",
        columns(kind)
    );
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    db.connection()
        .call(move |conn| -> Result<Vec<QueuedRow>, rusqlite::Error> {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params![limit], |row| map_row(kind, row))?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
