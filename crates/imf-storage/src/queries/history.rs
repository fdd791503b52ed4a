// SPDX-FileCopyrightText: 2026 iMessageForwarder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-only lookups against the history store.

use base64::Engine;
use imf_core::{HistoryTable, ImfError, RowId};
use rusqlite::types::ValueRef;
use rusqlite::{params, OptionalExtension};
use serde_json::{Map, Number, Value};

use crate::database::Database;

/// Fetch one row by `ROWID` as a column-name → JSON value map.
pub async fn row(
    db: &Database,
    table: HistoryTable,
    id: RowId,
) -> Result<Option<Map<String, Value>>, ImfError> {
    let sql = format!("SELECT * FROM \"{table}\" WHERE ROWID = ?1");
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
            stmt.query_row(params![id.0], |row| {
                let mut map = Map::with_capacity(names.len());
                for (idx, name) in names.iter().enumerate() {
                    map.insert(name.clone(), to_json(row.get_ref(idx)?));
                }
                Ok(map)
            })
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// The stored `filename` of an attachment. The outer `None` means no row;
/// the inner one a row whose filename is NULL.
pub async fn attachment_filename(
    db: &Database,
    id: RowId,
) -> Result<Option<Option<String>>, ImfError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT filename FROM attachment WHERE ROWID = ?1",
                params![id.0],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

fn to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Number(i.into()),
        ValueRef::Real(f) => Number::from_f64(f).map_or(Value::Null, Value::Number),
        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::String(base64::engine::general_purpose::STANDARD.encode(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    async fn seeded() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("chat.db");
        {
            let conn = rusqlite::Connection::open(&path).unwrap();
            conn.execute_batch(
                "CREATE TABLE message (ROWID INTEGER PRIMARY KEY, guid TEXT, text TEXT,
                                       date INTEGER, attributedBody BLOB, ratio REAL);
                 CREATE TABLE chat (ROWID INTEGER PRIMARY KEY, chat_identifier TEXT);
                 CREATE TABLE attachment (ROWID INTEGER PRIMARY KEY, filename TEXT);
                 INSERT INTO message VALUES (5, 'G-5', 'hello', 700000000, x'01FF', 0.5);
                 INSERT INTO attachment VALUES (1, '~/Library/a.png');
                 INSERT INTO attachment VALUES (2, NULL);",
            )
            .unwrap();
        }
        let db = Database::open_read_only(&path).await.unwrap();
        (db, dir)
    }

    #[tokio::test]
    async fn row_converts_every_storage_class() {
        let (db, _dir) = seeded().await;
        let row = row(&db, HistoryTable::Message, RowId(5)).await.unwrap().unwrap();
        assert_eq!(
            Value::Object(row),
            json!({
                "ROWID": 5,
                "guid": "G-5",
                "text": "hello",
                "date": 700000000,
                "attributedBody": "Af8=",
                "ratio": 0.5
            })
        );
    }

    #[tokio::test]
    async fn absent_row_is_none() {
        let (db, _dir) = seeded().await;
        assert!(row(&db, HistoryTable::Chat, RowId(1)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn attachment_filename_distinguishes_null_from_absent() {
        let (db, _dir) = seeded().await;
        assert_eq!(
            attachment_filename(&db, RowId(1)).await.unwrap(),
            Some(Some("~/Library/a.png".to_string()))
        );
        assert_eq!(attachment_filename(&db, RowId(2)).await.unwrap(), Some(None));
        assert_eq!(attachment_filename(&db, RowId(3)).await.unwrap(), None);
    }
}
