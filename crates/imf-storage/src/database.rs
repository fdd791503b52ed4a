// SPDX-FileCopyrightText: 2026 iMessageForwarder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All statements are serialized through tokio-rusqlite's single background
//! thread. Do NOT create additional Connection instances for writes.

use std::path::{Path, PathBuf};

use imf_core::ImfError;
use rusqlite::OpenFlags;
use tracing::{debug, info};

use crate::migrations;

/// Handle to one SQLite file backed by a single long-lived connection.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
    path: PathBuf,
}

impl Database {
    /// Open (creating if needed) a writable database, apply pragmas and run
    /// pending migrations.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, ImfError> {
        let path = path.as_ref().to_path_buf();

        let migrate_path = path.clone();
        let applied = tokio::task::spawn_blocking(move || -> Result<usize, ImfError> {
            let mut conn = rusqlite::Connection::open(&migrate_path).map_err(storage_err)?;
            conn.execute_batch("PRAGMA journal_mode = WAL;")
                .map_err(storage_err)?;
            migrations::run_migrations(&mut conn)
        })
        .await
        .map_err(|e| ImfError::Internal(format!("migration task failed: {e}")))??;
        if applied > 0 {
            info!(path = %path.display(), applied, "queue store migrated");
        }

        let conn = tokio_rusqlite::Connection::open(&path)
            .await
            .map_err(storage_err)?;
        conn.call(|conn| -> Result<(), rusqlite::Error> {
            conn.execute_batch(
                "PRAGMA busy_timeout = 5000;
                 PRAGMA foreign_keys = ON;
                 PRAGMA synchronous = NORMAL;",
            )
        })
        .await
        .map_err(map_tr_err)?;

        debug!(path = %path.display(), "database opened");
        Ok(Self { conn, path })
    }

    /// Open an existing database without write access. No migrations run.
    pub async fn open_read_only(path: impl AsRef<Path>) -> Result<Self, ImfError> {
        let path = path.as_ref().to_path_buf();
        let conn = tokio_rusqlite::Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .await
        .map_err(storage_err)?;
        conn.call(|conn| -> Result<(), rusqlite::Error> {
            conn.execute_batch("PRAGMA busy_timeout = 5000;")
        })
        .await
        .map_err(map_tr_err)?;

        debug!(path = %path.display(), "database opened read-only");
        Ok(Self { conn, path })
    }

    /// The underlying async connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Fold the WAL back into the main database file.
    pub async fn checkpoint(&self) -> Result<(), ImfError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")
            })
            .await
            .map_err(map_tr_err)?;
        debug!(path = %self.path.display(), "WAL checkpoint complete");
        Ok(())
    }

    /// Close the connection, waiting for queued statements to finish.
    pub async fn close(self) -> Result<(), ImfError> {
        self.conn.close().await.map_err(storage_err)
    }
}

/// Convert a tokio-rusqlite error into `ImfError::Storage`.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> ImfError {
    storage_err(e)
}

fn storage_err<E>(e: E) -> ImfError
where
    E: std::error::Error + Send + Sync + 'static,
{
    ImfError::Storage {
        source: Box::new(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn open_creates_queue_tables_in_wal_mode() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("queue.db")).await.unwrap();

        let (mode, tables): (String, Vec<String>) = db
            .connection()
            .call(|conn| -> Result<_, rusqlite::Error> {
                let mode: String =
                    conn.query_row("PRAGMA journal_mode", [], |row| row.get(0))?;
                let mut stmt = conn.prepare(
                    "SELECT name FROM sqlite_master
                     WHERE type = 'table' AND name IN ('message', 'chat', 'reaction', 'rename')
                     ORDER BY name",
                )?;
                let tables = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok((mode, tables))
            })
            .await
            .unwrap();

        assert_eq!(mode.to_lowercase(), "wal");
        assert_eq!(tables, vec!["chat", "message", "reaction", "rename"]);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn reopening_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("queue.db");
        Database::open(&path).await.unwrap().close().await.unwrap();
        let db = Database::open(&path).await.unwrap();
        db.checkpoint().await.unwrap();
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn read_only_rejects_writes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.db");
        {
            let conn = rusqlite::Connection::open(&path).unwrap();
            conn.execute_batch("CREATE TABLE chat (guid TEXT);").unwrap();
        }

        let db = Database::open_read_only(&path).await.unwrap();
        let result = db
            .connection()
            .call(|conn| -> Result<usize, rusqlite::Error> {
                conn.execute("INSERT INTO chat (guid) VALUES ('x')", [])
            })
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn read_only_open_of_missing_file_fails() {
        let dir = tempdir().unwrap();
        let err = Database::open_read_only(dir.path().join("absent.db"))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, ImfError::Storage { .. }));
    }
}
