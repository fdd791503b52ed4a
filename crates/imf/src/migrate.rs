// SPDX-FileCopyrightText: 2026 iMessageForwarder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `imf migrate` command implementation.

use std::fmt::Write as _;

use imf_config::ImfConfig;
use imf_core::{ActionKind, ImfError};
use imf_storage::QueueStore;

/// Open (and thereby migrate) the queue store, report backlog, and exit.
pub async fn run_migrate(config: &ImfConfig) -> Result<(), ImfError> {
    let path = config
        .storage
        .queue_path
        .as_deref()
        .ok_or_else(|| ImfError::Config("QUEUE_PATH is not set".into()))?;

    let store = QueueStore::open(path).await?;
    print!("{}", render_backlog(&store).await?);
    store.checkpoint().await?;
    store.database().clone().close().await
}

/// One line per queue table: pending rows and the oldest waiting ROWID.
async fn render_backlog(store: &QueueStore) -> Result<String, ImfError> {
    let mut out = format!("queue store ready: {}\n", store.database().path().display());
    for kind in ActionKind::ALL {
        let name = kind.to_string();
        let count = store.count(kind).await?;
        let oldest = store.pending(kind, 1).await?;
        let _ = match oldest.first() {
            Some(row) => writeln!(out, "  {name:<9} {count} pending, oldest ROWID {}", row.rowid()),
            None => writeln!(out, "  {name:<9} {count} pending"),
        };
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use imf_core::{NewAction, NewRename};

    #[tokio::test]
    async fn backlog_reports_oldest_pending_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("queue.db");
        let store = QueueStore::open(&path).await.unwrap();
        for title in ["first", "second"] {
            store
                .enqueue(&NewAction::Rename(NewRename {
                    chat_id: 9,
                    group_title: title.into(),
                }))
                .await
                .unwrap();
        }

        let backlog = render_backlog(&store).await.unwrap();
        assert!(backlog.starts_with(&format!("queue store ready: {}\n", path.display())));
        assert!(backlog.contains("  rename    2 pending, oldest ROWID 1\n"), "{backlog}");
        assert!(backlog.contains("  message   0 pending\n"), "{backlog}");
    }
}
