// SPDX-FileCopyrightText: 2026 iMessageForwarder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Attachment path resolution.
//!
//! The history store records attachment locations relative to the user's
//! home directory (`~/Library/Messages/Attachments/...`).

use std::path::{Path, PathBuf};

use imf_core::{ImfError, RowId};

use crate::store::HistoryStore;

/// Expand a leading `~` (and any separators after it) onto `home`.
///
/// Filenames without a leading `~` are returned unchanged.
pub fn expand_home(filename: &str, home: &Path) -> PathBuf {
    match filename.strip_prefix('~') {
        Some(rest) => home.join(rest.trim_start_matches(['/', '\\'])),
        None => PathBuf::from(filename),
    }
}

/// Maps attachment row identities to filesystem paths.
#[derive(Clone)]
pub struct AttachmentResolver {
    history: HistoryStore,
    home: PathBuf,
}

impl AttachmentResolver {
    pub fn new(history: HistoryStore, home: impl Into<PathBuf>) -> Self {
        Self {
            history,
            home: home.into(),
        }
    }

    /// Resolve an attachment to an absolute path. The file itself is not
    /// checked for existence here.
    pub async fn resolve(&self, id: RowId) -> Result<PathBuf, ImfError> {
        match self.history.attachment_filename(id).await? {
            Some(Some(filename)) => Ok(expand_home(&filename, &self.home)),
            _ => Err(ImfError::NotFound(format!(
                "No file could be found for ROWID {id}"
            ))),
        }
    }
}
