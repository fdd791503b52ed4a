// SPDX-FileCopyrightText: 2026 iMessageForwarder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded queue store migrations using refinery.
//!
//! SQL migration files are compiled into the binary at build time via
//! `embed_migrations!`. Migrations run automatically when the queue store opens.

use imf_core::ImfError;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Run all pending migrations against the given connection.
///
/// Refinery tracks applied migrations in its own `refinery_schema_history` table.
pub fn run_migrations(conn: &mut rusqlite::Connection) -> Result<usize, ImfError> {
    let report = embedded::migrations::runner()
        .run(conn)
        .map_err(|e| ImfError::Storage {
            source: Box::new(e),
        })?;
    Ok(report.applied_migrations().len())
}
