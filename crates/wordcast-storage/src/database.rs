// SPDX-FileCopyrightText: 2026 Wordcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! Every statement runs on the single background thread owned by the
//! `tokio-rusqlite` connection. Query modules take `&Database` and go through
//! [`Database::connection`]; do not open a second connection for writes.

use std::path::Path;

use tracing::{debug, info};
use wordcast_core::WordcastError;

use crate::migrations;

/// Handle to the Wordcast SQLite database.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (creating if needed) the database at `path` in WAL mode and migrate it.
    pub async fn open(path: &str) -> Result<Self, WordcastError> {
        Self::open_with(path, true).await
    }

    /// Open the database, choosing the journal mode explicitly.
    pub async fn open_with(path: &str, wal_mode: bool) -> Result<Self, WordcastError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| WordcastError::Storage {
                source: Box::new(e),
            })?;
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| WordcastError::Storage {
                source: Box::new(e),
            })?;

        let journal_mode = if wal_mode { "WAL" } else { "DELETE" };
        conn.call(move |conn| {
            conn.pragma_update(None, "journal_mode", journal_mode)?;
            conn.pragma_update(None, "foreign_keys", "ON")?;
            conn.pragma_update(None, "busy_timeout", 5000)?;
            conn.pragma_update(None, "synchronous", "NORMAL")?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        let applied = conn
            .call(|conn| migrations::run_migrations(conn))
            .await
            .map_err(|e| WordcastError::Storage {
                source: format!("migration failed: {e}").into(),
            })?;
        if applied > 0 {
            info!(path, applied, "database migrations applied");
        }
        debug!(path, wal_mode, "database opened");

        Ok(Self { conn })
    }

    /// The underlying async connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Close the connection, checkpointing the WAL first.
    pub async fn close(self) -> Result<(), WordcastError> {
        self.conn
            .call(|conn| conn.query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(())))
            .await
            .map_err(map_tr_err)?;
        self.conn.close().await.map_err(|e| WordcastError::Storage {
            source: e.to_string().into(),
        })
    }
}

/// Convert a tokio-rusqlite error into [`WordcastError::Storage`].
pub fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> WordcastError {
    WordcastError::Storage {
        source: Box::new(e),
    }
}
