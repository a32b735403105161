// SPDX-FileCopyrightText: 2026 Wordcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Send history ledger. Rows are only ever inserted.

use rusqlite::{Connection, params};
use wordcast_core::types::SendRecord;
use wordcast_core::{Category, WordcastError};

use crate::database::{Database, map_tr_err};
use crate::models::format_ts;

/// Insert a record unless (user, word, category) is already present.
///
/// Shared with the outbox completion path so both run the same statement.
pub(crate) fn insert_record(conn: &Connection, record: &SendRecord) -> rusqlite::Result<bool> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO send_history (user_id, word_id, category, sent_at) \
         VALUES (?1, ?2, ?3, ?4)",
        params![
            record.user_id,
            record.word_id,
            record.category.to_string(),
            format_ts(record.sent_at),
        ],
    )?;
    Ok(inserted == 1)
}

/// Append a send record. Returns `false` when it was already present.
pub async fn record_sent(db: &Database, record: &SendRecord) -> Result<bool, WordcastError> {
    let record = record.clone();
    db.connection()
        .call(move |conn| insert_record(conn, &record))
        .await
        .map_err(map_tr_err)
}

pub async fn has_been_sent(
    db: &Database,
    user_id: &str,
    word_id: &str,
    category: Category,
) -> Result<bool, WordcastError> {
    let user_id = user_id.to_string();
    let word_id = word_id.to_string();
    let category = category.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT EXISTS (SELECT 1 FROM send_history \
                 WHERE user_id = ?1 AND word_id = ?2 AND category = ?3)",
                params![user_id, word_id, category],
                |row| row.get(0),
            )
        })
        .await
        .map_err(map_tr_err)
}

/// Word ids sent to the user in `category`, oldest first.
pub async fn sent_word_ids(
    db: &Database,
    user_id: &str,
    category: Category,
) -> Result<Vec<String>, WordcastError> {
    let user_id = user_id.to_string();
    let category = category.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT word_id FROM send_history WHERE user_id = ?1 AND category = ?2 \
                 ORDER BY sent_at, id",
            )?;
            let rows = stmt.query_map(params![user_id, category], |row| row.get(0))?;
            rows.collect::<Result<Vec<String>, _>>()
        })
        .await
        .map_err(map_tr_err)
}
