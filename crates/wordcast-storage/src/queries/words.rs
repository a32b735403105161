// SPDX-FileCopyrightText: 2026 Wordcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Word catalog queries.

use rusqlite::{OptionalExtension, params};
use wordcast_core::types::VocabularyWord;
use wordcast_core::{Category, WordcastError};

use crate::database::{Database, map_tr_err};
use crate::models::{WORD_COLUMNS, word_from_row};
use crate::queries::outbox::CLAIM_EXPIRED;

/// Insert a word, or overwrite its text fields if the id already exists.
///
/// Existing rows keep their rowid, so catalog order is stable across re-imports.
pub async fn upsert_word(db: &Database, word: &VocabularyWord) -> Result<(), WordcastError> {
    let word = word.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO words (id, word, definition, example, category, part_of_speech, \
                 memory_hook, pronunciation) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8) \
                 ON CONFLICT(id) DO UPDATE SET word = excluded.word, \
                 definition = excluded.definition, example = excluded.example, \
                 category = excluded.category, part_of_speech = excluded.part_of_speech, \
                 memory_hook = excluded.memory_hook, pronunciation = excluded.pronunciation",
                params![
                    word.id,
                    word.word,
                    word.definition,
                    word.example,
                    word.category.to_string(),
                    word.part_of_speech,
                    word.memory_hook,
                    word.pronunciation,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_word(db: &Database, id: &str) -> Result<Option<VocabularyWord>, WordcastError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {WORD_COLUMNS} FROM words WHERE id = ?1"),
                params![id],
                word_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Up to `limit` words in `category` in catalog order, skipping words already
/// in the user's send history and words already waiting in the user's outbox.
///
/// Rows failed with [`CLAIM_EXPIRED`] count as sent: the sweep that lost the
/// claim may have delivered them before it died.
pub async fn find_unsent_words(
    db: &Database,
    user_id: &str,
    category: Category,
    limit: u32,
) -> Result<Vec<VocabularyWord>, WordcastError> {
    let user_id = user_id.to_string();
    let category = category.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {WORD_COLUMNS} FROM words w \
                 WHERE w.category = ?2 \
                   AND NOT EXISTS (SELECT 1 FROM send_history h \
                       WHERE h.user_id = ?1 AND h.category = ?2 AND h.word_id = w.id) \
                   AND NOT EXISTS (SELECT 1 FROM outbox o \
                       WHERE o.user_id = ?1 AND o.category = ?2 AND o.word_id = w.id \
                         AND (o.state IN ('pending', 'processing') \
                              OR (o.state = 'failed' AND o.last_error = ?4))) \
                 ORDER BY w.rowid \
                 LIMIT ?3"
            ))?;
            let rows = stmt.query_map(
                params![user_id, category, limit, CLAIM_EXPIRED],
                word_from_row,
            )?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn count_words(db: &Database, category: Category) -> Result<i64, WordcastError> {
    let category = category.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM words WHERE category = ?1",
                params![category],
                |row| row.get(0),
            )
        })
        .await
        .map_err(map_tr_err)
}
