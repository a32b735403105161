// SPDX-FileCopyrightText: 2026 Wordcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbox queries: batch creation, atomic claiming, and completion.
//!
//! State only moves `pending -> processing -> sent | failed`. Every transition
//! is a conditional UPDATE on the current state, and completions also require
//! the claim token stamped by [`claim_due_outbox`], so a row can be completed
//! by at most one sweep.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{Connection, ErrorCode, OptionalExtension, TransactionBehavior, params};
use tracing::debug;
use wordcast_core::WordcastError;
use wordcast_core::types::{
    BatchInsert, DeliveryState, DeliveryStatus, NewOutboxMessage, OutboxMessage, SendRecord,
};

use crate::database::{Database, map_tr_err};
use crate::models::{OUTBOX_COLUMNS, format_date, format_ts, outbox_from_row, parsed_column};
use crate::queries::ledger;

/// Reason recorded on rows whose claim outlived the claim timeout.
pub const CLAIM_EXPIRED: &str = "claim expired";

enum BatchOutcome {
    Written(BatchInsert),
    Conflict,
}

fn select_day(conn: &Connection, user_id: &str, date: &str) -> rusqlite::Result<Vec<OutboxMessage>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {OUTBOX_COLUMNS} FROM outbox WHERE user_id = ?1 AND schedule_date = ?2 \
         ORDER BY slot_position"
    ))?;
    let rows = stmt.query_map(params![user_id, date], outbox_from_row)?;
    rows.collect()
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == ErrorCode::ConstraintViolation
                && e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

/// Write a user's batch for `date`, or return the batch already stored.
///
/// The existence check and the inserts share one IMMEDIATE transaction. If a
/// writer on another connection slips rows in first, the UNIQUE constraint
/// on (user, day, slot) rejects ours and the call fails with
/// [`WordcastError::ConcurrencyConflict`] without writing anything.
pub async fn create_outbox_batch(
    db: &Database,
    user_id: &str,
    date: NaiveDate,
    messages: Vec<NewOutboxMessage>,
) -> Result<BatchInsert, WordcastError> {
    if messages.is_empty() {
        return Err(WordcastError::Validation(
            "refusing to write an empty outbox batch".to_string(),
        ));
    }
    if let Some(stray) = messages
        .iter()
        .find(|m| m.user_id != user_id || m.schedule_date != date)
    {
        return Err(WordcastError::Validation(format!(
            "outbox message for {} on {} does not belong to batch {user_id}/{date}",
            stray.user_id, stray.schedule_date
        )));
    }

    let rows = messages
        .into_iter()
        .map(|m| {
            serde_json::to_string(&m.vars)
                .map(|vars| (m, vars))
                .map_err(|e| WordcastError::Internal(format!("template vars encoding: {e}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let owner = user_id.to_string();
    let day = format_date(date);
    let outcome = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let existing = select_day(&tx, &owner, &day)?;
            if !existing.is_empty() {
                return Ok(BatchOutcome::Written(BatchInsert::Existing(existing)));
            }

            let now = format_ts(Utc::now());
            for (m, vars) in &rows {
                let inserted = tx.execute(
                    "INSERT INTO outbox (user_id, destination, word_id, category, schedule_date, \
                     slot_position, scheduled_at, template, vars, state, created_at, updated_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 'pending', ?10, ?10)",
                    params![
                        m.user_id,
                        m.destination,
                        m.word_id,
                        m.category.to_string(),
                        day,
                        m.slot_position,
                        format_ts(m.scheduled_at),
                        m.template.to_string(),
                        vars,
                        now,
                    ],
                );
                match inserted {
                    Ok(_) => {}
                    Err(e) if is_unique_violation(&e) => return Ok(BatchOutcome::Conflict),
                    Err(e) => return Err(e),
                }
            }

            let created = select_day(&tx, &owner, &day)?;
            tx.commit()?;
            Ok(BatchOutcome::Written(BatchInsert::Created(created)))
        })
        .await
        .map_err(map_tr_err)?;

    match outcome {
        BatchOutcome::Written(batch) => Ok(batch),
        BatchOutcome::Conflict => Err(WordcastError::ConcurrencyConflict {
            user_id: user_id.to_string(),
            date: date.to_string(),
        }),
    }
}

pub async fn outbox_for_day(
    db: &Database,
    user_id: &str,
    date: NaiveDate,
) -> Result<Vec<OutboxMessage>, WordcastError> {
    let user_id = user_id.to_string();
    let day = format_date(date);
    db.connection()
        .call(move |conn| select_day(conn, &user_id, &day))
        .await
        .map_err(map_tr_err)
}

/// Claim up to `limit` due pending rows for one sweep.
///
/// A single UPDATE flips the rows to `processing` under a fresh token, so two
/// sweeps can never both claim the same row. Only rows carrying this call's
/// token are returned, oldest due first.
pub async fn claim_due_outbox(
    db: &Database,
    now: DateTime<Utc>,
    limit: u32,
) -> Result<Vec<OutboxMessage>, WordcastError> {
    let token = uuid::Uuid::new_v4().to_string();
    let now = format_ts(now);
    let claimed = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            tx.execute(
                "UPDATE outbox SET state = 'processing', claim_token = ?1, claimed_at = ?2, \
                 updated_at = ?2 \
                 WHERE state = 'pending' AND id IN ( \
                     SELECT id FROM outbox WHERE state = 'pending' AND scheduled_at <= ?2 \
                     ORDER BY scheduled_at, id LIMIT ?3)",
                params![token, now, limit],
            )?;
            let claimed = {
                let mut stmt = tx.prepare(&format!(
                    "SELECT {OUTBOX_COLUMNS} FROM outbox WHERE claim_token = ?1 \
                     ORDER BY scheduled_at, id"
                ))?;
                stmt.query_map(params![token], outbox_from_row)?
                    .collect::<Result<Vec<_>, _>>()?
            };
            tx.commit()?;
            Ok(claimed)
        })
        .await
        .map_err(map_tr_err)?;
    if !claimed.is_empty() {
        debug!(count = claimed.len(), "claimed due outbox rows");
    }
    Ok(claimed)
}

/// Mark a claimed row `sent` and append its send record in the same transaction.
///
/// Returns `false` without writing if the row is not `processing` under
/// `claim_token`.
pub async fn complete_outbox_sent(
    db: &Database,
    id: i64,
    claim_token: &str,
    channel_message_id: &str,
    status: DeliveryStatus,
    sent_at: DateTime<Utc>,
) -> Result<bool, WordcastError> {
    let claim_token = claim_token.to_string();
    let channel_message_id = channel_message_id.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let sent_ts = format_ts(sent_at);
            let updated = tx.execute(
                "UPDATE outbox SET state = 'sent', channel_message_id = ?1, \
                 delivery_status = ?2, sent_at = ?3, last_error = NULL, \
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now') \
                 WHERE id = ?4 AND state = 'processing' AND claim_token = ?5",
                params![channel_message_id, status.to_string(), sent_ts, id, claim_token],
            )?;
            if updated == 0 {
                return Ok(false);
            }

            let record = tx.query_row(
                "SELECT user_id, word_id, category FROM outbox WHERE id = ?1",
                params![id],
                |row| {
                    Ok(SendRecord {
                        user_id: row.get(0)?,
                        word_id: row.get(1)?,
                        category: parsed_column(row, 2)?,
                        sent_at,
                    })
                },
            )?;
            ledger::insert_record(&tx, &record)?;
            tx.commit()?;
            Ok(true)
        })
        .await
        .map_err(map_tr_err)
}

/// Attach a provider message id to a row without touching its state.
///
/// Used when a send went out but its completion was lost, so later delivery
/// callbacks still find the row.
pub async fn record_channel_message_id(
    db: &Database,
    id: i64,
    channel_message_id: &str,
) -> Result<bool, WordcastError> {
    let channel_message_id = channel_message_id.to_string();
    db.connection()
        .call(move |conn| {
            let updated = conn.execute(
                "UPDATE outbox SET channel_message_id = ?1, \
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now') \
                 WHERE id = ?2 AND channel_message_id IS NULL",
                params![channel_message_id, id],
            )?;
            Ok(updated == 1)
        })
        .await
        .map_err(map_tr_err)
}

/// Mark a claimed row `failed`. Same guard as [`complete_outbox_sent`].
pub async fn complete_outbox_failed(
    db: &Database,
    id: i64,
    claim_token: &str,
    error: &str,
) -> Result<bool, WordcastError> {
    let claim_token = claim_token.to_string();
    let error = error.to_string();
    db.connection()
        .call(move |conn| {
            let updated = conn.execute(
                "UPDATE outbox SET state = 'failed', last_error = ?1, \
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now') \
                 WHERE id = ?2 AND state = 'processing' AND claim_token = ?3",
                params![error, id, claim_token],
            )?;
            Ok(updated == 1)
        })
        .await
        .map_err(map_tr_err)
}

/// Record a provider delivery callback against the row that carries its id.
///
/// Only `delivery_status` changes; the row's `sent` state is final.
pub async fn apply_delivery_status(
    db: &Database,
    channel_message_id: &str,
    status: DeliveryStatus,
) -> Result<bool, WordcastError> {
    let channel_message_id = channel_message_id.to_string();
    db.connection()
        .call(move |conn| {
            let updated = conn.execute(
                "UPDATE outbox SET delivery_status = ?1, \
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now') \
                 WHERE channel_message_id = ?2",
                params![status.to_string(), channel_message_id],
            )?;
            Ok(updated > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// Fail rows left in `processing` by a sweep that never completed them.
///
/// They are not returned to `pending`: the send may already have happened.
pub async fn fail_stale_claims(
    db: &Database,
    claimed_before: DateTime<Utc>,
) -> Result<usize, WordcastError> {
    let cutoff = format_ts(claimed_before);
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE outbox SET state = 'failed', last_error = ?1, \
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now') \
                 WHERE state = 'processing' AND claimed_at < ?2",
                params![CLAIM_EXPIRED, cutoff],
            )
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_outbox_message(
    db: &Database,
    id: i64,
) -> Result<Option<OutboxMessage>, WordcastError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {OUTBOX_COLUMNS} FROM outbox WHERE id = ?1"),
                params![id],
                outbox_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Most recently scheduled rows first, optionally filtered by state.
pub async fn list_outbox(
    db: &Database,
    state: Option<DeliveryState>,
    limit: u32,
) -> Result<Vec<OutboxMessage>, WordcastError> {
    let state = state.map(|s| s.to_string());
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {OUTBOX_COLUMNS} FROM outbox WHERE (?1 IS NULL OR state = ?1) \
                 ORDER BY scheduled_at DESC, id DESC LIMIT ?2"
            ))?;
            let rows = stmt.query_map(params![state, limit], outbox_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn outbox_state_counts(db: &Database) -> Result<Vec<(DeliveryState, i64)>, WordcastError> {
    db.connection()
        .call(|conn| {
            let mut stmt =
                conn.prepare("SELECT state, COUNT(*) FROM outbox GROUP BY state ORDER BY state")?;
            let rows = stmt.query_map([], |row| Ok((parsed_column(row, 0)?, row.get(1)?)))?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}
