// SPDX-FileCopyrightText: 2026 Wordcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-user delivery settings and custom slot times.

use rusqlite::{OptionalExtension, params};
use wordcast_core::WordcastError;
use wordcast_core::types::{DeliverySettings, ScheduleMode};

use crate::database::{Database, map_tr_err};
use crate::models::{format_slot_time, parsed_column, slot_time_column};

/// Load a user's settings with slot times ordered by position.
pub async fn get_delivery_settings(
    db: &Database,
    user_id: &str,
) -> Result<Option<DeliverySettings>, WordcastError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let head = conn
                .query_row(
                    "SELECT words_per_day, mode, utc_offset_minutes FROM delivery_settings \
                     WHERE user_id = ?1",
                    params![user_id],
                    |row| {
                        Ok((
                            row.get::<_, u32>(0)?,
                            parsed_column::<ScheduleMode>(row, 1)?,
                            row.get::<_, Option<i32>>(2)?,
                        ))
                    },
                )
                .optional()?;
            let Some((words_per_day, mode, utc_offset_minutes)) = head else {
                return Ok(None);
            };

            let mut stmt = conn.prepare(
                "SELECT slot_time FROM delivery_slots WHERE user_id = ?1 ORDER BY position",
            )?;
            let custom_times = stmt
                .query_map(params![user_id], |row| slot_time_column(row, 0))?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(Some(DeliverySettings {
                user_id,
                words_per_day,
                mode,
                custom_times,
                utc_offset_minutes,
            }))
        })
        .await
        .map_err(map_tr_err)
}

/// Replace a user's settings and slot rows in one transaction.
///
/// Duplicate slot times are rejected by the `(user_id, slot_time)` constraint
/// and leave the previous settings untouched.
pub async fn put_delivery_settings(
    db: &Database,
    settings: &DeliverySettings,
) -> Result<(), WordcastError> {
    if settings.words_per_day == 0 {
        return Err(WordcastError::Validation(
            "words_per_day must be at least 1".to_string(),
        ));
    }
    let settings = settings.clone();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO delivery_settings (user_id, words_per_day, mode, utc_offset_minutes) \
                 VALUES (?1, ?2, ?3, ?4) \
                 ON CONFLICT(user_id) DO UPDATE SET words_per_day = excluded.words_per_day, \
                 mode = excluded.mode, utc_offset_minutes = excluded.utc_offset_minutes, \
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![
                    settings.user_id,
                    settings.words_per_day,
                    settings.mode.to_string(),
                    settings.utc_offset_minutes,
                ],
            )?;
            tx.execute(
                "DELETE FROM delivery_slots WHERE user_id = ?1",
                params![settings.user_id],
            )?;
            {
                let mut insert = tx.prepare(
                    "INSERT INTO delivery_slots (user_id, position, slot_time) VALUES (?1, ?2, ?3)",
                )?;
                for (i, time) in settings.custom_times.iter().enumerate() {
                    insert.execute(params![
                        settings.user_id,
                        i as u32 + 1,
                        format_slot_time(*time)
                    ])?;
                }
            }
            tx.commit()
        })
        .await
        .map_err(map_tr_err)
}
