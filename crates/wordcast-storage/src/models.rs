// SPDX-FileCopyrightText: 2026 Wordcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Column encodings shared by the query modules.
//!
//! Timestamps are RFC 3339 UTC with milliseconds so string order is time
//! order. Dates are `YYYY-MM-DD`, slot times `HH:MM`.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rusqlite::Row;
use rusqlite::types::Type;

use wordcast_core::types::{OutboxMessage, VocabularyWord};

pub(crate) const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";
pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";
pub(crate) const SLOT_TIME_FORMAT: &str = "%H:%M";

pub(crate) fn format_ts(ts: DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub(crate) fn format_slot_time(time: NaiveTime) -> String {
    time.format(SLOT_TIME_FORMAT).to_string()
}

fn conversion_error(
    idx: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

pub(crate) fn ts_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

pub(crate) fn opt_ts_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|raw| {
        DateTime::parse_from_rfc3339(&raw)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(|e| conversion_error(idx, e))
    })
    .transpose()
}

pub(crate) fn date_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    NaiveDate::parse_from_str(&raw, DATE_FORMAT).map_err(|e| conversion_error(idx, e))
}

pub(crate) fn slot_time_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveTime> {
    let raw: String = row.get(idx)?;
    NaiveTime::parse_from_str(&raw, SLOT_TIME_FORMAT).map_err(|e| conversion_error(idx, e))
}

/// Parse a text column through the type's `FromStr` (categories, states, enums).
pub(crate) fn parsed_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e| conversion_error(idx, e))
}

pub(crate) fn opt_parsed_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: Option<String> = row.get(idx)?;
    raw.map(|raw| raw.parse().map_err(|e| conversion_error(idx, e)))
        .transpose()
}

pub(crate) const WORD_COLUMNS: &str =
    "id, word, definition, example, category, part_of_speech, memory_hook, pronunciation";

pub(crate) fn word_from_row(row: &Row<'_>) -> rusqlite::Result<VocabularyWord> {
    Ok(VocabularyWord {
        id: row.get(0)?,
        word: row.get(1)?,
        definition: row.get(2)?,
        example: row.get(3)?,
        category: parsed_column(row, 4)?,
        part_of_speech: row.get(5)?,
        memory_hook: row.get(6)?,
        pronunciation: row.get(7)?,
    })
}

pub(crate) const OUTBOX_COLUMNS: &str = "id, user_id, destination, word_id, category, \
     schedule_date, slot_position, scheduled_at, template, vars, state, claim_token, \
     claimed_at, channel_message_id, delivery_status, last_error, sent_at, created_at, \
     updated_at";

pub(crate) fn outbox_from_row(row: &Row<'_>) -> rusqlite::Result<OutboxMessage> {
    let vars: String = row.get(9)?;
    Ok(OutboxMessage {
        id: row.get(0)?,
        user_id: row.get(1)?,
        destination: row.get(2)?,
        word_id: row.get(3)?,
        category: parsed_column(row, 4)?,
        schedule_date: date_column(row, 5)?,
        slot_position: row.get(6)?,
        scheduled_at: ts_column(row, 7)?,
        template: parsed_column(row, 8)?,
        vars: serde_json::from_str(&vars).map_err(|e| conversion_error(9, e))?,
        state: parsed_column(row, 10)?,
        claim_token: row.get(11)?,
        claimed_at: opt_ts_column(row, 12)?,
        channel_message_id: row.get(13)?,
        delivery_status: opt_parsed_column(row, 14)?,
        last_error: row.get(15)?,
        sent_at: opt_ts_column(row, 16)?,
        created_at: ts_column(row, 17)?,
        updated_at: ts_column(row, 18)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamps_sort_lexically() {
        let early = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2026, 3, 1, 21, 0, 0).unwrap();
        assert_eq!(format_ts(early), "2026-03-01T09:00:00.000Z");
        assert!(format_ts(early) < format_ts(late));
    }

    #[test]
    fn slot_times_use_hours_and_minutes() {
        let t = NaiveTime::from_hms_opt(8, 30, 0).unwrap();
        assert_eq!(format_slot_time(t), "08:30");
        assert_eq!(
            format_date(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()),
            "2026-03-01"
        );
    }
}
