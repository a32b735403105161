// SPDX-FileCopyrightText: 2026 Wordcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Send-time computation for a day's batch.
//!
//! Auto mode spreads `N` slots evenly across the configured window, rounding
//! each to the nearest whole hour: `interval = (end - start) / max(1, N - 1)`
//! and `time[i] = round(start + i * interval)`. With one slot only the start
//! hour is used. Large `N` rounds several slots onto the same hour; the
//! [`AutoSlotPolicy`] decides what happens to them.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use wordcast_config::model::AutoSlotPolicy;
use wordcast_core::WordcastError;
use wordcast_core::types::{DeliverySettings, ScheduleMode};

/// Auto-mode window and collision policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoWindow {
    pub start_hour: u32,
    pub end_hour: u32,
    pub policy: AutoSlotPolicy,
}

impl Default for AutoWindow {
    fn default() -> Self {
        Self {
            start_hour: 9,
            end_hour: 21,
            policy: AutoSlotPolicy::Stagger,
        }
    }
}

/// Rounded slot hours before any collision handling.
pub fn auto_hours(count: u32, start_hour: u32, end_hour: u32) -> Vec<u32> {
    if count == 0 {
        return Vec::new();
    }
    let start = f64::from(start_hour);
    let span = f64::from(end_hour.saturating_sub(start_hour));
    let interval = span / f64::from(count.saturating_sub(1).max(1));
    (0..count)
        .map(|i| (start + f64::from(i) * interval).round() as u32)
        .collect()
}

/// Auto-mode slot times for `count` words.
pub fn auto_times(count: u32, window: AutoWindow) -> Vec<NaiveTime> {
    let hours = auto_hours(count, window.start_hour, window.end_hour);
    match window.policy {
        AutoSlotPolicy::Overlap => hours
            .into_iter()
            .filter_map(|h| NaiveTime::from_hms_opt(h, 0, 0))
            .collect(),
        AutoSlotPolicy::Stagger => stagger(&hours),
    }
}

/// Spread the `k` slots sharing an hour at `60 / k` minute steps.
fn stagger(hours: &[u32]) -> Vec<NaiveTime> {
    let mut times = Vec::with_capacity(hours.len());
    let mut i = 0;
    while i < hours.len() {
        let hour = hours[i];
        let run = hours[i..].iter().take_while(|&&h| h == hour).count();
        let step = 60 / run as u32;
        for j in 0..run as u32 {
            if let Some(t) = NaiveTime::from_hms_opt(hour, j * step, 0) {
                times.push(t);
            }
        }
        i += run;
    }
    times
}

/// Ordered slot times for a user's settings.
///
/// Custom mode returns the stored times in position order (possibly fewer
/// than `words_per_day`); auto mode computes `words_per_day` times.
pub fn slot_times(settings: &DeliverySettings, words_per_day: u32, window: AutoWindow) -> Vec<NaiveTime> {
    match settings.mode {
        ScheduleMode::Custom => settings.custom_times.clone(),
        ScheduleMode::Auto => auto_times(words_per_day, window),
    }
}

/// Resolve the offset a user's wall-clock times are interpreted in.
pub fn user_offset(
    settings: &DeliverySettings,
    service_offset: FixedOffset,
) -> Result<FixedOffset, WordcastError> {
    match settings.utc_offset_minutes {
        None => Ok(service_offset),
        Some(minutes) => FixedOffset::east_opt(minutes * 60).ok_or_else(|| {
            WordcastError::Validation(format!(
                "utc offset of {minutes} minutes for user {} is out of range",
                settings.user_id
            ))
        }),
    }
}

/// The absolute instant of `time` on `date` in `offset`.
pub fn slot_instant(
    date: NaiveDate,
    time: NaiveTime,
    offset: FixedOffset,
) -> Result<DateTime<Utc>, WordcastError> {
    offset
        .from_local_datetime(&date.and_time(time))
        .single()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| WordcastError::Internal(format!("no single instant for {date} {time}")))
}
