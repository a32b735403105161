// SPDX-FileCopyrightText: 2026 Wordcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-shot commands: `schedule`, `dispatch`, and `subscribe`.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime, Utc};

use wordcast_config::model::WordcastConfig;
use wordcast_core::types::{DeliverySettings, ScheduleMode, Subscription};
use wordcast_core::{Category, StorageAdapter, WordcastError};
use wordcast_scheduler::{DailyScheduler, OutboxDispatcher, ScheduledBatch};

use crate::serve::build_channel;

/// Who to schedule for.
pub enum ScheduleTarget {
    All,
    User {
        user_id: String,
        phone_number: String,
        category: Category,
    },
}

/// Runs `wordcast schedule`.
pub async fn run_schedule(
    config: &WordcastConfig,
    storage: Arc<dyn StorageAdapter>,
    target: ScheduleTarget,
    date: Option<NaiveDate>,
) -> Result<(), WordcastError> {
    let scheduler = DailyScheduler::new(storage, &config.schedule)?;
    match target {
        ScheduleTarget::All => {
            let report = scheduler.schedule_all(date).await?;
            print_json(&report)
        }
        ScheduleTarget::User {
            user_id,
            phone_number,
            category,
        } => {
            let batch = match date {
                Some(date) => {
                    scheduler
                        .schedule_for_date(&user_id, &phone_number, category, date)
                        .await?
                }
                None => {
                    scheduler
                        .schedule_today(&user_id, &phone_number, category)
                        .await?
                }
            };
            print_batch(&batch);
            Ok(())
        }
    }
}

fn print_batch(batch: &ScheduledBatch) {
    let verb = if batch.created { "scheduled" } else { "already scheduled" };
    println!(
        "{} words {verb} for {} on {}",
        batch.messages.len(),
        batch.user_id,
        batch.date
    );
    for entry in &batch.schedule {
        println!("  {}  {}", entry.time, entry.word);
    }
}

/// Runs `wordcast dispatch`: one sweep over everything due now.
pub async fn run_dispatch(
    config: &WordcastConfig,
    storage: Arc<dyn StorageAdapter>,
) -> Result<(), WordcastError> {
    let channel = build_channel(config)?;
    let dispatcher = OutboxDispatcher::new(storage, channel, &config.dispatch);
    let report = dispatcher.dispatch_due(Utc::now()).await?;
    print_json(&report)
}

/// Arguments of `wordcast subscribe`, already parsed.
pub struct SubscribeArgs {
    pub user_id: String,
    pub phone_number: String,
    pub category: Category,
    pub words_per_day: u32,
    /// Comma-separated `HH:MM` list; empty means auto mode.
    pub times: Option<String>,
    pub utc_offset_minutes: Option<i32>,
}

/// Runs `wordcast subscribe`: stores delivery settings and an active subscription.
pub async fn run_subscribe(
    storage: &dyn StorageAdapter,
    args: SubscribeArgs,
) -> Result<(), WordcastError> {
    if args.words_per_day == 0 {
        return Err(WordcastError::Validation(
            "--words-per-day must be at least 1".into(),
        ));
    }
    if let Some(minutes) = args.utc_offset_minutes {
        if !(-14 * 60..=14 * 60).contains(&minutes) {
            return Err(WordcastError::Validation(format!(
                "--utc-offset-minutes {minutes} is outside -840..=840"
            )));
        }
    }
    let custom_times = parse_times(args.times.as_deref().unwrap_or(""))?;
    let mode = if custom_times.is_empty() {
        ScheduleMode::Auto
    } else {
        ScheduleMode::Custom
    };

    storage
        .put_delivery_settings(&DeliverySettings {
            user_id: args.user_id.clone(),
            words_per_day: args.words_per_day,
            mode,
            custom_times,
            utc_offset_minutes: args.utc_offset_minutes,
        })
        .await?;
    storage
        .upsert_subscription(&Subscription {
            user_id: args.user_id.clone(),
            phone_number: args.phone_number,
            category: args.category,
            active: true,
        })
        .await?;
    println!(
        "subscribed {} to {} ({} words/day, {} mode)",
        args.user_id, args.category, args.words_per_day, mode
    );
    Ok(())
}

/// Parse `08:00,12:30` into sorted, distinct slot times.
pub fn parse_times(input: &str) -> Result<Vec<NaiveTime>, WordcastError> {
    let mut seen = HashSet::new();
    let mut times = Vec::new();
    for part in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let time = NaiveTime::parse_from_str(part, "%H:%M").map_err(|e| {
            WordcastError::Validation(format!("slot time `{part}` is not HH:MM: {e}"))
        })?;
        if !seen.insert(time) {
            return Err(WordcastError::Validation(format!(
                "slot time {part} is listed twice"
            )));
        }
        times.push(time);
    }
    times.sort();
    Ok(times)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), WordcastError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| WordcastError::Internal(format!("failed to render report: {e}")))?;
    println!("{text}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_times_sorts_and_trims() {
        let times = parse_times(" 19:30, 08:00 ,12:00").unwrap();
        let rendered: Vec<String> = times.iter().map(|t| t.format("%H:%M").to_string()).collect();
        assert_eq!(rendered, vec!["08:00", "12:00", "19:30"]);
    }

    #[test]
    fn parse_times_empty_means_auto() {
        assert!(parse_times("").unwrap().is_empty());
    }

    #[test]
    fn parse_times_rejects_duplicates_and_garbage() {
        assert!(parse_times("08:00,08:00").is_err());
        assert!(parse_times("8am").is_err());
        assert!(parse_times("24:00").is_err());
    }
}
