// SPDX-FileCopyrightText: 2026 Wordcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Daily scheduler: turns a user's settings and unsent words into one day's
//! batch of pending outbox rows.
//!
//! A batch is written at most once per (user, day). Re-running the scheduler
//! for a day that already has rows returns those rows unchanged, and a
//! concurrent writer losing the insert race gets the winner's batch back.
//! A day booked in one category is never reported as another category's batch.

use std::sync::Arc;

use chrono::{FixedOffset, NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use wordcast_config::model::ScheduleConfig;
use wordcast_core::types::{
    BatchInsert, MessageTemplate, NewOutboxMessage, OutboxMessage, TemplateVars,
};
use wordcast_core::{Category, StorageAdapter, WordcastError};

use crate::resolver::{ResolvedSettings, SettingsResolver};
use crate::slots;

/// One line of a day's schedule, as shown to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleEntry {
    /// Local wall-clock time, `HH:MM`.
    pub time: String,
    pub word: String,
}

/// The batch for one user and day.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledBatch {
    pub user_id: String,
    pub date: NaiveDate,
    pub messages: Vec<OutboxMessage>,
    /// `false` when the batch already existed and nothing was written.
    pub created: bool,
    pub schedule: Vec<ScheduleEntry>,
}

impl ScheduledBatch {
    fn new(user_id: &str, date: NaiveDate, messages: Vec<OutboxMessage>, created: bool, offset: FixedOffset) -> Self {
        let schedule = messages
            .iter()
            .map(|m| ScheduleEntry {
                time: m.scheduled_at.with_timezone(&offset).format("%H:%M").to_string(),
                word: m.vars.word.clone(),
            })
            .collect();
        Self {
            user_id: user_id.to_string(),
            date,
            messages,
            created,
            schedule,
        }
    }
}

/// Outcome counts of a scheduling run over every active subscription.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRunReport {
    pub scheduled: usize,
    pub already_scheduled: usize,
    pub not_configured: usize,
    pub no_words: usize,
    /// Other per-user failures (bad offsets, conflicts that could not be read back).
    pub failed: usize,
    /// Outbox rows written by this run.
    pub messages: usize,
}

/// Writes each user's daily batch to the outbox.
pub struct DailyScheduler {
    storage: Arc<dyn StorageAdapter>,
    resolver: SettingsResolver,
}

impl DailyScheduler {
    pub fn new(
        storage: Arc<dyn StorageAdapter>,
        config: &ScheduleConfig,
    ) -> Result<Self, WordcastError> {
        let resolver = SettingsResolver::new(storage.clone(), config)?;
        Ok(Self { storage, resolver })
    }

    pub fn resolver(&self) -> &SettingsResolver {
        &self.resolver
    }

    /// Schedule the user's words for today in the user's scheduling offset.
    pub async fn schedule_today(
        &self,
        user_id: &str,
        phone_number: &str,
        category: Category,
    ) -> Result<ScheduledBatch, WordcastError> {
        let resolved = self.resolver.resolve(user_id).await?;
        let today = Utc::now().with_timezone(&resolved.offset).date_naive();
        self.schedule_resolved(&resolved, phone_number, category, today)
            .await
    }

    /// Schedule the user's words for an explicit local date.
    pub async fn schedule_for_date(
        &self,
        user_id: &str,
        phone_number: &str,
        category: Category,
        date: NaiveDate,
    ) -> Result<ScheduledBatch, WordcastError> {
        let resolved = self.resolver.resolve(user_id).await?;
        self.schedule_resolved(&resolved, phone_number, category, date)
            .await
    }

    async fn schedule_resolved(
        &self,
        resolved: &ResolvedSettings,
        phone_number: &str,
        category: Category,
        date: NaiveDate,
    ) -> Result<ScheduledBatch, WordcastError> {
        let user_id = resolved.settings.user_id.as_str();

        // An existing batch must win before any catalog lookup: today's own
        // rows may be what exhausted the category.
        let existing = self.storage.outbox_for_day(user_id, date).await?;
        if !existing.is_empty() {
            ensure_category(user_id, date, category, &existing)?;
            debug!(user_id, %date, rows = existing.len(), "batch already scheduled");
            return Ok(ScheduledBatch::new(user_id, date, existing, false, resolved.offset));
        }

        let words = self
            .storage
            .find_unsent_words(user_id, category, resolved.words_per_day)
            .await?;
        if words.is_empty() {
            return Err(WordcastError::NoWordsAvailable {
                user_id: user_id.to_string(),
                category: category.to_string(),
            });
        }

        let count = batch_size(words.len(), resolved.words_per_day, resolved.times.len());
        let total = count as u32;
        let mut rows = Vec::with_capacity(count);
        for (i, (word, time)) in words.iter().zip(&resolved.times).take(count).enumerate() {
            let position = i as u32 + 1;
            rows.push(NewOutboxMessage {
                user_id: user_id.to_string(),
                destination: phone_number.to_string(),
                word_id: word.id.clone(),
                category,
                schedule_date: date,
                slot_position: position,
                scheduled_at: slots::slot_instant(date, *time, resolved.offset)?,
                template: MessageTemplate::DailyWord,
                vars: TemplateVars::for_word(word, position, total),
            });
        }

        match self.storage.create_outbox_batch(user_id, date, rows).await {
            Ok(BatchInsert::Created(messages)) => {
                info!(user_id, %date, %category, count = messages.len(), "scheduled daily batch");
                Ok(ScheduledBatch::new(user_id, date, messages, true, resolved.offset))
            }
            Ok(BatchInsert::Existing(messages)) => {
                ensure_category(user_id, date, category, &messages)?;
                Ok(ScheduledBatch::new(user_id, date, messages, false, resolved.offset))
            }
            Err(WordcastError::ConcurrencyConflict { user_id: uid, date: d }) => {
                let winner = self.storage.outbox_for_day(user_id, date).await?;
                if winner.is_empty() {
                    return Err(WordcastError::ConcurrencyConflict { user_id: uid, date: d });
                }
                ensure_category(user_id, date, category, &winner)?;
                debug!(user_id, %date, "concurrent scheduler won the batch");
                Ok(ScheduledBatch::new(user_id, date, winner, false, resolved.offset))
            }
            Err(e) => Err(e),
        }
    }

    /// Schedule every active subscription.
    ///
    /// `date` defaults to each user's own local today. Per-user outcomes are
    /// counted in the report; only infrastructure errors abort the run.
    pub async fn schedule_all(
        &self,
        date: Option<NaiveDate>,
    ) -> Result<ScheduleRunReport, WordcastError> {
        let subscriptions = self.storage.list_active_subscriptions().await?;
        let mut report = ScheduleRunReport::default();

        for sub in subscriptions {
            let outcome = match date {
                Some(d) => {
                    self.schedule_for_date(&sub.user_id, &sub.phone_number, sub.category, d)
                        .await
                }
                None => {
                    self.schedule_today(&sub.user_id, &sub.phone_number, sub.category)
                        .await
                }
            };
            match outcome {
                Ok(batch) if batch.created => {
                    report.scheduled += 1;
                    report.messages += batch.messages.len();
                }
                Ok(_) => report.already_scheduled += 1,
                Err(WordcastError::NotConfigured { user_id, reason }) => {
                    debug!(%user_id, %reason, "skipping unconfigured user");
                    report.not_configured += 1;
                }
                Err(WordcastError::NoWordsAvailable { user_id, category }) => {
                    info!(%user_id, %category, "category exhausted, nothing to schedule");
                    report.no_words += 1;
                }
                Err(e) if e.is_user_scoped() => {
                    warn!(user_id = %sub.user_id, error = %e, "scheduling failed for user");
                    report.failed += 1;
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            scheduled = report.scheduled,
            already_scheduled = report.already_scheduled,
            not_configured = report.not_configured,
            no_words = report.no_words,
            failed = report.failed,
            messages = report.messages,
            "scheduling run complete"
        );
        Ok(report)
    }
}

/// Fails if the day's stored rows were scheduled for a different category.
fn ensure_category(
    user_id: &str,
    date: NaiveDate,
    category: Category,
    rows: &[OutboxMessage],
) -> Result<(), WordcastError> {
    match rows.first() {
        Some(row) if row.category != category => Err(WordcastError::Validation(format!(
            "user {user_id} already has a {} batch for {date}",
            row.category
        ))),
        _ => Ok(()),
    }
}

/// The number of rows a batch gets: whichever of words, allowance, and slots
/// is scarcest.
pub fn batch_size(words_available: usize, words_per_day: u32, times_available: usize) -> usize {
    words_available
        .min(words_per_day as usize)
        .min(times_available)
}
