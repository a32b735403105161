// SPDX-FileCopyrightText: 2026 Wordcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the Wordcast pipeline.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::category::Category;

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a trait object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Channel,
    Storage,
}

// --- Catalog ---

/// A vocabulary entry. Immutable once written to the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabularyWord {
    pub id: String,
    pub word: String,
    pub definition: String,
    pub example: String,
    pub category: Category,
    pub part_of_speech: String,
    #[serde(default)]
    pub memory_hook: Option<String>,
    #[serde(default)]
    pub pronunciation: Option<String>,
}

// --- Ledger ---

/// "Word W was sent to user U in category C at time T". Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendRecord {
    pub user_id: String,
    pub word_id: String,
    pub category: Category,
    pub sent_at: DateTime<Utc>,
}

// --- Delivery settings ---

/// How the day's send times are chosen.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ScheduleMode {
    /// Evenly spaced between the service's start and end hours.
    Auto,
    /// User-chosen wall-clock times, one per slot.
    Custom,
}

/// Per-user delivery configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliverySettings {
    pub user_id: String,
    pub words_per_day: u32,
    pub mode: ScheduleMode,
    /// Slot times ordered by position. Only consulted in `Custom` mode.
    #[serde(default)]
    pub custom_times: Vec<NaiveTime>,
    /// Overrides the service scheduling offset when set (minutes east of UTC).
    #[serde(default)]
    pub utc_offset_minutes: Option<i32>,
}

/// A user's subscription to one category, used by the daily batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub user_id: String,
    pub phone_number: String,
    pub category: Category,
    pub active: bool,
}

// --- Outbox ---

/// Lifecycle of an outbox row: `pending -> processing -> sent | failed`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DeliveryState {
    Pending,
    /// Claimed by a sweep; only that sweep may complete it.
    Processing,
    Sent,
    Failed,
}

impl DeliveryState {
    /// Terminal states never change again.
    pub fn is_terminal(self) -> bool {
        matches!(self, DeliveryState::Sent | DeliveryState::Failed)
    }
}

/// Provider-reported status of a message, from the send response or a callback.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Accepted,
    Queued,
    Sending,
    Sent,
    Delivered,
    Read,
    Failed,
    Undelivered,
    Rejected,
}

impl DeliveryStatus {
    /// Whether the provider took responsibility for the message.
    pub fn is_success(self) -> bool {
        !matches!(
            self,
            DeliveryStatus::Failed | DeliveryStatus::Undelivered | DeliveryStatus::Rejected
        )
    }
}

/// Identifier of the body template used to render an outbox message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MessageTemplate {
    DailyWord,
}

/// Values substituted into a message template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateVars {
    pub word: String,
    pub definition: String,
    pub example: String,
    pub category: Category,
    pub part_of_speech: String,
    #[serde(default)]
    pub pronunciation: Option<String>,
    #[serde(default)]
    pub memory_hook: Option<String>,
    /// 1-based position within the day's batch.
    pub position: u32,
    pub total: u32,
}

impl TemplateVars {
    /// Build the variables for one slot of a batch.
    pub fn for_word(word: &VocabularyWord, position: u32, total: u32) -> Self {
        Self {
            word: word.word.clone(),
            definition: word.definition.clone(),
            example: word.example.clone(),
            category: word.category,
            part_of_speech: word.part_of_speech.clone(),
            pronunciation: word.pronunciation.clone(),
            memory_hook: word.memory_hook.clone(),
            position,
            total,
        }
    }
}

/// An outbox row before it has been persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOutboxMessage {
    pub user_id: String,
    pub destination: String,
    pub word_id: String,
    pub category: Category,
    pub schedule_date: NaiveDate,
    /// 1-based slot within the day.
    pub slot_position: u32,
    pub scheduled_at: DateTime<Utc>,
    pub template: MessageTemplate,
    pub vars: TemplateVars,
}

/// A persisted scheduled send.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboxMessage {
    pub id: i64,
    pub user_id: String,
    pub destination: String,
    pub word_id: String,
    pub category: Category,
    pub schedule_date: NaiveDate,
    pub slot_position: u32,
    pub scheduled_at: DateTime<Utc>,
    pub template: MessageTemplate,
    pub vars: TemplateVars,
    pub state: DeliveryState,
    pub claim_token: Option<String>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub channel_message_id: Option<String>,
    pub delivery_status: Option<DeliveryStatus>,
    pub last_error: Option<String>,
    pub sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Result of writing a day's batch.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchInsert {
    /// The rows were written by this call.
    Created(Vec<OutboxMessage>),
    /// A batch for the same user and day already existed; nothing was written.
    Existing(Vec<OutboxMessage>),
}

impl BatchInsert {
    pub fn messages(&self) -> &[OutboxMessage] {
        match self {
            BatchInsert::Created(m) | BatchInsert::Existing(m) => m,
        }
    }

    pub fn into_messages(self) -> Vec<OutboxMessage> {
        match self {
            BatchInsert::Created(m) | BatchInsert::Existing(m) => m,
        }
    }
}

// --- Channel ---

/// A rendered message handed to a channel adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    /// Phone number in E.164 form.
    pub destination: String,
    pub body: String,
    /// Provider-side template name, for channels that require approved templates.
    pub template_id: Option<String>,
    /// Ordered template parameters matching `template_id`.
    pub template_params: Vec<String>,
}

/// What the provider returned for an accepted send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelReceipt {
    /// Provider message id, used to correlate delivery callbacks.
    pub id: String,
    pub status: DeliveryStatus,
}

/// A provider delivery-status callback, reduced to what the outbox records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryUpdate {
    pub channel_message_id: String,
    pub status: DeliveryStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn delivery_state_strings_match_storage_format() {
        assert_eq!(DeliveryState::Pending.to_string(), "pending");
        assert_eq!(DeliveryState::Processing.to_string(), "processing");
        assert_eq!(
            DeliveryState::from_str("failed").unwrap(),
            DeliveryState::Failed
        );
        assert!(DeliveryState::Sent.is_terminal());
        assert!(!DeliveryState::Processing.is_terminal());
    }

    #[test]
    fn delivery_status_success_classification() {
        assert!(DeliveryStatus::Accepted.is_success());
        assert!(DeliveryStatus::Queued.is_success());
        assert!(DeliveryStatus::Read.is_success());
        assert!(!DeliveryStatus::Failed.is_success());
        assert!(!DeliveryStatus::Undelivered.is_success());
        assert!(!DeliveryStatus::Rejected.is_success());
    }

    #[test]
    fn delivery_status_parses_provider_casing() {
        assert_eq!(
            DeliveryStatus::from_str("DELIVERED").unwrap(),
            DeliveryStatus::Delivered
        );
        assert_eq!(
            DeliveryStatus::from_str("undelivered").unwrap(),
            DeliveryStatus::Undelivered
        );
    }

    #[test]
    fn schedule_mode_and_template_strings() {
        assert_eq!(ScheduleMode::from_str("custom").unwrap(), ScheduleMode::Custom);
        assert_eq!(MessageTemplate::DailyWord.to_string(), "daily_word");
    }
}
