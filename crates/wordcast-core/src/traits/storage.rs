// SPDX-FileCopyrightText: 2026 Wordcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for persistence backends (SQLite, etc.).

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::category::Category;
use crate::error::WordcastError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    BatchInsert, DeliverySettings, DeliveryState, DeliveryStatus, NewOutboxMessage,
    OutboxMessage, SendRecord, Subscription, VocabularyWord,
};

/// Adapter for the persisted state of the daily-word pipeline.
///
/// Holds the word catalog, the send history ledger, per-user delivery
/// settings, subscriptions, and the outbox. The scheduler and dispatcher keep
/// no state of their own between invocations; everything lives here.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), WordcastError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), WordcastError>;

    // --- Word catalog ---

    /// Inserts or replaces a catalog entry.
    async fn upsert_word(&self, word: &VocabularyWord) -> Result<(), WordcastError>;

    async fn get_word(&self, id: &str) -> Result<Option<VocabularyWord>, WordcastError>;

    /// Up to `limit` words in `category` that the user has not been sent and
    /// that are not already waiting in the user's outbox, in catalog order.
    ///
    /// An exhausted category yields an empty vector, not an error.
    async fn find_unsent_words(
        &self,
        user_id: &str,
        category: Category,
        limit: u32,
    ) -> Result<Vec<VocabularyWord>, WordcastError>;

    async fn count_words(&self, category: Category) -> Result<i64, WordcastError>;

    // --- Send history ledger ---

    /// Appends a send record. Returns `false` if the same (user, word,
    /// category) was already present; duplicates are tolerated.
    async fn record_sent(&self, record: &SendRecord) -> Result<bool, WordcastError>;

    async fn has_been_sent(
        &self,
        user_id: &str,
        word_id: &str,
        category: Category,
    ) -> Result<bool, WordcastError>;

    async fn sent_word_ids(
        &self,
        user_id: &str,
        category: Category,
    ) -> Result<Vec<String>, WordcastError>;

    // --- Delivery settings ---

    async fn get_delivery_settings(
        &self,
        user_id: &str,
    ) -> Result<Option<DeliverySettings>, WordcastError>;

    /// Replaces the user's settings and slot times atomically.
    async fn put_delivery_settings(&self, settings: &DeliverySettings)
    -> Result<(), WordcastError>;

    // --- Subscriptions ---

    /// A user has one subscription; a new category replaces the old one.
    async fn upsert_subscription(&self, subscription: &Subscription) -> Result<(), WordcastError>;

    async fn list_active_subscriptions(&self) -> Result<Vec<Subscription>, WordcastError>;

    // --- Outbox ---

    /// Writes a user's batch for one day, or returns the batch already there.
    ///
    /// Fails with [`WordcastError::ConcurrencyConflict`] if another writer
    /// inserted rows for the same (user, day, slot) during this call.
    async fn create_outbox_batch(
        &self,
        user_id: &str,
        date: NaiveDate,
        messages: Vec<NewOutboxMessage>,
    ) -> Result<BatchInsert, WordcastError>;

    async fn outbox_for_day(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<OutboxMessage>, WordcastError>;

    /// Atomically moves up to `limit` due `pending` rows to `processing` and
    /// returns exactly the rows this call claimed.
    async fn claim_due_outbox(
        &self,
        now: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<OutboxMessage>, WordcastError>;

    /// Completes a claimed row as `sent` and appends its send record.
    ///
    /// Returns `false` if the row was not in `processing` under `claim_token`.
    async fn complete_outbox_sent(
        &self,
        id: i64,
        claim_token: &str,
        channel_message_id: &str,
        status: DeliveryStatus,
        sent_at: DateTime<Utc>,
    ) -> Result<bool, WordcastError>;

    /// Stores the provider id on a row whose completion could not be written.
    ///
    /// State is untouched. Returns `false` if the row already carries an id.
    async fn record_channel_message_id(
        &self,
        id: i64,
        channel_message_id: &str,
    ) -> Result<bool, WordcastError>;

    /// Completes a claimed row as `failed` with a reason.
    async fn complete_outbox_failed(
        &self,
        id: i64,
        claim_token: &str,
        error: &str,
    ) -> Result<bool, WordcastError>;

    /// Records a provider delivery callback. Returns `false` for unknown ids.
    async fn apply_delivery_status(
        &self,
        channel_message_id: &str,
        status: DeliveryStatus,
    ) -> Result<bool, WordcastError>;

    /// Fails rows stuck in `processing` since before `claimed_before`.
    async fn fail_stale_claims(
        &self,
        claimed_before: DateTime<Utc>,
    ) -> Result<usize, WordcastError>;

    async fn get_outbox_message(&self, id: i64) -> Result<Option<OutboxMessage>, WordcastError>;

    async fn list_outbox(
        &self,
        state: Option<DeliveryState>,
        limit: u32,
    ) -> Result<Vec<OutboxMessage>, WordcastError>;

    async fn outbox_state_counts(&self) -> Result<Vec<(DeliveryState, i64)>, WordcastError>;
}
