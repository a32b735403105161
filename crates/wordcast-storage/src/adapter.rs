// SPDX-FileCopyrightText: 2026 Wordcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::OnceCell;
use tracing::debug;

use wordcast_config::model::StorageConfig;
use wordcast_core::types::{
    BatchInsert, DeliverySettings, DeliveryState, DeliveryStatus, NewOutboxMessage,
    OutboxMessage, SendRecord, Subscription, VocabularyWord,
};
use wordcast_core::{
    AdapterType, Category, HealthStatus, PluginAdapter, StorageAdapter, WordcastError,
};

use crate::database::{Database, map_tr_err};
use crate::queries;

/// SQLite-backed storage adapter.
///
/// The database is opened by [`StorageAdapter::initialize`]; every other
/// call fails with a storage error until then.
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    fn db(&self) -> Result<&Database, WordcastError> {
        self.db.get().ok_or_else(|| WordcastError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }

    async fn checkpoint(db: &Database) -> Result<(), WordcastError> {
        db.connection()
            .call(|conn| conn.query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(())))
            .await
            .map_err(map_tr_err)
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, WordcastError> {
        self.db()?
            .connection()
            .call(|conn| conn.query_row("SELECT 1", [], |_| Ok(())))
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), WordcastError> {
        if let Some(db) = self.db.get() {
            Self::checkpoint(db).await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), WordcastError> {
        let db = Database::open_with(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| WordcastError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), WordcastError> {
        Self::checkpoint(self.db()?).await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    // --- Word catalog ---

    async fn upsert_word(&self, word: &VocabularyWord) -> Result<(), WordcastError> {
        queries::words::upsert_word(self.db()?, word).await
    }

    async fn get_word(&self, id: &str) -> Result<Option<VocabularyWord>, WordcastError> {
        queries::words::get_word(self.db()?, id).await
    }

    async fn find_unsent_words(
        &self,
        user_id: &str,
        category: Category,
        limit: u32,
    ) -> Result<Vec<VocabularyWord>, WordcastError> {
        queries::words::find_unsent_words(self.db()?, user_id, category, limit).await
    }

    async fn count_words(&self, category: Category) -> Result<i64, WordcastError> {
        queries::words::count_words(self.db()?, category).await
    }

    // --- Send history ledger ---

    async fn record_sent(&self, record: &SendRecord) -> Result<bool, WordcastError> {
        queries::ledger::record_sent(self.db()?, record).await
    }

    async fn has_been_sent(
        &self,
        user_id: &str,
        word_id: &str,
        category: Category,
    ) -> Result<bool, WordcastError> {
        queries::ledger::has_been_sent(self.db()?, user_id, word_id, category).await
    }

    async fn sent_word_ids(
        &self,
        user_id: &str,
        category: Category,
    ) -> Result<Vec<String>, WordcastError> {
        queries::ledger::sent_word_ids(self.db()?, user_id, category).await
    }

    // --- Delivery settings ---

    async fn get_delivery_settings(
        &self,
        user_id: &str,
    ) -> Result<Option<DeliverySettings>, WordcastError> {
        queries::settings::get_delivery_settings(self.db()?, user_id).await
    }

    async fn put_delivery_settings(
        &self,
        settings: &DeliverySettings,
    ) -> Result<(), WordcastError> {
        queries::settings::put_delivery_settings(self.db()?, settings).await
    }

    // --- Subscriptions ---

    async fn upsert_subscription(&self, subscription: &Subscription) -> Result<(), WordcastError> {
        queries::subscriptions::upsert_subscription(self.db()?, subscription).await
    }

    async fn list_active_subscriptions(&self) -> Result<Vec<Subscription>, WordcastError> {
        queries::subscriptions::list_active_subscriptions(self.db()?).await
    }

    // --- Outbox ---

    async fn create_outbox_batch(
        &self,
        user_id: &str,
        date: NaiveDate,
        messages: Vec<NewOutboxMessage>,
    ) -> Result<BatchInsert, WordcastError> {
        queries::outbox::create_outbox_batch(self.db()?, user_id, date, messages).await
    }

    async fn outbox_for_day(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<OutboxMessage>, WordcastError> {
        queries::outbox::outbox_for_day(self.db()?, user_id, date).await
    }

    async fn claim_due_outbox(
        &self,
        now: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<OutboxMessage>, WordcastError> {
        queries::outbox::claim_due_outbox(self.db()?, now, limit).await
    }

    async fn complete_outbox_sent(
        &self,
        id: i64,
        claim_token: &str,
        channel_message_id: &str,
        status: DeliveryStatus,
        sent_at: DateTime<Utc>,
    ) -> Result<bool, WordcastError> {
        queries::outbox::complete_outbox_sent(
            self.db()?,
            id,
            claim_token,
            channel_message_id,
            status,
            sent_at,
        )
        .await
    }

    async fn record_channel_message_id(
        &self,
        id: i64,
        channel_message_id: &str,
    ) -> Result<bool, WordcastError> {
        queries::outbox::record_channel_message_id(self.db()?, id, channel_message_id).await
    }

    async fn complete_outbox_failed(
        &self,
        id: i64,
        claim_token: &str,
        error: &str,
    ) -> Result<bool, WordcastError> {
        queries::outbox::complete_outbox_failed(self.db()?, id, claim_token, error).await
    }

    async fn apply_delivery_status(
        &self,
        channel_message_id: &str,
        status: DeliveryStatus,
    ) -> Result<bool, WordcastError> {
        queries::outbox::apply_delivery_status(self.db()?, channel_message_id, status).await
    }

    async fn fail_stale_claims(
        &self,
        claimed_before: DateTime<Utc>,
    ) -> Result<usize, WordcastError> {
        queries::outbox::fail_stale_claims(self.db()?, claimed_before).await
    }

    async fn get_outbox_message(&self, id: i64) -> Result<Option<OutboxMessage>, WordcastError> {
        queries::outbox::get_outbox_message(self.db()?, id).await
    }

    async fn list_outbox(
        &self,
        state: Option<DeliveryState>,
        limit: u32,
    ) -> Result<Vec<OutboxMessage>, WordcastError> {
        queries::outbox::list_outbox(self.db()?, state, limit).await
    }

    async fn outbox_state_counts(&self) -> Result<Vec<(DeliveryState, i64)>, WordcastError> {
        queries::outbox::outbox_state_counts(self.db()?).await
    }
}
