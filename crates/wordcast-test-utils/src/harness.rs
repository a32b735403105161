// SPDX-FileCopyrightText: 2026 Wordcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end pipeline tests.
//!
//! `TestHarness` assembles the whole pipeline against a temp SQLite database
//! and a [`MockChannel`]: storage, scheduler, and dispatcher share one
//! storage handle, exactly as the binary wires them.

use std::sync::Arc;

use chrono::NaiveTime;

use wordcast_config::model::{DispatchConfig, ScheduleConfig, StorageConfig, WordcastConfig};
use wordcast_core::types::{DeliverySettings, ScheduleMode, Subscription, VocabularyWord};
use wordcast_core::{Category, StorageAdapter, WordcastError};
use wordcast_scheduler::{DailyScheduler, OutboxDispatcher};
use wordcast_storage::SqliteStorage;

use crate::mock_channel::MockChannel;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    schedule: ScheduleConfig,
    dispatch: DispatchConfig,
    words: Vec<(Category, usize)>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            schedule: ScheduleConfig::default(),
            dispatch: DispatchConfig::default(),
            words: Vec::new(),
        }
    }

    /// Seed `count` words into `category` at build time.
    pub fn with_words(mut self, category: Category, count: usize) -> Self {
        self.words.push((category, count));
        self
    }

    pub fn with_schedule_config(mut self, schedule: ScheduleConfig) -> Self {
        self.schedule = schedule;
        self
    }

    pub fn with_dispatch_config(mut self, dispatch: DispatchConfig) -> Self {
        self.dispatch = dispatch;
        self
    }

    /// Build the harness, creating the temp database and all components.
    pub async fn build(self) -> Result<TestHarness, WordcastError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| WordcastError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("test.db");

        let storage_config = StorageConfig {
            database_path: db_path.to_string_lossy().to_string(),
            wal_mode: true,
        };
        let storage = SqliteStorage::new(storage_config.clone());
        storage.initialize().await?;
        let storage: Arc<dyn StorageAdapter> = Arc::new(storage);

        let channel = Arc::new(MockChannel::new());
        let scheduler = Arc::new(DailyScheduler::new(storage.clone(), &self.schedule)?);
        let dispatcher = Arc::new(OutboxDispatcher::new(
            storage.clone(),
            channel.clone(),
            &self.dispatch,
        ));

        let config = WordcastConfig {
            storage: storage_config,
            schedule: self.schedule,
            dispatch: self.dispatch,
            ..WordcastConfig::default()
        };

        let harness = TestHarness {
            storage,
            channel,
            scheduler,
            dispatcher,
            config,
            _temp_dir: temp_dir,
        };
        for (category, count) in self.words {
            harness.seed_words(category, count).await?;
        }
        Ok(harness)
    }
}

/// A complete pipeline with temp storage and a mock channel.
pub struct TestHarness {
    /// SQLite storage adapter (temp DB, cleaned up on drop).
    pub storage: Arc<dyn StorageAdapter>,
    pub channel: Arc<MockChannel>,
    pub scheduler: Arc<DailyScheduler>,
    pub dispatcher: Arc<OutboxDispatcher>,
    pub config: WordcastConfig,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Append `count` words to `category`, returning their ids in catalog order.
    ///
    /// Ids continue from the words already in the category, so repeated calls
    /// never collide.
    pub async fn seed_words(
        &self,
        category: Category,
        count: usize,
    ) -> Result<Vec<String>, WordcastError> {
        let start = self.storage.count_words(category).await? as usize;
        let mut ids = Vec::with_capacity(count);
        for i in start..start + count {
            let word = VocabularyWord {
                id: format!("{category}-{i:04}"),
                word: format!("{}-word-{i}", category.topic),
                definition: format!("definition of word {i}"),
                example: format!("An example using word {i}."),
                category,
                part_of_speech: "noun".to_string(),
                memory_hook: (i % 2 == 0).then(|| format!("hook {i}")),
                pronunciation: None,
            };
            self.storage.upsert_word(&word).await?;
            ids.push(word.id);
        }
        Ok(ids)
    }

    /// Store delivery settings and an active subscription for a user.
    ///
    /// Empty `custom_times` means auto mode. Times are `HH:MM`.
    pub async fn add_user(
        &self,
        user_id: &str,
        phone_number: &str,
        category: Category,
        words_per_day: u32,
        custom_times: &[&str],
    ) -> Result<(), WordcastError> {
        let custom_times = custom_times
            .iter()
            .map(|t| {
                NaiveTime::parse_from_str(t, "%H:%M")
                    .map_err(|e| WordcastError::Validation(format!("bad slot time `{t}`: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let mode = if custom_times.is_empty() {
            ScheduleMode::Auto
        } else {
            ScheduleMode::Custom
        };
        self.storage
            .put_delivery_settings(&DeliverySettings {
                user_id: user_id.to_string(),
                words_per_day,
                mode,
                custom_times,
                utc_offset_minutes: None,
            })
            .await?;
        self.storage
            .upsert_subscription(&Subscription {
                user_id: user_id.to_string(),
                phone_number: phone_number.to_string(),
                category,
                active: true,
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category() -> Category {
        "academic-intermediate".parse().unwrap()
    }

    #[tokio::test]
    async fn builder_seeds_requested_words() {
        let harness = TestHarness::builder()
            .with_words(category(), 7)
            .build()
            .await
            .unwrap();
        assert_eq!(harness.storage.count_words(category()).await.unwrap(), 7);
    }

    #[tokio::test]
    async fn repeated_seeding_appends() {
        let harness = TestHarness::builder()
            .with_words(category(), 2)
            .build()
            .await
            .unwrap();
        let more = harness.seed_words(category(), 2).await.unwrap();
        assert_eq!(more, vec![
            "academic-intermediate-0002".to_string(),
            "academic-intermediate-0003".to_string(),
        ]);
        assert_eq!(harness.storage.count_words(category()).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn add_user_stores_settings_and_subscription() {
        let harness = TestHarness::builder().build().await.unwrap();
        harness
            .add_user("u1", "+15550001111", category(), 2, &["08:00", "19:30"])
            .await
            .unwrap();
        let settings = harness
            .storage
            .get_delivery_settings("u1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(settings.mode, ScheduleMode::Custom);
        assert_eq!(settings.custom_times.len(), 2);
        assert_eq!(harness.storage.list_active_subscriptions().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn add_user_rejects_bad_times() {
        let harness = TestHarness::builder().build().await.unwrap();
        let err = harness
            .add_user("u1", "+1", category(), 1, &["25:00"])
            .await
            .unwrap_err();
        assert!(matches!(err, WordcastError::Validation(_)));
    }

    #[tokio::test]
    async fn temp_db_is_unique_per_harness() {
        let h1 = TestHarness::builder().with_words(category(), 1).build().await.unwrap();
        let h2 = TestHarness::builder().build().await.unwrap();
        assert_eq!(h1.storage.count_words(category()).await.unwrap(), 1);
        assert_eq!(h2.storage.count_words(category()).await.unwrap(), 0);
    }
}
