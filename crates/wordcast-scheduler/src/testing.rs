// SPDX-FileCopyrightText: 2026 Wordcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fixtures shared by this crate's unit tests.

use std::sync::Arc;

use tempfile::TempDir;

use wordcast_config::model::StorageConfig;
use wordcast_core::types::VocabularyWord;
use wordcast_core::{Category, StorageAdapter};
use wordcast_storage::SqliteStorage;

pub async fn open_storage() -> (Arc<dyn StorageAdapter>, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let storage = SqliteStorage::new(StorageConfig {
        database_path: dir.path().join("sched.db").to_str().unwrap().to_string(),
        wal_mode: true,
    });
    storage.initialize().await.unwrap();
    let storage: Arc<dyn StorageAdapter> = Arc::new(storage);
    (storage, dir)
}

/// Insert `n` words into `category`, returning their ids in catalog order.
pub async fn seed_words(storage: &Arc<dyn StorageAdapter>, category: Category, n: usize) -> Vec<String> {
    let mut ids = Vec::with_capacity(n);
    for i in 0..n {
        let id = format!("{category}-{i:03}");
        storage
            .upsert_word(&VocabularyWord {
                id: id.clone(),
                word: format!("word{i}"),
                definition: format!("definition {i}"),
                example: format!("example {i}"),
                category,
                part_of_speech: "noun".into(),
                memory_hook: None,
                pronunciation: None,
            })
            .await
            .unwrap();
        ids.push(id);
    }
    ids
}
