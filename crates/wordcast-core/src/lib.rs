// SPDX-FileCopyrightText: 2026 Wordcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Wordcast daily-word service.
//!
//! This crate provides the domain types, error taxonomy, and adapter traits
//! shared by the storage, scheduling, channel, and gateway crates.

pub mod category;
pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use category::{Category, Difficulty, Topic};
pub use error::WordcastError;
pub use types::{AdapterType, HealthStatus};

// Re-export all adapter traits at crate root.
pub use traits::{ChannelAdapter, PluginAdapter, StorageAdapter};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_scoped_errors_are_classified() {
        let not_configured = WordcastError::NotConfigured {
            user_id: "u1".into(),
            reason: "no settings".into(),
        };
        let no_words = WordcastError::NoWordsAvailable {
            user_id: "u1".into(),
            category: "exam-advanced".into(),
        };
        let conflict = WordcastError::ConcurrencyConflict {
            user_id: "u1".into(),
            date: "2026-03-01".into(),
        };
        assert!(not_configured.is_user_scoped());
        assert!(no_words.is_user_scoped());
        assert!(conflict.is_user_scoped());
        assert!(WordcastError::channel("503").is_user_scoped());
        assert!(
            WordcastError::Timeout {
                duration: std::time::Duration::from_secs(5)
            }
            .is_user_scoped()
        );
    }

    #[test]
    fn infrastructure_errors_are_not_user_scoped() {
        let storage = WordcastError::Storage {
            source: Box::new(std::io::Error::other("disk gone")),
        };
        assert!(!storage.is_user_scoped());
        assert!(!WordcastError::Internal("bug".into()).is_user_scoped());
        assert!(!WordcastError::Config("bad".into()).is_user_scoped());
    }

    #[test]
    fn error_messages_name_the_user() {
        let err = WordcastError::NoWordsAvailable {
            user_id: "user-42".into(),
            category: "business-beginner".into(),
        };
        let text = err.to_string();
        assert!(text.contains("user-42"));
        assert!(text.contains("business-beginner"));
    }

    #[test]
    fn adapter_type_round_trips_through_strings() {
        use std::str::FromStr;
        for variant in [AdapterType::Channel, AdapterType::Storage] {
            let parsed = AdapterType::from_str(&variant.to_string()).unwrap();
            assert_eq!(parsed, variant);
        }
    }

    #[test]
    fn all_traits_are_exported() {
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_channel_adapter<T: ChannelAdapter>() {}
        fn _assert_storage_adapter<T: StorageAdapter>() {}
    }
}
