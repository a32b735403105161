// SPDX-FileCopyrightText: 2026 Wordcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Wordcast service.

use thiserror::Error;

/// The primary error type used across all Wordcast adapter traits and core operations.
#[derive(Debug, Error)]
pub enum WordcastError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Messaging channel errors (HTTP failure, provider rejection, bad response).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The user has no usable delivery settings. The user is skipped, not retried.
    #[error("user {user_id} is not configured for delivery: {reason}")]
    NotConfigured { user_id: String, reason: String },

    /// Every word in the category has already been sent to the user.
    #[error("no unsent words left for user {user_id} in category {category}")]
    NoWordsAvailable { user_id: String, category: String },

    /// A concurrent scheduling run already wrote the batch for this user and day.
    #[error("schedule for user {user_id} on {date} was written concurrently")]
    ConcurrencyConflict { user_id: String, date: String },

    /// Input rejected at the boundary (bad category, bad slot time, bounds).
    #[error("validation error: {0}")]
    Validation(String),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl WordcastError {
    /// Returns `true` for outcomes scoped to a single user or message.
    ///
    /// Batch runs record these and move on. Anything else is an infrastructure
    /// failure and may abort the surrounding sweep.
    pub fn is_user_scoped(&self) -> bool {
        matches!(
            self,
            WordcastError::NotConfigured { .. }
                | WordcastError::NoWordsAvailable { .. }
                | WordcastError::ConcurrencyConflict { .. }
                | WordcastError::Channel { .. }
                | WordcastError::Validation(_)
                | WordcastError::Timeout { .. }
        )
    }

    /// Shorthand for a channel error without an underlying source.
    pub fn channel(message: impl Into<String>) -> Self {
        WordcastError::Channel {
            message: message.into(),
            source: None,
        }
    }
}
