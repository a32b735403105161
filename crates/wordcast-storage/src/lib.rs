// SPDX-FileCopyrightText: 2026 Wordcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Wordcast daily-word service.
//!
//! Holds the word catalog, the send history ledger, delivery settings,
//! subscriptions, and the outbox behind a single `tokio-rusqlite` connection,
//! with schema managed by embedded refinery migrations.

pub mod adapter;
pub mod database;
pub mod migrations;
mod models;
pub mod queries;

pub use adapter::SqliteStorage;
pub use database::Database;
