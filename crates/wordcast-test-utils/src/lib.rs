// SPDX-FileCopyrightText: 2026 Wordcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Wordcast integration tests.
//!
//! Provides a mock channel and a harness wired to a temp SQLite database for
//! fast, deterministic tests without external services.
//!
//! # Components
//!
//! - [`MockChannel`] - Mock messaging channel with send capture and scripted outcomes
//! - [`TestHarness`] - Storage, scheduler, and dispatcher over a temp database

pub mod harness;
pub mod mock_channel;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_channel::MockChannel;
