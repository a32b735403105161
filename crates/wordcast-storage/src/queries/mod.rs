// SPDX-FileCopyrightText: 2026 Wordcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules, one per table group. Each function takes `&Database`.

pub mod ledger;
pub mod outbox;
pub mod settings;
pub mod subscriptions;
pub mod words;
