// SPDX-FileCopyrightText: 2026 Wordcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scheduling and dispatch for the Wordcast daily-word pipeline.
//!
//! - [`SettingsResolver`] reads a user's delivery settings and computes slot times.
//! - [`DailyScheduler`] writes one day's batch of pending outbox rows per user.
//! - [`OutboxDispatcher`] claims due rows and sends them through a channel.
//! - [`ScheduleRunner`] drives both on timers for the long-running service.

pub mod daily;
pub mod dispatch;
pub mod resolver;
pub mod runner;
pub mod slots;
pub mod template;

#[cfg(test)]
mod testing;

pub use daily::{DailyScheduler, ScheduleEntry, ScheduleRunReport, ScheduledBatch};
pub use dispatch::{DispatchReport, OutboxDispatcher};
pub use resolver::{ResolvedSettings, SettingsResolver};
pub use runner::ScheduleRunner;
