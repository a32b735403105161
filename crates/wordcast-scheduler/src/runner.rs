// SPDX-FileCopyrightText: 2026 Wordcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Periodic driver for `serve`: dispatch sweeps on an interval and one
//! scheduling run per day.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, NaiveTime, Utc};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::daily::DailyScheduler;
use crate::dispatch::OutboxDispatcher;

pub struct ScheduleRunner {
    scheduler: Arc<DailyScheduler>,
    dispatcher: Arc<OutboxDispatcher>,
    dispatch_interval: Duration,
    run_time: NaiveTime,
    offset: FixedOffset,
}

impl ScheduleRunner {
    pub fn new(
        scheduler: Arc<DailyScheduler>,
        dispatcher: Arc<OutboxDispatcher>,
        dispatch_interval: Duration,
        run_time: NaiveTime,
    ) -> Self {
        let offset = scheduler.resolver().service_offset();
        Self {
            scheduler,
            dispatcher,
            dispatch_interval,
            run_time,
            offset,
        }
    }

    /// Run until `cancel` fires.
    ///
    /// Schedules today's batches once at startup so a restart after the daily
    /// run time does not skip a day, then sweeps the outbox every interval.
    pub async fn run(&self, cancel: CancellationToken) {
        self.run_schedule().await;

        let mut sweep = tokio::time::interval(self.dispatch_interval);
        sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let until_daily = until_next_run(Utc::now(), self.run_time, self.offset);
            tokio::select! {
                _ = sweep.tick() => {
                    if let Err(e) = self.dispatcher.dispatch_due(Utc::now()).await {
                        warn!(error = %e, "dispatch sweep failed");
                    }
                }
                _ = tokio::time::sleep(until_daily) => {
                    self.run_schedule().await;
                }
                _ = cancel.cancelled() => {
                    info!("schedule runner stopping");
                    break;
                }
            }
        }
    }

    async fn run_schedule(&self) {
        match self.scheduler.schedule_all(None).await {
            Ok(report) => debug!(scheduled = report.scheduled, "daily scheduling run finished"),
            Err(e) => warn!(error = %e, "daily scheduling run failed"),
        }
    }
}

/// Time from `now` until the next `run_time` in `offset`, strictly in the future.
pub fn until_next_run(now: DateTime<Utc>, run_time: NaiveTime, offset: FixedOffset) -> Duration {
    let local = now.with_timezone(&offset).naive_local();
    let today = local.date().and_time(run_time);
    let next = if today > local {
        today
    } else {
        today + chrono::Duration::days(1)
    };
    (next - local).to_std().unwrap_or_default()
}
