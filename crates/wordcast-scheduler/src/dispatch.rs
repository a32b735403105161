// SPDX-FileCopyrightText: 2026 Wordcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbox dispatcher: the sweep that sends due messages.
//!
//! Each sweep claims due `pending` rows with one conditional update, so two
//! overlapping sweeps never hold the same row. Every claimed row then ends in
//! exactly one terminal state. A failure on one row never stops the others;
//! only a storage failure while claiming aborts the sweep.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::StreamExt;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use wordcast_config::model::DispatchConfig;
use wordcast_core::types::{ChannelReceipt, OutboundMessage, OutboxMessage};
use wordcast_core::{ChannelAdapter, StorageAdapter, WordcastError};

use crate::template;

/// Failure reason recorded for messages past their staleness cutoff.
pub const EXPIRED: &str = "expired";

/// Counts from one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchReport {
    /// Rows claimed by this sweep.
    pub processed: usize,
    pub sent: usize,
    pub failed: usize,
    /// Claimed rows failed without a send because they were too old.
    pub expired: usize,
    /// Rows from crashed sweeps moved out of `processing`.
    pub reclaimed: usize,
    /// Rows whose completion could not be written. They stay in
    /// `processing` until the claim timeout fails them.
    pub unresolved: usize,
}

enum Outcome {
    Sent,
    Failed,
    Expired,
    Unresolved,
}

/// Sends due outbox rows through a channel.
pub struct OutboxDispatcher {
    storage: Arc<dyn StorageAdapter>,
    channel: Arc<dyn ChannelAdapter>,
    send_timeout: Duration,
    batch_limit: u32,
    concurrency: usize,
    stale_after: Option<chrono::Duration>,
    claim_timeout: chrono::Duration,
}

impl OutboxDispatcher {
    pub fn new(
        storage: Arc<dyn StorageAdapter>,
        channel: Arc<dyn ChannelAdapter>,
        config: &DispatchConfig,
    ) -> Self {
        Self {
            storage,
            channel,
            send_timeout: Duration::from_secs(config.send_timeout_secs),
            batch_limit: config.batch_limit,
            concurrency: config.concurrency.max(1),
            stale_after: config
                .stale_after_minutes
                .map(|m| chrono::Duration::minutes(m as i64)),
            claim_timeout: chrono::Duration::minutes(config.claim_timeout_minutes as i64),
        }
    }

    /// Run one sweep over rows due at or before `now`.
    pub async fn dispatch_due(&self, now: DateTime<Utc>) -> Result<DispatchReport, WordcastError> {
        let mut report = DispatchReport {
            reclaimed: self.storage.fail_stale_claims(now - self.claim_timeout).await?,
            ..DispatchReport::default()
        };
        if report.reclaimed > 0 {
            warn!(count = report.reclaimed, "failed outbox rows with expired claims");
        }

        let claimed = self.storage.claim_due_outbox(now, self.batch_limit).await?;
        report.processed = claimed.len();
        if claimed.is_empty() {
            debug!("no due outbox rows");
            return Ok(report);
        }

        let outcomes: Vec<Outcome> = futures::stream::iter(claimed)
            .map(|msg| self.dispatch_one(msg, now))
            .buffer_unordered(self.concurrency)
            .collect()
            .await;
        for outcome in outcomes {
            match outcome {
                Outcome::Sent => report.sent += 1,
                Outcome::Failed => report.failed += 1,
                Outcome::Expired => report.expired += 1,
                Outcome::Unresolved => report.unresolved += 1,
            }
        }

        info!(
            processed = report.processed,
            sent = report.sent,
            failed = report.failed,
            expired = report.expired,
            unresolved = report.unresolved,
            "dispatch sweep complete"
        );
        Ok(report)
    }

    async fn dispatch_one(&self, msg: OutboxMessage, now: DateTime<Utc>) -> Outcome {
        let Some(token) = msg.claim_token.clone() else {
            error!(outbox_id = msg.id, "claimed row has no claim token");
            return Outcome::Unresolved;
        };

        if self.is_stale(&msg, now) {
            info!(outbox_id = msg.id, scheduled_at = %msg.scheduled_at, "message expired before send");
            return match self.fail(&msg, &token, EXPIRED).await {
                Outcome::Failed => Outcome::Expired,
                other => other,
            };
        }

        let outbound = OutboundMessage {
            destination: msg.destination.clone(),
            body: template::render(msg.template, &msg.vars),
            template_id: Some(msg.template.to_string()),
            template_params: template::template_params(msg.template, &msg.vars),
        };

        match self.send(outbound).await {
            Ok(receipt) => self.complete(&msg, &token, receipt).await,
            Err(reason) => {
                warn!(outbox_id = msg.id, user_id = %msg.user_id, %reason, "dispatch failed");
                self.fail(&msg, &token, &reason).await
            }
        }
    }

    fn is_stale(&self, msg: &OutboxMessage, now: DateTime<Utc>) -> bool {
        self.stale_after
            .is_some_and(|limit| now - msg.scheduled_at > limit)
    }

    /// Send with the configured timeout; any non-success becomes a reason string.
    async fn send(&self, outbound: OutboundMessage) -> Result<ChannelReceipt, String> {
        match tokio::time::timeout(self.send_timeout, self.channel.send(outbound)).await {
            Ok(Ok(receipt)) if receipt.status.is_success() => Ok(receipt),
            Ok(Ok(receipt)) => Err(format!(
                "channel reported status {} for message {}",
                receipt.status, receipt.id
            )),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(WordcastError::Timeout {
                duration: self.send_timeout,
            }
            .to_string()),
        }
    }

    async fn complete(&self, msg: &OutboxMessage, token: &str, receipt: ChannelReceipt) -> Outcome {
        match self
            .storage
            .complete_outbox_sent(msg.id, token, &receipt.id, receipt.status, Utc::now())
            .await
        {
            Ok(true) => {
                debug!(
                    outbox_id = msg.id,
                    channel_message_id = %receipt.id,
                    status = %receipt.status,
                    "message sent"
                );
                Outcome::Sent
            }
            Ok(false) => {
                error!(outbox_id = msg.id, channel_message_id = %receipt.id, "sent but claim was lost");
                self.keep_receipt_id(msg, &receipt).await;
                Outcome::Unresolved
            }
            Err(e) => {
                error!(outbox_id = msg.id, channel_message_id = %receipt.id, error = %e, "sent but completion failed");
                self.keep_receipt_id(msg, &receipt).await;
                Outcome::Unresolved
            }
        }
    }

    /// Best effort: leave the provider id on the row so delivery callbacks
    /// can still be matched.
    async fn keep_receipt_id(&self, msg: &OutboxMessage, receipt: &ChannelReceipt) {
        match self
            .storage
            .record_channel_message_id(msg.id, &receipt.id)
            .await
        {
            Ok(true) => {}
            Ok(false) => warn!(outbox_id = msg.id, channel_message_id = %receipt.id, "row already has a channel message id"),
            Err(e) => error!(outbox_id = msg.id, channel_message_id = %receipt.id, error = %e, "failed to keep channel message id"),
        }
    }

    async fn fail(&self, msg: &OutboxMessage, token: &str, reason: &str) -> Outcome {
        match self.storage.complete_outbox_failed(msg.id, token, reason).await {
            Ok(true) => Outcome::Failed,
            Ok(false) => {
                error!(outbox_id = msg.id, "claim lost before failure was recorded");
                Outcome::Unresolved
            }
            Err(e) => {
                error!(outbox_id = msg.id, error = %e, "failed to record dispatch failure");
                Outcome::Unresolved
            }
        }
    }
}
