// SPDX-FileCopyrightText: 2026 Wordcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock channel adapter for deterministic testing.
//!
//! `MockChannel` implements `ChannelAdapter`, captures every message passed
//! to `send()`, and can be scripted to fail, reject, or stall per destination.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use wordcast_core::types::{
    AdapterType, ChannelReceipt, DeliveryStatus, HealthStatus, OutboundMessage,
};
use wordcast_core::{ChannelAdapter, PluginAdapter, WordcastError};

/// A mock messaging channel for testing.
///
/// Unscripted sends succeed with status `accepted` and a unique
/// `mock-<uuid>` message id.
pub struct MockChannel {
    sent: Arc<Mutex<Vec<OutboundMessage>>>,
    receipts: Arc<Mutex<Vec<ChannelReceipt>>>,
    failing: Arc<Mutex<HashSet<String>>>,
    rejecting: Arc<Mutex<HashSet<String>>>,
    delay: Arc<Mutex<Option<Duration>>>,
}

impl MockChannel {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            receipts: Arc::new(Mutex::new(Vec::new())),
            failing: Arc::new(Mutex::new(HashSet::new())),
            rejecting: Arc::new(Mutex::new(HashSet::new())),
            delay: Arc::new(Mutex::new(None)),
        }
    }

    /// Make every send to `destination` return a channel error.
    pub async fn fail_destination(&self, destination: &str) {
        self.failing.lock().await.insert(destination.to_string());
    }

    /// Make every send to `destination` come back with status `rejected`.
    pub async fn reject_destination(&self, destination: &str) {
        self.rejecting.lock().await.insert(destination.to_string());
    }

    /// Hold every send for `delay` before answering.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.lock().await = Some(delay);
    }

    /// All messages passed to `send()`, including failed ones.
    pub async fn sent_messages(&self) -> Vec<OutboundMessage> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    /// Receipts returned by successful sends, in call order.
    pub async fn receipts(&self) -> Vec<ChannelReceipt> {
        self.receipts.lock().await.clone()
    }

    pub async fn clear_sent(&self) {
        self.sent.lock().await.clear();
        self.receipts.lock().await.clear();
    }
}

impl Default for MockChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockChannel {
    fn name(&self) -> &str {
        "mock-channel"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, WordcastError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), WordcastError> {
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for MockChannel {
    async fn send(&self, msg: OutboundMessage) -> Result<ChannelReceipt, WordcastError> {
        let delay = *self.delay.lock().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let destination = msg.destination.clone();
        self.sent.lock().await.push(msg);

        if self.failing.lock().await.contains(&destination) {
            return Err(WordcastError::channel(format!(
                "mock failure for {destination}"
            )));
        }
        let status = if self.rejecting.lock().await.contains(&destination) {
            DeliveryStatus::Rejected
        } else {
            DeliveryStatus::Accepted
        };
        let receipt = ChannelReceipt {
            id: format!("mock-{}", uuid::Uuid::new_v4()),
            status,
        };
        self.receipts.lock().await.push(receipt.clone());
        Ok(receipt)
    }
}
