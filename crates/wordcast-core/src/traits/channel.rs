// SPDX-FileCopyrightText: 2026 Wordcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel adapter trait for outbound messaging providers (WhatsApp, SMS).

use async_trait::async_trait;

use crate::error::WordcastError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ChannelReceipt, OutboundMessage};

/// Adapter for delivering rendered messages through an external provider.
///
/// A returned receipt whose status is not a success status, and any error,
/// are both treated by the dispatcher as a failed delivery.
#[async_trait]
pub trait ChannelAdapter: PluginAdapter {
    /// Sends one message and returns the provider's id and status for it.
    async fn send(&self, msg: OutboundMessage) -> Result<ChannelReceipt, WordcastError>;
}
