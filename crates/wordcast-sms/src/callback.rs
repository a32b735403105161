// SPDX-FileCopyrightText: 2026 Wordcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Twilio status callbacks.

use serde::Deserialize;
use wordcast_core::types::{DeliveryStatus, DeliveryUpdate};

/// The fields of a status callback form this service reads. Twilio sends
/// many more; they are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusCallback {
    #[serde(rename = "MessageSid")]
    pub message_sid: String,
    #[serde(rename = "MessageStatus")]
    pub message_status: String,
    #[serde(rename = "ErrorCode", default)]
    pub error_code: Option<String>,
}

/// Map a callback to an outbox update. `None` for statuses not tracked
/// (e.g. `receiving`, `scheduled`, `canceled`).
pub fn status_update(callback: &StatusCallback) -> Option<DeliveryUpdate> {
    let status = callback.message_status.parse::<DeliveryStatus>().ok()?;
    Some(DeliveryUpdate {
        channel_message_id: callback.message_sid.clone(),
        status,
    })
}
