// SPDX-FileCopyrightText: 2026 Wordcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook handling: the subscription handshake and delivery statuses.

use std::str::FromStr;

use tracing::debug;
use wordcast_core::types::{DeliveryStatus, DeliveryUpdate};

use crate::types::{VerifyParams, WebhookPayload};

/// Answer the `GET` verification handshake.
///
/// Returns the challenge to echo back when the mode is `subscribe` and the
/// token matches. An unset local token rejects every request.
pub fn verify_subscription(params: &VerifyParams, expected_token: Option<&str>) -> Option<String> {
    let expected = expected_token.filter(|t| !t.is_empty())?;
    if params.mode.as_deref() != Some("subscribe") {
        return None;
    }
    if params.verify_token.as_deref() != Some(expected) {
        return None;
    }
    params.challenge.clone()
}

/// Pull delivery-status updates out of a notification.
///
/// Inbound messages and statuses this service does not track are ignored.
pub fn status_updates(payload: &WebhookPayload) -> Vec<DeliveryUpdate> {
    payload
        .entry
        .iter()
        .flat_map(|entry| &entry.changes)
        .flat_map(|change| &change.value.statuses)
        .filter_map(|s| match DeliveryStatus::from_str(&s.status) {
            Ok(status) => Some(DeliveryUpdate {
                channel_message_id: s.id.clone(),
                status,
            }),
            Err(_) => {
                debug!(status = %s.status, id = %s.id, "ignoring unknown WhatsApp status");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(mode: &str, token: &str) -> VerifyParams {
        VerifyParams {
            mode: Some(mode.into()),
            verify_token: Some(token.into()),
            challenge: Some("1158201444".into()),
        }
    }

    #[test]
    fn handshake_echoes_challenge_on_match() {
        assert_eq!(
            verify_subscription(&params("subscribe", "s3cret"), Some("s3cret")),
            Some("1158201444".to_string())
        );
    }

    #[test]
    fn handshake_rejects_mismatch_and_unset_token() {
        assert!(verify_subscription(&params("subscribe", "wrong"), Some("s3cret")).is_none());
        assert!(verify_subscription(&params("unsubscribe", "s3cret"), Some("s3cret")).is_none());
        assert!(verify_subscription(&params("subscribe", ""), None).is_none());
        assert!(verify_subscription(&params("subscribe", ""), Some("")).is_none());
    }

    #[test]
    fn statuses_are_extracted_across_entries() {
        let payload: WebhookPayload = serde_json::from_value(serde_json::json!({
            "object": "whatsapp_business_account",
            "entry": [
                {
                    "id": "102290129340398",
                    "changes": [{
                        "field": "messages",
                        "value": {
                            "messaging_product": "whatsapp",
                            "statuses": [
                                {"id": "wamid.A", "status": "delivered", "timestamp": "1750000000", "recipient_id": "15551234567"},
                                {"id": "wamid.B", "status": "read", "timestamp": "1750000001", "recipient_id": "15551234567"}
                            ]
                        }
                    }]
                },
                {
                    "id": "102290129340398",
                    "changes": [{
                        "field": "messages",
                        "value": {
                            "statuses": [
                                {"id": "wamid.C", "status": "failed", "errors": [{"code": 131026, "message": "Message undeliverable"}]},
                                {"id": "wamid.D", "status": "deleted"}
                            ]
                        }
                    }]
                }
            ]
        }))
        .unwrap();

        let updates = status_updates(&payload);
        assert_eq!(
            updates,
            vec![
                DeliveryUpdate { channel_message_id: "wamid.A".into(), status: DeliveryStatus::Delivered },
                DeliveryUpdate { channel_message_id: "wamid.B".into(), status: DeliveryStatus::Read },
                DeliveryUpdate { channel_message_id: "wamid.C".into(), status: DeliveryStatus::Failed },
            ]
        );
    }

    #[test]
    fn inbound_message_notifications_yield_nothing() {
        let payload: WebhookPayload = serde_json::from_value(serde_json::json!({
            "object": "whatsapp_business_account",
            "entry": [{"changes": [{"field": "messages", "value": {"messages": [{"from": "1555", "text": {"body": "hi"}}]}}]}]
        }))
        .unwrap();
        assert!(status_updates(&payload).is_empty());
    }
}
