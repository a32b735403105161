// SPDX-FileCopyrightText: 2026 Wordcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SMS channel for the Wordcast service, backed by the Twilio Messages API.
//!
//! SMS has no approved-template concept, so the rendered body is always sent
//! and the template parameters are ignored.

pub mod callback;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use wordcast_config::model::SmsConfig;
use wordcast_core::types::{
    AdapterType, ChannelReceipt, DeliveryStatus, HealthStatus, OutboundMessage,
};
use wordcast_core::{ChannelAdapter, PluginAdapter, WordcastError};

pub use callback::{StatusCallback, status_update};

#[derive(Debug, Serialize)]
struct CreateMessage<'a> {
    #[serde(rename = "To")]
    to: &'a str,
    #[serde(rename = "From")]
    from: &'a str,
    #[serde(rename = "Body")]
    body: &'a str,
    #[serde(rename = "StatusCallback", skip_serializing_if = "Option::is_none")]
    status_callback: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct MessageResource {
    sid: String,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TwilioError {
    #[serde(default)]
    code: Option<i64>,
    message: String,
}

/// Twilio SMS channel.
pub struct SmsChannel {
    client: reqwest::Client,
    messages_url: String,
    account_sid: String,
    auth_token: String,
    from_number: String,
    status_callback_url: Option<String>,
}

impl SmsChannel {
    /// Build the channel from `[sms]` config.
    pub fn new(config: &SmsConfig) -> Result<Self, WordcastError> {
        let required = |value: &Option<String>, key: &str| {
            value
                .clone()
                .filter(|v| !v.is_empty())
                .ok_or_else(|| WordcastError::Config(format!("sms.{key} is not set")))
        };
        let account_sid = required(&config.account_sid, "account_sid")?;
        let auth_token = required(&config.auth_token, "auth_token")?;
        let from_number = required(&config.from_number, "from_number")?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| WordcastError::Channel {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        let messages_url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            config.api_base.trim_end_matches('/'),
            account_sid
        );
        info!(from = %from_number, "SMS channel initialized");

        Ok(Self {
            client,
            messages_url,
            account_sid,
            auth_token,
            from_number,
            status_callback_url: config.status_callback_url.clone().filter(|u| !u.is_empty()),
        })
    }
}

#[async_trait]
impl PluginAdapter for SmsChannel {
    fn name(&self) -> &str {
        "sms"
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
impl ChannelAdapter for SmsChannel {
    async fn send(&self, msg: OutboundMessage) -> Result<ChannelReceipt, WordcastError> {
        let form = serde_urlencoded::to_string(CreateMessage {
            to: &msg.destination,
            from: &self.from_number,
            body: &msg.body,
            status_callback: self.status_callback_url.as_deref(),
        })
        .map_err(|e| WordcastError::Internal(format!("failed to encode SMS form: {e}")))?;

        let response = self
            .client
            .post(&self.messages_url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(form)
            .send()
            .await
            .map_err(|e| WordcastError::Channel {
                message: format!("Twilio request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            let message = match serde_json::from_str::<TwilioError>(&body) {
                Ok(err) => format!(
                    "Twilio error {} ({status}): {}",
                    err.code.unwrap_or_default(),
                    err.message
                ),
                Err(_) => format!("Twilio returned {status}: {body}"),
            };
            return Err(WordcastError::channel(message));
        }

        let resource: MessageResource =
            serde_json::from_str(&body).map_err(|e| WordcastError::Channel {
                message: format!("unreadable Twilio response: {e}"),
                source: Some(Box::new(e)),
            })?;
        let delivery = resource
            .status
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DeliveryStatus::Queued);
        debug!(sid = %resource.sid, status = %delivery, "SMS accepted");
        Ok(ChannelReceipt {
            id: resource.sid,
            status: delivery,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(base: &str) -> SmsConfig {
        SmsConfig {
            account_sid: Some("AC123".into()),
            auth_token: Some("tok".into()),
            from_number: Some("+15550000000".into()),
            api_base: base.to_string(),
            status_callback_url: Some("https://words.example.com/webhooks/sms".into()),
        }
    }

    fn message() -> OutboundMessage {
        OutboundMessage {
            destination: "+15551234567".into(),
            body: "Word 1 of 2".into(),
            template_id: Some("daily_word".into()),
            template_params: vec![],
        }
    }

    #[tokio::test]
    async fn posts_form_with_basic_auth() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/2010-04-01/Accounts/AC123/Messages.json"))
            .and(header_exists("authorization"))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(body_string_contains("To=%2B15551234567"))
            .and(body_string_contains("Body=Word+1+of+2"))
            .and(body_string_contains("StatusCallback="))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "sid": "SM0001",
                "status": "queued"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let channel = SmsChannel::new(&config(&server.uri())).unwrap();
        let receipt = channel.send(message()).await.unwrap();
        assert_eq!(receipt.id, "SM0001");
        assert_eq!(receipt.status, DeliveryStatus::Queued);
    }

    #[tokio::test]
    async fn twilio_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "code": 21211,
                "message": "The 'To' number is not a valid phone number.",
                "status": 400
            })))
            .mount(&server)
            .await;

        let channel = SmsChannel::new(&config(&server.uri())).unwrap();
        let err = channel.send(message()).await.unwrap_err();
        assert!(err.to_string().contains("21211"));
    }

    #[tokio::test]
    async fn failed_status_in_response_is_passed_through() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "sid": "SM0002",
                "status": "failed"
            })))
            .mount(&server)
            .await;

        let channel = SmsChannel::new(&config(&server.uri())).unwrap();
        let receipt = channel.send(message()).await.unwrap();
        assert!(!receipt.status.is_success());
    }

    #[test]
    fn missing_from_number_is_a_config_error() {
        let mut cfg = config("http://localhost");
        cfg.from_number = None;
        assert!(matches!(SmsChannel::new(&cfg), Err(WordcastError::Config(_))));
    }
}
