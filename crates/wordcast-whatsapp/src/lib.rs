// SPDX-FileCopyrightText: 2026 Wordcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WhatsApp channel for the Wordcast service.
//!
//! Implements [`ChannelAdapter`] over the WhatsApp Business Cloud API. When a
//! provider template name is configured, messages go out as that approved
//! template with the rendered parameters; otherwise as plain text, which the
//! API only accepts inside a 24-hour customer service window.

pub mod client;
pub mod types;
pub mod webhook;

use async_trait::async_trait;
use tracing::{debug, info};

use wordcast_config::model::WhatsAppConfig;
use wordcast_core::types::{
    AdapterType, ChannelReceipt, DeliveryStatus, HealthStatus, OutboundMessage,
};
use wordcast_core::{ChannelAdapter, PluginAdapter, WordcastError};

use crate::client::CloudApiClient;
use crate::types::{
    SendPayload, SendRequest, TemplateBody, TemplateComponent, TemplateLanguage,
    TemplateParameter, TextBody,
};

pub use webhook::{status_updates, verify_subscription};

/// WhatsApp Business Cloud API channel.
pub struct WhatsAppChannel {
    client: CloudApiClient,
    template_name: Option<String>,
    template_language: String,
}

impl WhatsAppChannel {
    /// Build the channel from `[whatsapp]` config.
    ///
    /// Fails with a config error when the access token or phone number id is
    /// missing.
    pub fn new(config: &WhatsAppConfig) -> Result<Self, WordcastError> {
        let access_token = config
            .access_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| WordcastError::Config("whatsapp.access_token is not set".into()))?;
        let phone_number_id = config
            .phone_number_id
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| WordcastError::Config("whatsapp.phone_number_id is not set".into()))?;

        let client = CloudApiClient::new(&config.api_base, phone_number_id, access_token)?;
        info!(
            phone_number_id,
            template = config.template_name.as_deref().unwrap_or("<text>"),
            "WhatsApp channel initialized"
        );
        Ok(Self {
            client,
            template_name: config.template_name.clone().filter(|t| !t.is_empty()),
            template_language: config.template_language.clone(),
        })
    }

    fn build_request(&self, msg: OutboundMessage) -> SendRequest {
        let to = msg.destination.trim_start_matches('+').to_string();
        let payload = match &self.template_name {
            Some(name) => SendPayload::Template {
                template: TemplateBody {
                    name: name.clone(),
                    language: TemplateLanguage {
                        code: self.template_language.clone(),
                    },
                    components: if msg.template_params.is_empty() {
                        Vec::new()
                    } else {
                        vec![TemplateComponent {
                            component_type: "body",
                            parameters: msg
                                .template_params
                                .into_iter()
                                .map(|text| TemplateParameter {
                                    parameter_type: "text",
                                    text,
                                })
                                .collect(),
                        }]
                    },
                },
            },
            None => SendPayload::Text {
                text: TextBody {
                    body: msg.body,
                    preview_url: false,
                },
            },
        };
        SendRequest {
            messaging_product: "whatsapp",
            to,
            payload,
        }
    }
}

#[async_trait]
impl PluginAdapter for WhatsAppChannel {
    fn name(&self) -> &str {
        "whatsapp"
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
impl ChannelAdapter for WhatsAppChannel {
    async fn send(&self, msg: OutboundMessage) -> Result<ChannelReceipt, WordcastError> {
        let request = self.build_request(msg);
        let sent = self.client.send(&request).await?;
        // The send response only ever reports acceptance; later states arrive
        // through the webhook.
        let status = sent
            .message_status
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DeliveryStatus::Accepted);
        debug!(id = %sent.id, %status, "WhatsApp message accepted");
        Ok(ChannelReceipt {
            id: sent.id,
            status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(base: &str, template: Option<&str>) -> WhatsAppConfig {
        WhatsAppConfig {
            access_token: Some("EAAG-test".into()),
            phone_number_id: Some("1098765".into()),
            api_base: base.to_string(),
            template_name: template.map(String::from),
            template_language: "en_US".into(),
            verify_token: None,
        }
    }

    fn message() -> OutboundMessage {
        OutboundMessage {
            destination: "+15551234567".into(),
            body: "Word 1 of 1\n\n*candor*".into(),
            template_id: Some("daily_word".into()),
            template_params: vec!["1/1".into(), "candor".into()],
        }
    }

    fn accepted(id: &str) -> serde_json::Value {
        serde_json::json!({
            "messaging_product": "whatsapp",
            "contacts": [{"input": "15551234567", "wa_id": "15551234567"}],
            "messages": [{"id": id, "message_status": "accepted"}]
        })
    }

    #[tokio::test]
    async fn sends_text_with_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/1098765/messages"))
            .and(header("authorization", "Bearer EAAG-test"))
            .and(body_partial_json(serde_json::json!({
                "messaging_product": "whatsapp",
                "to": "15551234567",
                "type": "text",
                "text": {"body": "Word 1 of 1\n\n*candor*"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(accepted("wamid.HBg1")))
            .expect(1)
            .mount(&server)
            .await;

        let channel = WhatsAppChannel::new(&config(&server.uri(), None)).unwrap();
        let receipt = channel.send(message()).await.unwrap();
        assert_eq!(receipt.id, "wamid.HBg1");
        assert_eq!(receipt.status, DeliveryStatus::Accepted);
    }

    #[tokio::test]
    async fn sends_template_parameters_when_configured() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/1098765/messages"))
            .and(body_partial_json(serde_json::json!({
                "type": "template",
                "template": {
                    "name": "daily_word_v2",
                    "language": {"code": "en_US"},
                    "components": [{
                        "type": "body",
                        "parameters": [
                            {"type": "text", "text": "1/1"},
                            {"type": "text", "text": "candor"}
                        ]
                    }]
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(accepted("wamid.T1")))
            .expect(1)
            .mount(&server)
            .await;

        let channel = WhatsAppChannel::new(&config(&server.uri(), Some("daily_word_v2"))).unwrap();
        assert_eq!(channel.send(message()).await.unwrap().id, "wamid.T1");
    }

    #[tokio::test]
    async fn api_error_becomes_channel_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": {"message": "Recipient phone number not in allowed list", "type": "OAuthException", "code": 131030}
            })))
            .mount(&server)
            .await;

        let channel = WhatsAppChannel::new(&config(&server.uri(), None)).unwrap();
        let err = channel.send(message()).await.unwrap_err();
        assert!(matches!(err, WordcastError::Channel { .. }));
        let text = err.to_string();
        assert!(text.contains("131030"), "got: {text}");
    }

    #[tokio::test]
    async fn rate_limit_is_retried_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": {"message": "Rate limit hit", "code": 130429}
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(accepted("wamid.R")))
            .mount(&server)
            .await;

        let channel = WhatsAppChannel::new(&config(&server.uri(), None)).unwrap();
        assert_eq!(channel.send(message()).await.unwrap().id, "wamid.R");
    }

    #[tokio::test]
    async fn server_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(1)
            .mount(&server)
            .await;

        let channel = WhatsAppChannel::new(&config(&server.uri(), None)).unwrap();
        assert!(channel.send(message()).await.is_err());
    }

    #[test]
    fn missing_credentials_are_config_errors() {
        let mut cfg = config("http://localhost", None);
        cfg.access_token = None;
        assert!(matches!(WhatsAppChannel::new(&cfg), Err(WordcastError::Config(_))));

        let mut cfg = config("http://localhost", None);
        cfg.phone_number_id = Some(String::new());
        assert!(matches!(WhatsAppChannel::new(&cfg), Err(WordcastError::Config(_))));
    }
}
