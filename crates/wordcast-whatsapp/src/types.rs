// SPDX-FileCopyrightText: 2026 Wordcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cloud API request, response, and webhook payload types.

use serde::{Deserialize, Serialize};

// --- Outbound ---

/// Body of `POST /{phone_number_id}/messages`.
#[derive(Debug, Clone, Serialize)]
pub struct SendRequest {
    pub messaging_product: &'static str,
    pub to: String,
    #[serde(flatten)]
    pub payload: SendPayload,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SendPayload {
    Text { text: TextBody },
    Template { template: TemplateBody },
}

#[derive(Debug, Clone, Serialize)]
pub struct TextBody {
    pub body: String,
    pub preview_url: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TemplateBody {
    pub name: String,
    pub language: TemplateLanguage,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<TemplateComponent>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TemplateLanguage {
    pub code: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TemplateComponent {
    #[serde(rename = "type")]
    pub component_type: &'static str,
    pub parameters: Vec<TemplateParameter>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TemplateParameter {
    #[serde(rename = "type")]
    pub parameter_type: &'static str,
    pub text: String,
}

/// Successful send response.
#[derive(Debug, Clone, Deserialize)]
pub struct SendResponse {
    #[serde(default)]
    pub messages: Vec<SentMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SentMessage {
    pub id: String,
    #[serde(default)]
    pub message_status: Option<String>,
}

/// Graph API error envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiError,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    pub message: String,
    #[serde(default)]
    pub code: Option<i64>,
}

// --- Webhook ---

/// Top-level webhook notification.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub entry: Vec<WebhookEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookEntry {
    #[serde(default)]
    pub changes: Vec<WebhookChange>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookChange {
    #[serde(default)]
    pub field: String,
    #[serde(default)]
    pub value: WebhookValue,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookValue {
    #[serde(default)]
    pub statuses: Vec<StatusNotification>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusNotification {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub recipient_id: Option<String>,
    #[serde(default)]
    pub errors: Vec<ApiError>,
}

/// Query parameters of the subscription verification `GET`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerifyParams {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}
