// SPDX-FileCopyrightText: 2026 Wordcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the WhatsApp Business Cloud API messages endpoint.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use tracing::{debug, warn};
use wordcast_core::WordcastError;

use crate::types::{ApiErrorResponse, SendRequest, SendResponse, SentMessage};

/// Sends messages from one business phone number.
///
/// Rate-limit and unavailable responses (429, 503) mean the message was not
/// accepted, so they are retried once. Everything else is returned as-is.
#[derive(Debug, Clone)]
pub struct CloudApiClient {
    client: reqwest::Client,
    messages_url: String,
    max_retries: u32,
}

impl CloudApiClient {
    pub fn new(
        api_base: &str,
        phone_number_id: &str,
        access_token: &str,
    ) -> Result<Self, WordcastError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {access_token}"))
            .map_err(|e| WordcastError::Config(format!("invalid WhatsApp access token: {e}")))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| WordcastError::Channel {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            messages_url: format!(
                "{}/{}/messages",
                api_base.trim_end_matches('/'),
                phone_number_id
            ),
            max_retries: 1,
        })
    }

    /// Post one message and return the provider's record of it.
    pub async fn send(&self, request: &SendRequest) -> Result<SentMessage, WordcastError> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                tokio::time::sleep(Duration::from_millis(500)).await;
            }

            let response = self
                .client
                .post(&self.messages_url)
                .json(request)
                .send()
                .await
                .map_err(|e| WordcastError::Channel {
                    message: format!("WhatsApp request failed: {e}"),
                    source: Some(Box::new(e)),
                })?;
            let status = response.status();
            debug!(status = %status, attempt, "WhatsApp send response");

            if status.is_success() {
                let parsed: SendResponse =
                    response.json().await.map_err(|e| WordcastError::Channel {
                        message: format!("unreadable WhatsApp response: {e}"),
                        source: Some(Box::new(e)),
                    })?;
                return parsed
                    .messages
                    .into_iter()
                    .next()
                    .ok_or_else(|| WordcastError::channel("WhatsApp response carried no message id"));
            }

            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api) => format!(
                    "WhatsApp API error {} ({status}): {}",
                    api.error.code.unwrap_or_default(),
                    api.error.message
                ),
                Err(_) => format!("WhatsApp API returned {status}: {body}"),
            };

            if is_retryable(status) && attempt < self.max_retries {
                warn!(status = %status, "WhatsApp send not accepted, retrying");
                last_error = Some(WordcastError::channel(message));
                continue;
            }
            return Err(WordcastError::channel(message));
        }

        Err(last_error
            .unwrap_or_else(|| WordcastError::channel("WhatsApp send failed after retries")))
    }
}

fn is_retryable(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 503)
}
