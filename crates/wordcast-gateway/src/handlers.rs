// SPDX-FileCopyrightText: 2026 Wordcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the gateway.
//!
//! Trigger routes return JSON; failures are `{"error": "..."}` with a status
//! derived from the error kind.

use axum::{
    Form, Json,
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use wordcast_core::types::{DeliveryState, DeliveryUpdate, OutboxMessage};
use wordcast_core::{Category, WordcastError};
use wordcast_scheduler::ScheduleEntry;
use wordcast_sms::StatusCallback;
use wordcast_whatsapp::types::{VerifyParams, WebhookPayload};

use crate::server::GatewayState;

/// Request body for POST /v1/schedule.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRequest {
    pub user_id: String,
    pub phone_number: String,
    /// `topic-difficulty`, e.g. `business-advanced`.
    pub category: String,
    /// Local date to schedule; defaults to the user's today.
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

/// Response body for POST /v1/schedule.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResponse {
    pub success: bool,
    pub scheduled_messages: usize,
    /// False when the day's batch already existed.
    pub created: bool,
    pub schedule: Vec<ScheduleEntry>,
}

/// Request body for POST /v1/schedule/all.
#[derive(Debug, Default, Deserialize)]
pub struct ScheduleAllRequest {
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

/// Query parameters for GET /v1/outbox.
#[derive(Debug, Deserialize)]
pub struct OutboxQuery {
    #[serde(default)]
    pub state: Option<DeliveryState>,
    #[serde(default = "default_outbox_limit")]
    pub limit: u32,
}

fn default_outbox_limit() -> u32 {
    50
}

#[derive(Debug, Serialize)]
pub struct OutboxResponse {
    pub messages: Vec<OutboxMessage>,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Maps an error to a status code and `{"error"}` body.
pub(crate) fn error_response(err: &WordcastError) -> Response {
    let status = match err {
        WordcastError::Validation(_) => StatusCode::BAD_REQUEST,
        WordcastError::NotConfigured { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        WordcastError::NoWordsAvailable { .. } | WordcastError::ConcurrencyConflict { .. } => {
            StatusCode::CONFLICT
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        warn!(error = %err, "request failed");
    }
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}

/// GET /health
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// POST /v1/schedule
///
/// Schedules one user's day. A replay returns the existing batch with
/// `created: false`.
pub async fn post_schedule(
    State(state): State<GatewayState>,
    Json(body): Json<ScheduleRequest>,
) -> Response {
    let category = match body.category.parse::<Category>() {
        Ok(category) => category,
        Err(err) => return error_response(&err),
    };
    if body.user_id.trim().is_empty() || body.phone_number.trim().is_empty() {
        return error_response(&WordcastError::Validation(
            "userId and phoneNumber are required".into(),
        ));
    }

    let result = match body.date {
        Some(date) => {
            state
                .scheduler
                .schedule_for_date(&body.user_id, &body.phone_number, category, date)
                .await
        }
        None => {
            state
                .scheduler
                .schedule_today(&body.user_id, &body.phone_number, category)
                .await
        }
    };

    match result {
        Ok(batch) => {
            info!(
                user_id = %batch.user_id,
                date = %batch.date,
                messages = batch.messages.len(),
                created = batch.created,
                "schedule triggered over HTTP"
            );
            Json(ScheduleResponse {
                success: true,
                scheduled_messages: batch.messages.len(),
                created: batch.created,
                schedule: batch.schedule,
            })
            .into_response()
        }
        Err(err) => error_response(&err),
    }
}

/// POST /v1/schedule/all
///
/// The body is optional; an empty one schedules each user's today.
pub async fn post_schedule_all(State(state): State<GatewayState>, body: Bytes) -> Response {
    let request = if body.is_empty() {
        ScheduleAllRequest::default()
    } else {
        match serde_json::from_slice::<ScheduleAllRequest>(&body) {
            Ok(request) => request,
            Err(e) => {
                return error_response(&WordcastError::Validation(format!(
                    "invalid request body: {e}"
                )));
            }
        }
    };
    match state.scheduler.schedule_all(request.date).await {
        Ok(report) => Json(report).into_response(),
        Err(err) => error_response(&err),
    }
}

/// POST /v1/dispatch
///
/// Runs one dispatch sweep immediately.
pub async fn post_dispatch(State(state): State<GatewayState>) -> Response {
    match state.dispatcher.dispatch_due(Utc::now()).await {
        Ok(report) => Json(report).into_response(),
        Err(err) => error_response(&err),
    }
}

/// GET /v1/outbox?state=failed&limit=50
pub async fn get_outbox(
    State(state): State<GatewayState>,
    Query(query): Query<OutboxQuery>,
) -> Response {
    match state
        .storage
        .list_outbox(query.state, query.limit.clamp(1, 500))
        .await
    {
        Ok(messages) => Json(OutboxResponse { messages }).into_response(),
        Err(err) => error_response(&err),
    }
}

/// GET /webhooks/whatsapp
///
/// Subscription handshake: echoes `hub.challenge` when the verify token matches.
pub async fn verify_whatsapp(
    State(state): State<GatewayState>,
    Query(params): Query<VerifyParams>,
) -> Response {
    match wordcast_whatsapp::verify_subscription(&params, state.whatsapp_verify_token.as_deref())
    {
        Some(challenge) => (StatusCode::OK, challenge).into_response(),
        None => StatusCode::FORBIDDEN.into_response(),
    }
}

/// POST /webhooks/whatsapp
pub async fn whatsapp_webhook(
    State(state): State<GatewayState>,
    Json(payload): Json<WebhookPayload>,
) -> Response {
    let updates = wordcast_whatsapp::status_updates(&payload);
    apply_updates(&state, updates).await
}

/// POST /webhooks/sms
pub async fn sms_callback(
    State(state): State<GatewayState>,
    Form(callback): Form<StatusCallback>,
) -> Response {
    let updates = wordcast_sms::status_update(&callback).into_iter().collect();
    apply_updates(&state, updates).await
}

async fn apply_updates(state: &GatewayState, updates: Vec<DeliveryUpdate>) -> Response {
    for update in updates {
        match state
            .storage
            .apply_delivery_status(&update.channel_message_id, update.status)
            .await
        {
            Ok(true) => debug!(
                channel_message_id = %update.channel_message_id,
                status = %update.status,
                "delivery status applied"
            ),
            Ok(false) => debug!(
                channel_message_id = %update.channel_message_id,
                "delivery status for unknown message ignored"
            ),
            Err(err) => return error_response(&err),
        }
    }
    StatusCode::OK.into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_request_uses_camel_case() {
        let json = r#"{"userId":"u1","phoneNumber":"+1555","category":"exam-advanced"}"#;
        let req: ScheduleRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.user_id, "u1");
        assert_eq!(req.phone_number, "+1555");
        assert!(req.date.is_none());
    }

    #[test]
    fn schedule_request_accepts_date() {
        let json = r#"{"userId":"u1","phoneNumber":"+1","category":"exam-advanced","date":"2026-03-01"}"#;
        let req: ScheduleRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.date, NaiveDate::from_ymd_opt(2026, 3, 1));
    }

    #[test]
    fn schedule_response_serializes_camel_case() {
        let resp = ScheduleResponse {
            success: true,
            scheduled_messages: 2,
            created: true,
            schedule: vec![ScheduleEntry {
                time: "09:00".into(),
                word: "candor".into(),
            }],
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["scheduledMessages"], 2);
        assert_eq!(json["schedule"][0]["time"], "09:00");
    }

    #[test]
    fn error_kinds_map_to_statuses() {
        let cases = [
            (WordcastError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (
                WordcastError::NotConfigured {
                    user_id: "u".into(),
                    reason: "no settings".into(),
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (WordcastError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(error_response(&err).status(), status);
        }
    }
}
