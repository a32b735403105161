// SPDX-FileCopyrightText: 2026 Wordcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Route-level tests for the gateway, driven through `tower::ServiceExt::oneshot`.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use wordcast_core::Category;
use wordcast_core::types::{DeliveryState, DeliveryStatus};
use wordcast_gateway::{GatewayState, router};
use wordcast_test_utils::TestHarness;

const TOKEN: &str = "test-token";

fn category() -> Category {
    "business-advanced".parse().unwrap()
}

async fn setup() -> (TestHarness, Router) {
    let harness = TestHarness::builder()
        .with_words(category(), 6)
        .build()
        .await
        .unwrap();
    harness
        .add_user("u1", "+15550001111", category(), 3, &["08:00", "12:00", "18:00"])
        .await
        .unwrap();

    let mut config = harness.config.clone();
    config.gateway.bearer_token = Some(TOKEN.to_string());
    config.whatsapp.verify_token = Some("verify-me".to_string());
    let state = GatewayState::new(
        harness.storage.clone(),
        harness.scheduler.clone(),
        harness.dispatcher.clone(),
        &config,
    );
    (harness, router(state))
}

fn authed_json(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn schedule_body(date: &str) -> Value {
    json!({
        "userId": "u1",
        "phoneNumber": "+15550001111",
        "category": "business-advanced",
        "date": date
    })
}

#[tokio::test]
async fn health_is_public() {
    let (_harness, app) = setup().await;
    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "ok");
}

#[tokio::test]
async fn trigger_routes_require_bearer_token() {
    let (_harness, app) = setup().await;
    let request = Request::post("/v1/schedule")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(schedule_body("2026-03-01").to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let request = Request::post("/v1/dispatch")
        .header(header::AUTHORIZATION, "Bearer wrong")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn trigger_routes_fail_closed_without_configured_token() {
    let (harness, _) = setup().await;
    let state = GatewayState::new(
        harness.storage.clone(),
        harness.scheduler.clone(),
        harness.dispatcher.clone(),
        &harness.config,
    );
    let response = router(state)
        .oneshot(authed_json("POST", "/v1/schedule", schedule_body("2026-03-01")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn booked_day_rejects_another_category() {
    let (_harness, app) = setup().await;
    let response = app
        .clone()
        .oneshot(authed_json("POST", "/v1/schedule", schedule_body("2026-03-01")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let mut other = schedule_body("2026-03-01");
    other["category"] = json!("exam-advanced");
    let response = app
        .oneshot(authed_json("POST", "/v1/schedule", other))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("business-advanced"));
}

#[tokio::test]
async fn schedule_returns_batch_and_is_idempotent() {
    let (_harness, app) = setup().await;

    let response = app
        .clone()
        .oneshot(authed_json("POST", "/v1/schedule", schedule_body("2026-03-01")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let first = body_json(response).await;
    assert_eq!(first["success"], true);
    assert_eq!(first["scheduledMessages"], 3);
    assert_eq!(first["created"], true);
    assert_eq!(first["schedule"][0]["time"], "08:00");
    assert_eq!(first["schedule"][2]["time"], "18:00");

    let response = app
        .oneshot(authed_json("POST", "/v1/schedule", schedule_body("2026-03-01")))
        .await
        .unwrap();
    let second = body_json(response).await;
    assert_eq!(second["created"], false);
    assert_eq!(second["schedule"], first["schedule"]);
}

#[tokio::test]
async fn schedule_rejects_unknown_category() {
    let (_harness, app) = setup().await;
    let mut body = schedule_body("2026-03-01");
    body["category"] = json!("cooking-expert");
    let response = app
        .oneshot(authed_json("POST", "/v1/schedule", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["error"].is_string());
}

#[tokio::test]
async fn schedule_for_unconfigured_user_is_unprocessable() {
    let (_harness, app) = setup().await;
    let mut body = schedule_body("2026-03-01");
    body["userId"] = json!("nobody");
    let response = app
        .oneshot(authed_json("POST", "/v1/schedule", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn schedule_all_accepts_empty_body() {
    let (_harness, app) = setup().await;
    let request = Request::post("/v1/schedule/all")
        .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let report = body_json(response).await;
    assert_eq!(report["scheduled"], 1);
    assert_eq!(report["messages"], 3);
}

#[tokio::test]
async fn dispatch_sends_due_rows_and_outbox_lists_them() {
    let (harness, app) = setup().await;
    app.clone()
        .oneshot(authed_json("POST", "/v1/schedule", schedule_body("2020-01-01")))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(authed_json("POST", "/v1/dispatch", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let report = body_json(response).await;
    assert_eq!(report["sent"], 3);
    assert_eq!(harness.channel.sent_count().await, 3);

    let request = Request::get("/v1/outbox?state=sent&limit=10")
        .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
        .body(Body::empty())
        .unwrap();
    let listed = body_json(app.oneshot(request).await.unwrap()).await;
    assert_eq!(listed["messages"].as_array().unwrap().len(), 3);
    assert_eq!(listed["messages"][0]["state"], "sent");
}

#[tokio::test]
async fn whatsapp_verification_handshake() {
    let (_harness, app) = setup().await;
    let ok = Request::get(
        "/webhooks/whatsapp?hub.mode=subscribe&hub.verify_token=verify-me&hub.challenge=12345",
    )
    .body(Body::empty())
    .unwrap();
    let response = app.clone().oneshot(ok).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"12345");

    let bad = Request::get(
        "/webhooks/whatsapp?hub.mode=subscribe&hub.verify_token=nope&hub.challenge=12345",
    )
    .body(Body::empty())
    .unwrap();
    assert_eq!(
        app.oneshot(bad).await.unwrap().status(),
        StatusCode::FORBIDDEN
    );
}

async fn dispatch_one(harness: &TestHarness, app: &Router) -> (i64, String) {
    app.clone()
        .oneshot(authed_json("POST", "/v1/schedule", schedule_body("2020-01-01")))
        .await
        .unwrap();
    harness
        .dispatcher
        .dispatch_due(chrono::Utc::now())
        .await
        .unwrap();
    let sent = harness
        .storage
        .list_outbox(Some(DeliveryState::Sent), 10)
        .await
        .unwrap();
    let first = &sent[0];
    (first.id, first.channel_message_id.clone().unwrap())
}

#[tokio::test]
async fn whatsapp_status_webhook_updates_outbox() {
    let (harness, app) = setup().await;
    let (id, wamid) = dispatch_one(&harness, &app).await;

    let payload = json!({
        "object": "whatsapp_business_account",
        "entry": [{
            "id": "WABA",
            "changes": [{
                "field": "messages",
                "value": {
                    "messaging_product": "whatsapp",
                    "statuses": [{
                        "id": wamid,
                        "status": "delivered",
                        "timestamp": "1700000000",
                        "recipient_id": "15550001111"
                    }]
                }
            }]
        }]
    });
    let request = Request::post("/webhooks/whatsapp")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap();
    assert_eq!(app.oneshot(request).await.unwrap().status(), StatusCode::OK);

    let row = harness.storage.get_outbox_message(id).await.unwrap().unwrap();
    assert_eq!(row.delivery_status, Some(DeliveryStatus::Delivered));
    assert_eq!(row.state, DeliveryState::Sent);
}

#[tokio::test]
async fn sms_status_callback_updates_outbox() {
    let (harness, app) = setup().await;
    let (id, sid) = dispatch_one(&harness, &app).await;

    let form = format!("MessageSid={sid}&MessageStatus=undelivered&ErrorCode=30003");
    let request = Request::post("/webhooks/sms")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form))
        .unwrap();
    assert_eq!(app.oneshot(request).await.unwrap().status(), StatusCode::OK);

    let row = harness.storage.get_outbox_message(id).await.unwrap().unwrap();
    assert_eq!(row.delivery_status, Some(DeliveryStatus::Undelivered));
}

#[tokio::test]
async fn status_for_unknown_message_is_acknowledged() {
    let (_harness, app) = setup().await;
    let request = Request::post("/webhooks/sms")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("MessageSid=SMunknown&MessageStatus=delivered"))
        .unwrap();
    assert_eq!(app.oneshot(request).await.unwrap().status(), StatusCode::OK);
}
