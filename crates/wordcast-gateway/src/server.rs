// SPDX-FileCopyrightText: 2026 Wordcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use wordcast_config::model::{GatewayConfig, WordcastConfig};
use wordcast_core::{StorageAdapter, WordcastError};
use wordcast_scheduler::{DailyScheduler, OutboxDispatcher};

use crate::auth::{AuthConfig, auth_middleware};
use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub storage: Arc<dyn StorageAdapter>,
    pub scheduler: Arc<DailyScheduler>,
    pub dispatcher: Arc<OutboxDispatcher>,
    /// Token expected in the WhatsApp subscription handshake.
    pub whatsapp_verify_token: Option<String>,
    pub auth: AuthConfig,
    /// Process start time for uptime calculation.
    pub start_time: Instant,
}

impl GatewayState {
    pub fn new(
        storage: Arc<dyn StorageAdapter>,
        scheduler: Arc<DailyScheduler>,
        dispatcher: Arc<OutboxDispatcher>,
        config: &WordcastConfig,
    ) -> Self {
        Self {
            storage,
            scheduler,
            dispatcher,
            whatsapp_verify_token: config.whatsapp.verify_token.clone(),
            auth: AuthConfig {
                bearer_token: config.gateway.bearer_token.clone(),
            },
            start_time: Instant::now(),
        }
    }
}

/// Build the gateway router.
///
/// - GET /health (public)
/// - POST /v1/schedule, POST /v1/schedule/all, POST /v1/dispatch,
///   GET /v1/outbox (bearer auth)
/// - GET/POST /webhooks/whatsapp, POST /webhooks/sms (provider callbacks)
pub fn router(state: GatewayState) -> Router {
    let auth_state = state.auth.clone();

    let public_routes = Router::new()
        .route("/health", get(handlers::get_health))
        .with_state(state.clone());

    let api_routes = Router::new()
        .route("/v1/schedule", post(handlers::post_schedule))
        .route("/v1/schedule/all", post(handlers::post_schedule_all))
        .route("/v1/dispatch", post(handlers::post_dispatch))
        .route("/v1/outbox", get(handlers::get_outbox))
        .route_layer(axum_middleware::from_fn_with_state(
            auth_state,
            auth_middleware,
        ))
        .with_state(state.clone());

    // Providers cannot send our bearer token; the WhatsApp handshake carries
    // its own verify token.
    let webhook_routes = Router::new()
        .route(
            "/webhooks/whatsapp",
            get(handlers::verify_whatsapp).post(handlers::whatsapp_webhook),
        )
        .route("/webhooks/sms", post(handlers::sms_callback))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .merge(webhook_routes)
        .layer(TraceLayer::new_for_http())
}

/// Bind to the configured host:port and serve until `cancel` fires.
pub async fn start_server(
    config: &GatewayConfig,
    state: GatewayState,
    cancel: CancellationToken,
) -> Result<(), WordcastError> {
    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| WordcastError::Channel {
            message: format!("failed to bind gateway to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("Gateway server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .map_err(|e| WordcastError::Channel {
            message: format!("gateway server error: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("Gateway server stopped");
    Ok(())
}
