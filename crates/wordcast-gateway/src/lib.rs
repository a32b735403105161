// SPDX-FileCopyrightText: 2026 Wordcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the Wordcast service.
//!
//! Exposes on-demand scheduling and dispatch triggers behind a bearer token,
//! plus the delivery-status webhooks the messaging providers call back on.

pub mod auth;
pub mod handlers;
pub mod server;

pub use auth::AuthConfig;
pub use server::{GatewayState, router, start_server};
