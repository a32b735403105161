// SPDX-FileCopyrightText: 2026 Wordcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `wordcast status` command implementation.
//!
//! Reads outbox state counts straight from the database, so it works whether
//! or not `serve` is running.

use std::io::IsTerminal;

use serde::Serialize;

use wordcast_core::types::DeliveryState;
use wordcast_core::{StorageAdapter, WordcastError};

/// Structured status output for `--json` mode.
#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct StatusResponse {
    pub pending: i64,
    pub processing: i64,
    pub sent: i64,
    pub failed: i64,
    pub active_subscriptions: usize,
}

impl StatusResponse {
    fn from_counts(counts: &[(DeliveryState, i64)], active_subscriptions: usize) -> Self {
        let mut resp = StatusResponse {
            active_subscriptions,
            ..Default::default()
        };
        for (state, count) in counts {
            match state {
                DeliveryState::Pending => resp.pending += count,
                DeliveryState::Processing => resp.processing += count,
                DeliveryState::Sent => resp.sent += count,
                DeliveryState::Failed => resp.failed += count,
            }
        }
        resp
    }
}

/// Run the `wordcast status` command.
///
/// `--json` prints structured output; `--plain` or a non-TTY stdout disables colors.
pub async fn run_status(
    storage: &dyn StorageAdapter,
    json: bool,
    plain: bool,
) -> Result<(), WordcastError> {
    let counts = storage.outbox_state_counts().await?;
    let subscriptions = storage.list_active_subscriptions().await?.len();
    let status = StatusResponse::from_counts(&counts, subscriptions);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&status).unwrap_or_else(|_| "{}".to_string())
        );
    } else {
        let use_color = !plain && std::io::stdout().is_terminal();
        print_status(&status, use_color);
    }
    Ok(())
}

fn print_status(status: &StatusResponse, use_color: bool) {
    println!();
    println!("  wordcast status");
    println!("  {}", "-".repeat(35));
    println!("    Subscriptions: {}", status.active_subscriptions);
    println!("    Pending:       {}", status.pending);
    println!("    Processing:    {}", status.processing);

    if use_color {
        use colored::Colorize;
        println!("    Sent:          {}", status.sent.to_string().green());
        let failed = status.failed.to_string();
        if status.failed > 0 {
            println!("    Failed:        {}", failed.red());
        } else {
            println!("    Failed:        {failed}");
        }
    } else {
        println!("    Sent:          {}", status.sent);
        println!("    Failed:        {}", status.failed);
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_map_onto_states() {
        let status = StatusResponse::from_counts(
            &[(DeliveryState::Sent, 4), (DeliveryState::Failed, 1)],
            2,
        );
        assert_eq!(
            status,
            StatusResponse {
                pending: 0,
                processing: 0,
                sent: 4,
                failed: 1,
                active_subscriptions: 2,
            }
        );
    }

    #[test]
    fn status_response_serializes() {
        let json = serde_json::to_string(&StatusResponse::default()).unwrap();
        assert!(json.contains("\"pending\":0"));
        assert!(json.contains("\"active_subscriptions\":0"));
    }
}
