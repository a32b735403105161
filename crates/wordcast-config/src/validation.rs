// SPDX-FileCopyrightText: 2026 Wordcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks constraints serde cannot express: offset and time formats, hour
//! ranges, non-zero limits, and a usable bind host. All problems are
//! collected rather than failing on the first.

use crate::diagnostic::ConfigError;
use crate::model::{WordcastConfig, parse_utc_offset};

/// Hard ceiling for `schedule.max_words_per_day`; one word per hour.
pub const MAX_WORDS_PER_DAY_LIMIT: u32 = 24;

/// Validate a deserialized configuration for semantic correctness.
pub fn validate_config(config: &WordcastConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::validation(
            "storage.database_path",
            "must not be empty",
        ));
    }

    let schedule = &config.schedule;
    if parse_utc_offset(&schedule.utc_offset).is_none() {
        errors.push(ConfigError::validation(
            "schedule.utc_offset",
            format!("`{}` must look like +HH:MM or -HH:MM", schedule.utc_offset),
        ));
    }
    if schedule.auto_end_hour > 23 {
        errors.push(ConfigError::validation(
            "schedule.auto_end_hour",
            format!("must be at most 23, got {}", schedule.auto_end_hour),
        ));
    }
    if schedule.auto_start_hour >= schedule.auto_end_hour {
        errors.push(ConfigError::validation(
            "schedule.auto_start_hour",
            format!(
                "must be before auto_end_hour ({} >= {})",
                schedule.auto_start_hour, schedule.auto_end_hour
            ),
        ));
    }
    if schedule.max_words_per_day == 0 || schedule.max_words_per_day > MAX_WORDS_PER_DAY_LIMIT {
        errors.push(ConfigError::validation(
            "schedule.max_words_per_day",
            format!(
                "must be between 1 and {MAX_WORDS_PER_DAY_LIMIT}, got {}",
                schedule.max_words_per_day
            ),
        ));
    }
    if schedule.run_time().is_none() {
        errors.push(ConfigError::validation(
            "schedule.daily_run_time",
            format!("`{}` must look like HH:MM", schedule.daily_run_time),
        ));
    }

    let dispatch = &config.dispatch;
    if dispatch.interval_secs == 0 {
        errors.push(ConfigError::validation(
            "dispatch.interval_secs",
            "must be greater than 0",
        ));
    }
    if dispatch.send_timeout_secs == 0 {
        errors.push(ConfigError::validation(
            "dispatch.send_timeout_secs",
            "must be greater than 0",
        ));
    }
    if dispatch.batch_limit == 0 {
        errors.push(ConfigError::validation(
            "dispatch.batch_limit",
            "must be greater than 0",
        ));
    }
    if dispatch.concurrency == 0 {
        errors.push(ConfigError::validation(
            "dispatch.concurrency",
            "must be at least 1",
        ));
    }
    if dispatch.claim_timeout_minutes == 0 {
        errors.push(ConfigError::validation(
            "dispatch.claim_timeout_minutes",
            "must be greater than 0",
        ));
    }

    let host = config.gateway.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::validation("gateway.host", "must not be empty"));
    } else {
        let is_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_hostname = host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
        if !is_ip && !is_hostname {
            errors.push(ConfigError::validation(
                "gateway.host",
                format!("`{host}` is not a valid IP address or hostname"),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
