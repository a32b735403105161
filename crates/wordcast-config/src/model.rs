// SPDX-FileCopyrightText: 2026 Wordcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Wordcast service.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use chrono::{FixedOffset, NaiveTime};
use serde::{Deserialize, Serialize};

/// Top-level Wordcast configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WordcastConfig {
    /// Service identity and logging.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Daily scheduling settings.
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Outbox dispatch settings.
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Which messaging channel delivers the words.
    #[serde(default)]
    pub channel: ChannelConfig,

    /// WhatsApp Business Cloud API settings.
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,

    /// SMS provider settings.
    #[serde(default)]
    pub sms: SmsConfig,

    /// HTTP trigger and webhook server settings.
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Service identity configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Display name used in logs and health output.
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_service_name() -> String {
    "wordcast".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("wordcast").join("wordcast.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("wordcast.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// What to do when auto mode rounds two slots onto the same hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AutoSlotPolicy {
    /// Spread colliding slots across the hour (10:00, 10:30).
    #[default]
    Stagger,
    /// Keep the rounded `HH:00` times, duplicates included.
    Overlap,
}

/// Daily scheduling configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ScheduleConfig {
    /// Fixed offset the service interprets slot times in, as `+HH:MM` / `-HH:MM`.
    #[serde(default = "default_utc_offset")]
    pub utc_offset: String,

    /// First auto-mode slot hour (inclusive).
    #[serde(default = "default_auto_start_hour")]
    pub auto_start_hour: u32,

    /// Last auto-mode slot hour (inclusive).
    #[serde(default = "default_auto_end_hour")]
    pub auto_end_hour: u32,

    /// Upper bound on a user's words-per-day setting.
    #[serde(default = "default_max_words_per_day")]
    pub max_words_per_day: u32,

    /// Collision handling for auto-mode slots.
    #[serde(default)]
    pub auto_slot_policy: AutoSlotPolicy,

    /// Local time (`HH:MM`) at which `serve` schedules every subscriber's day.
    #[serde(default = "default_daily_run_time")]
    pub daily_run_time: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            utc_offset: default_utc_offset(),
            auto_start_hour: default_auto_start_hour(),
            auto_end_hour: default_auto_end_hour(),
            max_words_per_day: default_max_words_per_day(),
            auto_slot_policy: AutoSlotPolicy::default(),
            daily_run_time: default_daily_run_time(),
        }
    }
}

impl ScheduleConfig {
    /// The scheduling offset, if `utc_offset` is well formed.
    pub fn offset(&self) -> Option<FixedOffset> {
        parse_utc_offset(&self.utc_offset)
    }

    /// The daily run time, if `daily_run_time` is well formed.
    pub fn run_time(&self) -> Option<NaiveTime> {
        NaiveTime::parse_from_str(self.daily_run_time.trim(), "%H:%M").ok()
    }
}

fn default_utc_offset() -> String {
    "+00:00".to_string()
}

fn default_auto_start_hour() -> u32 {
    9
}

fn default_auto_end_hour() -> u32 {
    21
}

fn default_max_words_per_day() -> u32 {
    10
}

fn default_daily_run_time() -> String {
    "00:05".to_string()
}

/// Parse `+HH:MM`, `-HH:MM`, or `Z` into a fixed offset.
pub fn parse_utc_offset(s: &str) -> Option<FixedOffset> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("z") {
        return FixedOffset::east_opt(0);
    }
    let (sign, rest) = match s.as_bytes().first()? {
        b'+' => (1, &s[1..]),
        b'-' => (-1, &s[1..]),
        _ => return None,
    };
    let (hours, minutes) = rest.split_once(':')?;
    if hours.len() != 2 || minutes.len() != 2 {
        return None;
    }
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if hours > 14 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// Outbox dispatch configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DispatchConfig {
    /// Seconds between dispatch sweeps in `serve`.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Upper bound on a single channel send.
    #[serde(default = "default_send_timeout_secs")]
    pub send_timeout_secs: u64,

    /// Maximum rows claimed per sweep.
    #[serde(default = "default_batch_limit")]
    pub batch_limit: u32,

    /// Sends in flight at once within a sweep.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Fail messages due longer ago than this instead of sending them.
    /// `None` keeps overdue messages eligible forever.
    #[serde(default)]
    pub stale_after_minutes: Option<u64>,

    /// Rows left in `processing` longer than this are failed as abandoned.
    #[serde(default = "default_claim_timeout_minutes")]
    pub claim_timeout_minutes: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            send_timeout_secs: default_send_timeout_secs(),
            batch_limit: default_batch_limit(),
            concurrency: default_concurrency(),
            stale_after_minutes: None,
            claim_timeout_minutes: default_claim_timeout_minutes(),
        }
    }
}

fn default_interval_secs() -> u64 {
    60
}

fn default_send_timeout_secs() -> u64 {
    15
}

fn default_batch_limit() -> u32 {
    200
}

fn default_concurrency() -> usize {
    8
}

fn default_claim_timeout_minutes() -> u64 {
    30
}

/// Supported delivery channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    #[default]
    Whatsapp,
    Sms,
}

/// Channel selection.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChannelConfig {
    /// Which provider `serve` and `dispatch` send through.
    #[serde(default)]
    pub kind: ChannelKind,
}

/// WhatsApp Business Cloud API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WhatsAppConfig {
    /// Graph API access token.
    #[serde(default)]
    pub access_token: Option<String>,

    /// Sending phone number id from Meta Business Suite.
    #[serde(default)]
    pub phone_number_id: Option<String>,

    /// Graph API base URL including version.
    #[serde(default = "default_whatsapp_api_base")]
    pub api_base: String,

    /// Approved message template. Plain text is sent when unset.
    #[serde(default)]
    pub template_name: Option<String>,

    /// Language code of the approved template.
    #[serde(default = "default_template_language")]
    pub template_language: String,

    /// Token echoed back during webhook verification.
    #[serde(default)]
    pub verify_token: Option<String>,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            phone_number_id: None,
            api_base: default_whatsapp_api_base(),
            template_name: None,
            template_language: default_template_language(),
            verify_token: None,
        }
    }
}

fn default_whatsapp_api_base() -> String {
    "https://graph.facebook.com/v21.0".to_string()
}

fn default_template_language() -> String {
    "en".to_string()
}

/// SMS (Twilio-compatible) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SmsConfig {
    #[serde(default)]
    pub account_sid: Option<String>,

    #[serde(default)]
    pub auth_token: Option<String>,

    /// Sender number in E.164 form.
    #[serde(default)]
    pub from_number: Option<String>,

    #[serde(default = "default_sms_api_base")]
    pub api_base: String,

    /// Public URL of `/webhooks/sms` for delivery callbacks.
    #[serde(default)]
    pub status_callback_url: Option<String>,
}

impl Default for SmsConfig {
    fn default() -> Self {
        Self {
            account_sid: None,
            auth_token: None,
            from_number: None,
            api_base: default_sms_api_base(),
            status_callback_url: None,
        }
    }
}

fn default_sms_api_base() -> String {
    "https://api.twilio.com".to_string()
}

/// HTTP gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Run the HTTP server inside `serve`.
    #[serde(default = "default_gateway_enabled")]
    pub enabled: bool,

    #[serde(default = "default_gateway_host")]
    pub host: String,

    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bearer token for the trigger routes. Without one they reject every request.
    #[serde(default)]
    pub bearer_token: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            enabled: default_gateway_enabled(),
            host: default_gateway_host(),
            port: default_gateway_port(),
            bearer_token: None,
        }
    }
}

fn default_gateway_enabled() -> bool {
    true
}

fn default_gateway_host() -> String {
    "127.0.0.1".to_string()
}

fn default_gateway_port() -> u16 {
    3400
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_offsets() {
        assert_eq!(parse_utc_offset("+00:00").unwrap().local_minus_utc(), 0);
        assert_eq!(
            parse_utc_offset("+05:30").unwrap().local_minus_utc(),
            5 * 3600 + 30 * 60
        );
        assert_eq!(parse_utc_offset("-08:00").unwrap().local_minus_utc(), -8 * 3600);
        assert_eq!(parse_utc_offset("Z").unwrap().local_minus_utc(), 0);
    }

    #[test]
    fn rejects_malformed_offsets() {
        for bad in ["", "05:30", "+5:30", "+05:60", "+15:00", "UTC", "+0530"] {
            assert!(parse_utc_offset(bad).is_none(), "{bad} should not parse");
        }
    }

    #[test]
    fn schedule_defaults() {
        let schedule = ScheduleConfig::default();
        assert_eq!(schedule.auto_start_hour, 9);
        assert_eq!(schedule.auto_end_hour, 21);
        assert_eq!(schedule.auto_slot_policy, AutoSlotPolicy::Stagger);
        assert_eq!(schedule.offset().unwrap().local_minus_utc(), 0);
        assert_eq!(
            schedule.run_time().unwrap(),
            NaiveTime::from_hms_opt(0, 5, 0).unwrap()
        );
    }

    #[test]
    fn dispatch_defaults_never_expire() {
        let dispatch = DispatchConfig::default();
        assert!(dispatch.stale_after_minutes.is_none());
        assert_eq!(dispatch.send_timeout_secs, 15);
    }
}
