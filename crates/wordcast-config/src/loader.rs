// SPDX-FileCopyrightText: 2026 Wordcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./wordcast.toml` > `~/.config/wordcast/wordcast.toml`
//! > `/etc/wordcast/wordcast.toml` with environment variable overrides via the
//! `WORDCAST_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::WordcastConfig;

/// Config sections reachable through `WORDCAST_<SECTION>_<KEY>` variables.
pub const SECTIONS: &[&str] = &[
    "service", "storage", "schedule", "dispatch", "channel", "whatsapp", "sms", "gateway",
];

/// System-wide config file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/wordcast/wordcast.toml";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "wordcast.toml";

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/wordcast/wordcast.toml` (system-wide)
/// 3. `~/.config/wordcast/wordcast.toml` (user XDG config)
/// 4. `./wordcast.toml` (local directory)
/// 5. `WORDCAST_*` environment variables
pub fn load_config() -> Result<WordcastConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<WordcastConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(WordcastConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<WordcastConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(WordcastConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the layered Figment without extracting it.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(WordcastConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_FILE))
        .merge(env_provider())
}

/// `~/.config/wordcast/wordcast.toml`, if the platform has a config dir.
pub fn user_config_path() -> Option<std::path::PathBuf> {
    dirs::config_dir().map(|d| d.join("wordcast").join("wordcast.toml"))
}

/// Map a lowercased, prefix-stripped env var name to a dotted config path.
///
/// Only the leading section name is split off, so `whatsapp_access_token`
/// becomes `whatsapp.access_token` rather than `whatsapp.access.token`.
/// Names that start with no known section are passed through unchanged and
/// rejected later as unknown top-level keys.
pub fn env_key_to_path(key: &str) -> String {
    for section in SECTIONS {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_'))
            && !rest.is_empty()
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

fn env_provider() -> Env {
    Env::prefixed("WORDCAST_").map(|key| env_key_to_path(key.as_str()).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_split_on_section_only() {
        assert_eq!(env_key_to_path("service_log_level"), "service.log_level");
        assert_eq!(
            env_key_to_path("whatsapp_access_token"),
            "whatsapp.access_token"
        );
        assert_eq!(
            env_key_to_path("dispatch_stale_after_minutes"),
            "dispatch.stale_after_minutes"
        );
        assert_eq!(env_key_to_path("sms_auth_token"), "sms.auth_token");
        assert_eq!(env_key_to_path("channel_kind"), "channel.kind");
    }

    #[test]
    fn unknown_sections_pass_through() {
        assert_eq!(env_key_to_path("smsx_token"), "smsx_token");
        assert_eq!(env_key_to_path("storage"), "storage");
    }
}
