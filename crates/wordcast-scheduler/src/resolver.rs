// SPDX-FileCopyrightText: 2026 Wordcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery settings resolution.
//!
//! Turns a user's stored [`DeliverySettings`] into everything the daily
//! scheduler needs: the clamped words-per-day count, the offset the user's
//! wall-clock times are read in, and the ordered slot times.

use std::sync::Arc;

use chrono::{FixedOffset, NaiveTime};
use tracing::{debug, warn};

use wordcast_config::model::ScheduleConfig;
use wordcast_core::types::{DeliverySettings, ScheduleMode};
use wordcast_core::{StorageAdapter, WordcastError};

use crate::slots::{self, AutoWindow};

/// A user's settings, ready for scheduling.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSettings {
    pub settings: DeliverySettings,
    /// Stored words-per-day, capped at the service maximum.
    pub words_per_day: u32,
    pub offset: FixedOffset,
    /// Slot times in position order. May be shorter than `words_per_day`
    /// for custom mode.
    pub times: Vec<NaiveTime>,
}

/// Reads per-user delivery settings from storage.
pub struct SettingsResolver {
    storage: Arc<dyn StorageAdapter>,
    service_offset: FixedOffset,
    window: AutoWindow,
    max_words_per_day: u32,
}

impl SettingsResolver {
    pub fn new(
        storage: Arc<dyn StorageAdapter>,
        config: &ScheduleConfig,
    ) -> Result<Self, WordcastError> {
        let service_offset = config.offset().ok_or_else(|| {
            WordcastError::Config(format!(
                "schedule.utc_offset `{}` is not a valid offset",
                config.utc_offset
            ))
        })?;
        Ok(Self {
            storage,
            service_offset,
            window: AutoWindow {
                start_hour: config.auto_start_hour,
                end_hour: config.auto_end_hour,
                policy: config.auto_slot_policy,
            },
            max_words_per_day: config.max_words_per_day,
        })
    }

    /// The service-wide scheduling offset.
    pub fn service_offset(&self) -> FixedOffset {
        self.service_offset
    }

    /// Resolve a user's settings.
    ///
    /// Fails with [`WordcastError::NotConfigured`] when the user has no
    /// settings row, or is in custom mode without any slot times.
    pub async fn resolve(&self, user_id: &str) -> Result<ResolvedSettings, WordcastError> {
        let settings = self
            .storage
            .get_delivery_settings(user_id)
            .await?
            .ok_or_else(|| WordcastError::NotConfigured {
                user_id: user_id.to_string(),
                reason: "no delivery settings".to_string(),
            })?;

        if settings.words_per_day == 0 {
            return Err(WordcastError::NotConfigured {
                user_id: user_id.to_string(),
                reason: "words_per_day is zero".to_string(),
            });
        }
        if settings.mode == ScheduleMode::Custom && settings.custom_times.is_empty() {
            return Err(WordcastError::NotConfigured {
                user_id: user_id.to_string(),
                reason: "custom mode without any slot times".to_string(),
            });
        }

        let words_per_day = if settings.words_per_day > self.max_words_per_day {
            warn!(
                user_id,
                requested = settings.words_per_day,
                max = self.max_words_per_day,
                "words_per_day above service maximum, clamping"
            );
            self.max_words_per_day
        } else {
            settings.words_per_day
        };

        let offset = slots::user_offset(&settings, self.service_offset)?;
        let times = slots::slot_times(&settings, words_per_day, self.window);
        debug!(
            user_id,
            mode = %settings.mode,
            words_per_day,
            slots = times.len(),
            "resolved delivery settings"
        );

        Ok(ResolvedSettings {
            settings,
            words_per_day,
            offset,
            times,
        })
    }
}
