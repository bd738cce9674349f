// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bridge configuration.
//!
//! The configuration is format agnostic: it derives `Deserialize` so a host
//! can load it from JSON, TOML or anything else `serde` speaks, and it offers
//! builder-style setters for programmatic use. Out of range values are
//! clamped, never rejected.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//! use valetudo_bridge::config::BridgeConfig;
//!
//! let config = BridgeConfig::default()
//!     .with_poll_interval(Duration::from_secs(2))
//!     .with_map_refresh_hours(48.0);
//!
//! // Both values are clamped to their allowed ranges
//! assert_eq!(config.poll_interval(), Duration::from_secs(5));
//! assert_eq!(config.map_refresh_interval(), Duration::from_secs(24 * 3600));
//! ```

use std::time::Duration;

use serde::Deserialize;

use crate::consumables::ConsumableCategory;
use crate::mapping::{CleanCategory, PresetLevel};

/// Shortest allowed poll interval.
pub const MIN_POLL_INTERVAL_MS: u64 = 5_000;
/// Longest allowed poll interval.
pub const MAX_POLL_INTERVAL_MS: u64 = 60_000;
/// Shortest allowed map cache lifetime.
pub const MIN_MAP_REFRESH_HOURS: f64 = 0.1;
/// Longest allowed map cache lifetime.
pub const MAX_MAP_REFRESH_HOURS: f64 = 24.0;

/// Top-level bridge configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BridgeConfig {
    /// Poll interval in milliseconds, clamped to [5000, 60000].
    pub poll_interval_ms: u64,
    /// Map cache lifetime in hours, clamped to [0.1, 24].
    pub map_refresh_hours: f64,
    /// Consumable monitoring settings.
    pub consumables: ConsumableConfig,
    /// Display names of the clean mode categories.
    pub mode_names: ModeNames,
    /// Fan speed preset names per intensity.
    pub fan_presets: PresetOverrides,
    /// Water usage preset names per intensity.
    pub water_presets: PresetOverrides,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 10_000,
            map_refresh_hours: 1.0,
            consumables: ConsumableConfig::default(),
            mode_names: ModeNames::default(),
            fan_presets: PresetOverrides::default(),
            water_presets: PresetOverrides::default(),
        }
    }
}

impl BridgeConfig {
    /// Sets the poll interval.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        // Safe: clamped to MAX_POLL_INTERVAL_MS right after
        self.poll_interval_ms = (interval.as_millis() as u64)
            .clamp(MIN_POLL_INTERVAL_MS, MAX_POLL_INTERVAL_MS);
        self
    }

    /// Sets the map cache lifetime in hours.
    #[must_use]
    pub fn with_map_refresh_hours(mut self, hours: f64) -> Self {
        self.map_refresh_hours = clamp_hours(hours);
        self
    }

    /// Sets the consumable monitoring settings.
    #[must_use]
    pub fn with_consumables(mut self, consumables: ConsumableConfig) -> Self {
        self.consumables = consumables;
        self
    }

    /// Sets the clean mode category names.
    #[must_use]
    pub fn with_mode_names(mut self, mode_names: ModeNames) -> Self {
        self.mode_names = mode_names;
        self
    }

    /// Sets the fan speed preset overrides.
    #[must_use]
    pub fn with_fan_presets(mut self, presets: PresetOverrides) -> Self {
        self.fan_presets = presets;
        self
    }

    /// Sets the water usage preset overrides.
    #[must_use]
    pub fn with_water_presets(mut self, presets: PresetOverrides) -> Self {
        self.water_presets = presets;
        self
    }

    /// Returns the effective poll interval.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(
            self.poll_interval_ms
                .clamp(MIN_POLL_INTERVAL_MS, MAX_POLL_INTERVAL_MS),
        )
    }

    /// Returns the effective map cache lifetime.
    #[must_use]
    pub fn map_refresh_interval(&self) -> Duration {
        Duration::from_secs_f64(clamp_hours(self.map_refresh_hours) * 3600.0)
    }
}

fn clamp_hours(hours: f64) -> f64 {
    if hours.is_nan() {
        return MIN_MAP_REFRESH_HOURS;
    }
    hours.clamp(MIN_MAP_REFRESH_HOURS, MAX_MAP_REFRESH_HOURS)
}

/// Consumable monitoring settings.
///
/// Lifetimes are in minutes and only matter for consumables the robot
/// reports as remaining runtime. A lifetime of zero disables tracking for
/// that category.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConsumableConfig {
    /// Whether consumable checks run at all.
    pub enabled: bool,
    /// Life percentage at or below which a consumable needs replacement.
    pub warning_threshold: u8,
    /// Main brush lifetime.
    pub main_brush_minutes: u32,
    /// Side brush lifetime.
    pub side_brush_minutes: u32,
    /// Filter lifetime.
    pub filter_minutes: u32,
    /// Sensor cleaning interval.
    pub sensor_minutes: u32,
}

impl Default for ConsumableConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            warning_threshold: 10,
            main_brush_minutes: 18_000,
            side_brush_minutes: 12_000,
            filter_minutes: 9_000,
            sensor_minutes: 1_800,
        }
    }
}

impl ConsumableConfig {
    /// Returns the configured lifetime of a category in minutes.
    #[must_use]
    pub fn max_minutes(&self, category: ConsumableCategory) -> Option<f64> {
        let minutes = match category {
            ConsumableCategory::MainBrush => self.main_brush_minutes,
            ConsumableCategory::SideBrush => self.side_brush_minutes,
            ConsumableCategory::Filter => self.filter_minutes,
            ConsumableCategory::Sensor => self.sensor_minutes,
        };
        (minutes > 0).then_some(f64::from(minutes))
    }

    /// Sets the warning threshold, clamped to 100.
    #[must_use]
    pub fn with_warning_threshold(mut self, percent: u8) -> Self {
        self.warning_threshold = percent.min(100);
        self
    }

    /// Disables consumable checks.
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// Display names of the three clean mode categories.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ModeNames {
    /// Vacuum only.
    pub vacuum: String,
    /// Mop only.
    pub mop: String,
    /// Vacuum and mop at once.
    pub vacuum_and_mop: String,
}

impl Default for ModeNames {
    fn default() -> Self {
        Self {
            vacuum: "Vacuum".to_string(),
            mop: "Mop".to_string(),
            vacuum_and_mop: "Vacuum & Mop".to_string(),
        }
    }
}

impl ModeNames {
    /// Returns the name of a category.
    #[must_use]
    pub fn name(&self, category: CleanCategory) -> &str {
        match category {
            CleanCategory::Vacuum => &self.vacuum,
            CleanCategory::Mop => &self.mop,
            CleanCategory::VacuumAndMop => &self.vacuum_and_mop,
        }
    }
}

/// Robot preset names to use for each intensity level.
///
/// Unset levels use the level keyword itself (`low`, `medium`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PresetOverrides {
    /// Preset for [`PresetLevel::Off`].
    pub off: Option<String>,
    /// Preset for [`PresetLevel::Min`].
    pub min: Option<String>,
    /// Preset for [`PresetLevel::Low`].
    pub low: Option<String>,
    /// Preset for [`PresetLevel::Medium`].
    pub medium: Option<String>,
    /// Preset for [`PresetLevel::High`].
    pub high: Option<String>,
    /// Preset for [`PresetLevel::Max`].
    pub max: Option<String>,
    /// Preset for [`PresetLevel::Turbo`].
    pub turbo: Option<String>,
}

impl PresetOverrides {
    fn custom(&self, level: PresetLevel) -> Option<&str> {
        match level {
            PresetLevel::Off => self.off.as_deref(),
            PresetLevel::Min => self.min.as_deref(),
            PresetLevel::Low => self.low.as_deref(),
            PresetLevel::Medium => self.medium.as_deref(),
            PresetLevel::High => self.high.as_deref(),
            PresetLevel::Max => self.max.as_deref(),
            PresetLevel::Turbo => self.turbo.as_deref(),
        }
    }

    /// Returns the robot preset name for a level.
    #[must_use]
    pub fn name_for(&self, level: PresetLevel) -> &str {
        self.custom(level).unwrap_or(level.keyword())
    }

    /// Sets the preset name for a level.
    #[must_use]
    pub fn with(mut self, level: PresetLevel, name: impl Into<String>) -> Self {
        let slot = match level {
            PresetLevel::Off => &mut self.off,
            PresetLevel::Min => &mut self.min,
            PresetLevel::Low => &mut self.low,
            PresetLevel::Medium => &mut self.medium,
            PresetLevel::High => &mut self.high,
            PresetLevel::Max => &mut self.max,
            PresetLevel::Turbo => &mut self.turbo,
        };
        *slot = Some(name.into());
        self
    }

    /// Resolves a robot preset name back to a level.
    ///
    /// Overrides are checked first, then the level keywords. Matching is
    /// case-insensitive.
    #[must_use]
    pub fn level_of(&self, preset: &str) -> Option<PresetLevel> {
        PresetLevel::ALL
            .into_iter()
            .find(|level| {
                self.custom(*level)
                    .is_some_and(|name| name.eq_ignore_ascii_case(preset))
            })
            .or_else(|| PresetLevel::from_keyword(preset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let config = BridgeConfig::default();
        assert_eq!(config.poll_interval(), Duration::from_secs(10));
        assert_eq!(config.map_refresh_interval(), Duration::from_secs(3600));
        assert!(config.consumables.enabled);
        assert_eq!(config.consumables.warning_threshold, 10);
    }

    #[test]
    fn poll_interval_is_clamped() {
        let fast = BridgeConfig::default().with_poll_interval(Duration::from_millis(100));
        assert_eq!(fast.poll_interval(), Duration::from_millis(5_000));

        let slow = BridgeConfig::default().with_poll_interval(Duration::from_secs(600));
        assert_eq!(slow.poll_interval(), Duration::from_millis(60_000));
    }

    #[test]
    fn deserialized_values_are_clamped_on_read() {
        let config: BridgeConfig =
            serde_json::from_str(r#"{"pollIntervalMs": 1, "mapRefreshHours": 0.0}"#).unwrap();
        assert_eq!(config.poll_interval(), Duration::from_millis(5_000));
        assert_eq!(config.map_refresh_interval(), Duration::from_secs(360));
    }

    #[test]
    fn deserialize_nested_sections() {
        let json = r#"{
            "consumables": {"enabled": false, "warningThreshold": 25},
            "modeNames": {"vacuum": "Suck"},
            "fanPresets": {"max": "turbo"}
        }"#;
        let config: BridgeConfig = serde_json::from_str(json).unwrap();

        assert!(!config.consumables.enabled);
        assert_eq!(config.consumables.warning_threshold, 25);
        assert_eq!(config.consumables.main_brush_minutes, 18_000);
        assert_eq!(config.mode_names.vacuum, "Suck");
        assert_eq!(config.mode_names.mop, "Mop");
        assert_eq!(config.fan_presets.name_for(PresetLevel::Max), "turbo");
    }

    #[test]
    fn zero_lifetime_disables_category() {
        let config = ConsumableConfig {
            sensor_minutes: 0,
            ..ConsumableConfig::default()
        };
        assert_eq!(config.max_minutes(ConsumableCategory::Sensor), None);
        assert_eq!(
            config.max_minutes(ConsumableCategory::MainBrush),
            Some(18_000.0)
        );
    }

    #[test]
    fn preset_name_defaults_to_keyword() {
        let presets = PresetOverrides::default();
        assert_eq!(presets.name_for(PresetLevel::Low), "low");
        assert_eq!(presets.name_for(PresetLevel::Turbo), "turbo");
    }

    #[test]
    fn level_of_prefers_overrides() {
        let presets = PresetOverrides::default().with(PresetLevel::Low, "quiet");
        assert_eq!(presets.level_of("Quiet"), Some(PresetLevel::Low));
        assert_eq!(presets.level_of("medium"), Some(PresetLevel::Medium));
        assert_eq!(presets.level_of("custom"), None);
    }

    #[test]
    fn mode_names_lookup() {
        let names = ModeNames::default();
        assert_eq!(names.name(CleanCategory::VacuumAndMop), "Vacuum & Mop");
    }
}
