// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Consumable lifetime tracking.
//!
//! Consumables are checked on a slow cadence. Each item is converted to a
//! life percentage and compared against the configured warning threshold.
//! Only transitions of the resulting "needs replacement" flag are reported,
//! so a worn brush produces one alert and not one per check.
//!
//! # Examples
//!
//! ```
//! use tokio::time::Instant;
//! use valetudo_bridge::config::ConsumableConfig;
//! use valetudo_bridge::consumables::ConsumableTracker;
//! use valetudo_bridge::telemetry::Consumable;
//!
//! let worn: Consumable = serde_json::from_str(
//!     r#"{"type":"brush","subType":"main","remaining":{"value":200,"unit":"minutes"}}"#,
//! ).unwrap();
//!
//! let mut tracker = ConsumableTracker::new();
//! let alerts = tracker.evaluate(&[worn], &ConsumableConfig::default(), Instant::now());
//!
//! assert_eq!(alerts.len(), 1);
//! assert_eq!(alerts[0].name, "Main Brush");
//! assert!(alerts[0].needs_replacement);
//! ```

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

use crate::config::ConsumableConfig;
use crate::telemetry::{Consumable, Remaining, RemainingUnit};

/// Minimum time between two consumable checks of one device.
pub const CONSUMABLE_CHECK_INTERVAL: Duration = Duration::from_secs(3600);

/// Consumable categories with a configurable lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConsumableCategory {
    /// Main brush.
    MainBrush,
    /// Left or right side brush.
    SideBrush,
    /// Dust filter.
    Filter,
    /// Cliff and wall sensors.
    Sensor,
}

impl ConsumableCategory {
    /// Returns the lifetime category of a `{type, subType}` pair.
    #[must_use]
    pub fn of(kind: &str, sub_type: &str) -> Option<Self> {
        match (kind, sub_type) {
            ("brush", "main") => Some(Self::MainBrush),
            ("brush", "side_right" | "side_left") => Some(Self::SideBrush),
            ("filter", "main") => Some(Self::Filter),
            ("sensor", "all") => Some(Self::Sensor),
            _ => None,
        }
    }
}

/// Returns the display name of a consumable.
///
/// # Examples
///
/// ```
/// use valetudo_bridge::consumables::display_name;
///
/// assert_eq!(display_name("brush", "side_left"), "Left Side Brush");
/// assert_eq!(display_name("detergent", "dock"), "Detergent");
/// assert_eq!(display_name("squeegee", "rear"), "squeegee rear");
/// ```
#[must_use]
pub fn display_name(kind: &str, sub_type: &str) -> String {
    let known = match (kind, sub_type) {
        ("brush", "main") => Some("Main Brush"),
        ("brush", "side_right") => Some("Right Side Brush"),
        ("brush", "side_left") => Some("Left Side Brush"),
        ("filter", "main") => Some("Filter"),
        ("sensor", "all") => Some("Sensors"),
        ("mop", "main") => Some("Mop"),
        ("bin", "main") => Some("Dust Bin"),
        (_, sub) if sub.contains("dock") => Some("Detergent"),
        _ => None,
    };
    known.map_or_else(|| format!("{kind} {sub_type}"), str::to_string)
}

/// Computes the remaining life of a consumable in percent.
///
/// Returns `None` when the unit is unknown or the consumable is reported in
/// minutes without a configured lifetime for its category.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn life_percent(consumable: &Consumable, config: &ConsumableConfig) -> Option<u8> {
    let percent = match consumable.remaining.unit {
        RemainingUnit::Percent => consumable.remaining.value,
        RemainingUnit::Minutes => {
            let category = ConsumableCategory::of(&consumable.kind, &consumable.sub_type)?;
            let max = config.max_minutes(category)?;
            consumable.remaining.value / max * 100.0
        }
        RemainingUnit::Other => return None,
    };
    if percent.is_nan() {
        return None;
    }
    // Safe: clamped to 0..=100
    Some(percent.round().clamp(0.0, 100.0) as u8)
}

/// Last known state of one consumable.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsumableEntry {
    /// Display name.
    pub name: String,
    /// Raw remaining value as reported.
    pub remaining: Remaining,
    /// Remaining life in percent.
    pub life_percent: u8,
    /// Whether the life is at or below the warning threshold.
    pub needs_replacement: bool,
}

/// A change of a consumable's replacement flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumableAlert {
    /// Display name.
    pub name: String,
    /// Remaining life in percent.
    pub life_percent: u8,
    /// New value of the replacement flag.
    pub needs_replacement: bool,
}

/// Per-device consumable tracker.
///
/// Entries are keyed by the raw `{type, subType}` pair. Display names are
/// not unique: every dock item is shown as "Detergent".
#[derive(Debug, Clone)]
pub struct ConsumableTracker {
    entries: HashMap<(String, String), ConsumableEntry>,
    last_check: Option<Instant>,
    interval: Duration,
}

impl Default for ConsumableTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsumableTracker {
    /// Creates a tracker using [`CONSUMABLE_CHECK_INTERVAL`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_interval(CONSUMABLE_CHECK_INTERVAL)
    }

    /// Creates a tracker with a custom check interval.
    #[must_use]
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            last_check: None,
            interval,
        }
    }

    /// Returns true if a check is due at `now`.
    #[must_use]
    pub fn is_due(&self, now: Instant) -> bool {
        self.last_check
            .is_none_or(|last| now.saturating_duration_since(last) >= self.interval)
    }

    /// Records a check attempt at `now`, successful or not.
    pub fn mark_checked(&mut self, now: Instant) {
        self.last_check = Some(now);
    }

    /// Evaluates freshly fetched consumables.
    ///
    /// Marks the tracker as checked at `now` and returns one alert per item
    /// whose replacement flag changed. An item seen for the first time
    /// alerts only if it already needs replacement.
    pub fn evaluate(
        &mut self,
        consumables: &[Consumable],
        config: &ConsumableConfig,
        now: Instant,
    ) -> Vec<ConsumableAlert> {
        self.mark_checked(now);

        let mut alerts = Vec::new();
        for consumable in consumables {
            let Some(life) = life_percent(consumable, config) else {
                tracing::debug!(
                    kind = %consumable.kind,
                    sub_type = %consumable.sub_type,
                    "Skipping consumable without known lifetime"
                );
                continue;
            };

            let key = (consumable.kind.clone(), consumable.sub_type.clone());
            let name = display_name(&consumable.kind, &consumable.sub_type);
            let needs_replacement = life <= config.warning_threshold;
            let previous = self.entries.get(&key).map(|e| e.needs_replacement);

            let changed = match previous {
                Some(previous) => previous != needs_replacement,
                None => needs_replacement,
            };
            if changed {
                alerts.push(ConsumableAlert {
                    name: name.clone(),
                    life_percent: life,
                    needs_replacement,
                });
            }

            self.entries.insert(
                key,
                ConsumableEntry {
                    name,
                    remaining: consumable.remaining,
                    life_percent: life,
                    needs_replacement,
                },
            );
        }
        alerts
    }

    /// Returns the tracked entry of a `{type, subType}` pair.
    #[must_use]
    pub fn get(&self, kind: &str, sub_type: &str) -> Option<&ConsumableEntry> {
        self.entries.get(&(kind.to_string(), sub_type.to_string()))
    }

    /// Returns the number of tracked consumables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is tracked yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn consumable(kind: &str, sub_type: &str, value: f64, unit: RemainingUnit) -> Consumable {
        Consumable {
            kind: kind.to_string(),
            sub_type: sub_type.to_string(),
            remaining: Remaining { value, unit },
        }
    }

    #[test]
    fn name_table() {
        let cases = [
            ("brush", "main", "Main Brush"),
            ("brush", "side_right", "Right Side Brush"),
            ("brush", "side_left", "Left Side Brush"),
            ("filter", "main", "Filter"),
            ("sensor", "all", "Sensors"),
            ("mop", "main", "Mop"),
            ("bin", "main", "Dust Bin"),
            ("detergent", "dock_tank", "Detergent"),
            ("cleaning", "dock", "Detergent"),
            ("brush", "roller", "brush roller"),
        ];
        for (kind, sub, expected) in cases {
            assert_eq!(display_name(kind, sub), expected);
        }
    }

    #[test]
    fn percent_unit_is_used_directly() {
        let mop = consumable("mop", "main", 42.4, RemainingUnit::Percent);
        assert_eq!(life_percent(&mop, &ConsumableConfig::default()), Some(42));
    }

    #[test]
    fn minutes_use_configured_lifetime() {
        let filter = consumable("filter", "main", 4_500.0, RemainingUnit::Minutes);
        assert_eq!(life_percent(&filter, &ConsumableConfig::default()), Some(50));
    }

    #[test]
    fn minutes_without_lifetime_are_skipped() {
        let bin = consumable("bin", "main", 100.0, RemainingUnit::Minutes);
        assert_eq!(life_percent(&bin, &ConsumableConfig::default()), None);

        let config = ConsumableConfig {
            filter_minutes: 0,
            ..ConsumableConfig::default()
        };
        let filter = consumable("filter", "main", 100.0, RemainingUnit::Minutes);
        assert_eq!(life_percent(&filter, &config), None);
    }

    #[test]
    fn unknown_unit_is_skipped() {
        let odd = consumable("mop", "main", 3.0, RemainingUnit::Other);
        assert_eq!(life_percent(&odd, &ConsumableConfig::default()), None);
    }

    #[test]
    fn life_is_clamped() {
        let fresh = consumable("brush", "main", 20_000.0, RemainingUnit::Minutes);
        assert_eq!(life_percent(&fresh, &ConsumableConfig::default()), Some(100));
    }

    #[test]
    fn worn_brush_alerts_once_over_three_checks() {
        let config = ConsumableConfig::default();
        let worn = [consumable("brush", "main", 200.0, RemainingUnit::Minutes)];
        let mut tracker = ConsumableTracker::new();
        let now = Instant::now();

        let first = tracker.evaluate(&worn, &config, now);
        let second = tracker.evaluate(&worn, &config, now + CONSUMABLE_CHECK_INTERVAL);
        let third = tracker.evaluate(&worn, &config, now + CONSUMABLE_CHECK_INTERVAL * 2);

        assert_eq!(
            first,
            vec![ConsumableAlert {
                name: "Main Brush".to_string(),
                life_percent: 1,
                needs_replacement: true,
            }]
        );
        assert!(second.is_empty());
        assert!(third.is_empty());
    }

    #[test]
    fn healthy_first_observation_is_silent() {
        let config = ConsumableConfig::default();
        let healthy = [consumable("mop", "main", 80.0, RemainingUnit::Percent)];
        let mut tracker = ConsumableTracker::new();

        assert!(tracker.evaluate(&healthy, &config, Instant::now()).is_empty());
        assert_eq!(tracker.len(), 1);
        assert!(!tracker.get("mop", "main").unwrap().needs_replacement);
    }

    #[test]
    fn replacement_clears_flag() {
        let config = ConsumableConfig::default();
        let mut tracker = ConsumableTracker::new();
        let now = Instant::now();

        tracker.evaluate(
            &[consumable("mop", "main", 5.0, RemainingUnit::Percent)],
            &config,
            now,
        );
        let alerts = tracker.evaluate(
            &[consumable("mop", "main", 100.0, RemainingUnit::Percent)],
            &config,
            now,
        );

        assert_eq!(alerts.len(), 1);
        assert!(!alerts[0].needs_replacement);
    }

    #[test]
    fn dock_items_sharing_a_name_are_tracked_apart() {
        let config = ConsumableConfig::default();
        let dock = [
            consumable("detergent", "dock", 5.0, RemainingUnit::Percent),
            consumable("cleaning", "dock", 80.0, RemainingUnit::Percent),
        ];
        let mut tracker = ConsumableTracker::new();
        let now = Instant::now();

        let first = tracker.evaluate(&dock, &config, now);
        let second = tracker.evaluate(&dock, &config, now + CONSUMABLE_CHECK_INTERVAL);
        let third = tracker.evaluate(&dock, &config, now + CONSUMABLE_CHECK_INTERVAL * 2);

        assert_eq!(
            first,
            vec![ConsumableAlert {
                name: "Detergent".to_string(),
                life_percent: 5,
                needs_replacement: true,
            }]
        );
        assert!(second.is_empty());
        assert!(third.is_empty());
        assert_eq!(tracker.len(), 2);
        assert!(tracker.get("detergent", "dock").unwrap().needs_replacement);
        assert!(!tracker.get("cleaning", "dock").unwrap().needs_replacement);
    }

    #[test]
    fn threshold_is_inclusive() {
        let config = ConsumableConfig::default().with_warning_threshold(10);
        let mut tracker = ConsumableTracker::new();
        let alerts = tracker.evaluate(
            &[consumable("mop", "main", 10.0, RemainingUnit::Percent)],
            &config,
            Instant::now(),
        );
        assert_eq!(alerts.len(), 1);
    }

    #[test]
    fn check_gate() {
        let mut tracker = ConsumableTracker::new();
        let start = Instant::now();
        assert!(tracker.is_due(start));

        tracker.mark_checked(start);
        assert!(!tracker.is_due(start + Duration::from_secs(59 * 60)));
        assert!(tracker.is_due(start + CONSUMABLE_CHECK_INTERVAL));
    }
}
