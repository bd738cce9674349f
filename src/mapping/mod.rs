// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Translation of robot enumerations into normalized bridge values.
//!
//! Every function here is pure and total. An unrecognized robot value is not
//! an error: it maps to a documented default.
//!
//! # Examples
//!
//! ```
//! use valetudo_bridge::mapping::{map_status_to_operational_state, map_status_to_run_mode};
//! use valetudo_bridge::types::{OperationalState, RunMode};
//!
//! assert_eq!(map_status_to_operational_state("Cleaning", None), OperationalState::Running);
//! assert_eq!(map_status_to_run_mode("cleaning"), RunMode::Cleaning);
//!
//! // The dock takes precedence while the robot is parked
//! assert_eq!(
//!     map_status_to_operational_state("idle", Some("emptying")),
//!     OperationalState::Docked
//! );
//!
//! // Unknown values fall back to defaults
//! assert_eq!(map_status_to_operational_state("levitating", None), OperationalState::Stopped);
//! assert_eq!(map_status_to_run_mode("levitating"), RunMode::Idle);
//! ```

mod clean_mode;

pub use clean_mode::{
    CatalogInput, CleanCategory, CleanModeCatalog, CleanModeEntry, ModeSettings, PresetLevel,
    build_catalog, expand_combined, expand_presets,
};

use crate::telemetry::StateSnapshot;
use crate::types::{BatteryChargeState, BatteryPercent, OperationalState, RunMode};

/// Base statuses during which dock activity overrides the robot status.
const PARKED_STATUSES: [&str; 3] = ["docked", "idle", "charging"];

/// Dock activities that force [`OperationalState::Docked`].
const ACTIVE_DOCK_STATUSES: [&str; 3] = ["emptying", "drying", "cleaning"];

/// Maps a robot status to an operational state.
///
/// Matching is case-insensitive. When the base status is a parked status
/// (`docked`, `idle`, `charging`) and the dock reports `emptying`, `drying`
/// or `cleaning`, the result is [`OperationalState::Docked`] regardless of
/// the base mapping. Unknown statuses map to [`OperationalState::Stopped`].
#[must_use]
pub fn map_status_to_operational_state(status: &str, dock_status: Option<&str>) -> OperationalState {
    let status = status.trim().to_ascii_lowercase();

    if PARKED_STATUSES.contains(&status.as_str())
        && dock_status.is_some_and(|dock| {
            let dock = dock.trim().to_ascii_lowercase();
            ACTIVE_DOCK_STATUSES.contains(&dock.as_str())
        })
    {
        return OperationalState::Docked;
    }

    match status.as_str() {
        "error" => OperationalState::Error,
        "docked" => OperationalState::Docked,
        "charging" => OperationalState::Charging,
        "cleaning" | "manual_control" | "moving" => OperationalState::Running,
        "paused" => OperationalState::Paused,
        "returning" => OperationalState::SeekingCharger,
        _ => OperationalState::Stopped,
    }
}

/// Maps a robot status to a run mode.
///
/// Only an active cleaning status yields [`RunMode::Cleaning`]; everything
/// else, known or not, is [`RunMode::Idle`].
#[must_use]
pub fn map_status_to_run_mode(status: &str) -> RunMode {
    if status.trim().eq_ignore_ascii_case("cleaning") {
        RunMode::Cleaning
    } else {
        RunMode::Idle
    }
}

/// Maps a robot battery flag to a charge state.
#[must_use]
pub fn map_battery_flag(flag: &str) -> BatteryChargeState {
    match flag.trim().to_ascii_lowercase().as_str() {
        "charging" => BatteryChargeState::Charging,
        "charged" => BatteryChargeState::Charged,
        "discharging" => BatteryChargeState::NotCharging,
        _ => BatteryChargeState::Unknown,
    }
}

/// Normalized values derived from one state snapshot.
///
/// Fields are `None` when the snapshot did not contain the source record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizedState {
    /// Remaining battery in half-percent steps.
    pub battery_percent: Option<BatteryPercent>,
    /// Battery charge state.
    pub charge_state: Option<BatteryChargeState>,
    /// Operational state.
    pub operational_state: Option<OperationalState>,
    /// Run mode.
    pub run_mode: Option<RunMode>,
}

impl NormalizedState {
    /// Normalizes a state snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: &StateSnapshot) -> Self {
        let (battery_percent, charge_state) = match &snapshot.battery {
            Some(battery) => (
                Some(BatteryPercent::from_vendor_level(battery.level)),
                Some(map_battery_flag(&battery.flag)),
            ),
            None => (None, None),
        };

        let (operational_state, run_mode) = match &snapshot.status {
            Some(status) => (
                Some(map_status_to_operational_state(
                    &status.value,
                    snapshot.dock_status.as_deref(),
                )),
                Some(map_status_to_run_mode(&status.value)),
            ),
            None => (None, None),
        };

        Self {
            battery_percent,
            charge_state,
            operational_state,
            run_mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::{BatteryReading, StatusReading};

    const KNOWN: [(&str, OperationalState, RunMode); 9] = [
        ("error", OperationalState::Error, RunMode::Idle),
        ("docked", OperationalState::Docked, RunMode::Idle),
        ("idle", OperationalState::Stopped, RunMode::Idle),
        ("charging", OperationalState::Charging, RunMode::Idle),
        ("cleaning", OperationalState::Running, RunMode::Cleaning),
        ("manual_control", OperationalState::Running, RunMode::Idle),
        ("moving", OperationalState::Running, RunMode::Idle),
        ("paused", OperationalState::Paused, RunMode::Idle),
        ("returning", OperationalState::SeekingCharger, RunMode::Idle),
    ];

    #[test]
    fn known_statuses_map_to_fixed_values() {
        for (status, state, mode) in KNOWN {
            assert_eq!(map_status_to_operational_state(status, None), state, "{status}");
            assert_eq!(map_status_to_run_mode(status), mode, "{status}");
        }
    }

    #[test]
    fn mapping_is_case_insensitive() {
        assert_eq!(
            map_status_to_operational_state("RETURNING", None),
            OperationalState::SeekingCharger
        );
        assert_eq!(map_status_to_run_mode("Cleaning"), RunMode::Cleaning);
    }

    #[test]
    fn unknown_status_maps_to_defaults() {
        for status in ["", "drying", "sleeping", "cleaning!"] {
            assert_eq!(
                map_status_to_operational_state(status, None),
                OperationalState::Stopped
            );
            assert_eq!(map_status_to_run_mode(status), RunMode::Idle);
        }
    }

    #[test]
    fn docked_with_drying_dock_is_docked() {
        assert_eq!(
            map_status_to_operational_state("docked", Some("drying")),
            OperationalState::Docked
        );
    }

    #[test]
    fn dock_activity_overrides_parked_statuses() {
        for status in ["idle", "charging", "docked"] {
            for dock in ["emptying", "drying", "cleaning", "DRYING"] {
                assert_eq!(
                    map_status_to_operational_state(status, Some(dock)),
                    OperationalState::Docked,
                    "{status} + {dock}"
                );
            }
        }
    }

    #[test]
    fn dock_activity_does_not_override_moving_statuses() {
        assert_eq!(
            map_status_to_operational_state("cleaning", Some("drying")),
            OperationalState::Running
        );
        assert_eq!(
            map_status_to_operational_state("returning", Some("emptying")),
            OperationalState::SeekingCharger
        );
    }

    #[test]
    fn idle_dock_does_not_override() {
        assert_eq!(
            map_status_to_operational_state("charging", Some("idle")),
            OperationalState::Charging
        );
    }

    #[test]
    fn battery_flags() {
        assert_eq!(map_battery_flag("charging"), BatteryChargeState::Charging);
        assert_eq!(map_battery_flag("charged"), BatteryChargeState::Charged);
        assert_eq!(map_battery_flag("discharging"), BatteryChargeState::NotCharging);
        assert_eq!(map_battery_flag("none"), BatteryChargeState::Unknown);
        assert_eq!(map_battery_flag(""), BatteryChargeState::Unknown);
    }

    #[test]
    fn normalize_full_snapshot() {
        let snapshot = StateSnapshot {
            battery: Some(BatteryReading {
                level: 73.0,
                flag: "discharging".to_string(),
            }),
            status: Some(StatusReading {
                value: "cleaning".to_string(),
                flag: "segment".to_string(),
            }),
            dock_status: None,
            presets: Vec::new(),
        };

        let state = NormalizedState::from_snapshot(&snapshot);
        assert_eq!(state.battery_percent.map(|b| b.value()), Some(146));
        assert_eq!(state.charge_state, Some(BatteryChargeState::NotCharging));
        assert_eq!(state.operational_state, Some(OperationalState::Running));
        assert_eq!(state.run_mode, Some(RunMode::Cleaning));
    }

    #[test]
    fn normalize_empty_snapshot() {
        let state = NormalizedState::from_snapshot(&StateSnapshot::default());
        assert_eq!(state, NormalizedState::default());
    }
}
