// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parser for the robot state attribute list.

use serde::Deserialize;

use crate::error::ParseError;

/// One entry of `GET /api/v2/robot/state/attributes`.
///
/// The robot returns a heterogeneous list distinguished by the `__class`
/// field. Kinds this crate does not consume decode to [`StateAttribute::Unknown`]
/// instead of failing the whole payload.
///
/// # Examples
///
/// ```
/// use valetudo_bridge::telemetry::StateAttribute;
///
/// let json = r#"{"__class":"BatteryStateAttribute","level":87,"flag":"discharging"}"#;
/// let attr: StateAttribute = serde_json::from_str(json).unwrap();
/// assert!(matches!(attr, StateAttribute::Battery { .. }));
///
/// let json = r#"{"__class":"SomethingNew","foo":1}"#;
/// let attr: StateAttribute = serde_json::from_str(json).unwrap();
/// assert!(matches!(attr, StateAttribute::Unknown));
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "__class")]
pub enum StateAttribute {
    /// Battery level and charge flag.
    #[serde(rename = "BatteryStateAttribute")]
    Battery {
        /// Battery level in percent.
        #[serde(default)]
        level: f64,
        /// Charge flag (`charging`, `charged`, `discharging`, `none`).
        #[serde(default)]
        flag: String,
    },

    /// Primary robot status.
    #[serde(rename = "StatusStateAttribute")]
    Status {
        /// Status value (`docked`, `cleaning`, `returning`, ...).
        value: String,
        /// Status flag (`none`, `segment`, `zone`, `resumable`, ...).
        #[serde(default)]
        flag: String,
    },

    /// Status of the docking station.
    #[serde(rename = "DockStatusStateAttribute")]
    DockStatus {
        /// Dock activity (`idle`, `emptying`, `drying`, `cleaning`, ...).
        value: String,
    },

    /// Currently selected preset of a preset capability.
    #[serde(rename = "PresetSelectionStateAttribute")]
    PresetSelection {
        /// Preset kind (`fan_speed`, `water_grade`, `operation_mode`).
        #[serde(rename = "type")]
        kind: String,
        /// Selected preset name.
        value: String,
    },

    /// Any attribute kind not consumed by the bridge.
    #[serde(other)]
    Unknown,
}

/// Battery reading extracted from a state snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct BatteryReading {
    /// Battery level in percent.
    pub level: f64,
    /// Vendor charge flag.
    pub flag: String,
}

/// Status reading extracted from a state snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReading {
    /// Vendor status value.
    pub value: String,
    /// Vendor status flag.
    pub flag: String,
}

/// The sub-records the bridge needs from one state attribute fetch.
///
/// All fields come from the same payload, so a cycle never mixes readings
/// from two different requests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateSnapshot {
    /// Battery reading, if reported.
    pub battery: Option<BatteryReading>,
    /// Robot status, if reported.
    pub status: Option<StatusReading>,
    /// Dock status, if the robot has a dock that reports one.
    pub dock_status: Option<String>,
    /// Selected presets as `(kind, value)` pairs.
    pub presets: Vec<(String, String)>,
}

impl StateSnapshot {
    /// Extracts the known sub-records from an attribute list.
    ///
    /// When a kind appears more than once, the first occurrence wins.
    #[must_use]
    pub fn from_attributes(attributes: &[StateAttribute]) -> Self {
        let mut snapshot = Self::default();

        for attribute in attributes {
            match attribute {
                StateAttribute::Battery { level, flag } if snapshot.battery.is_none() => {
                    snapshot.battery = Some(BatteryReading {
                        level: *level,
                        flag: flag.clone(),
                    });
                }
                StateAttribute::Status { value, flag } if snapshot.status.is_none() => {
                    snapshot.status = Some(StatusReading {
                        value: value.clone(),
                        flag: flag.clone(),
                    });
                }
                StateAttribute::DockStatus { value } if snapshot.dock_status.is_none() => {
                    snapshot.dock_status = Some(value.clone());
                }
                StateAttribute::PresetSelection { kind, value } => {
                    snapshot.presets.push((kind.clone(), value.clone()));
                }
                _ => {}
            }
        }

        snapshot
    }

    /// Returns the selected preset of the given kind.
    #[must_use]
    pub fn preset(&self, kind: &str) -> Option<&str> {
        self.presets
            .iter()
            .find(|(k, _)| k == kind)
            .map(|(_, v)| v.as_str())
    }
}

/// Parses the body of a state attribute response.
///
/// # Errors
///
/// Returns `ParseError::Json` if the body is not a JSON array of attributes.
pub fn parse_state_attributes(body: &str) -> Result<Vec<StateAttribute>, ParseError> {
    serde_json::from_str(body).map_err(ParseError::Json)
}
