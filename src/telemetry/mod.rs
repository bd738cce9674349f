// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Payloads read from the robot.
//!
//! Everything in this module is passive data: decoded from robot responses,
//! read by the synchronizer and never written back.
//!
//! # Examples
//!
//! ```
//! use valetudo_bridge::telemetry::{parse_state_attributes, StateSnapshot};
//!
//! let body = r#"[
//!     {"__class":"StatusStateAttribute","value":"docked","flag":"none"},
//!     {"__class":"BatteryStateAttribute","level":100,"flag":"charged"}
//! ]"#;
//!
//! let attributes = parse_state_attributes(body).unwrap();
//! let snapshot = StateSnapshot::from_attributes(&attributes);
//! assert_eq!(snapshot.status.unwrap().value, "docked");
//! ```

mod map_parser;
mod state_parser;

pub use map_parser::{
    AxisBounds, LayerDimensions, LayerMetaData, MapEntity, MapLayer, MapMetaData, MapPayload,
    MapSize, PositionPayload, ROBOT_POSITION_ENTITY, SEGMENT_LAYER, SegmentId, parse_map,
    parse_position, robot_position,
};
pub use state_parser::{
    BatteryReading, StateAttribute, StateSnapshot, StatusReading, parse_state_attributes,
};

use serde::Deserialize;

/// Identity of a robot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RobotIdentity {
    /// Stable vendor-assigned system id.
    pub system_id: String,
    /// Robot manufacturer.
    pub manufacturer: String,
    /// Robot model name.
    pub model_name: String,
}

impl RobotIdentity {
    /// Returns a human readable name built from manufacturer and model.
    #[must_use]
    pub fn display_name(&self) -> String {
        match (self.manufacturer.is_empty(), self.model_name.is_empty()) {
            (false, false) => format!("{} {}", self.manufacturer, self.model_name),
            (true, false) => self.model_name.clone(),
            (false, true) => self.manufacturer.clone(),
            (true, true) => self.system_id.clone(),
        }
    }
}

/// A consumable reported by the robot.
///
/// # Examples
///
/// ```
/// use valetudo_bridge::telemetry::{Consumable, RemainingUnit};
///
/// let json = r#"{"__class":"ValetudoConsumable","type":"brush","subType":"main",
///                "remaining":{"value":17290,"unit":"minutes"}}"#;
/// let consumable: Consumable = serde_json::from_str(json).unwrap();
/// assert_eq!(consumable.remaining.unit, RemainingUnit::Minutes);
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Consumable {
    /// Consumable type (`brush`, `filter`, `sensor`, `mop`, ...).
    #[serde(rename = "type")]
    pub kind: String,
    /// Consumable sub type (`main`, `side_right`, `all`, ...).
    #[serde(default)]
    pub sub_type: String,
    /// Remaining usage.
    pub remaining: Remaining,
}

/// Remaining usage of a consumable.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Remaining {
    /// Remaining amount.
    pub value: f64,
    /// Unit of `value`.
    pub unit: RemainingUnit,
}

/// Unit of a remaining usage value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemainingUnit {
    /// Remaining runtime in minutes.
    Minutes,
    /// Remaining life in percent.
    Percent,
    /// Any unit the bridge does not interpret.
    #[serde(other)]
    Other,
}

/// A map segment as listed by the segmentation capability.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Segment {
    /// Segment id.
    pub id: SegmentId,
    /// Segment name, if the user named it.
    #[serde(default)]
    pub name: Option<String>,
}
