// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Robot capability set.
//!
//! A robot advertises the capabilities it implements as a list of names
//! (`GET /api/v2/robot/capabilities`). Every capability-specific feature of
//! the bridge checks membership here first and silently skips itself when
//! the robot lacks the capability.

use std::collections::BTreeSet;

/// Starting, stopping, pausing and docking.
pub const BASIC_CONTROL: &str = "BasicControlCapability";
/// Fan speed presets.
pub const FAN_SPEED_CONTROL: &str = "FanSpeedControlCapability";
/// Water usage presets.
pub const WATER_USAGE_CONTROL: &str = "WaterUsageControlCapability";
/// Vacuum / mop / combined operation modes.
pub const OPERATION_MODE_CONTROL: &str = "OperationModeControlCapability";
/// Cleaning selected map segments.
pub const MAP_SEGMENTATION: &str = "MapSegmentationCapability";
/// Consumable remaining-life reporting.
pub const CONSUMABLE_MONITORING: &str = "ConsumableMonitoringCapability";

/// Capabilities advertised by a robot.
///
/// # Examples
///
/// ```
/// use valetudo_bridge::Capabilities;
/// use valetudo_bridge::capabilities::{FAN_SPEED_CONTROL, MAP_SEGMENTATION};
///
/// let caps = Capabilities::from_names(["BasicControlCapability", "FanSpeedControlCapability"]);
/// assert!(caps.has(FAN_SPEED_CONTROL));
/// assert!(!caps.has(MAP_SEGMENTATION));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capabilities {
    names: BTreeSet<String>,
}

impl Capabilities {
    /// Creates an empty capability set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a capability set from capability names.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns true if the robot advertises the named capability.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Returns true if the robot can report consumables.
    #[must_use]
    pub fn supports_consumables(&self) -> bool {
        self.has(CONSUMABLE_MONITORING)
    }

    /// Returns true if the robot can clean individual segments.
    #[must_use]
    pub fn supports_segments(&self) -> bool {
        self.has(MAP_SEGMENTATION)
    }

    /// Returns true if the robot can switch between vacuum and mop modes.
    #[must_use]
    pub fn supports_operation_modes(&self) -> bool {
        self.has(OPERATION_MODE_CONTROL)
    }

    /// Returns the number of advertised capabilities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true if the robot advertised nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterates over capability names in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

/// Builder for creating capability sets by hand.
#[derive(Debug, Default)]
pub struct CapabilitiesBuilder {
    inner: Capabilities,
}

impl CapabilitiesBuilder {
    /// Creates a new builder with no capabilities.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a capability by name.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>) -> Self {
        self.inner.names.insert(name.into());
        self
    }

    /// Adds segment cleaning support.
    #[must_use]
    pub fn with_segments(self) -> Self {
        self.with(MAP_SEGMENTATION)
    }

    /// Adds consumable monitoring support.
    #[must_use]
    pub fn with_consumables(self) -> Self {
        self.with(CONSUMABLE_MONITORING)
    }

    /// Builds the capabilities.
    #[must_use]
    pub fn build(self) -> Capabilities {
        self.inner
    }
}
