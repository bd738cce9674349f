// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Downstream attribute sink.
//!
//! The bridge does not model the smart-home device tree itself. It hands
//! normalized values to an [`AttributeSink`] provided by the host, addressed
//! by cluster and attribute name.
//!
//! | Cluster | Attribute | Value |
//! |---------|-----------|-------|
//! | `PowerSource` | `batPercentRemaining` | half-percent steps, `0..=200` |
//! | `PowerSource` | `batChargeState` | charge state code |
//! | `RvcOperationalState` | `operationalState` | operational state code |
//! | `RvcRunMode` | `currentMode` | run mode code |
//! | `RvcCleanMode` | `currentMode` | clean mode code |
//! | `ServiceArea` | `currentArea` | region id |
//! | `ConsumableMonitoring` | consumable display name | needs replacement |

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;

use crate::error::SinkError;
use crate::event::DeviceId;
use crate::mapping::CleanModeCatalog;
use crate::types::RunMode;

/// Cluster and attribute name pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttributePath {
    /// Cluster name.
    pub cluster: &'static str,
    /// Attribute name.
    pub attribute: &'static str,
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.cluster, self.attribute)
    }
}

/// Remaining battery.
pub const BATTERY_PERCENT: AttributePath = AttributePath {
    cluster: "PowerSource",
    attribute: "batPercentRemaining",
};

/// Battery charge state.
pub const BATTERY_CHARGE_STATE: AttributePath = AttributePath {
    cluster: "PowerSource",
    attribute: "batChargeState",
};

/// Operational state.
pub const OPERATIONAL_STATE: AttributePath = AttributePath {
    cluster: "RvcOperationalState",
    attribute: "operationalState",
};

/// Run mode.
pub const RUN_MODE: AttributePath = AttributePath {
    cluster: "RvcRunMode",
    attribute: "currentMode",
};

/// Clean mode.
pub const CLEAN_MODE: AttributePath = AttributePath {
    cluster: "RvcCleanMode",
    attribute: "currentMode",
};

/// Region the robot is in.
pub const CURRENT_AREA: AttributePath = AttributePath {
    cluster: "ServiceArea",
    attribute: "currentArea",
};

/// Cluster of the per-consumable replacement flags.
pub const CONSUMABLE_CLUSTER: &str = "ConsumableMonitoring";

/// A normalized attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeValue {
    /// Unsigned 8-bit value.
    U8(u8),
    /// Unsigned 32-bit value.
    U32(u32),
    /// Boolean value.
    Bool(bool),
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::U8(v) => write!(f, "{v}"),
            Self::U32(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
        }
    }
}

/// Everything the sink needs to expose a robot, sent once at setup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRegistration {
    /// Human readable name.
    pub name: String,
    /// Manufacturer.
    pub manufacturer: String,
    /// Model name.
    pub model_name: String,
    /// Region name to region id.
    pub regions: BTreeMap<String, u32>,
    /// Selectable clean modes.
    pub clean_modes: CleanModeCatalog,
    /// Selectable run modes.
    pub run_modes: Vec<RunMode>,
}

/// Receiver of normalized robot state.
///
/// Calls for one device are strictly sequential. Calls for different devices
/// may interleave.
pub trait AttributeSink: Send + Sync + 'static {
    /// Registers a robot before any attribute is published for it.
    fn register_device(
        &self,
        device_id: &DeviceId,
        registration: DeviceRegistration,
    ) -> impl Future<Output = Result<(), SinkError>> + Send;

    /// Publishes one attribute value.
    fn publish_attribute(
        &self,
        device_id: &DeviceId,
        cluster: &str,
        attribute: &str,
        value: AttributeValue,
    ) -> impl Future<Output = Result<(), SinkError>> + Send;

    /// Marks a robot as reachable or not.
    fn set_reachable(
        &self,
        device_id: &DeviceId,
        reachable: bool,
    ) -> impl Future<Output = Result<(), SinkError>> + Send;

    /// Removes a robot.
    fn unregister_device(
        &self,
        device_id: &DeviceId,
    ) -> impl Future<Output = Result<(), SinkError>> + Send;
}
