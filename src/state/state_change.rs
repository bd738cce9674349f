// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! State change representation.
//!
//! A [`StateChange`] is one normalized value bound for one sink attribute.
//! The synchronizer produces changes from each poll and applies them to a
//! [`DeviceState`](super::DeviceState) to decide what to publish.
//!
//! # Examples
//!
//! ```
//! use valetudo_bridge::state::{DeviceState, StateChange};
//! use valetudo_bridge::types::OperationalState;
//!
//! let mut state = DeviceState::new();
//!
//! // Apply returns true if state actually changed
//! let change = StateChange::OperationalState(OperationalState::Docked);
//! assert!(state.apply(&change));
//!
//! // Applying same change again returns false
//! assert!(!state.apply(&change));
//! ```

use crate::mapping::NormalizedState;
use crate::sink::{
    AttributePath, AttributeValue, BATTERY_CHARGE_STATE, BATTERY_PERCENT, CLEAN_MODE,
    CURRENT_AREA, OPERATIONAL_STATE, RUN_MODE,
};
use crate::types::{BatteryChargeState, BatteryPercent, OperationalState, RunMode};

/// A change of one published attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateChange {
    /// Remaining battery changed.
    BatteryPercent(BatteryPercent),
    /// Battery charge state changed.
    ChargeState(BatteryChargeState),
    /// Operational state changed.
    OperationalState(OperationalState),
    /// Run mode changed.
    RunMode(RunMode),
    /// Selected clean mode changed.
    CleanMode(u8),
    /// The robot moved into another region.
    CurrentArea(u32),
}

impl StateChange {
    /// Returns the sink attribute this change is written to.
    #[must_use]
    pub fn attribute(&self) -> AttributePath {
        match self {
            Self::BatteryPercent(_) => BATTERY_PERCENT,
            Self::ChargeState(_) => BATTERY_CHARGE_STATE,
            Self::OperationalState(_) => OPERATIONAL_STATE,
            Self::RunMode(_) => RUN_MODE,
            Self::CleanMode(_) => CLEAN_MODE,
            Self::CurrentArea(_) => CURRENT_AREA,
        }
    }

    /// Returns the value written to the sink.
    #[must_use]
    pub fn value(&self) -> AttributeValue {
        match self {
            Self::BatteryPercent(percent) => AttributeValue::U8(percent.value()),
            Self::ChargeState(state) => AttributeValue::U8(state.code()),
            Self::OperationalState(state) => AttributeValue::U8(state.code()),
            Self::RunMode(mode) => AttributeValue::U8(mode.code()),
            Self::CleanMode(code) => AttributeValue::U8(*code),
            Self::CurrentArea(id) => AttributeValue::U32(*id),
        }
    }

    /// Returns the changes carried by a normalized snapshot, in publish order.
    ///
    /// The order is battery level, charge state, operational state, run mode.
    #[must_use]
    pub fn from_normalized(state: &NormalizedState) -> Vec<Self> {
        [
            state.battery_percent.map(Self::BatteryPercent),
            state.charge_state.map(Self::ChargeState),
            state.operational_state.map(Self::OperationalState),
            state.run_mode.map(Self::RunMode),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}
