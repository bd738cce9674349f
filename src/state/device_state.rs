// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Last-published attribute values.

use crate::types::{BatteryChargeState, BatteryPercent, OperationalState, RunMode};

use super::StateChange;

/// Values last written to the sink for one robot.
///
/// All fields start unknown. A value is only recorded after the sink
/// accepted it, so a rejected write is retried on the next cycle.
///
/// # Examples
///
/// ```
/// use valetudo_bridge::state::{DeviceState, StateChange};
/// use valetudo_bridge::types::RunMode;
///
/// let mut state = DeviceState::new();
/// assert!(state.is_changed_by(&StateChange::RunMode(RunMode::Idle)));
///
/// state.apply(&StateChange::RunMode(RunMode::Idle));
/// assert_eq!(state.run_mode(), Some(RunMode::Idle));
/// assert!(!state.is_changed_by(&StateChange::RunMode(RunMode::Idle)));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceState {
    battery_percent: Option<BatteryPercent>,
    charge_state: Option<BatteryChargeState>,
    operational_state: Option<OperationalState>,
    run_mode: Option<RunMode>,
    clean_mode: Option<u8>,
    current_area: Option<u32>,
}

impl DeviceState {
    /// Creates a new empty device state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the last published battery level.
    #[must_use]
    pub fn battery_percent(&self) -> Option<BatteryPercent> {
        self.battery_percent
    }

    /// Returns the last published charge state.
    #[must_use]
    pub fn charge_state(&self) -> Option<BatteryChargeState> {
        self.charge_state
    }

    /// Returns the last published operational state.
    #[must_use]
    pub fn operational_state(&self) -> Option<OperationalState> {
        self.operational_state
    }

    /// Returns the last published run mode.
    #[must_use]
    pub fn run_mode(&self) -> Option<RunMode> {
        self.run_mode
    }

    /// Returns the last published clean mode code.
    #[must_use]
    pub fn clean_mode(&self) -> Option<u8> {
        self.clean_mode
    }

    /// Returns the last published region id.
    #[must_use]
    pub fn current_area(&self) -> Option<u32> {
        self.current_area
    }

    /// Returns true if applying `change` would alter the state.
    #[must_use]
    pub fn is_changed_by(&self, change: &StateChange) -> bool {
        match *change {
            StateChange::BatteryPercent(v) => self.battery_percent != Some(v),
            StateChange::ChargeState(v) => self.charge_state != Some(v),
            StateChange::OperationalState(v) => self.operational_state != Some(v),
            StateChange::RunMode(v) => self.run_mode != Some(v),
            StateChange::CleanMode(v) => self.clean_mode != Some(v),
            StateChange::CurrentArea(v) => self.current_area != Some(v),
        }
    }

    /// Records a change.
    ///
    /// Returns `true` if the state actually changed.
    pub fn apply(&mut self, change: &StateChange) -> bool {
        if !self.is_changed_by(change) {
            return false;
        }
        match *change {
            StateChange::BatteryPercent(v) => self.battery_percent = Some(v),
            StateChange::ChargeState(v) => self.charge_state = Some(v),
            StateChange::OperationalState(v) => self.operational_state = Some(v),
            StateChange::RunMode(v) => self.run_mode = Some(v),
            StateChange::CleanMode(v) => self.clean_mode = Some(v),
            StateChange::CurrentArea(v) => self.current_area = Some(v),
        }
        true
    }
}
