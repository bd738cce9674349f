// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Normalized value types published to the bridge.
//!
//! # Types
//!
//! - [`OperationalState`] - Stopped/Running/Paused/Error/SeekingCharger/Charging/Docked
//! - [`RunMode`] - Idle/Cleaning/Mapping
//! - [`BatteryPercent`] - Remaining battery in half-percent steps (0-200)
//! - [`BatteryChargeState`] - Unknown/Charging/Charged/NotCharging
//! - [`ModeTag`] - Semantic tags for clean modes

mod battery;
mod mode_tag;
mod operational;

pub use battery::{BatteryChargeState, BatteryPercent};
pub use mode_tag::ModeTag;
pub use operational::{OperationalState, RunMode};
