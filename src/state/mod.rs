// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-robot state.
//!
//! [`DeviceRecord`] holds everything the bridge tracks for one robot.
//! [`DeviceState`] is the part of it that gates publication: a
//! [`StateChange`] is written to the sink only if it changes the state.

mod device_record;
mod device_state;
mod state_change;

pub use device_record::DeviceRecord;
pub use device_state::DeviceState;
pub use state_change::StateChange;
