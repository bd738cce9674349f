// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Registry entry of a running robot.

use std::sync::Arc;

use crate::event::DeviceId;
use crate::sync::DeviceHandle;

/// Result of adding a robot to the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    /// A new robot was registered and its task started.
    Added(DeviceId),
    /// The robot was already known; its address was updated in place.
    AddressUpdated(DeviceId),
}

impl AddOutcome {
    /// Returns the ID of the robot.
    #[must_use]
    pub fn device_id(&self) -> &DeviceId {
        match self {
            Self::Added(id) | Self::AddressUpdated(id) => id,
        }
    }

    /// Returns true if a new robot was registered.
    #[must_use]
    pub fn is_added(&self) -> bool {
        matches!(self, Self::Added(_))
    }
}

/// Internal representation of a robot in the registry.
///
/// The device record itself lives in the task; the registry only keeps what
/// it needs to reach the robot and stop the task.
#[derive(Debug)]
pub(crate) struct ManagedDevice<A> {
    /// Client shared with the task, used for address updates.
    pub api: Arc<A>,
    /// Handle of the polling task.
    pub handle: DeviceHandle,
}
