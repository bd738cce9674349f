// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device event types.

use super::DeviceId;

/// Events emitted by the registry and the device tasks.
///
/// # Examples
///
/// ```
/// use valetudo_bridge::event::{DeviceId, DeviceEvent};
///
/// let device_id = DeviceId::new("4f8c2a1e");
///
/// // Device lifecycle events
/// let added = DeviceEvent::device_added(device_id.clone());
/// let removed = DeviceEvent::device_removed(device_id.clone());
///
/// // Connection events
/// let offline = DeviceEvent::ConnectionChanged {
///     device_id,
///     online: false,
///     error: Some("request timed out after 5000 ms".to_string()),
/// };
/// assert!(offline.is_connection());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    /// A robot was identified and added to the registry.
    DeviceAdded {
        /// The ID of the added device.
        device_id: DeviceId,
    },

    /// A robot was removed from the registry.
    DeviceRemoved {
        /// The ID of the removed device.
        device_id: DeviceId,
    },

    /// A known robot was re-added at a different address.
    AddressChanged {
        /// The ID of the device.
        device_id: DeviceId,
        /// The new address.
        address: String,
    },

    /// The robot stopped or resumed answering state requests.
    ConnectionChanged {
        /// The ID of the device.
        device_id: DeviceId,
        /// Whether the robot is reachable now.
        online: bool,
        /// Error that made the robot unreachable.
        error: Option<String>,
    },

    /// The robot entered a different region.
    RegionChanged {
        /// The ID of the device.
        device_id: DeviceId,
        /// The region the robot is in now.
        region_id: u32,
    },

    /// A consumable crossed the replacement threshold in either direction.
    ConsumableChanged {
        /// The ID of the device.
        device_id: DeviceId,
        /// Display name of the consumable.
        name: String,
        /// Remaining life in percent.
        life_percent: u8,
        /// Whether the consumable needs replacement now.
        needs_replacement: bool,
    },
}

impl DeviceEvent {
    /// Returns the device ID associated with this event.
    #[must_use]
    pub fn device_id(&self) -> &DeviceId {
        match self {
            Self::DeviceAdded { device_id }
            | Self::DeviceRemoved { device_id }
            | Self::AddressChanged { device_id, .. }
            | Self::ConnectionChanged { device_id, .. }
            | Self::RegionChanged { device_id, .. }
            | Self::ConsumableChanged { device_id, .. } => device_id,
        }
    }

    /// Returns `true` if this is a device lifecycle event (added/removed).
    #[must_use]
    pub fn is_lifecycle(&self) -> bool {
        matches!(self, Self::DeviceAdded { .. } | Self::DeviceRemoved { .. })
    }

    /// Returns `true` if this is a connection event.
    #[must_use]
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::ConnectionChanged { .. })
    }

    /// Creates a device added event.
    #[must_use]
    pub fn device_added(device_id: DeviceId) -> Self {
        Self::DeviceAdded { device_id }
    }

    /// Creates a device removed event.
    #[must_use]
    pub fn device_removed(device_id: DeviceId) -> Self {
        Self::DeviceRemoved { device_id }
    }

    /// Creates an online event.
    #[must_use]
    pub fn online(device_id: DeviceId) -> Self {
        Self::ConnectionChanged {
            device_id,
            online: true,
            error: None,
        }
    }

    /// Creates an offline event with the error that caused it.
    #[must_use]
    pub fn offline(device_id: DeviceId, error: impl Into<String>) -> Self {
        Self::ConnectionChanged {
            device_id,
            online: false,
            error: Some(error.into()),
        }
    }
}
