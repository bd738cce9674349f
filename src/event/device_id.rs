// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device identifier type.

use std::fmt;
use std::sync::Arc;

/// Identifier of a managed robot.
///
/// Wraps the robot's vendor system id, which is stable across restarts and
/// address changes. Cloning is cheap.
///
/// # Examples
///
/// ```
/// use valetudo_bridge::event::DeviceId;
///
/// let id = DeviceId::new("4f8c2a1e");
/// assert_eq!(id.as_str(), "4f8c2a1e");
/// assert_eq!(id.to_string(), "4f8c2a1e");
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(Arc<str>);

impl DeviceId {
    /// Creates a device identifier from a system id.
    #[must_use]
    pub fn new(system_id: impl AsRef<str>) -> Self {
        Self(Arc::from(system_id.as_ref()))
    }

    /// Returns the system id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeviceId({})", self.0)
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for DeviceId {
    fn from(id: String) -> Self {
        Self(Arc::from(id))
    }
}

impl AsRef<str> for DeviceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
