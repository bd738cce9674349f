// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Change-gated synchronization.
//!
//! Each robot gets one [`Synchronizer`] driven by its own tokio task. A poll
//! cycle fetches the robot state once, normalizes it and writes only values
//! that differ from what was last published. The first cycle after
//! registration publishes everything.
//!
//! Control commands are queued to the same task through a [`DeviceHandle`],
//! so the device record never has two writers.

mod command;
mod synchronizer;
mod task;

use std::time::Duration;

pub use command::DeviceCommand;
pub use synchronizer::{SyncState, Synchronizer};
pub use task::{CommandSender, DeviceHandle, spawn_device_task};

/// Delay before the first poll of a newly registered robot.
pub const STARTUP_DELAY: Duration = Duration::from_secs(10);

/// Extra start delay per earlier registration.
pub const STARTUP_STAGGER: Duration = Duration::from_secs(3);

/// Pause after each attribute write.
pub const PUBLISH_PACING: Duration = Duration::from_millis(50);

/// Returns the first-poll delay of the robot registered at `order`.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use valetudo_bridge::sync::startup_delay;
///
/// assert_eq!(startup_delay(0), Duration::from_secs(10));
/// assert_eq!(startup_delay(2), Duration::from_secs(16));
/// ```
#[must_use]
pub fn startup_delay(order: u32) -> Duration {
    STARTUP_DELAY.saturating_add(STARTUP_STAGGER.saturating_mul(order))
}
