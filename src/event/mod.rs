// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Event system for robot lifecycle and state notifications.
//!
//! The [`EventBus`] uses tokio's broadcast channel so any number of
//! subscribers can observe robots coming and going, dropping offline,
//! moving between regions and wearing out consumables.
//!
//! # Examples
//!
//! ```
//! use valetudo_bridge::event::{DeviceId, DeviceEvent, EventBus};
//!
//! let bus = EventBus::new();
//!
//! // Subscribe to events
//! let mut rx = bus.subscribe();
//!
//! // Publish an event
//! bus.publish(DeviceEvent::device_added(DeviceId::new("4f8c2a1e")));
//! ```

mod device_event;
mod device_id;
mod event_bus;

pub use device_event::DeviceEvent;
pub use device_id::DeviceId;
pub use event_bus::EventBus;
