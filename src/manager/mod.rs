// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Registry of managed robots.
//!
//! The [`DeviceRegistry`] owns one polling task per robot and is the entry
//! point for applications bridging several robots:
//!
//! - **Identification**: robots are keyed by their vendor system id
//! - **Startup pacing**: first polls are delayed and staggered
//! - **Event system**: subscribe to lifecycle, connection, region and
//!   consumable events
//! - **Control**: commands are routed to the owning task
//!
//! # Event Subscription
//!
//! ```no_run
//! use valetudo_bridge::event::DeviceEvent;
//! # use valetudo_bridge::{DeviceRegistry, protocol::VacuumApi, sink::AttributeSink};
//!
//! # fn example<A: VacuumApi, S: AttributeSink>(registry: &DeviceRegistry<A, S>) {
//! let mut events = registry.subscribe();
//!
//! tokio::spawn(async move {
//!     while let Ok(event) = events.recv().await {
//!         match event {
//!             DeviceEvent::ConnectionChanged { device_id, online, .. } => {
//!                 println!("Device {device_id} online: {online}");
//!             }
//!             DeviceEvent::RegionChanged { device_id, region_id } => {
//!                 println!("Device {device_id} entered region {region_id}");
//!             }
//!             _ => {}
//!         }
//!     }
//! });
//! # }
//! ```

mod device_manager;
mod managed_device;

pub use device_manager::DeviceRegistry;
pub use managed_device::AddOutcome;
