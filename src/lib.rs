// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Valetudo Bridge - A Rust library exposing Valetudo robot vacuums through a
//! normalized smart-home device model.
//!
//! The bridge polls each robot's REST API, translates vendor state into the
//! enumerations of the robotic vacuum clusters and hands every changed value
//! to a host-provided [`AttributeSink`](sink::AttributeSink).
//!
//! # Supported Features
//!
//! - **State synchronization**: battery, charge state, operational state, run
//!   mode and clean mode, published only when they change
//! - **Clean modes**: a mode catalog derived from the robot's fan, water and
//!   operation mode presets
//! - **Region tracking**: the map segment the robot is currently in
//! - **Consumables**: hourly checks with replacement alerts on threshold
//!   crossings
//! - **Control**: area selection, targeted cleaning, pause, resume and
//!   return to dock
//!
//! # Quick Start
//!
//! ```no_run
//! use valetudo_bridge::sink::{AttributeSink, AttributeValue, DeviceRegistration};
//! use valetudo_bridge::error::SinkError;
//! use valetudo_bridge::event::DeviceId;
//! use valetudo_bridge::{BridgeConfig, DeviceRegistry};
//!
//! struct LogSink;
//!
//! impl AttributeSink for LogSink {
//!     async fn register_device(
//!         &self,
//!         id: &DeviceId,
//!         registration: DeviceRegistration,
//!     ) -> Result<(), SinkError> {
//!         println!("{id}: {} with {} regions", registration.name, registration.regions.len());
//!         Ok(())
//!     }
//!
//!     async fn publish_attribute(
//!         &self,
//!         id: &DeviceId,
//!         cluster: &str,
//!         attribute: &str,
//!         value: AttributeValue,
//!     ) -> Result<(), SinkError> {
//!         println!("{id}: {cluster}.{attribute} = {value}");
//!         Ok(())
//!     }
//!
//!     async fn set_reachable(&self, id: &DeviceId, reachable: bool) -> Result<(), SinkError> {
//!         println!("{id}: reachable = {reachable}");
//!         Ok(())
//!     }
//!
//!     async fn unregister_device(&self, _id: &DeviceId) -> Result<(), SinkError> {
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> valetudo_bridge::Result<()> {
//!     let registry = DeviceRegistry::new(LogSink, BridgeConfig::default());
//!     registry.add_address("192.168.1.40").await?;
//!
//!     tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
//!     registry.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod capabilities;
pub mod config;
pub mod consumables;
pub mod error;
pub mod event;
pub mod manager;
pub mod mapping;
pub mod protocol;
pub mod sink;
pub mod spatial;
pub mod state;
pub mod sync;
pub mod telemetry;
pub mod types;

pub use capabilities::{Capabilities, CapabilitiesBuilder};
pub use config::{BridgeConfig, ConsumableConfig, ModeNames, PresetOverrides};
pub use consumables::ConsumableTracker;
pub use error::{DeviceError, Error, ParseError, ProtocolError, Result, SinkError};
pub use event::{DeviceEvent, DeviceId, EventBus};
pub use manager::{AddOutcome, DeviceRegistry};
pub use mapping::{CleanModeCatalog, CleanModeEntry, NormalizedState};
#[cfg(feature = "http")]
pub use protocol::{HttpClient, HttpConfig};
pub use protocol::VacuumApi;
pub use spatial::SpatialIndex;
pub use sync::{DeviceCommand, SyncState, Synchronizer};
pub use types::{BatteryChargeState, BatteryPercent, ModeTag, OperationalState, RunMode};
