// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Transport to the robot's REST API.
//!
//! The synchronizer only talks to robots through [`VacuumApi`], so tests can
//! substitute an in-memory robot. [`HttpClient`] is the real implementation
//! and is available with the `http` feature.
//!
//! # Endpoints
//!
//! | Method | Path |
//! |--------|------|
//! | `GET`  | `/api/v2/valetudo` |
//! | `GET`  | `/api/v2/robot` |
//! | `GET`  | `/api/v2/robot/capabilities` |
//! | `GET`  | `/api/v2/robot/state/attributes` |
//! | `GET`  | `/api/v2/robot/state/map` |
//! | `GET`  | `/api/v2/robot/capabilities/{capability}` |
//! | `GET`  | `/api/v2/robot/capabilities/{capability}/presets` |
//! | `PUT`  | `/api/v2/robot/capabilities/{capability}` |
//! | `PUT`  | `/api/v2/robot/capabilities/{capability}/preset` |

#[cfg(feature = "http")]
mod http;

#[cfg(feature = "http")]
pub use http::{HttpClient, HttpConfig};

use std::future::Future;
use std::time::Duration;

use crate::error::{ProtocolError, Result};
use crate::telemetry::{
    Consumable, MapPayload, PositionPayload, RobotIdentity, Segment, StateAttribute,
};

/// Timeout for fetching the full map, which can be several megabytes.
pub const FULL_MAP_TIMEOUT: Duration = Duration::from_secs(30);

/// Operations the bridge needs from a robot.
///
/// Every future is `Send` so device tasks can be spawned on a multi-threaded
/// runtime. Implementations report transport failures as
/// [`Error::Protocol`](crate::Error::Protocol) and undecodable bodies as
/// [`Error::Parse`](crate::Error::Parse).
pub trait VacuumApi: Send + Sync + 'static {
    /// Returns the current network address of the robot.
    fn address(&self) -> String;

    /// Points the client at a new network address.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::InvalidAddress` if the address is unusable.
    fn set_address(&self, address: &str) -> std::result::Result<(), ProtocolError>;

    /// Fetches the robot identity.
    fn fetch_identity(&self) -> impl Future<Output = Result<RobotIdentity>> + Send;

    /// Fetches the names of the capabilities the robot implements.
    fn fetch_capabilities(&self) -> impl Future<Output = Result<Vec<String>>> + Send;

    /// Fetches the robot state attributes.
    fn fetch_state_attributes(&self) -> impl Future<Output = Result<Vec<StateAttribute>>> + Send;

    /// Fetches the full map including layers.
    fn fetch_full_map(&self, timeout: Duration)
    -> impl Future<Output = Result<MapPayload>> + Send;

    /// Fetches the map entities and version only.
    fn fetch_position(&self) -> impl Future<Output = Result<PositionPayload>> + Send;

    /// Fetches the consumable list.
    fn fetch_consumables(&self) -> impl Future<Output = Result<Vec<Consumable>>> + Send;

    /// Fetches the presets of a preset capability.
    fn fetch_presets(&self, capability: &str)
    -> impl Future<Output = Result<Vec<String>>> + Send;

    /// Fetches the map segments.
    fn fetch_segments(&self) -> impl Future<Output = Result<Vec<Segment>>> + Send;

    /// Sends a control command to a capability.
    fn send_control_command(
        &self,
        capability: &str,
        payload: serde_json::Value,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Selects a preset of a preset capability.
    fn apply_preset(&self, capability: &str, name: &str) -> impl Future<Output = Result<()>> + Send;
}
