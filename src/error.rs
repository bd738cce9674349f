// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the bridge.
//!
//! This module provides the error hierarchy used across the crate: vendor
//! transport failures, payload parsing, device operations and the downstream
//! attribute sink.
//!
//! Note that an unrecognized vendor enumeration value is never an error. The
//! mapping functions in [`crate::mapping`] always resolve to a defined default.

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Error occurred while talking to the robot.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Error occurred while decoding a robot payload.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Error occurred during a device operation.
    #[error("device error: {0}")]
    Device(#[from] DeviceError),

    /// The downstream sink rejected a write.
    #[error("sink error: {0}")]
    Sink(#[from] SinkError),

    /// Device was not found in the registry.
    #[error("device not found")]
    DeviceNotFound,

    /// Device does not advertise the capability needed for an operation.
    #[error("device does not support {0}")]
    CapabilityNotSupported(String),

    /// The device task has stopped and no longer accepts commands.
    #[error("device task is shutting down")]
    ShuttingDown,
}

/// Errors related to the vendor transport.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// HTTP request failed.
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The robot answered with a non-success status or could not be reached.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The robot rejected the configured credentials.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// Request timed out.
    #[error("request timed out after {0} ms")]
    Timeout(u64),

    /// Invalid URL or address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

/// Errors related to decoding robot payloads.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors related to device operations.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// A command referenced a clean mode that is not in the catalog.
    #[error("unknown clean mode {0}")]
    UnknownCleanMode(u8),

    /// A command referenced a region that the robot does not know.
    #[error("unknown region {0}")]
    UnknownRegion(u32),

    /// The requested run mode cannot be started on this robot.
    #[error("run mode {0} is not supported")]
    UnsupportedRunMode(u8),
}

/// Errors reported by an [`AttributeSink`](crate::sink::AttributeSink).
#[derive(Debug, Error)]
pub enum SinkError {
    /// The sink does not know the device.
    #[error("device {0} is not registered with the sink")]
    UnknownDevice(String),

    /// The sink refused the write.
    #[error("write to {cluster}.{attribute} rejected: {message}")]
    Rejected {
        /// Cluster name of the rejected write.
        cluster: String,
        /// Attribute name of the rejected write.
        attribute: String,
        /// Sink-provided reason.
        message: String,
    },
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
