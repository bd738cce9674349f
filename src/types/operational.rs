// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Operational state and run mode of a robot vacuum.
//!
//! Both enumerations carry the numeric codes used by the RVC clusters on the
//! bridge side, so a value can be written downstream without a second lookup.

use std::fmt;

/// Normalized high-level activity of the robot.
///
/// # Examples
///
/// ```
/// use valetudo_bridge::types::OperationalState;
///
/// assert_eq!(OperationalState::Running.code(), 1);
/// assert_eq!(OperationalState::Docked.code(), 66);
/// assert_eq!(OperationalState::default(), OperationalState::Stopped);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize)]
pub enum OperationalState {
    /// Not doing anything and not on the dock.
    #[default]
    Stopped,
    /// Actively moving or cleaning.
    Running,
    /// A task is paused and can be resumed.
    Paused,
    /// The robot reports an error.
    Error,
    /// Returning to the dock.
    SeekingCharger,
    /// Charging on the dock.
    Charging,
    /// Parked on the dock.
    Docked,
}

impl OperationalState {
    /// Returns the cluster encoding of this state.
    #[must_use]
    pub const fn code(&self) -> u8 {
        match self {
            Self::Stopped => 0,
            Self::Running => 1,
            Self::Paused => 2,
            Self::Error => 3,
            Self::SeekingCharger => 64,
            Self::Charging => 65,
            Self::Docked => 66,
        }
    }

    /// Returns a short lowercase name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Error => "error",
            Self::SeekingCharger => "seeking_charger",
            Self::Charging => "charging",
            Self::Docked => "docked",
        }
    }
}

impl fmt::Display for OperationalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse run mode of the robot, independent of [`OperationalState`].
///
/// # Examples
///
/// ```
/// use valetudo_bridge::types::RunMode;
///
/// assert_eq!(RunMode::from_code(2), Some(RunMode::Cleaning));
/// assert_eq!(RunMode::from_code(9), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize)]
pub enum RunMode {
    /// No task running.
    #[default]
    Idle,
    /// A cleaning task is running.
    Cleaning,
    /// A mapping run is in progress.
    Mapping,
}

impl RunMode {
    /// Returns the mode number exposed in the run mode catalog.
    #[must_use]
    pub const fn code(&self) -> u8 {
        match self {
            Self::Idle => 1,
            Self::Cleaning => 2,
            Self::Mapping => 3,
        }
    }

    /// Looks up a run mode by its mode number.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Idle),
            2 => Some(Self::Cleaning),
            3 => Some(Self::Mapping),
            _ => None,
        }
    }

    /// Returns the label shown by the bridge.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Cleaning => "Cleaning",
            Self::Mapping => "Mapping",
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operational_codes_match_cluster_encoding() {
        assert_eq!(OperationalState::Stopped.code(), 0);
        assert_eq!(OperationalState::Paused.code(), 2);
        assert_eq!(OperationalState::Error.code(), 3);
        assert_eq!(OperationalState::SeekingCharger.code(), 64);
        assert_eq!(OperationalState::Charging.code(), 65);
    }

    #[test]
    fn run_mode_code_roundtrip() {
        for mode in [RunMode::Idle, RunMode::Cleaning, RunMode::Mapping] {
            assert_eq!(RunMode::from_code(mode.code()), Some(mode));
        }
        assert_eq!(RunMode::from_code(0), None);
    }

    #[test]
    fn display_uses_names() {
        assert_eq!(OperationalState::SeekingCharger.to_string(), "seeking_charger");
        assert_eq!(RunMode::Cleaning.to_string(), "Cleaning");
    }
}
