// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Battery level and charge state types.

use std::fmt;

/// Remaining battery in half-percent steps (0-200).
///
/// The bridge side reports battery with half-percent granularity, so a
/// vendor level of 50% is stored as 100.
///
/// # Examples
///
/// ```
/// use valetudo_bridge::types::BatteryPercent;
///
/// let level = BatteryPercent::from_vendor_level(87.0);
/// assert_eq!(level.value(), 174);
///
/// // Out of range readings are clamped
/// assert_eq!(BatteryPercent::from_vendor_level(130.0), BatteryPercent::FULL);
/// assert_eq!(BatteryPercent::from_vendor_level(-4.0), BatteryPercent::EMPTY);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, serde::Serialize)]
pub struct BatteryPercent(u8);

impl BatteryPercent {
    /// Empty battery.
    pub const EMPTY: Self = Self(0);

    /// Full battery.
    pub const FULL: Self = Self(200);

    /// Converts a vendor percentage (0-100) into half-percent steps.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_vendor_level(level: f64) -> Self {
        if level.is_nan() {
            return Self::EMPTY;
        }
        // Safe: clamped to 0..=200 before the cast
        Self((level * 2.0).round().clamp(0.0, 200.0) as u8)
    }

    /// Returns the raw half-percent value.
    #[must_use]
    pub const fn value(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for BatteryPercent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}%", self.0 / 2, if self.0 % 2 == 0 { 0 } else { 5 })
    }
}

/// Normalized battery charge state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize)]
pub enum BatteryChargeState {
    /// The robot does not report a charge state.
    #[default]
    Unknown,
    /// The battery is charging.
    Charging,
    /// The battery is full.
    Charged,
    /// The robot is running on battery.
    NotCharging,
}

impl BatteryChargeState {
    /// Returns the cluster encoding of this state.
    #[must_use]
    pub const fn code(&self) -> u8 {
        match self {
            Self::Unknown => 0,
            Self::Charging => 1,
            Self::Charged => 2,
            Self::NotCharging => 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vendor_level_is_doubled() {
        assert_eq!(BatteryPercent::from_vendor_level(0.0).value(), 0);
        assert_eq!(BatteryPercent::from_vendor_level(50.0).value(), 100);
        assert_eq!(BatteryPercent::from_vendor_level(100.0).value(), 200);
    }

    #[test]
    fn fractional_level_rounds_to_half_percent() {
        assert_eq!(BatteryPercent::from_vendor_level(42.6).value(), 85);
        assert_eq!(BatteryPercent::from_vendor_level(42.8).value(), 86);
    }

    #[test]
    fn nan_level_is_empty() {
        assert_eq!(BatteryPercent::from_vendor_level(f64::NAN), BatteryPercent::EMPTY);
    }

    #[test]
    fn display_shows_half_percent() {
        assert_eq!(BatteryPercent::from_vendor_level(42.5).to_string(), "42.5%");
        assert_eq!(BatteryPercent::from_vendor_level(80.0).to_string(), "80.0%");
    }

    #[test]
    fn charge_state_codes() {
        assert_eq!(BatteryChargeState::Unknown.code(), 0);
        assert_eq!(BatteryChargeState::Charging.code(), 1);
        assert_eq!(BatteryChargeState::Charged.code(), 2);
        assert_eq!(BatteryChargeState::NotCharging.code(), 3);
    }
}
