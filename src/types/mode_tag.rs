// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Semantic tags attached to clean-mode catalog entries.

/// Capability tag of a clean mode.
///
/// Tags let a controller understand what a mode does without parsing its
/// label. Codes follow the common mode-tag namespace plus the RVC clean mode
/// extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum ModeTag {
    /// Robot picks its own settings.
    Auto,
    /// Fast, light pass.
    Quick,
    /// Reduced noise.
    Quiet,
    /// Lowest setting.
    Min,
    /// Highest regular setting.
    Max,
    /// Above the highest regular setting.
    DeepClean,
    /// Vacuuming is active.
    Vacuum,
    /// Mopping is active.
    Mop,
}

impl ModeTag {
    /// Returns the numeric tag value.
    #[must_use]
    pub const fn code(&self) -> u16 {
        match self {
            Self::Auto => 0,
            Self::Quick => 1,
            Self::Quiet => 2,
            Self::Min => 6,
            Self::Max => 7,
            Self::DeepClean => 0x4000,
            Self::Vacuum => 0x4001,
            Self::Mop => 0x4002,
        }
    }
}
