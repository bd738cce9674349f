// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Clean mode catalog construction.
//!
//! A robot offers operation modes (vacuum, mop, both) and per-mode intensity
//! presets (fan speed, water usage). The bridge flattens these into a single
//! ordered list of selectable clean modes, each with a numeric code and a set
//! of [`ModeTag`]s.
//!
//! Codes are banded per category so that two entries never share a code:
//!
//! | Category       | Codes       |
//! |----------------|-------------|
//! | Vacuum         | `1..=5`     |
//! | Mop            | `11..=15`   |
//! | Vacuum and mop | `21..=24`   |
//!
//! # Examples
//!
//! ```
//! use valetudo_bridge::config::BridgeConfig;
//! use valetudo_bridge::mapping::{build_catalog, CatalogInput};
//!
//! let fan = vec!["low".to_string(), "medium".to_string(), "max".to_string()];
//! let catalog = build_catalog(
//!     &CatalogInput { operation_modes: None, fan_presets: &fan, water_presets: &[] },
//!     &BridgeConfig::default(),
//! );
//!
//! let labels: Vec<&str> = catalog.iter().map(|e| e.label.as_str()).collect();
//! assert_eq!(labels, vec!["Vacuum Low", "Vacuum Medium", "Vacuum Max"]);
//! assert_eq!(catalog.get(4).unwrap().label, "Vacuum Max");
//! ```

use std::collections::BTreeSet;

use crate::config::{BridgeConfig, PresetOverrides};
use crate::types::ModeTag;

/// Highest intensity offset within a category band.
const MAX_OFFSET: u8 = 4;

/// A clean mode category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CleanCategory {
    /// Vacuum only.
    Vacuum,
    /// Mop only.
    Mop,
    /// Vacuum and mop in one pass.
    VacuumAndMop,
}

impl CleanCategory {
    /// Returns the first code of this category's band.
    #[must_use]
    pub const fn base_code(&self) -> u8 {
        match self {
            Self::Vacuum => 1,
            Self::Mop => 11,
            Self::VacuumAndMop => 21,
        }
    }

    /// Returns the robot operation mode preset for this category.
    #[must_use]
    pub const fn operation_mode(&self) -> &'static str {
        match self {
            Self::Vacuum => "vacuum",
            Self::Mop => "mop",
            Self::VacuumAndMop => "vacuum_and_mop",
        }
    }

    /// Returns the category tags added to every entry.
    #[must_use]
    pub fn category_tags(&self) -> &'static [ModeTag] {
        match self {
            Self::Vacuum => &[ModeTag::Vacuum],
            Self::Mop => &[ModeTag::Mop],
            Self::VacuumAndMop => &[ModeTag::Vacuum, ModeTag::Mop],
        }
    }

    fn from_operation_mode(name: &str) -> Option<Self> {
        [Self::Vacuum, Self::Mop, Self::VacuumAndMop]
            .into_iter()
            .find(|c| c.operation_mode().eq_ignore_ascii_case(name.trim()))
    }
}

/// Intensity keyword of a robot preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PresetLevel {
    /// `off`
    Off,
    /// `min`
    Min,
    /// `low`
    Low,
    /// `medium`
    Medium,
    /// `high`
    High,
    /// `max`
    Max,
    /// `turbo`
    Turbo,
}

impl PresetLevel {
    /// All levels in ascending order.
    pub const ALL: [Self; 7] = [
        Self::Off,
        Self::Min,
        Self::Low,
        Self::Medium,
        Self::High,
        Self::Max,
        Self::Turbo,
    ];

    /// Returns the keyword robots use for this level.
    #[must_use]
    pub const fn keyword(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Min => "min",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Max => "max",
            Self::Turbo => "turbo",
        }
    }

    /// Returns the offset added to the category base code.
    #[must_use]
    pub const fn offset(&self) -> u8 {
        match self {
            Self::Off | Self::Min => 0,
            Self::Low => 1,
            Self::Medium => 2,
            Self::High | Self::Max => 3,
            Self::Turbo => MAX_OFFSET,
        }
    }

    /// Returns the descriptive tag of this level.
    #[must_use]
    pub const fn tag(&self) -> ModeTag {
        match self {
            Self::Off | Self::Min => ModeTag::Min,
            Self::Low => ModeTag::Quiet,
            Self::Medium => ModeTag::Auto,
            Self::High | Self::Max => ModeTag::Max,
            Self::Turbo => ModeTag::DeepClean,
        }
    }

    /// Looks up a level by keyword, case-insensitively.
    #[must_use]
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        let keyword = keyword.trim();
        Self::ALL
            .into_iter()
            .find(|level| level.keyword().eq_ignore_ascii_case(keyword))
    }
}

/// Robot settings applied when a clean mode is selected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModeSettings {
    /// Operation mode preset, if the robot supports operation modes.
    pub operation_mode: Option<String>,
    /// Fan speed preset.
    pub fan_speed: Option<String>,
    /// Water usage preset.
    pub water_usage: Option<String>,
}

impl ModeSettings {
    /// Returns how many presets of `self` are set and equal in `current`,
    /// or `None` if any set preset differs.
    fn match_score(&self, current: &Self) -> Option<usize> {
        let pairs = [
            (&self.operation_mode, &current.operation_mode),
            (&self.fan_speed, &current.fan_speed),
            (&self.water_usage, &current.water_usage),
        ];
        let mut score = 0;
        for (wanted, actual) in pairs {
            let Some(wanted) = wanted else { continue };
            if !actual.as_ref().is_some_and(|a| a.eq_ignore_ascii_case(wanted)) {
                return None;
            }
            score += 1;
        }
        Some(score)
    }
}

/// One selectable clean mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanModeEntry {
    /// Label shown to the user, unique within a catalog.
    pub label: String,
    /// Mode code, unique within a catalog.
    pub code: u8,
    /// Semantic tags.
    pub tags: Vec<ModeTag>,
    /// Robot settings for this mode.
    pub settings: ModeSettings,
}

/// Ordered, label-unique list of clean modes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanModeCatalog {
    entries: Vec<CleanModeEntry>,
}

impl CleanModeCatalog {
    /// Appends an entry unless its label or code is already taken.
    ///
    /// Returns `true` if the entry was added.
    pub fn push(&mut self, entry: CleanModeEntry) -> bool {
        if self
            .entries
            .iter()
            .any(|e| e.label == entry.label || e.code == entry.code)
        {
            tracing::debug!(label = %entry.label, code = entry.code, "Dropping duplicate clean mode");
            return false;
        }
        self.entries.push(entry);
        true
    }

    /// Returns the entry with the given code.
    #[must_use]
    pub fn get(&self, code: u8) -> Option<&CleanModeEntry> {
        self.entries.iter().find(|e| e.code == code)
    }

    /// Returns the entry matching the robot's currently selected presets.
    ///
    /// An entry matches when every preset it sets equals the current one,
    /// ignoring case. Among matches the most specific entry wins, then the
    /// earliest.
    #[must_use]
    pub fn resolve(&self, current: &ModeSettings) -> Option<&CleanModeEntry> {
        let mut best: Option<(&CleanModeEntry, usize)> = None;
        for entry in &self.entries {
            let Some(score) = entry.settings.match_score(current) else {
                continue;
            };
            if best.is_none_or(|(_, best_score)| score > best_score) {
                best = Some((entry, score));
            }
        }
        best.map(|(entry, _)| entry)
    }

    /// Iterates over the entries in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &CleanModeEntry> {
        self.entries.iter()
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the catalog has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Robot-offered presets used to build a catalog.
#[derive(Debug, Clone, Copy)]
pub struct CatalogInput<'a> {
    /// Operation mode presets, or `None` if the robot has no operation modes.
    pub operation_modes: Option<&'a [String]>,
    /// Fan speed presets.
    pub fan_presets: &'a [String],
    /// Water usage presets.
    pub water_presets: &'a [String],
}

/// Expands the presets of a single category into catalog entries.
///
/// Each preset whose name resolves to a [`PresetLevel`] yields one entry at
/// `base_code + level.offset()`. A preset whose offset is already used is
/// dropped, so the first preset per offset wins. Presets that resolve to no
/// level are skipped. Without any presets a single `Auto` entry at the base
/// code is produced.
#[must_use]
pub fn expand_presets(
    category: CleanCategory,
    base_label: &str,
    presets: &[String],
    overrides: &PresetOverrides,
    operation_mode: Option<&str>,
) -> Vec<CleanModeEntry> {
    let make_settings = |preset: Option<&str>| {
        let preset = preset.map(str::to_string);
        let (fan_speed, water_usage) = match category {
            CleanCategory::Mop => (None, preset),
            _ => (preset, None),
        };
        ModeSettings {
            operation_mode: operation_mode.map(str::to_string),
            fan_speed,
            water_usage,
        }
    };

    if presets.is_empty() {
        return vec![CleanModeEntry {
            label: base_label.to_string(),
            code: category.base_code(),
            tags: with_category_tags(ModeTag::Auto, category),
            settings: make_settings(None),
        }];
    }

    let mut used_offsets = BTreeSet::new();
    let mut entries = Vec::new();

    for preset in presets {
        let Some(level) = overrides.level_of(preset) else {
            tracing::debug!(preset = %preset, "Skipping preset without intensity keyword");
            continue;
        };
        if !used_offsets.insert(level.offset()) {
            tracing::debug!(preset = %preset, offset = level.offset(), "Intensity slot already taken");
            continue;
        }
        entries.push(CleanModeEntry {
            label: format!("{base_label} {}", title_case(preset)),
            code: category.base_code() + level.offset(),
            tags: with_category_tags(level.tag(), category),
            settings: make_settings(Some(preset)),
        });
    }

    entries
}

/// A fixed fan/water combination offered in the combined category.
struct Archetype {
    name: &'static str,
    tag: ModeTag,
    fan: PresetLevel,
    water: PresetLevel,
}

const ARCHETYPES: [Archetype; 4] = [
    Archetype {
        name: "Auto",
        tag: ModeTag::Auto,
        fan: PresetLevel::Medium,
        water: PresetLevel::Medium,
    },
    Archetype {
        name: "Quiet",
        tag: ModeTag::Quiet,
        fan: PresetLevel::Low,
        water: PresetLevel::Low,
    },
    Archetype {
        name: "Quick",
        tag: ModeTag::Quick,
        fan: PresetLevel::Max,
        water: PresetLevel::Low,
    },
    Archetype {
        name: "Max",
        tag: ModeTag::Max,
        fan: PresetLevel::Max,
        water: PresetLevel::High,
    },
];

/// Expands the combined vacuum-and-mop category.
///
/// The four archetypes Auto, Quiet, Quick and Max are evaluated in order.
/// An archetype is accepted iff both its fan preset and its water preset are
/// offered by the robot. Archetype codes are fixed by position, so `Quick`
/// is always `base + 2` even when `Quiet` is rejected. If the robot offers no
/// fan or no water presets, a single `Auto` entry is produced.
#[must_use]
pub fn expand_combined(
    base_label: &str,
    fan_presets: &[String],
    water_presets: &[String],
    config: &BridgeConfig,
    operation_mode: Option<&str>,
) -> Vec<CleanModeEntry> {
    let category = CleanCategory::VacuumAndMop;

    if fan_presets.is_empty() || water_presets.is_empty() {
        return vec![CleanModeEntry {
            label: base_label.to_string(),
            code: category.base_code(),
            tags: with_category_tags(ModeTag::Auto, category),
            settings: ModeSettings {
                operation_mode: operation_mode.map(str::to_string),
                fan_speed: None,
                water_usage: None,
            },
        }];
    }

    let offered = |list: &[String], name: &str| {
        list.iter()
            .find(|p| p.eq_ignore_ascii_case(name))
            .cloned()
    };

    ARCHETYPES
        .iter()
        .zip(0u8..)
        .filter_map(|(archetype, index)| {
            let fan = offered(fan_presets, config.fan_presets.name_for(archetype.fan))?;
            let water = offered(water_presets, config.water_presets.name_for(archetype.water))?;
            Some(CleanModeEntry {
                label: format!("{base_label} {}", archetype.name),
                code: category.base_code() + index,
                tags: with_category_tags(archetype.tag, category),
                settings: ModeSettings {
                    operation_mode: operation_mode.map(str::to_string),
                    fan_speed: Some(fan),
                    water_usage: Some(water),
                },
            })
        })
        .collect()
}

/// Builds the clean mode catalog of a robot.
///
/// Robots without operation modes are treated as vacuum-only. Entries with a
/// label already in the catalog are dropped (first wins). If nothing can be
/// derived, a single fallback vacuum entry is synthesized.
#[must_use]
pub fn build_catalog(input: &CatalogInput<'_>, config: &BridgeConfig) -> CleanModeCatalog {
    let categories: Vec<(CleanCategory, Option<&str>)> = match input.operation_modes {
        Some(modes) => modes
            .iter()
            .filter_map(|mode| {
                CleanCategory::from_operation_mode(mode).map(|c| (c, Some(c.operation_mode())))
            })
            .collect(),
        None => vec![(CleanCategory::Vacuum, None)],
    };

    let mut catalog = CleanModeCatalog::default();

    for (category, operation_mode) in categories {
        let label = config.mode_names.name(category);
        let entries = match category {
            CleanCategory::Vacuum => expand_presets(
                category,
                label,
                input.fan_presets,
                &config.fan_presets,
                operation_mode,
            ),
            CleanCategory::Mop => expand_presets(
                category,
                label,
                input.water_presets,
                &config.water_presets,
                operation_mode,
            ),
            CleanCategory::VacuumAndMop => expand_combined(
                label,
                input.fan_presets,
                input.water_presets,
                config,
                operation_mode,
            ),
        };
        for entry in entries {
            catalog.push(entry);
        }
    }

    if catalog.is_empty() {
        catalog.push(CleanModeEntry {
            label: config.mode_names.vacuum.clone(),
            code: CleanCategory::Vacuum.base_code(),
            tags: vec![ModeTag::Auto, ModeTag::Vacuum],
            settings: ModeSettings::default(),
        });
    }

    catalog
}

fn with_category_tags(tag: ModeTag, category: CleanCategory) -> Vec<ModeTag> {
    let mut tags = vec![tag];
    tags.extend_from_slice(category.category_tags());
    tags
}

fn title_case(preset: &str) -> String {
    preset
        .split(['_', ' ', '-'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
