// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-robot record owned by the device task.

use std::collections::{BTreeMap, BTreeSet};

use crate::capabilities::Capabilities;
use crate::consumables::ConsumableTracker;
use crate::event::DeviceId;
use crate::mapping::CleanModeCatalog;
use crate::spatial::SpatialIndex;
use crate::telemetry::RobotIdentity;

use super::DeviceState;

/// Everything the bridge knows about one robot.
///
/// Created once the robot is identified and mutated only by its own device
/// task, so no locking is needed.
#[derive(Debug, Clone)]
pub struct DeviceRecord {
    /// Registry key.
    pub id: DeviceId,
    /// Identity reported by the robot.
    pub identity: RobotIdentity,
    /// Human readable name.
    pub name: String,
    /// Advertised capabilities.
    pub capabilities: Capabilities,
    /// Values last written to the sink.
    pub published: DeviceState,
    /// Forces every tracked attribute out on the next cycle.
    pub pending_initial_state: bool,
    /// Region name to region id.
    pub regions: BTreeMap<String, u32>,
    /// Regions selected for the next targeted clean.
    pub selected_regions: BTreeSet<u32>,
    /// Selectable clean modes.
    pub clean_modes: CleanModeCatalog,
    /// Consumable replacement tracking.
    pub consumables: ConsumableTracker,
    /// Cached spatial index, if built.
    pub spatial: Option<SpatialIndex>,
}

impl DeviceRecord {
    /// Creates a record for an identified robot.
    #[must_use]
    pub fn new(identity: RobotIdentity, capabilities: Capabilities) -> Self {
        Self {
            id: DeviceId::new(&identity.system_id),
            name: identity.display_name(),
            identity,
            capabilities,
            published: DeviceState::new(),
            pending_initial_state: true,
            regions: BTreeMap::new(),
            selected_regions: BTreeSet::new(),
            clean_modes: CleanModeCatalog::default(),
            consumables: ConsumableTracker::new(),
            spatial: None,
        }
    }

    /// Returns true if the robot knows a region with this id.
    #[must_use]
    pub fn has_region(&self, region_id: u32) -> bool {
        self.regions.values().any(|id| *id == region_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> RobotIdentity {
        RobotIdentity {
            system_id: "4f8c2a1e".to_string(),
            manufacturer: "Roborock".to_string(),
            model_name: "S5".to_string(),
        }
    }

    #[test]
    fn new_record_is_pending() {
        let record = DeviceRecord::new(identity(), Capabilities::new());
        assert_eq!(record.id.as_str(), "4f8c2a1e");
        assert_eq!(record.name, "Roborock S5");
        assert!(record.pending_initial_state);
        assert!(record.spatial.is_none());
        assert!(record.consumables.is_empty());
    }

    #[test]
    fn region_lookup_by_id() {
        let mut record = DeviceRecord::new(identity(), Capabilities::new());
        record.regions.insert("Kitchen".to_string(), 16);

        assert!(record.has_region(16));
        assert!(!record.has_region(17));
    }
}
