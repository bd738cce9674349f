// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Time-bounded spatial index of map regions.
//!
//! The full robot map is large, so it is fetched rarely. [`SpatialIndex`]
//! keeps just the bounding boxes of its layers and answers point lookups.
//! An index is valid until its horizon elapses or the robot reports a
//! different map version; it is then rebuilt wholesale.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//! use tokio::time::Instant;
//! use valetudo_bridge::spatial::{BoundingBox, IndexedLayer, SpatialIndex};
//!
//! let kitchen = IndexedLayer::region(16, "Kitchen", BoundingBox::new((0.0, 100.0), (0.0, 50.0)));
//! let index = SpatialIndex::new(vec![kitchen], 5.0, 3, Instant::now(), Duration::from_secs(3600));
//!
//! assert_eq!(index.locate(40.0, 20.0), Some(16));
//! assert_eq!(index.locate(101.0, 20.0), None);
//! ```

use std::collections::BTreeMap;
use std::time::Duration;

use tokio::time::Instant;

use crate::telemetry::{AxisBounds, MapLayer, MapPayload};

/// Bounding box of a layer in index units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Horizontal extent.
    pub x: AxisBounds,
    /// Vertical extent.
    pub y: AxisBounds,
}

impl BoundingBox {
    /// Creates a box from `(min, max)` per axis, deriving the midpoints.
    #[must_use]
    pub fn new(x: (f64, f64), y: (f64, f64)) -> Self {
        let axis = |(min, max): (f64, f64)| AxisBounds {
            min,
            max,
            mid: (min + max) / 2.0,
        };
        Self {
            x: axis(x),
            y: axis(y),
        }
    }

    /// Returns true if the point lies inside the box, edges included.
    #[must_use]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x.min && x <= self.x.max && y >= self.y.min && y <= self.y.max
    }

    /// Returns the Euclidean distance from the point to the box midpoint.
    #[must_use]
    pub fn distance_to_mid(&self, x: f64, y: f64) -> f64 {
        (x - self.x.mid).hypot(y - self.y.mid)
    }
}

/// What a layer represents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayerKind {
    /// A named room segment; the only kind `locate` considers.
    Region {
        /// User-assigned name, if any.
        name: Option<String>,
    },
    /// Floor, wall or any other layer.
    Other(String),
}

/// One layer of the index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedLayer {
    /// Region id, `0` for non-region layers.
    pub id: u32,
    /// Layer kind.
    pub kind: LayerKind,
    /// Bounding box in index units.
    pub bounds: BoundingBox,
}

impl IndexedLayer {
    /// Creates a region layer.
    #[must_use]
    pub fn region(id: u32, name: impl Into<String>, bounds: BoundingBox) -> Self {
        Self {
            id,
            kind: LayerKind::Region {
                name: Some(name.into()),
            },
            bounds,
        }
    }

    /// Creates a non-region layer.
    #[must_use]
    pub fn other(kind: impl Into<String>, bounds: BoundingBox) -> Self {
        Self {
            id: 0,
            kind: LayerKind::Other(kind.into()),
            bounds,
        }
    }

    /// Returns true if this layer is a region.
    #[must_use]
    pub fn is_region(&self) -> bool {
        matches!(self.kind, LayerKind::Region { .. })
    }

    fn from_map_layer(layer: &MapLayer) -> Option<Self> {
        let bounds = BoundingBox {
            x: layer.dimensions.x,
            y: layer.dimensions.y,
        };
        if !layer.is_segment() {
            return Some(Self::other(layer.kind.clone(), bounds));
        }
        // A segment without a usable id cannot be reported
        let id = layer.meta_data.segment_id.as_ref()?.as_u32()?;
        Some(Self {
            id,
            kind: LayerKind::Region {
                name: layer.meta_data.name.clone(),
            },
            bounds,
        })
    }
}

/// Spatial index over one version of the robot map.
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    layers: Vec<IndexedLayer>,
    pixel_size: f64,
    version: u32,
    created_at: Instant,
    horizon: Duration,
}

impl SpatialIndex {
    /// Creates an index from prepared layers.
    ///
    /// A non-positive or non-finite pixel size is treated as `1`.
    #[must_use]
    pub fn new(
        layers: Vec<IndexedLayer>,
        pixel_size: f64,
        version: u32,
        created_at: Instant,
        horizon: Duration,
    ) -> Self {
        let pixel_size = if pixel_size.is_finite() && pixel_size > 0.0 {
            pixel_size
        } else {
            1.0
        };
        Self {
            layers,
            pixel_size,
            version,
            created_at,
            horizon,
        }
    }

    /// Builds an index from a full map payload, keeping layer order.
    #[must_use]
    pub fn from_map(map: &MapPayload, created_at: Instant, horizon: Duration) -> Self {
        let layers = map
            .layers
            .iter()
            .filter_map(IndexedLayer::from_map_layer)
            .collect();
        Self::new(
            layers,
            map.pixel_size,
            map.meta_data.version,
            created_at,
            horizon,
        )
    }

    /// Returns the map version this index was built from.
    #[must_use]
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Returns the coordinate units per index unit.
    #[must_use]
    pub fn pixel_size(&self) -> f64 {
        self.pixel_size
    }

    /// Returns the layers in map order.
    #[must_use]
    pub fn layers(&self) -> &[IndexedLayer] {
        &self.layers
    }

    /// Returns true once the validity horizon has elapsed at `now`.
    #[must_use]
    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.created_at) >= self.horizon
    }

    /// Returns true if the index is unexpired at `now` and matches `version`.
    #[must_use]
    pub fn is_valid_for(&self, version: u32, now: Instant) -> bool {
        self.version == version && !self.is_expired(now)
    }

    /// Converts robot coordinates to index units.
    #[must_use]
    pub fn to_index_units(&self, x: f64, y: f64) -> (f64, f64) {
        ((x / self.pixel_size).round(), (y / self.pixel_size).round())
    }

    /// Returns the region containing the point, in index units.
    ///
    /// Only region layers are candidates and every edge is inclusive. When
    /// several regions contain the point, the one whose midpoint is closest
    /// wins; exact ties go to the earliest layer.
    #[must_use]
    pub fn locate(&self, x: f64, y: f64) -> Option<u32> {
        let mut best: Option<(&IndexedLayer, f64)> = None;

        for layer in self.layers.iter().filter(|l| l.is_region()) {
            if !layer.bounds.contains(x, y) {
                continue;
            }
            let distance = layer.bounds.distance_to_mid(x, y);
            match best {
                Some((_, best_distance)) if distance >= best_distance => {}
                _ => best = Some((layer, distance)),
            }
        }

        best.map(|(layer, _)| layer.id)
    }

    /// Returns the region name to id map.
    ///
    /// Unnamed regions are listed under their id. A name used twice keeps
    /// the first region.
    #[must_use]
    pub fn regions(&self) -> BTreeMap<String, u32> {
        let mut regions = BTreeMap::new();
        for layer in &self.layers {
            if let LayerKind::Region { name } = &layer.kind {
                let name = name.clone().unwrap_or_else(|| layer.id.to_string());
                regions.entry(name).or_insert(layer.id);
            }
        }
        regions
    }
}
