// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parser for robot map payloads.
//!
//! The full map (`GET /api/v2/robot/state/map`) carries every layer with its
//! pixel data and can be several megabytes. [`PositionPayload`] decodes the
//! same endpoint but only keeps the entities and the map version.

use serde::Deserialize;

use crate::error::ParseError;

/// Entity type of the robot position marker.
pub const ROBOT_POSITION_ENTITY: &str = "robot_position";

/// Layer type of a room segment.
pub const SEGMENT_LAYER: &str = "segment";

/// Full map payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapPayload {
    /// Map layers (floor, walls, segments).
    #[serde(default)]
    pub layers: Vec<MapLayer>,
    /// Map entities (robot, charger, paths, ...).
    #[serde(default)]
    pub entities: Vec<MapEntity>,
    /// Map size in coordinate units.
    #[serde(default)]
    pub size: MapSize,
    /// Coordinate units per layer pixel.
    pub pixel_size: f64,
    /// Map metadata.
    pub meta_data: MapMetaData,
}

/// Lightweight map payload used for position tracking.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionPayload {
    /// Map entities.
    #[serde(default)]
    pub entities: Vec<MapEntity>,
    /// Map metadata.
    pub meta_data: MapMetaData,
}

impl PositionPayload {
    /// Returns the robot position marker, if present.
    #[must_use]
    pub fn robot_position(&self) -> Option<(f64, f64)> {
        robot_position(&self.entities)
    }
}

/// Map metadata.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct MapMetaData {
    /// Version of the map, bumped whenever the robot rebuilds it.
    #[serde(default)]
    pub version: u32,
}

/// Map size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct MapSize {
    /// Width.
    #[serde(default)]
    pub x: f64,
    /// Height.
    #[serde(default)]
    pub y: f64,
}

/// One map layer.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapLayer {
    /// Layer type (`floor`, `wall`, `segment`).
    #[serde(rename = "type")]
    pub kind: String,
    /// Layer metadata.
    #[serde(default)]
    pub meta_data: LayerMetaData,
    /// Bounding box of the layer in pixel units.
    pub dimensions: LayerDimensions,
}

impl MapLayer {
    /// Returns true if this layer describes a room segment.
    #[must_use]
    pub fn is_segment(&self) -> bool {
        self.kind == SEGMENT_LAYER
    }
}

/// Layer metadata.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerMetaData {
    /// Segment id, present on segment layers.
    #[serde(default)]
    pub segment_id: Option<SegmentId>,
    /// Segment name, if the user named it.
    #[serde(default)]
    pub name: Option<String>,
}

/// Segment id as sent by the robot.
///
/// Firmwares disagree on whether ids are strings or numbers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SegmentId {
    /// Numeric id.
    Number(u32),
    /// Textual id.
    Text(String),
}

impl SegmentId {
    /// Returns the id as a number, if it is numeric.
    #[must_use]
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// Bounding box of a layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct LayerDimensions {
    /// Horizontal extent.
    pub x: AxisBounds,
    /// Vertical extent.
    pub y: AxisBounds,
}

/// Extent of a layer along one axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct AxisBounds {
    /// Lowest coordinate.
    pub min: f64,
    /// Highest coordinate.
    pub max: f64,
    /// Midpoint.
    pub mid: f64,
}

/// A map entity.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MapEntity {
    /// Entity type (`robot_position`, `charger_location`, `path`, ...).
    #[serde(rename = "type")]
    pub kind: String,
    /// Flattened `[x0, y0, x1, y1, ...]` coordinates.
    #[serde(default)]
    pub points: Vec<f64>,
}

/// Finds the robot position marker in an entity list.
#[must_use]
pub fn robot_position(entities: &[MapEntity]) -> Option<(f64, f64)> {
    entities
        .iter()
        .find(|e| e.kind == ROBOT_POSITION_ENTITY)
        .and_then(|e| match e.points.as_slice() {
            [x, y, ..] => Some((*x, *y)),
            _ => None,
        })
}

/// Parses a full map body.
///
/// # Errors
///
/// Returns `ParseError::Json` if the body is not a valid map.
pub fn parse_map(body: &str) -> Result<MapPayload, ParseError> {
    serde_json::from_str(body).map_err(ParseError::Json)
}

/// Parses a map body keeping only entities and metadata.
///
/// # Errors
///
/// Returns `ParseError::Json` if the body is not a valid map.
pub fn parse_position(body: &str) -> Result<PositionPayload, ParseError> {
    serde_json::from_str(body).map_err(ParseError::Json)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAP: &str = r#"{
        "__class": "ValetudoMap",
        "metaData": {"version": 2, "nonce": "abc"},
        "size": {"x": 5120, "y": 5120},
        "pixelSize": 5,
        "layers": [
            {
                "__class": "MapLayer",
                "type": "floor",
                "metaData": {"area": 100},
                "dimensions": {"x": {"min": 0, "max": 300, "mid": 150, "avg": 150},
                               "y": {"min": 0, "max": 300, "mid": 150, "avg": 150},
                               "pixelCount": 9000},
                "compressedPixels": [1, 2, 3]
            },
            {
                "__class": "MapLayer",
                "type": "segment",
                "metaData": {"segmentId": "16", "name": "Kitchen", "active": false},
                "dimensions": {"x": {"min": 10, "max": 90, "mid": 50, "avg": 48},
                               "y": {"min": 20, "max": 80, "mid": 50, "avg": 51},
                               "pixelCount": 4000},
                "compressedPixels": []
            }
        ],
        "entities": [
            {"__class": "PointMapEntity", "type": "charger_location", "points": [100, 100]},
            {"__class": "PointMapEntity", "type": "robot_position", "points": [251, 248],
             "metaData": {"angle": 90}}
        ]
    }"#;

    #[test]
    fn parse_full_map() {
        let map = parse_map(MAP).unwrap();

        assert_eq!(map.meta_data.version, 2);
        assert!((map.pixel_size - 5.0).abs() < f64::EPSILON);
        assert_eq!(map.layers.len(), 2);
        assert!(!map.layers[0].is_segment());
        assert!(map.layers[1].is_segment());
        assert_eq!(
            map.layers[1].meta_data.segment_id.as_ref().and_then(SegmentId::as_u32),
            Some(16)
        );
        assert_eq!(map.layers[1].meta_data.name.as_deref(), Some("Kitchen"));
    }

    #[test]
    fn parse_position_skips_layers() {
        let position = parse_position(MAP).unwrap();

        assert_eq!(position.meta_data.version, 2);
        assert_eq!(position.robot_position(), Some((251.0, 248.0)));
    }

    #[test]
    fn numeric_segment_id() {
        let id: SegmentId = serde_json::from_str("7").unwrap();
        assert_eq!(id.as_u32(), Some(7));

        let id: SegmentId = serde_json::from_str("\"hall\"").unwrap();
        assert_eq!(id.as_u32(), None);
    }

    #[test]
    fn robot_position_requires_two_points() {
        let entities = vec![MapEntity {
            kind: ROBOT_POSITION_ENTITY.to_string(),
            points: vec![12.0],
        }];
        assert_eq!(robot_position(&entities), None);
    }

    #[test]
    fn missing_metadata_is_error() {
        let result = parse_position(r#"{"entities": []}"#);
        assert!(result.is_err());
    }
}
