#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Core data types for store density analysis.
//!
//! These are plain values shared across the grid, aggregation, source,
//! and prediction crates. They carry no behavior beyond simple derived
//! accessors; validation (coordinate ranges, bounding box ordering)
//! lives at the boundaries that produce them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A geographic point in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoPoint {
    /// Latitude in degrees, `[-90, 90]`.
    pub lat: f64,
    /// Longitude in degrees, `[-180, 180]`.
    pub lon: f64,
}

impl GeoPoint {
    /// Creates a point. Range validation happens where points enter the
    /// system (the grid indexer and the source parsers).
    #[must_use]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// A geographic bounding box: `(south, west, north, east)` in degrees,
/// with `south <= north`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    /// Southern latitude bound.
    pub south: f64,
    /// Western longitude bound.
    pub west: f64,
    /// Northern latitude bound.
    pub north: f64,
    /// Eastern longitude bound.
    pub east: f64,
}

impl BoundingBox {
    /// Creates a bounding box from `(south, west, north, east)`.
    #[must_use]
    pub const fn new(south: f64, west: f64, north: f64, east: f64) -> Self {
        Self {
            south,
            west,
            north,
            east,
        }
    }

    /// The box midpoint, used as the map center for a region.
    #[must_use]
    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            f64::midpoint(self.south, self.north),
            f64::midpoint(self.west, self.east),
        )
    }
}

/// One occupied hexagonal grid cell with its point count.
///
/// `lat`/`lon` are the cell's canonical center (not an input point),
/// used by rendering consumers to place the cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HexCell {
    /// Opaque H3 cell identifier (lowercase hex string).
    pub cell_id: String,
    /// Number of points that fell in this cell. Always >= 1.
    pub count: u64,
    /// Cell center latitude.
    pub lat: f64,
    /// Cell center longitude.
    pub lon: f64,
}

/// An LLM-suggested commercial hotspot location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hotspot {
    /// Suggested latitude.
    pub lat: f64,
    /// Suggested longitude.
    pub lon: f64,
    /// One-sentence justification from the model.
    pub reasoning: String,
}

/// The aggregate density analysis for one named region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionAnalysis {
    /// Region name. Case-sensitive identity key in the session store.
    pub region_name: String,
    /// Total number of points aggregated. Equals the sum of all cell
    /// counts.
    pub total_points: u64,
    /// Occupied cells keyed by cell id.
    pub cells: BTreeMap<String, HexCell>,
    /// `total_points / |cells|`, or 0 when no cells are occupied.
    pub average_density: f64,
    /// The cell with the maximum count. On ties, the first cell to
    /// reach the maximum in aggregation encounter order.
    pub densest_cell: Option<HexCell>,
    /// The region's bounding box as fetched from the boundary source.
    pub bounding_box: BoundingBox,
    /// Midpoint of the bounding box.
    pub center: GeoPoint,
    /// Advisory hotspot prediction, attached after aggregation.
    /// Never recomputed by re-aggregation.
    pub hotspot: Option<Hotspot>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounding_box_center_is_midpoint() {
        let bbox = BoundingBox::new(6.0, 3.0, 7.0, 4.0);
        let center = bbox.center();
        assert!((center.lat - 6.5).abs() < f64::EPSILON);
        assert!((center.lon - 3.5).abs() < f64::EPSILON);
    }

    #[test]
    fn region_analysis_serializes_camel_case() {
        let analysis = RegionAnalysis {
            region_name: "Lagos".to_string(),
            total_points: 0,
            cells: BTreeMap::new(),
            average_density: 0.0,
            densest_cell: None,
            bounding_box: BoundingBox::new(6.0, 3.0, 7.0, 4.0),
            center: GeoPoint::new(6.5, 3.5),
            hotspot: None,
        };
        let json = serde_json::to_value(&analysis).unwrap();
        assert_eq!(json["regionName"], "Lagos");
        assert_eq!(json["totalPoints"], 0);
        assert!(json["densestCell"].is_null());
        assert_eq!(json["boundingBox"]["south"], 6.0);
    }
}
