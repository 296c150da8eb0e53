#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Fixed-resolution H3 hexagonal grid indexing.
//!
//! Maps geographic points to H3 cell identifiers and back. The whole
//! system runs at a single fixed resolution — changing it is a global
//! configuration change, never a per-request parameter, so two points
//! compare equal under [`cell_index`] iff they fall in the same cell of
//! one consistent grid.

use std::str::FromStr;

use h3o::{CellIndex, LatLng, Resolution};
use store_map_models::GeoPoint;
use thiserror::Error;

/// The fixed H3 resolution for the whole system.
///
/// Resolution 7 (~1.2km edge) is a good balance for state-level views.
pub const GRID_RESOLUTION: Resolution = Resolution::Seven;

/// Errors from grid indexing operations.
#[derive(Debug, Error)]
pub enum GridError {
    /// A point's latitude or longitude is non-finite or out of range.
    #[error("invalid coordinate: lat={lat}, lon={lon}")]
    InvalidCoordinate {
        /// The offending latitude.
        lat: f64,
        /// The offending longitude.
        lon: f64,
    },

    /// A cell identifier string does not name a valid H3 cell.
    #[error("invalid cell id: {cell_id}")]
    InvalidCellId {
        /// The unparsable identifier.
        cell_id: String,
    },
}

/// Returns the H3 cell identifier containing `point` at the fixed
/// resolution, as the canonical lowercase hex string.
///
/// Deterministic: the same point always yields the same identifier.
///
/// # Errors
///
/// Returns [`GridError::InvalidCoordinate`] if `lat`/`lon` is non-finite
/// or outside `[-90, 90]` / `[-180, 180]`.
pub fn cell_index(point: &GeoPoint) -> Result<String, GridError> {
    let coord = valid_coord(point)?;
    Ok(coord.to_cell(GRID_RESOLUTION).to_string())
}

/// Returns the canonical center of the cell named by `cell_id`.
///
/// This is the exact center used for rendering; it is not expected to
/// reproduce any point that was indexed into the cell.
///
/// # Errors
///
/// Returns [`GridError::InvalidCellId`] if `cell_id` is not a valid H3
/// cell identifier.
pub fn cell_center(cell_id: &str) -> Result<GeoPoint, GridError> {
    let cell = parse_cell(cell_id)?;
    let coord = LatLng::from(cell);
    Ok(GeoPoint::new(coord.lat(), coord.lng()))
}

/// Returns the cell's boundary polygon as an ordered vertex list.
///
/// The polygon is closed implicitly: the first vertex closes with the
/// last. Consumed by the rendering layer only.
///
/// # Errors
///
/// Returns [`GridError::InvalidCellId`] if `cell_id` is not a valid H3
/// cell identifier.
pub fn cell_boundary(cell_id: &str) -> Result<Vec<GeoPoint>, GridError> {
    let cell = parse_cell(cell_id)?;
    Ok(cell
        .boundary()
        .iter()
        .map(|coord| GeoPoint::new(coord.lat(), coord.lng()))
        .collect())
}

fn valid_coord(point: &GeoPoint) -> Result<LatLng, GridError> {
    let in_range = point.lat.is_finite()
        && point.lon.is_finite()
        && (-90.0..=90.0).contains(&point.lat)
        && (-180.0..=180.0).contains(&point.lon);

    if !in_range {
        return Err(GridError::InvalidCoordinate {
            lat: point.lat,
            lon: point.lon,
        });
    }

    LatLng::new(point.lat, point.lon).map_err(|_| GridError::InvalidCoordinate {
        lat: point.lat,
        lon: point.lon,
    })
}

fn parse_cell(cell_id: &str) -> Result<CellIndex, GridError> {
    CellIndex::from_str(cell_id).map_err(|_| GridError::InvalidCellId {
        cell_id: cell_id.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_point_same_cell() {
        let point = GeoPoint::new(6.5244, 3.3792);
        let a = cell_index(&point).unwrap();
        let b = cell_index(&point).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn nearby_points_share_a_cell() {
        // ~10m apart, far inside a resolution-7 hexagon.
        let a = cell_index(&GeoPoint::new(6.5244, 3.3792)).unwrap();
        let b = cell_index(&GeoPoint::new(6.5245, 3.3792)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_out_of_range_latitude() {
        let err = cell_index(&GeoPoint::new(91.0, 0.0)).unwrap_err();
        assert!(matches!(err, GridError::InvalidCoordinate { .. }));
    }

    #[test]
    fn rejects_non_finite_longitude() {
        let err = cell_index(&GeoPoint::new(0.0, f64::NAN)).unwrap_err();
        assert!(matches!(err, GridError::InvalidCoordinate { .. }));
    }

    #[test]
    fn center_stays_in_its_cell() {
        let cell_id = cell_index(&GeoPoint::new(6.5244, 3.3792)).unwrap();
        let center = cell_center(&cell_id).unwrap();
        assert_eq!(cell_index(&center).unwrap(), cell_id);
    }

    #[test]
    fn boundary_is_a_polygon() {
        let cell_id = cell_index(&GeoPoint::new(6.5244, 3.3792)).unwrap();
        let boundary = cell_boundary(&cell_id).unwrap();
        // Hexagon (or pentagon at the 12 icosahedron vertices).
        assert!(boundary.len() >= 5);
        assert!(boundary.iter().all(|p| p.lat.is_finite() && p.lon.is_finite()));
    }

    #[test]
    fn rejects_garbage_cell_id() {
        let err = cell_center("not-a-cell").unwrap_err();
        assert!(matches!(err, GridError::InvalidCellId { .. }));
    }
}
