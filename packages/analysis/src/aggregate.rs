//! Pure hex-cell density aggregation.

use std::collections::BTreeMap;

use store_map_grid::GridError;
use store_map_models::{BoundingBox, GeoPoint, HexCell, RegionAnalysis};

/// Aggregates `points` into occupied hex cells and derives the region's
/// density statistics.
///
/// Pure function of its inputs and the fixed grid resolution: no
/// side effects, and the same inputs always produce the same cell map
/// and totals. The densest cell is tracked with a running maximum that
/// only advances on a strictly greater count, so among cells tying at
/// the maximum the *first to reach it* in input order wins. That makes
/// the tie-break deterministic for a given input order, but a
/// permutation of the same points may report a different (equally
/// dense) winner.
///
/// An empty `points` slice is a valid input and yields a zero analysis:
/// no cells, no densest cell, `average_density` 0.
///
/// # Errors
///
/// Returns [`GridError::InvalidCoordinate`] if any point is malformed.
/// The aggregation fails atomically: no partial analysis is produced.
pub fn aggregate(
    region_name: &str,
    points: &[GeoPoint],
    bbox: &BoundingBox,
) -> Result<RegionAnalysis, GridError> {
    let mut cells: BTreeMap<String, HexCell> = BTreeMap::new();
    // (cell_id, count) running max; count 0 is the "no cell yet" sentinel.
    let mut max_cell_id: Option<String> = None;
    let mut max_count: u64 = 0;

    for point in points {
        let cell_id = store_map_grid::cell_index(point)?;

        let cell = match cells.entry(cell_id.clone()) {
            std::collections::btree_map::Entry::Occupied(entry) => entry.into_mut(),
            std::collections::btree_map::Entry::Vacant(entry) => {
                let center = store_map_grid::cell_center(&cell_id)?;
                entry.insert(HexCell {
                    cell_id: cell_id.clone(),
                    count: 0,
                    lat: center.lat,
                    lon: center.lon,
                })
            }
        };
        cell.count += 1;

        // Strict `>`: later ties never displace the first cell to reach
        // the current maximum.
        if cell.count > max_count {
            max_count = cell.count;
            max_cell_id = Some(cell_id);
        }
    }

    let total_points = points.len() as u64;
    let average_density = if cells.is_empty() {
        0.0
    } else {
        #[allow(clippy::cast_precision_loss)]
        {
            total_points as f64 / cells.len() as f64
        }
    };
    let densest_cell = max_cell_id.and_then(|id| cells.get(&id).cloned());

    log::debug!(
        "Aggregated {total_points} points into {} cells for {region_name}",
        cells.len()
    );

    Ok(RegionAnalysis {
        region_name: region_name.to_string(),
        total_points,
        cells,
        average_density,
        densest_cell,
        bounding_box: *bbox,
        center: bbox.center(),
        hotspot: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lagos_bbox() -> BoundingBox {
        BoundingBox::new(6.3, 3.0, 6.7, 3.7)
    }

    #[test]
    fn total_equals_sum_of_cell_counts() {
        let points = vec![
            GeoPoint::new(6.50, 3.30),
            GeoPoint::new(6.50, 3.30),
            GeoPoint::new(6.51, 3.31),
            GeoPoint::new(6.60, 3.50),
        ];
        let analysis = aggregate("Lagos", &points, &lagos_bbox()).unwrap();

        assert_eq!(analysis.total_points, 4);
        let sum: u64 = analysis.cells.values().map(|c| c.count).sum();
        assert_eq!(sum, 4);
    }

    #[test]
    fn empty_input_yields_zero_analysis() {
        let analysis = aggregate("Lagos", &[], &lagos_bbox()).unwrap();

        assert_eq!(analysis.total_points, 0);
        assert!(analysis.cells.is_empty());
        assert!(analysis.densest_cell.is_none());
        assert!(analysis.average_density.abs() < f64::EPSILON);
    }

    #[test]
    fn end_to_end_density_scenario() {
        // Two coincident points plus one close neighbor: the coincident
        // pair guarantees a cell with count >= 2 at any resolution.
        let points = vec![
            GeoPoint::new(6.50, 3.30),
            GeoPoint::new(6.50, 3.30),
            GeoPoint::new(6.51, 3.31),
        ];
        let analysis = aggregate("Lagos", &points, &lagos_bbox()).unwrap();

        assert_eq!(analysis.total_points, 3);
        assert!(!analysis.cells.is_empty() && analysis.cells.len() <= 2);
        assert!(analysis.densest_cell.unwrap().count >= 2);
    }

    #[test]
    fn first_cell_to_reach_max_wins_tie() {
        // Two well-separated locations, two points each: a crafted tie.
        let first = GeoPoint::new(6.50, 3.30);
        let second = GeoPoint::new(6.60, 3.60);
        let first_cell = store_map_grid::cell_index(&first).unwrap();
        let second_cell = store_map_grid::cell_index(&second).unwrap();
        assert_ne!(first_cell, second_cell);

        let points = vec![first, second, first, second];
        let analysis = aggregate("Lagos", &points, &lagos_bbox()).unwrap();
        // `first` reaches count 2 at index 2, before `second` does.
        assert_eq!(analysis.densest_cell.unwrap().cell_id, first_cell);

        let reversed = vec![second, first, second, first];
        let analysis = aggregate("Lagos", &reversed, &lagos_bbox()).unwrap();
        assert_eq!(analysis.densest_cell.unwrap().cell_id, second_cell);
    }

    #[test]
    fn permutation_preserves_cell_map() {
        let points = vec![
            GeoPoint::new(6.50, 3.30),
            GeoPoint::new(6.51, 3.31),
            GeoPoint::new(6.60, 3.50),
            GeoPoint::new(6.50, 3.30),
        ];
        let mut permuted = points.clone();
        permuted.reverse();

        let a = aggregate("Lagos", &points, &lagos_bbox()).unwrap();
        let b = aggregate("Lagos", &permuted, &lagos_bbox()).unwrap();

        assert_eq!(a.total_points, b.total_points);
        assert_eq!(a.cells, b.cells);
    }

    #[test]
    fn invalid_point_fails_atomically() {
        let points = vec![GeoPoint::new(6.50, 3.30), GeoPoint::new(200.0, 3.30)];
        let err = aggregate("Lagos", &points, &lagos_bbox()).unwrap_err();
        assert!(matches!(err, GridError::InvalidCoordinate { .. }));
    }

    #[test]
    fn cell_centers_are_canonical() {
        let point = GeoPoint::new(6.50, 3.30);
        let analysis = aggregate("Lagos", &[point], &lagos_bbox()).unwrap();
        let cell = analysis.cells.values().next().unwrap();
        let center = store_map_grid::cell_center(&cell.cell_id).unwrap();
        assert!((cell.lat - center.lat).abs() < f64::EPSILON);
        assert!((cell.lon - center.lon).abs() < f64::EPSILON);
    }
}
