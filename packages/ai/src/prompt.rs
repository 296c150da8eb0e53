//! Prompt construction and response validation shared by all providers.

use store_map_models::{BoundingBox, GeoPoint, Hotspot};

use crate::PredictionError;

/// Maximum number of store points embedded in a prompt.
///
/// Beyond this, [`sample_points`] thins the list deterministically so a
/// large region does not blow the context window.
pub const MAX_PROMPT_POINTS: usize = 500;

/// Selects at most [`MAX_PROMPT_POINTS`] points with a fixed stride.
///
/// Deterministic: the same input always yields the same sample, keeping
/// predictions reproducible across runs (unlike random shuffling).
#[must_use]
pub fn sample_points(points: &[GeoPoint]) -> Vec<GeoPoint> {
    if points.len() <= MAX_PROMPT_POINTS {
        return points.to_vec();
    }
    let stride = points.len().div_ceil(MAX_PROMPT_POINTS);
    points.iter().step_by(stride).copied().collect()
}

/// Builds the analyst prompt for a region's hotspot prediction.
#[must_use]
pub fn build_prompt(region_name: &str, points: &[GeoPoint], bbox: &BoundingBox) -> String {
    let sampled = sample_points(points);
    let coords: Vec<String> = sampled
        .iter()
        .map(|p| format!("({:.4}, {:.4})", p.lat, p.lon))
        .collect();

    format!(
        "You are a professional geospatial analyst.\n\
         I am analyzing store density in {region_name}, Nigeria.\n\
         Bounding box: minLat: {south}, minLon: {west}, maxLat: {north}, maxLon: {east}.\n\
         Existing stores: {stores}.\n\
         Predict a new commercial hotspot (lat, lon) within the box.\n\
         Give a one-sentence reasoning.\n\
         Return ONLY valid JSON with keys \"lat\", \"lon\", \"reasoning\".",
        south = bbox.south,
        west = bbox.west,
        north = bbox.north,
        east = bbox.east,
        stores = coords.join("; "),
    )
}

/// JSON schema for the structured prediction response, in the format
/// accepted by Gemini's `responseSchema`.
#[must_use]
pub fn response_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "OBJECT",
        "properties": {
            "lat": { "type": "NUMBER", "description": "Predicted latitude for the new hotspot" },
            "lon": { "type": "NUMBER", "description": "Predicted longitude for the new hotspot" },
            "reasoning": { "type": "STRING", "description": "Why this location was chosen" }
        },
        "required": ["lat", "lon", "reasoning"]
    })
}

/// Validates a model's JSON payload into a [`Hotspot`].
///
/// # Errors
///
/// Returns [`PredictionError::InvalidResponse`] if `lat`/`lon` are
/// missing or non-finite, or `reasoning` is not a string. A prediction
/// is never optional: an empty payload is an error, not a "no hotspot".
pub fn parse_hotspot(value: &serde_json::Value) -> Result<Hotspot, PredictionError> {
    let lat = value["lat"]
        .as_f64()
        .filter(|v| v.is_finite())
        .ok_or_else(|| PredictionError::InvalidResponse {
            message: "Missing or non-numeric lat".to_string(),
        })?;
    let lon = value["lon"]
        .as_f64()
        .filter(|v| v.is_finite())
        .ok_or_else(|| PredictionError::InvalidResponse {
            message: "Missing or non-numeric lon".to_string(),
        })?;
    let reasoning = value["reasoning"]
        .as_str()
        .ok_or_else(|| PredictionError::InvalidResponse {
            message: "Missing reasoning".to_string(),
        })?
        .to_string();

    Ok(Hotspot {
        lat,
        lon,
        reasoning,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_points(n: usize) -> Vec<GeoPoint> {
        (0..n)
            .map(|i| {
                #[allow(clippy::cast_precision_loss)]
                let offset = i as f64 * 1e-4;
                GeoPoint::new(6.4 + offset, 3.3 + offset)
            })
            .collect()
    }

    #[test]
    fn small_input_passes_through() {
        let points = grid_points(10);
        assert_eq!(sample_points(&points), points);
    }

    #[test]
    fn large_input_is_thinned_deterministically() {
        let points = grid_points(1600);
        let a = sample_points(&points);
        let b = sample_points(&points);
        assert_eq!(a, b);
        assert!(a.len() <= MAX_PROMPT_POINTS);
        // Fixed stride of 4 over 1600 points.
        assert_eq!(a.len(), 400);
        assert_eq!(a[0], points[0]);
        assert_eq!(a[1], points[4]);
    }

    #[test]
    fn prompt_names_region_and_bounds() {
        let bbox = BoundingBox::new(6.36, 2.69, 6.70, 3.84);
        let prompt = build_prompt("Lagos", &grid_points(2), &bbox);
        assert!(prompt.contains("Lagos"));
        assert!(prompt.contains("minLat: 6.36"));
        assert!(prompt.contains("maxLon: 3.84"));
        assert!(prompt.contains("(6.4000, 3.3000)"));
    }

    #[test]
    fn parses_valid_payload() {
        let value = serde_json::json!({
            "lat": 6.52,
            "lon": 3.37,
            "reasoning": "Gap between two dense clusters"
        });
        let hotspot = parse_hotspot(&value).unwrap();
        assert!((hotspot.lat - 6.52).abs() < f64::EPSILON);
        assert_eq!(hotspot.reasoning, "Gap between two dense clusters");
    }

    #[test]
    fn rejects_missing_lat() {
        let value = serde_json::json!({ "lon": 3.37, "reasoning": "x" });
        let err = parse_hotspot(&value).unwrap_err();
        assert!(matches!(err, PredictionError::InvalidResponse { .. }));
    }

    #[test]
    fn rejects_string_coordinates() {
        let value = serde_json::json!({ "lat": "6.52", "lon": 3.37, "reasoning": "x" });
        let err = parse_hotspot(&value).unwrap_err();
        assert!(matches!(err, PredictionError::InvalidResponse { .. }));
    }

    #[test]
    fn rejects_empty_payload() {
        let err = parse_hotspot(&serde_json::json!({})).unwrap_err();
        assert!(matches!(err, PredictionError::InvalidResponse { .. }));
    }
}
