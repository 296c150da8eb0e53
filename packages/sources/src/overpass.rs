//! Overpass API point source.
//!
//! Queries OpenStreetMap `shop` nodes inside a bounding box via
//! Overpass QL. The public instance is slow under load and rate-limited,
//! so callers should cache results rather than re-query.

use async_trait::async_trait;
use serde::Deserialize;
use store_map_models::{BoundingBox, GeoPoint};

use crate::{PointSource, SourceError};

/// Default public Overpass interpreter endpoint.
pub const DEFAULT_BASE_URL: &str = "https://overpass-api.de/api/interpreter";

/// Point source backed by the Overpass API.
pub struct OverpassClient {
    client: reqwest::Client,
    base_url: String,
}

impl OverpassClient {
    /// Creates a client against the public Overpass instance.
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_base_url(client, DEFAULT_BASE_URL.to_string())
    }

    /// Creates a client against a custom Overpass instance.
    #[must_use]
    pub const fn with_base_url(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }
}

/// Top-level Overpass JSON response.
#[derive(Deserialize)]
struct OverpassResponse {
    elements: Vec<OverpassElement>,
}

/// A single returned OSM element. Only node coordinates are used;
/// ways/relations without a direct lat/lon are skipped.
#[derive(Deserialize)]
struct OverpassElement {
    lat: Option<f64>,
    lon: Option<f64>,
}

#[async_trait]
impl PointSource for OverpassClient {
    async fn fetch_points(&self, bbox: &BoundingBox) -> Result<Vec<GeoPoint>, SourceError> {
        let query = build_query(bbox);
        log::debug!("Overpass query: {}", query.trim());

        let resp = self.client.post(&self.base_url).body(query).send().await?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(SourceError::RateLimited);
        }
        if !resp.status().is_success() {
            return Err(SourceError::Parse {
                message: format!("Overpass request failed with status {}", resp.status()),
            });
        }

        let body: serde_json::Value = resp.json().await?;
        parse_response(&body)
    }
}

/// Builds the Overpass QL query for shop nodes inside `bbox`.
fn build_query(bbox: &BoundingBox) -> String {
    format!(
        "[out:json][timeout:60];\n(\n  node[\"shop\"]({south},{west},{north},{east});\n);\nout;\n",
        south = bbox.south,
        west = bbox.west,
        north = bbox.north,
        east = bbox.east,
    )
}

/// Parses an Overpass JSON response into store points.
fn parse_response(body: &serde_json::Value) -> Result<Vec<GeoPoint>, SourceError> {
    let response: OverpassResponse =
        serde_json::from_value(body.clone()).map_err(|e| SourceError::Parse {
            message: format!("Malformed Overpass response: {e}"),
        })?;

    Ok(response
        .elements
        .into_iter()
        .filter_map(|element| match (element.lat, element.lon) {
            (Some(lat), Some(lon)) => Some(GeoPoint::new(lat, lon)),
            _ => None,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_overpass_nodes() {
        let body = serde_json::json!({
            "elements": [
                { "type": "node", "id": 1, "lat": 6.4541, "lon": 3.3947 },
                { "type": "node", "id": 2, "lat": 6.6018, "lon": 3.3515 }
            ]
        });
        let points = parse_response(&body).unwrap();
        assert_eq!(points.len(), 2);
        assert!((points[0].lat - 6.4541).abs() < 1e-4);
        assert!((points[0].lon - 3.3947).abs() < 1e-4);
    }

    #[test]
    fn empty_elements_is_valid_success() {
        let body = serde_json::json!({ "elements": [] });
        assert!(parse_response(&body).unwrap().is_empty());
    }

    #[test]
    fn skips_elements_without_coordinates() {
        let body = serde_json::json!({
            "elements": [
                { "type": "way", "id": 3 },
                { "type": "node", "id": 4, "lat": 6.45, "lon": 3.39 }
            ]
        });
        let points = parse_response(&body).unwrap();
        assert_eq!(points.len(), 1);
    }

    #[test]
    fn missing_elements_key_is_parse_error() {
        let body = serde_json::json!({ "remark": "timed out" });
        let err = parse_response(&body).unwrap_err();
        assert!(matches!(err, SourceError::Parse { .. }));
    }

    #[test]
    fn query_embeds_bbox_in_osm_order() {
        let bbox = BoundingBox::new(6.36, 2.69, 6.70, 3.84);
        let query = build_query(&bbox);
        assert!(query.contains("node[\"shop\"](6.36,2.69,6.7,3.84)"));
        assert!(query.contains("[out:json]"));
    }
}
