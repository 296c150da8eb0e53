//! Nominatim / OpenStreetMap boundary source.
//!
//! Resolves a region name to its bounding box via the Nominatim search
//! endpoint. The public instance enforces **1 request per second**;
//! the caller is responsible for pacing.
//!
//! See <https://nominatim.org/release-docs/develop/api/Search/>

use async_trait::async_trait;
use store_map_models::BoundingBox;

use crate::{BoundarySource, SourceError};

/// Default Nominatim search endpoint.
pub const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org/search";

/// Region names are qualified with this suffix before geocoding, so a
/// bare state name like "Lagos" resolves to the Nigerian state rather
/// than some other place.
const QUERY_SUFFIX: &str = "State, Nigeria";

/// Boundary source backed by the Nominatim search API.
pub struct NominatimClient {
    client: reqwest::Client,
    base_url: String,
}

impl NominatimClient {
    /// Creates a client against the public Nominatim instance.
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_base_url(client, DEFAULT_BASE_URL.to_string())
    }

    /// Creates a client against a custom Nominatim instance.
    #[must_use]
    pub const fn with_base_url(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }
}

#[async_trait]
impl BoundarySource for NominatimClient {
    async fn fetch_bounding_box(&self, region_name: &str) -> Result<BoundingBox, SourceError> {
        let query = format!("{region_name} {QUERY_SUFFIX}");
        log::debug!("Nominatim lookup: {query}");

        let resp = self
            .client
            .get(&self.base_url)
            .query(&[("q", query.as_str()), ("format", "json"), ("limit", "1")])
            .send()
            .await?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(SourceError::RateLimited);
        }

        let body: serde_json::Value = resp.json().await?;
        parse_response(&body, region_name)
    }
}

/// Parses a Nominatim search response into a bounding box.
///
/// Nominatim's `boundingbox` array is `[southLat, northLat, westLon,
/// eastLon]` as strings.
fn parse_response(
    body: &serde_json::Value,
    region_name: &str,
) -> Result<BoundingBox, SourceError> {
    let results = body.as_array().ok_or_else(|| SourceError::Parse {
        message: "Nominatim response is not an array".to_string(),
    })?;

    let Some(first) = results.first() else {
        return Err(SourceError::RegionNotFound {
            region_name: region_name.to_string(),
        });
    };

    let bounds = first["boundingbox"]
        .as_array()
        .filter(|values| values.len() == 4)
        .ok_or_else(|| SourceError::Parse {
            message: "Missing boundingbox in Nominatim response".to_string(),
        })?;

    let mut parsed = [0.0_f64; 4];
    for (slot, value) in parsed.iter_mut().zip(bounds) {
        *slot = value
            .as_str()
            .and_then(|s| s.parse::<f64>().ok())
            .ok_or_else(|| SourceError::Parse {
                message: "Non-numeric boundingbox value in Nominatim response".to_string(),
            })?;
    }

    let [south, north, west, east] = parsed;
    if south > north {
        return Err(SourceError::Parse {
            message: format!("Inverted boundingbox latitudes: south={south}, north={north}"),
        });
    }

    Ok(BoundingBox::new(south, west, north, east))
}
