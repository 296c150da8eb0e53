#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! External data source clients for store density analysis.
//!
//! Two collaborator contracts and their OpenStreetMap-backed
//! implementations:
//!
//! - [`BoundarySource`] — region name to bounding box, via the
//!   [Nominatim](https://nominatim.org/release-docs/develop/api/Search/)
//!   search endpoint.
//! - [`PointSource`] — bounding box to shop locations, via the
//!   [Overpass API](https://overpass-api.de).
//!
//! Both public instances are rate-limited (Nominatim: 1 request/second),
//! which is why the analysis engine processes regions sequentially and
//! reuses cached results aggressively. Retries are a caller concern;
//! these clients surface failures as structured [`SourceError`] values.

pub mod nominatim;
pub mod overpass;

use async_trait::async_trait;
use store_map_models::{BoundingBox, GeoPoint};
use thiserror::Error;

pub use nominatim::NominatimClient;
pub use overpass::OverpassClient;

/// Errors from external data source operations.
#[derive(Debug, Error)]
pub enum SourceError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// The geocoder found no match for the region name.
    #[error("no location found for region: {region_name}")]
    RegionNotFound {
        /// The unresolvable name.
        region_name: String,
    },

    /// Rate limit exceeded.
    #[error("Rate limit exceeded")]
    RateLimited,
}

/// Resolves a region name to its geographic bounding box.
#[async_trait]
pub trait BoundarySource: Send + Sync {
    /// Fetches the bounding box for `region_name`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::RegionNotFound`] if the name does not
    /// resolve, or another [`SourceError`] on transport/format failure.
    async fn fetch_bounding_box(&self, region_name: &str) -> Result<BoundingBox, SourceError>;
}

/// Queries raw point-of-interest locations within a bounding box.
#[async_trait]
pub trait PointSource: Send + Sync {
    /// Fetches all store locations inside `bbox`.
    ///
    /// An empty result is a valid success: the region simply has no
    /// mapped stores.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] on transport or format failure.
    async fn fetch_points(&self, bbox: &BoundingBox) -> Result<Vec<GeoPoint>, SourceError>;
}
