#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Density aggregation and the per-session region analysis cache.
//!
//! [`aggregate`] turns a raw point list and bounding box into a
//! [`store_map_models::RegionAnalysis`]; [`RegionAnalysisStore`] holds at
//! most one analysis per region name for the lifetime of the session and
//! supports in-place hotspot annotation without invalidating the cached
//! aggregation.

mod aggregate;
mod store;

pub use aggregate::aggregate;
pub use store::RegionAnalysisStore;

use thiserror::Error;

/// Errors from the region analysis store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No analysis is cached under the given region name.
    #[error("no analysis cached for region: {region_name}")]
    RegionNotFound {
        /// The requested region name.
        region_name: String,
    },
}
