#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! LLM hotspot prediction with provider abstraction.
//!
//! Given a region's observed store distribution, asks a generative model
//! to suggest one new commercial location inside the region's bounding
//! box. Providers (Gemini, `OpenAI`) share a common [`PredictionService`]
//! trait and are selected from environment variables. Predictions are
//! advisory: a missing or malformed model response is always an error,
//! never an empty "no hotspot" value.

mod prompt;
pub mod providers;

pub use prompt::{MAX_PROMPT_POINTS, build_prompt, parse_hotspot, sample_points};

use async_trait::async_trait;
use store_map_models::{BoundingBox, GeoPoint, Hotspot};
use thiserror::Error;

/// Errors from hotspot prediction.
#[derive(Debug, Error)]
pub enum PredictionError {
    /// HTTP request to the LLM provider failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// No provider is available (e.g. missing credentials).
    #[error("prediction service unavailable: {message}")]
    Unavailable {
        /// Description of what is missing.
        message: String,
    },

    /// The model responded, but the payload did not contain a valid
    /// prediction.
    #[error("invalid prediction response: {message}")]
    InvalidResponse {
        /// Description of the malformation.
        message: String,
    },
}

/// Suggests a new commercial hotspot for a region.
#[async_trait]
pub trait PredictionService: Send + Sync {
    /// Predicts a hotspot location inside `bbox` given the region's
    /// observed store points.
    ///
    /// # Errors
    ///
    /// Returns [`PredictionError::Unavailable`] when the provider cannot
    /// be used for configuration reasons,
    /// [`PredictionError::InvalidResponse`] when the model's payload is
    /// malformed, or a transport error otherwise.
    async fn predict(
        &self,
        region_name: &str,
        points: &[GeoPoint],
        bbox: &BoundingBox,
    ) -> Result<Hotspot, PredictionError>;
}
